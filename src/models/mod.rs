pub mod stock;
pub mod screening;
pub mod response;

pub use stock::*;
pub use screening::*;
pub use response::*;
