pub mod event;
pub mod item;
pub mod response;

pub use event::*;
pub use item::*;
pub use response::*;
