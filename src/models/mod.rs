pub mod campaign;
pub mod common;
pub mod draw;
pub mod outcome;
pub mod pagination;

pub use campaign::*;
pub use common::*;
pub use draw::*;
pub use outcome::*;
pub use pagination::*;
