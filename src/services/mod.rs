pub mod campaign_service;
pub mod draw_service;
pub mod sequence;

pub use campaign_service::*;
pub use draw_service::*;
