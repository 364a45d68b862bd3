pub mod campaign;
pub mod draw;

pub use campaign::campaign_config;
pub use draw::draw_config;
