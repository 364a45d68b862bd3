pub mod campaigns;
pub mod draw_results;
pub mod outcomes;
pub mod rotations;

pub use campaigns as campaign_entity;
pub use draw_results as draw_result_entity;
pub use outcomes as outcome_entity;
pub use rotations as rotation_entity;

pub use campaigns::GameType;
