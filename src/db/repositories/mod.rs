pub mod media_items;
pub mod pause_points;
