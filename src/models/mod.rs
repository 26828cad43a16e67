pub mod media;
pub mod pause;

pub use media::{MediaItem, MediaKind, MAX_DISPLAY_SECONDS};
pub use pause::PauseDescriptor;
