pub mod commands;
pub mod controller;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod orchestrator;
pub mod rotation;
pub mod session;
pub mod surface;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::PauseController;
pub use engine::PlaybackController;
pub use events::{
    AdvanceReason, OverlayState, PlaybackEvent, PlaybackObserver, PlaybackSnapshot, PlayerEvent,
    PlayerEventKind, TauriObserver,
};
pub use ledger::{derive_active_pauses, ActivePause};
pub use orchestrator::Orchestrator;
pub use rotation::{AdvancePolicy, RotationDriver};
pub use session::{PlaybackSession, SessionStatus};
pub use surface::{PlayerMirror, VideoSurface, WebviewSurface};
