use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter};

use crate::models::MediaItem;

use super::SessionStatus;

/// Reports coming back from the player, tagged with the session they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEvent {
    pub session_id: String,
    pub kind: PlayerEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEventKind {
    Playing,
    Ended,
    PlayRejected { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvanceReason {
    TimerExpired,
    VideoEnded,
    Stalled,
}

/// What the rendering layer is told, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlaybackEvent {
    ItemChanged {
        index: usize,
        item: MediaItem,
        session_id: Option<String>,
    },
    PlaylistEmpty,
    OverlayShown {
        session_id: String,
        pause_id: String,
        overlay_image: String,
        display_ms: u64,
    },
    OverlayHidden {
        session_id: String,
        pause_id: String,
        resumed_at_seconds: f64,
    },
    ResumeFailed {
        session_id: String,
        pause_id: Option<String>,
        reason: String,
    },
    AdvanceRequested {
        from_index: usize,
        reason: AdvanceReason,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub pause_id: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current: Option<MediaItem>,
    pub index: Option<usize>,
    pub item_count: usize,
    pub session_id: Option<String>,
    pub session_status: Option<SessionStatus>,
    pub overlay: Option<OverlayState>,
    pub suspended: bool,
    pub resume_position_seconds: Option<f64>,
}

pub trait PlaybackObserver: Send + Sync + 'static {
    fn on_event(&self, event: &PlaybackEvent);
    fn on_state_changed(&self, snapshot: &PlaybackSnapshot);
}

/// Forwards playback output to the webview.
pub struct TauriObserver {
    app_handle: AppHandle,
}

impl TauriObserver {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl PlaybackObserver for TauriObserver {
    fn on_event(&self, event: &PlaybackEvent) {
        if let Err(err) = self.app_handle.emit("playback-event", event) {
            log::warn!("failed to emit playback-event: {err}");
        }
    }

    fn on_state_changed(&self, snapshot: &PlaybackSnapshot) {
        if let Err(err) = self.app_handle.emit("playback-state-changed", snapshot) {
            log::warn!("failed to emit playback-state-changed: {err}");
        }
    }
}
