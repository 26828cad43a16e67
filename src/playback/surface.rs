use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde::Serialize;
use tauri::{AppHandle, Emitter};

/// The single video element the active playback session drives.
///
/// Only the mounted session may call these; the orchestrator attaches a
/// session id on mount and detaches it when the session is discarded.
pub trait VideoSurface: Send {
    fn attach(&mut self, session_id: &str);
    fn detach(&mut self);
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek(&mut self, seconds: f64) -> Result<()>;
    /// Last known play head, `None` until the player has reported one.
    fn position(&self) -> Option<f64>;
}

#[derive(Debug, Default)]
struct MirrorState {
    session_id: Option<String>,
    position: Option<f64>,
}

/// Play head reported by the webview, shared between the command handlers
/// that receive reports and the surface that reads them on each poll tick.
#[derive(Clone, Default)]
pub struct PlayerMirror {
    inner: Arc<Mutex<MirrorState>>,
}

impl PlayerMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a position report. Returns `false` when it belongs to a
    /// session that is no longer mounted.
    pub fn record_position(&self, session_id: &str, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }
        let mut guard = self.lock();
        if guard.session_id.as_deref() != Some(session_id) {
            return false;
        }
        guard.position = Some(seconds);
        true
    }

    pub fn position(&self) -> Option<f64> {
        self.lock().position
    }

    fn bind(&self, session_id: Option<&str>) {
        let mut guard = self.lock();
        guard.session_id = session_id.map(str::to_string);
        guard.position = None;
    }

    fn set_position(&self, seconds: f64) {
        self.lock().position = Some(seconds);
    }

    fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MirrorState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct VideoCommandEvent {
    session_id: String,
    action: &'static str,
    seconds: Option<f64>,
}

/// Drives the `<video>` element in the main webview through `video-command` events.
pub struct WebviewSurface {
    app_handle: AppHandle,
    mirror: PlayerMirror,
}

impl WebviewSurface {
    pub fn new(app_handle: AppHandle, mirror: PlayerMirror) -> Self {
        Self { app_handle, mirror }
    }

    fn send(&self, action: &'static str, seconds: Option<f64>) -> Result<()> {
        let session_id = self
            .mirror
            .session_id()
            .ok_or_else(|| anyhow!("no video session attached"))?;

        self.app_handle
            .emit(
                "video-command",
                VideoCommandEvent {
                    session_id,
                    action,
                    seconds,
                },
            )
            .map_err(|err| anyhow!("failed to emit video-command {action}: {err}"))
    }
}

impl VideoSurface for WebviewSurface {
    fn attach(&mut self, session_id: &str) {
        self.mirror.bind(Some(session_id));
    }

    fn detach(&mut self) {
        self.mirror.bind(None);
    }

    fn play(&mut self) -> Result<()> {
        self.send("play", None)
    }

    fn pause(&mut self) -> Result<()> {
        self.send("pause", None)
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.send("seek", Some(seconds))?;
        self.mirror.set_position(seconds);
        Ok(())
    }

    fn position(&self) -> Option<f64> {
        self.mirror.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_rejects_reports_for_other_sessions() {
        let mirror = PlayerMirror::new();
        assert!(!mirror.record_position("s1", 1.0));

        mirror.bind(Some("s1"));
        assert!(mirror.record_position("s1", 1.5));
        assert!(!mirror.record_position("s0", 9.0));
        assert_eq!(mirror.position(), Some(1.5));
    }

    #[test]
    fn test_rebinding_clears_position() {
        let mirror = PlayerMirror::new();
        mirror.bind(Some("s1"));
        mirror.record_position("s1", 4.0);

        mirror.bind(Some("s2"));
        assert_eq!(mirror.position(), None);
        assert!(!mirror.record_position("s1", 4.2));
    }

    #[test]
    fn test_invalid_positions_are_ignored() {
        let mirror = PlayerMirror::new();
        mirror.bind(Some("s1"));
        assert!(!mirror.record_position("s1", f64::NAN));
        assert!(!mirror.record_position("s1", -2.0));
        assert_eq!(mirror.position(), None);
    }
}
