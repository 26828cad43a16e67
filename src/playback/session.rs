use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::MAX_DISPLAY_SECONDS;

use super::ActivePause;

/// `now + wait`, with `wait` capped at the longest supported dwell. Never panics.
pub(crate) fn deadline_after(now: Instant, wait: Duration) -> Instant {
    let wait = wait.min(Duration::from_secs(MAX_DISPLAY_SECONDS));
    now.checked_add(wait).unwrap_or(now)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Playing,
    Suspended,
    Ended,
}

/// Playback held at a pause point.
#[derive(Debug, Clone, PartialEq)]
pub struct Suspension {
    pub pause_id: String,
    pub overlay_image: String,
    pub resume_position: f64,
    /// When the overlay dwell ends. `None` once the dwell is over but the
    /// resume was refused, which leaves the video paused without an overlay.
    pub resume_at: Option<Instant>,
}

impl Suspension {
    pub fn overlay_visible(&self) -> bool {
        self.resume_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Playing,
    Suspended(Suspension),
    Ended,
}

/// Pause bookkeeping for one mount of one video. Never reused: a new mount
/// gets a new session with an empty consumed set.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: String,
    media_id: String,
    pauses: Vec<ActivePause>,
    consumed: HashSet<String>,
    phase: SessionPhase,
}

impl PlaybackSession {
    pub fn new(media_id: impl Into<String>, pauses: Vec<ActivePause>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            media_id: media_id.into(),
            pauses,
            consumed: HashSet::new(),
            phase: SessionPhase::Playing,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    pub fn pauses(&self) -> &[ActivePause] {
        &self.pauses
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn status(&self) -> SessionStatus {
        match self.phase {
            SessionPhase::Playing => SessionStatus::Playing,
            SessionPhase::Suspended(_) => SessionStatus::Suspended,
            SessionPhase::Ended => SessionStatus::Ended,
        }
    }

    pub fn is_consumed(&self, pause_id: &str) -> bool {
        self.consumed.contains(pause_id)
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.phase, SessionPhase::Suspended(_))
    }

    pub fn suspension(&self) -> Option<&Suspension> {
        match &self.phase {
            SessionPhase::Suspended(suspension) => Some(suspension),
            _ => None,
        }
    }

    pub fn resume_position(&self) -> Option<f64> {
        self.suspension().map(|s| s.resume_position)
    }

    pub fn resume_at(&self) -> Option<Instant> {
        self.suspension().and_then(|s| s.resume_at)
    }

    /// Earliest unconsumed pause whose trigger window holds `position`.
    pub fn due_pause(&self, position: f64, window: f64) -> Option<&ActivePause> {
        self.pauses
            .iter()
            .find(|p| !self.is_consumed(&p.id) && p.window_contains(position, window))
    }

    /// Marks `pause` consumed and enters the suspended phase.
    pub fn suspend(&mut self, pause: &ActivePause, position: f64, now: Instant) {
        self.consumed.insert(pause.id.clone());
        self.phase = SessionPhase::Suspended(Suspension {
            pause_id: pause.id.clone(),
            overlay_image: pause.overlay_image.clone(),
            resume_position: position,
            resume_at: Some(deadline_after(now, pause.display)),
        });
    }

    /// Closes the overlay of a suspension whose resume did not go through.
    pub fn stall(&mut self) {
        if let SessionPhase::Suspended(suspension) = &mut self.phase {
            suspension.resume_at = None;
        }
    }

    pub fn resume(&mut self) {
        self.phase = SessionPhase::Playing;
    }

    pub fn end(&mut self) {
        self.phase = SessionPhase::Ended;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pause(id: &str, trigger: f64) -> ActivePause {
        ActivePause {
            id: id.to_string(),
            trigger_second: trigger,
            display: Duration::from_secs(2),
            overlay_image: format!("{id}.png"),
        }
    }

    #[test]
    fn test_new_sessions_get_distinct_ids_and_start_playing() {
        let a = PlaybackSession::new("video-1", vec![pause("p1", 3.0)]);
        let b = PlaybackSession::new("video-1", vec![pause("p1", 3.0)]);

        assert_ne!(a.id(), b.id());
        assert_eq!(a.status(), SessionStatus::Playing);
        assert_eq!(a.consumed_count(), 0);
        assert_eq!(a.resume_position(), None);
    }

    #[test]
    fn test_suspend_records_position_and_deadline() {
        let now = Instant::now();
        let mut session = PlaybackSession::new("video-1", vec![pause("p1", 3.0)]);
        let p = session.pauses()[0].clone();

        session.suspend(&p, 3.04, now);

        assert!(session.is_consumed("p1"));
        assert_eq!(session.resume_position(), Some(3.04));
        assert_eq!(session.resume_at(), Some(now + Duration::from_secs(2)));
        assert!(session.suspension().map(Suspension::overlay_visible).unwrap_or(false));
    }

    #[test]
    fn test_deadline_after_caps_the_wait() {
        let now = Instant::now();
        let day = Duration::from_secs(MAX_DISPLAY_SECONDS);

        assert_eq!(deadline_after(now, Duration::from_secs(2)), now + Duration::from_secs(2));
        assert_eq!(deadline_after(now, Duration::MAX), now + day);

        let mut long = pause("long", 1.0);
        long.display = Duration::MAX;
        let mut session = PlaybackSession::new("video-1", vec![long.clone()]);
        session.suspend(&long, 1.0, now);
        assert_eq!(session.resume_at(), Some(now + day));
    }

    #[test]
    fn test_resume_position_only_exists_while_suspended() {
        let now = Instant::now();
        let mut session = PlaybackSession::new("video-1", vec![pause("p1", 3.0)]);
        let p = session.pauses()[0].clone();

        session.suspend(&p, 3.0, now);
        session.stall();
        assert!(session.is_suspended());
        assert_eq!(session.resume_position(), Some(3.0));
        assert_eq!(session.resume_at(), None);

        session.resume();
        assert_eq!(session.resume_position(), None);

        session.end();
        assert_eq!(session.status(), SessionStatus::Ended);
        assert_eq!(session.resume_position(), None);
    }

    #[test]
    fn test_due_pause_skips_consumed_and_picks_earliest() {
        let now = Instant::now();
        let mut session =
            PlaybackSession::new("video-1", vec![pause("p1", 3.0), pause("p2", 3.2)]);

        assert_eq!(session.due_pause(3.3, 0.5).map(|p| p.id.as_str()), Some("p1"));

        let p1 = session.pauses()[0].clone();
        session.suspend(&p1, 3.3, now);
        session.resume();

        assert_eq!(session.due_pause(3.3, 0.5).map(|p| p.id.as_str()), Some("p2"));
        assert!(session.due_pause(10.0, 0.5).is_none());
    }
}
