use std::time::Duration;

use tokio::time::Instant;

use super::{session::SessionPhase, ActivePause, PlaybackSession, VideoSurface};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// A pause point that just fired.
#[derive(Debug, Clone, PartialEq)]
pub struct PauseTriggered {
    pub pause_id: String,
    pub overlay_image: String,
    pub position: f64,
    pub display: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    Resumed { pause_id: String, position: f64 },
    /// The surface refused the seek or the play; the video stays paused.
    Failed { pause_id: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayingOutcome {
    /// Nothing to do: the session is playing or no session is mounted.
    Expected,
    /// The video started while an overlay was up and was paused again.
    ForcedPause,
    /// A stalled session is moving again on its own.
    Recovered,
}

/// Owns the playback session of the mounted video and turns poll ticks,
/// dwell expiry and player reports into pause/resume commands.
pub struct PauseController {
    session: Option<PlaybackSession>,
    trigger_window: f64,
}

impl PauseController {
    pub fn new(trigger_window: Duration) -> Self {
        Self {
            session: None,
            trigger_window: trigger_window.as_secs_f64(),
        }
    }

    pub fn set_trigger_window(&mut self, window: Duration) {
        self.trigger_window = window.as_secs_f64();
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(PlaybackSession::id)
    }

    /// Discards any previous session and starts a fresh one for `media_id`.
    pub fn mount<S: VideoSurface + ?Sized>(
        &mut self,
        media_id: &str,
        pauses: Vec<ActivePause>,
        surface: &mut S,
    ) -> String {
        self.unmount(surface);

        let session = PlaybackSession::new(media_id, pauses);
        let session_id = session.id().to_string();
        surface.attach(&session_id);
        log_info!(
            "mounted video {} as session {} with {} pause point(s)",
            media_id,
            session_id,
            session.pauses().len()
        );
        self.session = Some(session);
        session_id
    }

    pub fn unmount<S: VideoSurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(session) = self.session.take() {
            log_debug!("discarding session {} for {}", session.id(), session.media_id());
            surface.detach();
        }
    }

    /// Poll tick: fires at most one pause point.
    pub fn poll<S: VideoSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        now: Instant,
    ) -> Option<PauseTriggered> {
        let session = self.session.as_mut()?;
        if session.phase() != &SessionPhase::Playing {
            return None;
        }

        let position = surface.position()?;
        let pause = session.due_pause(position, self.trigger_window)?.clone();

        session.suspend(&pause, position, now);
        if let Err(err) = surface.pause() {
            // The overlay still covers the frame; the resume seek restores the spot.
            log_warn!("pause command for {} failed: {err:#}", pause.id);
        }

        log_info!(
            "pause {} fired at {:.3}s in session {} for {:?}",
            pause.id,
            position,
            session.id(),
            pause.display
        );

        Some(PauseTriggered {
            pause_id: pause.id,
            overlay_image: pause.overlay_image,
            position,
            display: pause.display,
        })
    }

    /// Overlay dwell deadline: restores the recorded position and resumes.
    pub fn finish_dwell<S: VideoSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        now: Instant,
    ) -> Option<ResumeOutcome> {
        let session = self.session.as_mut()?;
        let suspension = session.suspension()?.clone();
        match suspension.resume_at {
            Some(deadline) if deadline <= now => {}
            _ => return None,
        }

        let resumed = surface
            .seek(suspension.resume_position)
            .and_then(|_| surface.play());

        match resumed {
            Ok(()) => {
                session.resume();
                log_info!(
                    "resumed session {} at {:.3}s after pause {}",
                    session.id(),
                    suspension.resume_position,
                    suspension.pause_id
                );
                Some(ResumeOutcome::Resumed {
                    pause_id: suspension.pause_id,
                    position: suspension.resume_position,
                })
            }
            Err(err) => {
                session.stall();
                log_error!(
                    "resume after pause {} failed in session {}: {err:#}",
                    suspension.pause_id,
                    session.id()
                );
                Some(ResumeOutcome::Failed {
                    pause_id: suspension.pause_id,
                    reason: format!("{err:#}"),
                })
            }
        }
    }

    /// The player reports that it started playing.
    pub fn on_playing<S: VideoSurface + ?Sized>(&mut self, surface: &mut S) -> PlayingOutcome {
        let Some(session) = self.session.as_mut() else {
            return PlayingOutcome::Expected;
        };
        let Some(suspension) = session.suspension() else {
            return PlayingOutcome::Expected;
        };

        if suspension.overlay_visible() {
            log_warn!(
                "video started during overlay {} in session {}; pausing again",
                suspension.pause_id,
                session.id()
            );
            if let Err(err) = surface.pause() {
                log_error!("re-pause during overlay failed: {err:#}");
            }
            PlayingOutcome::ForcedPause
        } else {
            log_info!("stalled session {} is playing again", session.id());
            session.resume();
            PlayingOutcome::Recovered
        }
    }

    /// End of stream. Returns `true` exactly once per session.
    pub fn on_ended(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        match session.phase() {
            SessionPhase::Ended => {
                log_debug!("duplicate end of stream for session {}", session.id());
                false
            }
            SessionPhase::Suspended(suspension) if suspension.overlay_visible() => {
                log_warn!(
                    "end of stream during overlay {} in session {}; ignoring",
                    suspension.pause_id,
                    session.id()
                );
                false
            }
            _ => {
                let skipped = session.pauses().len() - session.consumed_count();
                if skipped > 0 {
                    log_info!(
                        "session {} ended with {} pause point(s) never reached",
                        session.id(),
                        skipped
                    );
                }
                session.end();
                true
            }
        }
    }

    /// The player refused to play. Returns `true` when the video is now
    /// stuck and the rotation needs a fallback.
    pub fn on_play_rejected(&mut self, reason: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        match session.phase() {
            SessionPhase::Ended => false,
            SessionPhase::Suspended(suspension) if suspension.overlay_visible() => false,
            _ => {
                log_warn!("playback rejected in session {}: {}", session.id(), reason);
                true
            }
        }
    }
}
