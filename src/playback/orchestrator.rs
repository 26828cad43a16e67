use std::collections::HashMap;

use tokio::time::Instant;

use crate::models::{MediaItem, MediaKind, PauseDescriptor};
use crate::settings::PlaybackSettings;

use super::{
    controller::{PauseController, PlayingOutcome, ResumeOutcome},
    derive_active_pauses,
    events::{
        AdvanceReason, OverlayState, PlaybackEvent, PlaybackSnapshot, PlayerEvent,
        PlayerEventKind,
    },
    rotation::{AdvancePolicy, RotationDriver},
    session::deadline_after,
    VideoSurface,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Composes the rotation driver and the pause controller around one video
/// surface. Every deadline lives here as an owned `Option<Instant>`, so
/// replacing the current item drops its timers with it.
///
/// Time is always passed in; nothing here reads a clock.
pub struct Orchestrator<S> {
    settings: PlaybackSettings,
    rotation: RotationDriver,
    pauses_by_media: HashMap<String, Vec<PauseDescriptor>>,
    controller: PauseController,
    surface: S,
    advance_at: Option<Instant>,
    advance_reason: AdvanceReason,
}

impl<S: VideoSurface> Orchestrator<S> {
    pub fn new(surface: S, settings: PlaybackSettings) -> Self {
        let settings = settings.normalized();
        Self {
            controller: PauseController::new(settings.trigger_window()),
            settings,
            rotation: RotationDriver::new(),
            pauses_by_media: HashMap::new(),
            surface,
            advance_at: None,
            advance_reason: AdvanceReason::TimerExpired,
        }
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// New timings apply to timers armed from now on.
    pub fn update_settings(&mut self, settings: PlaybackSettings) {
        self.settings = settings.normalized();
        self.controller.set_trigger_window(self.settings.trigger_window());
    }

    /// Replaces the playlist. The item on screen keeps running when neither
    /// it nor its pause points changed; otherwise the current slot is
    /// activated from scratch.
    pub fn load_playlist(
        &mut self,
        items: Vec<MediaItem>,
        pauses: Vec<PauseDescriptor>,
        now: Instant,
    ) -> Vec<PlaybackEvent> {
        let previous_item = self.rotation.current().cloned();
        let previous_pauses = previous_item
            .as_ref()
            .and_then(|item| self.pauses_by_media.get(&item.id).cloned());

        let mut pauses_by_media: HashMap<String, Vec<PauseDescriptor>> = HashMap::new();
        for pause in pauses {
            pauses_by_media
                .entry(pause.media_id.clone())
                .or_default()
                .push(pause);
        }
        for list in pauses_by_media.values_mut() {
            list.sort_by_key(|pause| pause.order_index);
        }
        self.pauses_by_media = pauses_by_media;
        self.rotation.replace(items);

        log_info!("playlist loaded with {} playable item(s)", self.rotation.len());

        let current_item = self.rotation.current().cloned();
        let unchanged = match (&previous_item, &current_item) {
            (Some(before), Some(after)) => {
                before == after
                    && previous_pauses.as_ref() == self.pauses_by_media.get(&after.id)
                    && self.is_mounted(after)
            }
            _ => false,
        };

        if unchanged {
            log_debug!("current item unchanged by reload; keeping its session");
            return Vec::new();
        }

        let mut events = Vec::new();
        self.activate_current(now, &mut events);
        events
    }

    /// Fixed-interval sample of the play head.
    pub fn on_poll_tick(&mut self, now: Instant) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if let Some(fired) = self.controller.poll(&mut self.surface, now) {
            if let Some(session_id) = self.controller.session_id() {
                events.push(PlaybackEvent::OverlayShown {
                    session_id: session_id.to_string(),
                    pause_id: fired.pause_id,
                    overlay_image: fired.overlay_image,
                    display_ms: u64::try_from(fired.display.as_millis()).unwrap_or(u64::MAX),
                });
            }
        }
        events
    }

    /// The overlay dwell elapsed.
    pub fn on_overlay_deadline(&mut self, now: Instant) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let Some(outcome) = self.controller.finish_dwell(&mut self.surface, now) else {
            return events;
        };
        let session_id = self.controller.session_id().unwrap_or_default().to_string();

        match outcome {
            ResumeOutcome::Resumed { pause_id, position } => {
                events.push(PlaybackEvent::OverlayHidden {
                    session_id,
                    pause_id,
                    resumed_at_seconds: position,
                });
            }
            ResumeOutcome::Failed { pause_id, reason } => {
                events.push(PlaybackEvent::ResumeFailed {
                    session_id,
                    pause_id: Some(pause_id),
                    reason,
                });
                self.arm_stall_fallback(now);
            }
        }
        events
    }

    /// The per-item advance timer (or the stall fallback) elapsed.
    pub fn on_advance_deadline(&mut self, now: Instant) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        match self.advance_at {
            Some(deadline) if deadline <= now => {
                let reason = self.advance_reason;
                self.advance(reason, now, &mut events);
            }
            _ => {}
        }
        events
    }

    pub fn on_player_event(&mut self, event: PlayerEvent, now: Instant) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if self.controller.session_id() != Some(event.session_id.as_str()) {
            log_debug!(
                "dropping {:?} for session {} (not mounted)",
                event.kind,
                event.session_id
            );
            return events;
        }

        match event.kind {
            PlayerEventKind::Playing => {
                if self.controller.on_playing(&mut self.surface) == PlayingOutcome::Recovered {
                    self.cancel_stall_fallback();
                }
            }
            PlayerEventKind::Ended => {
                if self.controller.on_ended() {
                    self.advance(AdvanceReason::VideoEnded, now, &mut events);
                }
            }
            PlayerEventKind::PlayRejected { reason } => {
                if self.controller.on_play_rejected(&reason) {
                    events.push(PlaybackEvent::ResumeFailed {
                        session_id: event.session_id,
                        pause_id: None,
                        reason,
                    });
                    self.arm_stall_fallback(now);
                }
            }
        }
        events
    }

    pub fn next_overlay_deadline(&self) -> Option<Instant> {
        self.controller.session().and_then(|s| s.resume_at())
    }

    pub fn next_advance_deadline(&self) -> Option<Instant> {
        self.advance_at
    }

    /// Polling only matters while a video is actually playing.
    pub fn wants_poll(&self) -> bool {
        self.controller
            .session()
            .map(|s| s.status() == super::SessionStatus::Playing)
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let session = self.controller.session();
        let suspension = session.and_then(|s| s.suspension());
        PlaybackSnapshot {
            current: self.rotation.current().cloned(),
            index: self.rotation.index(),
            item_count: self.rotation.len(),
            session_id: session.map(|s| s.id().to_string()),
            session_status: session.map(|s| s.status()),
            overlay: suspension
                .filter(|s| s.overlay_visible())
                .map(|s| OverlayState {
                    pause_id: s.pause_id.clone(),
                    image: s.overlay_image.clone(),
                }),
            suspended: session.map(|s| s.is_suspended()).unwrap_or(false),
            resume_position_seconds: session.and_then(|s| s.resume_position()),
        }
    }

    /// Releases the surface; used when the engine stops.
    pub fn shutdown(&mut self) {
        self.advance_at = None;
        self.controller.unmount(&mut self.surface);
    }

    fn is_mounted(&self, item: &MediaItem) -> bool {
        match item.kind {
            MediaKind::Video => self
                .controller
                .session()
                .map(|s| s.media_id() == item.id)
                .unwrap_or(false),
            MediaKind::Image | MediaKind::EmbeddedVideo => self.advance_at.is_some(),
        }
    }

    fn advance(&mut self, reason: AdvanceReason, now: Instant, events: &mut Vec<PlaybackEvent>) {
        let Some(from_index) = self.rotation.index() else {
            self.advance_at = None;
            return;
        };

        events.push(PlaybackEvent::AdvanceRequested { from_index, reason });
        self.rotation.advance();
        self.activate_current(now, events);
    }

    /// Tears down whatever the previous slot armed and starts the current one.
    fn activate_current(&mut self, now: Instant, events: &mut Vec<PlaybackEvent>) {
        self.advance_at = None;
        self.advance_reason = AdvanceReason::TimerExpired;
        self.controller.unmount(&mut self.surface);

        let (Some(index), Some(item)) = (self.rotation.index(), self.rotation.current().cloned())
        else {
            log_info!("playlist is empty; nothing to show");
            events.push(PlaybackEvent::PlaylistEmpty);
            return;
        };

        let session_id = match RotationDriver::policy_for(&item, self.settings.default_display()) {
            AdvancePolicy::After(dwell) => {
                self.advance_at = Some(deadline_after(now, dwell));
                log_info!("showing {} {} for {:?}", item.kind.as_str(), item.id, dwell);
                None
            }
            AdvancePolicy::OnVideoEnd => {
                let descriptors = self
                    .pauses_by_media
                    .get(&item.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let pauses = derive_active_pauses(descriptors);
                Some(self.controller.mount(&item.id, pauses, &mut self.surface))
            }
        };

        events.push(PlaybackEvent::ItemChanged {
            index,
            item,
            session_id,
        });
    }

    fn arm_stall_fallback(&mut self, now: Instant) {
        if self.advance_at.is_some() {
            return;
        }
        let wait = self.settings.stall_advance();
        log_warn!("video is stuck; advancing in {:?} unless it recovers", wait);
        self.advance_at = Some(deadline_after(now, wait));
        self.advance_reason = AdvanceReason::Stalled;
    }

    fn cancel_stall_fallback(&mut self) {
        if self.advance_reason == AdvanceReason::Stalled {
            self.advance_at = None;
            self.advance_reason = AdvanceReason::TimerExpired;
        }
    }
}
