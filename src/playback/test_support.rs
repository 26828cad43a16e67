use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};

use super::{PlaybackEvent, PlaybackObserver, PlaybackSnapshot, VideoSurface};

#[derive(Debug, Default)]
struct FakeState {
    attached: Option<String>,
    position: Option<f64>,
    playing: bool,
    play_calls: usize,
    pause_calls: usize,
    seeks: Vec<f64>,
    fail_play: bool,
}

/// In-memory video element. Clones share state so a test can move the play
/// head while the orchestrator owns the surface.
#[derive(Clone, Default)]
pub struct FakeSurface {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_position(&self, seconds: f64) {
        self.lock().position = Some(seconds);
    }

    pub fn fail_play(&self, fail: bool) {
        self.lock().fail_play = fail;
    }

    pub fn attached(&self) -> Option<String> {
        self.lock().attached.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn play_calls(&self) -> usize {
        self.lock().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.lock().pause_calls
    }

    pub fn last_seek(&self) -> Option<f64> {
        self.lock().seeks.last().copied()
    }
}

impl VideoSurface for FakeSurface {
    fn attach(&mut self, session_id: &str) {
        let mut state = self.lock();
        state.attached = Some(session_id.to_string());
        state.position = None;
        state.playing = true;
    }

    fn detach(&mut self) {
        let mut state = self.lock();
        state.attached = None;
        state.position = None;
        state.playing = false;
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.play_calls += 1;
        if state.fail_play {
            bail!("play() was rejected");
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.pause_calls += 1;
        state.playing = false;
        Ok(())
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        let mut state = self.lock();
        state.seeks.push(seconds);
        state.position = Some(seconds);
        Ok(())
    }

    fn position(&self) -> Option<f64> {
        self.lock().position
    }
}

/// Observer that keeps everything it is told.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
    snapshots: Arc<Mutex<Vec<PlaybackSnapshot>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_snapshot(&self) -> Option<PlaybackSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }
}

impl PlaybackObserver for RecordingObserver {
    fn on_event(&self, event: &PlaybackEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn on_state_changed(&self, snapshot: &PlaybackSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}
