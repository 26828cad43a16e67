use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::models::{MediaItem, PauseDescriptor};
use crate::settings::PlaybackSettings;

use super::{Orchestrator, PlaybackEvent, PlaybackObserver, PlaybackSnapshot, PlayerEvent, VideoSurface};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

enum EngineCommand {
    LoadPlaylist {
        items: Vec<MediaItem>,
        pauses: Vec<PauseDescriptor>,
    },
    Player(PlayerEvent),
    UpdateSettings(PlaybackSettings),
}

/// Handle to the task that owns the orchestrator. All playback state is
/// mutated on that one task; this handle only queues commands and reads the
/// latest published snapshot.
#[derive(Clone)]
pub struct PlaybackController {
    commands: mpsc::UnboundedSender<EngineCommand>,
    snapshot: Arc<Mutex<PlaybackSnapshot>>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel_token: CancellationToken,
}

impl PlaybackController {
    /// Starts the engine task. Must be called from within a tokio runtime.
    pub fn spawn<S, O>(orchestrator: Orchestrator<S>, observer: O) -> Self
    where
        S: VideoSurface + 'static,
        O: PlaybackObserver,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let snapshot = Arc::new(Mutex::new(orchestrator.snapshot()));
        let cancel_token = CancellationToken::new();

        let handle = tokio::spawn(run_engine(
            orchestrator,
            observer,
            command_rx,
            snapshot.clone(),
            cancel_token.clone(),
        ));

        Self {
            commands: command_tx,
            snapshot,
            worker: Arc::new(Mutex::new(Some(handle))),
            cancel_token,
        }
    }

    pub async fn get_snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.lock().await.clone()
    }

    pub fn load_playlist(&self, items: Vec<MediaItem>, pauses: Vec<PauseDescriptor>) -> Result<()> {
        self.send(EngineCommand::LoadPlaylist { items, pauses })
    }

    pub fn report_player_event(&self, event: PlayerEvent) -> Result<()> {
        self.send(EngineCommand::Player(event))
    }

    pub fn update_settings(&self, settings: PlaybackSettings) -> Result<()> {
        self.send(EngineCommand::UpdateSettings(settings))
    }

    /// Stops the engine and waits for it to release the video surface.
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel_token.cancel();
        if let Some(handle) = self.worker.lock().await.take() {
            handle.await.context("playback engine task failed to join")?;
        }
        Ok(())
    }

    fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("playback engine is not running"))
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn new_poll_interval(settings: &PlaybackSettings) -> time::Interval {
    let mut poll = time::interval(settings.poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    poll
}

async fn run_engine<S, O>(
    mut orchestrator: Orchestrator<S>,
    observer: O,
    mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    snapshot: Arc<Mutex<PlaybackSnapshot>>,
    cancel_token: CancellationToken,
) where
    S: VideoSurface,
    O: PlaybackObserver,
{
    let mut poll = new_poll_interval(orchestrator.settings());
    log_info!("playback engine started");

    loop {
        let overlay_deadline = orchestrator.next_overlay_deadline();
        let advance_deadline = orchestrator.next_advance_deadline();
        let polling = orchestrator.wants_poll();

        // One wake-up, one transition.
        let events = tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log_info!("playback engine shutting down");
                break;
            }
            command = commands.recv() => match command {
                Some(EngineCommand::LoadPlaylist { items, pauses }) => {
                    orchestrator.load_playlist(items, pauses, Instant::now())
                }
                Some(EngineCommand::Player(event)) => {
                    orchestrator.on_player_event(event, Instant::now())
                }
                Some(EngineCommand::UpdateSettings(settings)) => {
                    let previous_interval = orchestrator.settings().poll_interval();
                    orchestrator.update_settings(settings);
                    if orchestrator.settings().poll_interval() != previous_interval {
                        poll = new_poll_interval(orchestrator.settings());
                    }
                    log_info!("playback settings updated: {:?}", orchestrator.settings());
                    Vec::new()
                }
                None => {
                    log_info!("all playback handles dropped; stopping engine");
                    break;
                }
            },
            _ = sleep_until_deadline(overlay_deadline) => {
                orchestrator.on_overlay_deadline(Instant::now())
            }
            _ = sleep_until_deadline(advance_deadline) => {
                orchestrator.on_advance_deadline(Instant::now())
            }
            _ = poll.tick(), if polling => {
                orchestrator.on_poll_tick(Instant::now())
            }
        };

        for event in &events {
            log_debug!("playback event: {:?}", event);
            observer.on_event(event);
        }

        // Some transitions change state without emitting an event.
        let latest = orchestrator.snapshot();
        let mut published = snapshot.lock().await;
        if events.is_empty() && *published == latest {
            continue;
        }
        observer.on_state_changed(&latest);
        *published = latest;
    }

    orchestrator.shutdown();
    *snapshot.lock().await = orchestrator.snapshot();
}
