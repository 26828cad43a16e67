mod db;
mod models;
mod playback;
mod playlist_commands;
mod settings;
mod utils;

use db::Database;
use playback::{
    commands::{
        get_playback_settings, get_playback_state, reload_from_store, reload_playlist,
        report_video_event, report_video_position, set_playback_settings,
    },
    Orchestrator, PlaybackController, PlayerMirror, TauriObserver, WebviewSurface,
};
use playlist_commands::{
    delete_media_item, delete_pause_point, list_media_items, list_pause_points,
    upsert_media_item, upsert_pause_point,
};
use settings::SettingsStore;
use tauri::{Manager, RunEvent};

pub(crate) struct AppState {
    pub(crate) db: Database,
    pub(crate) playback: PlaybackController,
    pub(crate) settings: SettingsStore,
    pub(crate) mirror: PlayerMirror,
}

fn debug_logging_requested() -> bool {
    std::env::var("MEDIABOARD_DEBUG")
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // RUST_LOG still overrides per module.
    let level = if debug_logging_requested() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    log::info!("mediaboard starting up...");

    let app = tauri::Builder::default()
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let database = Database::new(app_data_dir.join("mediaboard.sqlite3"))?;
                let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;

                let mirror = PlayerMirror::new();
                let orchestrator = Orchestrator::new(
                    WebviewSurface::new(app.handle().clone(), mirror.clone()),
                    settings_store.playback(),
                );
                let observer = TauriObserver::new(app.handle().clone());

                // The engine task lives on the Tauri runtime.
                let playback = {
                    let db = database.clone();
                    tauri::async_runtime::block_on(async move {
                        let controller = PlaybackController::spawn(orchestrator, observer);
                        let count = reload_from_store(&db, &controller).await?;
                        log::info!("Loaded {count} media items from the playlist store");
                        Ok::<_, anyhow::Error>(controller)
                    })?
                };

                app.manage(AppState {
                    db: database,
                    playback,
                    settings: settings_store,
                    mirror,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_playback_state,
            reload_playlist,
            report_video_position,
            report_video_event,
            list_media_items,
            upsert_media_item,
            delete_media_item,
            list_pause_points,
            upsert_pause_point,
            delete_pause_point,
            get_playback_settings,
            set_playback_settings,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| {
        if let RunEvent::Exit = event {
            let Some(state) = app_handle.try_state::<AppState>() else {
                return;
            };
            let playback = state.playback.clone();
            if let Err(err) = tauri::async_runtime::block_on(playback.shutdown()) {
                log::error!("Failed to stop playback engine: {err}");
            }
        }
    });
}
