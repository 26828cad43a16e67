use anyhow::Result;
use tauri::State;

use crate::{
    db::Database,
    settings::PlaybackSettings,
    AppState,
};

use super::{PlaybackController, PlaybackSnapshot, PlayerEvent, PlayerEventKind};

fn controller_from_state(state: &State<'_, AppState>) -> PlaybackController {
    state.playback.clone()
}

/// Pushes the stored playlist into the running engine. Returns the number of
/// items read, playable or not.
pub(crate) async fn reload_from_store(db: &Database, controller: &PlaybackController) -> Result<usize> {
    let items = db.list_media_items().await?;
    let pauses = db.list_pause_points().await?;
    let count = items.len();
    controller.load_playlist(items, pauses)?;
    Ok(count)
}

#[tauri::command]
pub async fn get_playback_state(state: State<'_, AppState>) -> Result<PlaybackSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn reload_playlist(state: State<'_, AppState>) -> Result<usize, String> {
    let controller = controller_from_state(&state);
    reload_from_store(&state.db, &controller)
        .await
        .map_err(|e| e.to_string())
}

/// Called by the webview on every `timeupdate`. Stale sessions are ignored.
#[tauri::command]
pub fn report_video_position(
    state: State<'_, AppState>,
    session_id: String,
    seconds: f64,
) -> Result<bool, String> {
    Ok(state.mirror.record_position(&session_id, seconds))
}

#[tauri::command]
pub fn report_video_event(
    state: State<'_, AppState>,
    session_id: String,
    kind: PlayerEventKind,
) -> Result<(), String> {
    state
        .playback
        .report_player_event(PlayerEvent { session_id, kind })
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_playback_settings(state: State<'_, AppState>) -> Result<PlaybackSettings, String> {
    Ok(state.settings.playback())
}

#[tauri::command]
pub fn set_playback_settings(
    state: State<'_, AppState>,
    settings: PlaybackSettings,
) -> Result<PlaybackSettings, String> {
    let saved = state
        .settings
        .update_playback(settings)
        .map_err(|e| e.to_string())?;
    state
        .playback
        .update_settings(saved)
        .map_err(|e| e.to_string())?;
    Ok(saved)
}
