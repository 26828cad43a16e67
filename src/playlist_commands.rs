//! Tauri commands for editing the stored playlist.
//!
//! Every successful edit is pushed to the running engine right away.

use tauri::State;

use crate::{
    models::{MediaItem, PauseDescriptor},
    playback::commands::reload_from_store,
    AppState,
};

async fn refresh_playback(state: &State<'_, AppState>) -> Result<(), String> {
    reload_from_store(&state.db, &state.playback)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_media_items(state: State<'_, AppState>) -> Result<Vec<MediaItem>, String> {
    state
        .db
        .list_media_items()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn upsert_media_item(
    state: State<'_, AppState>,
    item: MediaItem,
) -> Result<MediaItem, String> {
    let stored = state
        .db
        .upsert_media_item(item)
        .await
        .map_err(|e| e.to_string())?;
    refresh_playback(&state).await?;
    Ok(stored)
}

#[tauri::command]
pub async fn delete_media_item(state: State<'_, AppState>, id: String) -> Result<(), String> {
    state
        .db
        .delete_media_item(id)
        .await
        .map_err(|e| e.to_string())?;
    refresh_playback(&state).await
}

#[tauri::command]
pub async fn list_pause_points(
    state: State<'_, AppState>,
    media_id: Option<String>,
) -> Result<Vec<PauseDescriptor>, String> {
    let result = match media_id {
        Some(media_id) => state.db.list_pause_points_for_media(media_id).await,
        None => state.db.list_pause_points().await,
    };
    result.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn upsert_pause_point(
    state: State<'_, AppState>,
    point: PauseDescriptor,
) -> Result<PauseDescriptor, String> {
    let stored = state
        .db
        .upsert_pause_point(point)
        .await
        .map_err(|e| e.to_string())?;
    refresh_playback(&state).await?;
    Ok(stored)
}

#[tauri::command]
pub async fn delete_pause_point(state: State<'_, AppState>, id: String) -> Result<(), String> {
    state
        .db
        .delete_pause_point(id)
        .await
        .map_err(|e| e.to_string())?;
    refresh_playback(&state).await
}
