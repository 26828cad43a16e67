use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::connection::Database;
use crate::models::{PauseDescriptor, MAX_DISPLAY_SECONDS};

const SELECT_COLUMNS: &str =
    "SELECT id, media_id, trigger_second, display_seconds, overlay_image, active, order_index
     FROM pause_points";

fn row_to_pause_point(row: &Row) -> Result<PauseDescriptor, rusqlite::Error> {
    Ok(PauseDescriptor {
        id: row.get("id")?,
        media_id: row.get("media_id")?,
        trigger_second: row.get("trigger_second")?,
        display_seconds: row.get("display_seconds")?,
        overlay_image: row.get("overlay_image")?,
        active: row.get("active")?,
        order_index: row.get("order_index")?,
    })
}

fn validate(point: &PauseDescriptor) -> Result<()> {
    if point.media_id.trim().is_empty() {
        bail!("pause point must belong to a media item");
    }
    if !point.trigger_second.is_finite() || point.trigger_second < 0.0 {
        bail!("trigger_second must be a non-negative number");
    }
    if !point.display_seconds.is_finite() || point.display_seconds <= 0.0 {
        bail!("display_seconds must be greater than zero");
    }
    if point.display_seconds > MAX_DISPLAY_SECONDS as f64 {
        bail!("display_seconds may not exceed {MAX_DISPLAY_SECONDS}");
    }
    Ok(())
}

impl Database {
    /// Every pause point, grouped by media item. Within an item, rows keep
    /// their insertion order behind `order_index`.
    pub async fn list_pause_points(&self) -> Result<Vec<PauseDescriptor>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY media_id ASC, order_index ASC, rowid ASC"
            ))?;

            let points = stmt
                .query_map([], row_to_pause_point)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(points)
        })
        .await
    }

    pub async fn list_pause_points_for_media(&self, media_id: String) -> Result<Vec<PauseDescriptor>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE media_id = ?1 ORDER BY order_index ASC, rowid ASC"
            ))?;

            let points = stmt
                .query_map(params![media_id], row_to_pause_point)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(points)
        })
        .await
    }

    pub async fn upsert_pause_point(&self, mut point: PauseDescriptor) -> Result<PauseDescriptor> {
        validate(&point)?;
        point.overlay_image = point
            .overlay_image
            .map(|image| image.trim().to_string())
            .filter(|image| !image.is_empty());
        if point.id.trim().is_empty() {
            point.id = format!("pp_{}", uuid::Uuid::new_v4());
        }

        self.execute(move |conn| {
            let media_exists = conn
                .query_row(
                    "SELECT 1 FROM media_items WHERE id = ?1",
                    params![point.media_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !media_exists {
                bail!("media item {} does not exist", point.media_id);
            }

            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO pause_points (id, media_id, trigger_second, display_seconds, overlay_image, active, order_index, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                     media_id = excluded.media_id,
                     trigger_second = excluded.trigger_second,
                     display_seconds = excluded.display_seconds,
                     overlay_image = excluded.overlay_image,
                     active = excluded.active,
                     order_index = excluded.order_index,
                     updated_at = excluded.updated_at",
                params![
                    point.id,
                    point.media_id,
                    point.trigger_second,
                    point.display_seconds,
                    point.overlay_image,
                    point.active,
                    point.order_index,
                    now,
                ],
            )?;

            let stored = conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![point.id],
                row_to_pause_point,
            )?;

            Ok(stored)
        })
        .await
    }

    pub async fn delete_pause_point(&self, id: String) -> Result<()> {
        self.execute(move |conn| {
            conn.execute("DELETE FROM pause_points WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }
}
