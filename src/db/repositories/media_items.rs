use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{conversion_error, parse_kind, to_i64, to_u64},
};
use crate::models::{MediaItem, MAX_DISPLAY_SECONDS};

fn row_to_media_item(row: &Row) -> Result<MediaItem, rusqlite::Error> {
    let kind: String = row.get("kind")?;
    let display_seconds: Option<i64> = row.get("display_seconds")?;

    Ok(MediaItem {
        id: row.get("id")?,
        kind: parse_kind(&kind).map_err(conversion_error)?,
        source: row.get("source")?,
        display_seconds: display_seconds
            .map(|secs| to_u64(secs, "display_seconds"))
            .transpose()
            .map_err(conversion_error)?,
        order_index: row.get("order_index")?,
        active: row.get("active")?,
    })
}

impl Database {
    /// All items in rotation order, inactive ones included.
    pub async fn list_media_items(&self) -> Result<Vec<MediaItem>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, source, display_seconds, order_index, active
                 FROM media_items
                 ORDER BY order_index ASC, id ASC",
            )?;

            let items = stmt
                .query_map([], row_to_media_item)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(items)
        })
        .await
    }

    /// Insert or update by id. A blank id gets a fresh one.
    pub async fn upsert_media_item(&self, mut item: MediaItem) -> Result<MediaItem> {
        item.source = item.source.trim().to_string();
        if item.source.is_empty() {
            bail!("media source is required");
        }
        if item.display_seconds.is_some_and(|secs| secs > MAX_DISPLAY_SECONDS) {
            bail!("display_seconds may not exceed {MAX_DISPLAY_SECONDS}");
        }
        if item.id.trim().is_empty() {
            item.id = format!("mi_{}", uuid::Uuid::new_v4());
        }

        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO media_items (id, kind, source, display_seconds, order_index, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     kind = excluded.kind,
                     source = excluded.source,
                     display_seconds = excluded.display_seconds,
                     order_index = excluded.order_index,
                     active = excluded.active,
                     updated_at = excluded.updated_at",
                params![
                    item.id,
                    item.kind.as_str(),
                    item.source,
                    item.display_seconds.map(to_i64).transpose()?,
                    item.order_index,
                    item.active,
                    now,
                ],
            )?;

            let stored = conn.query_row(
                "SELECT id, kind, source, display_seconds, order_index, active
                 FROM media_items
                 WHERE id = ?1",
                params![item.id],
                row_to_media_item,
            )?;

            Ok(stored)
        })
        .await
    }

    /// Removes the item and, through the foreign key, its pause points.
    pub async fn delete_media_item(&self, id: String) -> Result<()> {
        self.execute(move |conn| {
            conn.execute("DELETE FROM media_items WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }
}
