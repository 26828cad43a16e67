use std::convert::TryFrom;

use anyhow::{anyhow, Result};

use crate::models::MediaKind;

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn parse_kind(value: &str) -> Result<MediaKind> {
    match value {
        "image" => Ok(MediaKind::Image),
        "video" => Ok(MediaKind::Video),
        "embeddedVideo" => Ok(MediaKind::EmbeddedVideo),
        other => Err(anyhow!("unknown media kind {other}")),
    }
}

/// Keeps row mapping inside `query_map` while still using the anyhow helpers.
pub fn conversion_error(err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        err.to_string(),
    )))
}
