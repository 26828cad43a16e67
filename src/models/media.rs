use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Image,
    Video,
    /// Externally hosted player (iframe); its playback cannot be observed or controlled.
    EmbeddedVideo,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::EmbeddedVideo => "embeddedVideo",
        }
    }
}

/// Longest dwell the player honours for a single item or overlay (one day).
pub const MAX_DISPLAY_SECONDS: u64 = 24 * 60 * 60;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub kind: MediaKind,
    pub source: String,
    /// Ignored for `MediaKind::Video`, which advances on natural end.
    pub display_seconds: Option<u64>,
    pub order_index: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl MediaItem {
    pub fn is_playable(&self) -> bool {
        self.active && !self.source.trim().is_empty()
    }
}
