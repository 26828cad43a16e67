use serde::{Deserialize, Serialize};

/// Operator-configured pause point on a video item, as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PauseDescriptor {
    pub id: String,
    pub media_id: String,
    pub trigger_second: f64,
    pub display_seconds: f64,
    pub overlay_image: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub order_index: i64,
}
