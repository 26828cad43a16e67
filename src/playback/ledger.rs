use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use crate::models::{PauseDescriptor, MAX_DISPLAY_SECONDS};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// A pause point that is eligible to fire: enabled, well formed, with an overlay.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivePause {
    pub id: String,
    pub trigger_second: f64,
    pub display: Duration,
    pub overlay_image: String,
}

impl ActivePause {
    /// Whether `position` falls in `[trigger_second, trigger_second + window)`.
    pub fn window_contains(&self, position: f64, window: f64) -> bool {
        position >= self.trigger_second && position < self.trigger_second + window
    }
}

/// Filters, sorts and deduplicates the pause descriptors of one media item.
///
/// Output is ascending by `trigger_second`. Of several descriptors sharing a
/// trigger second only the first inserted survives.
pub fn derive_active_pauses(descriptors: &[PauseDescriptor]) -> Vec<ActivePause> {
    let mut eligible: Vec<ActivePause> = descriptors.iter().filter_map(to_active).collect();

    // Stable: ties keep insertion order.
    eligible.sort_by(|a, b| a.trigger_second.total_cmp(&b.trigger_second));

    let mut seen_ids = HashSet::new();
    let mut pauses: Vec<ActivePause> = Vec::with_capacity(eligible.len());
    for pause in eligible {
        if !seen_ids.insert(pause.id.clone()) {
            log_warn!("pause descriptor {} listed twice, keeping the first", pause.id);
            continue;
        }
        if let Some(previous) = pauses.last() {
            if previous.trigger_second == pause.trigger_second {
                log_warn!(
                    "pause {} shares trigger second {} with {}; skipping it",
                    pause.id,
                    pause.trigger_second,
                    previous.id
                );
                continue;
            }
        }
        pauses.push(pause);
    }

    pauses
}

fn to_active(descriptor: &PauseDescriptor) -> Option<ActivePause> {
    if !descriptor.active {
        return None;
    }

    let overlay_image = match descriptor.overlay_image.as_deref().map(str::trim) {
        Some(image) if !image.is_empty() => image.to_string(),
        _ => {
            log_debug!("pause {} has no overlay image; treating as inactive", descriptor.id);
            return None;
        }
    };

    if !descriptor.trigger_second.is_finite() || descriptor.trigger_second < 0.0 {
        log_warn!(
            "pause {} has invalid trigger second {}; ignoring",
            descriptor.id,
            descriptor.trigger_second
        );
        return None;
    }

    let display_seconds = descriptor.display_seconds;
    let display = match Duration::try_from_secs_f64(display_seconds) {
        Ok(display) if !display.is_zero() => display.min(Duration::from_secs(MAX_DISPLAY_SECONDS)),
        // Finite but past what `Duration` holds.
        Err(_) if display_seconds.is_finite() && display_seconds > 0.0 => {
            Duration::from_secs(MAX_DISPLAY_SECONDS)
        }
        _ => {
            log_warn!(
                "pause {} has invalid display duration {}; ignoring",
                descriptor.id,
                descriptor.display_seconds
            );
            return None;
        }
    };

    Some(ActivePause {
        id: descriptor.id.clone(),
        trigger_second: descriptor.trigger_second,
        display,
        overlay_image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, trigger: f64, overlay: Option<&str>, active: bool) -> PauseDescriptor {
        PauseDescriptor {
            id: id.to_string(),
            media_id: "video-1".to_string(),
            trigger_second: trigger,
            display_seconds: 2.0,
            overlay_image: overlay.map(str::to_string),
            active,
            order_index: 0,
        }
    }

    #[test]
    fn test_output_is_sorted_and_only_active_with_overlay() {
        let input = vec![
            descriptor("late", 30.0, Some("late.png"), true),
            descriptor("disabled", 5.0, Some("off.png"), false),
            descriptor("no-overlay", 7.0, None, true),
            descriptor("blank-overlay", 8.0, Some("   "), true),
            descriptor("early", 2.5, Some("early.png"), true),
            descriptor("middle", 12.0, Some("mid.png"), true),
        ];

        let pauses = derive_active_pauses(&input);
        let ids: Vec<&str> = pauses.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
        assert!(pauses
            .windows(2)
            .all(|pair| pair[0].trigger_second <= pair[1].trigger_second));
    }

    #[test]
    fn test_malformed_descriptors_are_excluded() {
        let mut negative = descriptor("negative", -1.0, Some("a.png"), true);
        negative.display_seconds = 3.0;
        let mut zero_dwell = descriptor("zero-dwell", 4.0, Some("b.png"), true);
        zero_dwell.display_seconds = 0.0;
        let mut nan_trigger = descriptor("nan", f64::NAN, Some("c.png"), true);
        nan_trigger.display_seconds = 1.0;
        let ok = descriptor("ok", 0.0, Some("d.png"), true);

        let pauses = derive_active_pauses(&[negative, zero_dwell, nan_trigger, ok]);
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses[0].id, "ok");
        assert_eq!(pauses[0].display, Duration::from_secs(2));
    }

    #[test]
    fn test_equal_trigger_keeps_first_inserted() {
        let input = vec![
            descriptor("first", 3.0, Some("first.png"), true),
            descriptor("other", 1.0, Some("other.png"), true),
            descriptor("second", 3.0, Some("second.png"), true),
        ];

        let pauses = derive_active_pauses(&input);
        let ids: Vec<&str> = pauses.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["other", "first"]);
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let input = vec![
            descriptor("dup", 3.0, Some("a.png"), true),
            descriptor("dup", 9.0, Some("b.png"), true),
        ];

        let pauses = derive_active_pauses(&input);
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses[0].trigger_second, 3.0);
    }

    #[test]
    fn test_oversized_display_is_capped() {
        let mut huge = descriptor("huge", 1.0, Some("a.png"), true);
        huge.display_seconds = 1e19;
        let mut beyond_duration = descriptor("beyond", 2.0, Some("b.png"), true);
        beyond_duration.display_seconds = 1e30;
        let mut infinite = descriptor("infinite", 3.0, Some("c.png"), true);
        infinite.display_seconds = f64::INFINITY;

        let pauses = derive_active_pauses(&[huge, beyond_duration, infinite]);
        let ids: Vec<&str> = pauses.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["huge", "beyond"]);
        assert!(pauses
            .iter()
            .all(|p| p.display == Duration::from_secs(MAX_DISPLAY_SECONDS)));
    }

    #[test]
    fn test_empty_input() {
        assert!(derive_active_pauses(&[]).is_empty());
    }

    #[test]
    fn test_window_contains_is_half_open() {
        let pause = ActivePause {
            id: "p".into(),
            trigger_second: 3.0,
            display: Duration::from_secs(2),
            overlay_image: "o.png".into(),
        };
        assert!(!pause.window_contains(2.99, 0.5));
        assert!(pause.window_contains(3.0, 0.5));
        assert!(pause.window_contains(3.49, 0.5));
        assert!(!pause.window_contains(3.5, 0.5));
    }
}
