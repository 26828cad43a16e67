use std::time::Duration;

use crate::models::{MediaItem, MediaKind, MAX_DISPLAY_SECONDS};

/// How the current item leaves the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// Single-shot timer.
    After(Duration),
    /// Wait for the video's end of stream.
    OnVideoEnd,
}

/// Owns the ordered playlist and the index of the item on screen.
#[derive(Debug, Default)]
pub struct RotationDriver {
    items: Vec<MediaItem>,
    index: Option<usize>,
}

impl RotationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new list. The first list starts at index 0; later lists
    /// keep the index, clamped to the last item if the list shrank.
    pub fn replace(&mut self, items: Vec<MediaItem>) {
        let mut items: Vec<MediaItem> = items.into_iter().filter(MediaItem::is_playable).collect();
        items.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.id.cmp(&b.id))
        });

        self.index = match (items.len(), self.index) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(index)) => Some(index.min(len - 1)),
        };
        self.items = items;
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.index.and_then(|index| self.items.get(index))
    }

    /// Moves to the next item, wrapping to 0. No-op on an empty list.
    pub fn advance(&mut self) -> Option<&MediaItem> {
        let len = self.items.len();
        if len == 0 {
            self.index = None;
            return None;
        }
        self.index = Some(self.index.map_or(0, |index| (index + 1) % len));
        self.current()
    }

    pub fn policy_for(item: &MediaItem, default_display: Duration) -> AdvancePolicy {
        match item.kind {
            MediaKind::Video => AdvancePolicy::OnVideoEnd,
            MediaKind::Image | MediaKind::EmbeddedVideo => match item.display_seconds {
                Some(secs) if secs > 0 => {
                    AdvancePolicy::After(Duration::from_secs(secs.min(MAX_DISPLAY_SECONDS)))
                }
                _ => AdvancePolicy::After(default_display),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, kind: MediaKind, order_index: i64) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            kind,
            source: format!("https://cdn.example.com/{id}"),
            display_seconds: Some(5),
            order_index,
            active: true,
        }
    }

    #[test]
    fn test_sorted_by_order_index_then_id() {
        let mut driver = RotationDriver::new();
        driver.replace(vec![
            item("c", MediaKind::Image, 2),
            item("b", MediaKind::Image, 1),
            item("a", MediaKind::Video, 1),
        ]);

        let ids: Vec<&str> = driver.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(driver.index(), Some(0));
    }

    #[test]
    fn test_inactive_and_sourceless_items_are_dropped() {
        let mut inactive = item("inactive", MediaKind::Image, 0);
        inactive.active = false;
        let mut blank = item("blank", MediaKind::Image, 1);
        blank.source = " ".into();

        let mut driver = RotationDriver::new();
        driver.replace(vec![inactive, blank]);
        assert!(driver.is_empty());
        assert!(driver.current().is_none());
    }

    #[test]
    fn test_advance_wraps_modulo_length() {
        let mut driver = RotationDriver::new();
        driver.replace(vec![
            item("a", MediaKind::Image, 0),
            item("b", MediaKind::Image, 1),
            item("c", MediaKind::Image, 2),
        ]);

        assert_eq!(driver.advance().map(|i| i.id.as_str()), Some("b"));
        assert_eq!(driver.advance().map(|i| i.id.as_str()), Some("c"));
        assert_eq!(driver.advance().map(|i| i.id.as_str()), Some("a"));
        assert_eq!(driver.index(), Some(0));
    }

    #[test]
    fn test_empty_list_never_advances() {
        let mut driver = RotationDriver::new();
        assert!(driver.advance().is_none());
        driver.replace(Vec::new());
        assert!(driver.advance().is_none());
        assert_eq!(driver.index(), None);
    }

    #[test]
    fn test_shrinking_list_clamps_index() {
        let mut driver = RotationDriver::new();
        driver.replace(vec![
            item("a", MediaKind::Image, 0),
            item("b", MediaKind::Image, 1),
            item("c", MediaKind::Image, 2),
        ]);
        driver.advance();
        driver.advance();
        assert_eq!(driver.index(), Some(2));

        driver.replace(vec![item("a", MediaKind::Image, 0), item("b", MediaKind::Image, 1)]);
        assert_eq!(driver.index(), Some(1));

        driver.replace(Vec::new());
        assert_eq!(driver.index(), None);

        driver.replace(vec![item("z", MediaKind::Image, 0)]);
        assert_eq!(driver.index(), Some(0));
    }

    #[test]
    fn test_policy_by_kind() {
        let default = Duration::from_secs(10);
        let mut image = item("img", MediaKind::Image, 0);
        assert_eq!(
            RotationDriver::policy_for(&image, default),
            AdvancePolicy::After(Duration::from_secs(5))
        );

        image.display_seconds = None;
        assert_eq!(RotationDriver::policy_for(&image, default), AdvancePolicy::After(default));
        image.display_seconds = Some(0);
        assert_eq!(RotationDriver::policy_for(&image, default), AdvancePolicy::After(default));

        let embed = item("yt", MediaKind::EmbeddedVideo, 0);
        assert_eq!(
            RotationDriver::policy_for(&embed, default),
            AdvancePolicy::After(Duration::from_secs(5))
        );

        let video = item("clip", MediaKind::Video, 0);
        assert_eq!(RotationDriver::policy_for(&video, default), AdvancePolicy::OnVideoEnd);
    }
}
