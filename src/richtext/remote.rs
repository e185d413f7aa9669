// Remote carets
// Collaborators' carets, shown for presence only. They read the document for
// positions and never change it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::caret::{RichTextCaret, Selection};
use super::config::EditorConfig;
use super::document::Document;

/// Remote carets keyed by collaborator id
#[derive(Debug, Clone, Default)]
pub struct RemoteCarets {
    carets: HashMap<String, RichTextCaret>,
    config: EditorConfig,
}

impl RemoteCarets {
    pub fn new(config: &EditorConfig) -> Self {
        RemoteCarets {
            carets: HashMap::new(),
            config: config.clone(),
        }
    }

    /// Create or move a collaborator's caret; either way it becomes fully opaque again
    pub fn upsert(
        &mut self,
        id: &str,
        label: &str,
        color: u32,
        selection: Selection,
        now: DateTime<Utc>,
    ) -> &RichTextCaret {
        let config = &self.config;
        let caret = self
            .carets
            .entry(id.to_string())
            .and_modify(|caret| {
                if caret.label() != Some(label) || caret.color() != Some(color) {
                    *caret = RichTextCaret::remote(label, color, config, now);
                }
            })
            .or_insert_with(|| {
                debug!(id, label, "remote caret joined");
                RichTextCaret::remote(label, color, config, now)
            });
        caret.set_selection(selection, now);
        caret
    }

    pub fn remove(&mut self, id: &str) -> Option<RichTextCaret> {
        self.carets.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&RichTextCaret> {
        self.carets.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RichTextCaret)> {
        self.carets.iter().map(|(id, caret)| (id.as_str(), caret))
    }

    pub fn len(&self) -> usize {
        self.carets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carets.is_empty()
    }

    /// Drop carets that have fully faded; returns how many were dropped
    pub fn prune_faded(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.carets.len();
        self.carets.retain(|_, caret| caret.is_visible(now));
        let pruned = before - self.carets.len();
        if pruned > 0 {
            debug!(pruned, "pruned faded remote carets");
        }
        pruned
    }

    /// Re-clamp every caret after blocks were removed
    pub fn clamp_all(&mut self, doc: &Document) {
        for caret in self.carets.values_mut() {
            caret.clamp(doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::caret::CaretPosition;
    use crate::richtext::font::FixedWidthFonts;
    use chrono::TimeDelta;

    fn pos(block: usize, offset: usize) -> Selection {
        Selection::collapsed(CaretPosition::new(block, offset))
    }

    #[test]
    fn test_upsert_and_remove() {
        let t0 = Utc::now();
        let mut remotes = RemoteCarets::new(&EditorConfig::default());
        remotes.upsert("u1", "Ada", 0xff0000, pos(0, 1), t0);
        remotes.upsert("u2", "Bob", 0x00ff00, pos(0, 2), t0);
        assert_eq!(remotes.len(), 2);

        remotes.upsert("u1", "Ada", 0xff0000, pos(0, 3), t0);
        assert_eq!(remotes.len(), 2);
        let ada = remotes.get("u1").unwrap();
        assert_eq!(ada.position(), CaretPosition::new(0, 3));
        assert_eq!(ada.label(), Some("Ada"));

        assert!(remotes.remove("u2").is_some());
        assert!(remotes.get("u2").is_none());
        assert_eq!(remotes.iter().count(), 1);
    }

    #[test]
    fn test_activity_restarts_fade() {
        let t0 = Utc::now();
        let mut remotes = RemoteCarets::new(&EditorConfig::default());
        remotes.upsert("u1", "Ada", 1, pos(0, 0), t0);
        remotes.upsert("u2", "Bob", 2, pos(0, 0), t0);

        let t1 = t0 + TimeDelta::milliseconds(5500);
        remotes.upsert("u2", "Bob", 2, pos(0, 1), t1);
        assert_eq!(remotes.get("u1").unwrap().opacity(t1), 0.5);
        assert_eq!(remotes.get("u2").unwrap().opacity(t1), 1.0);

        let t2 = t0 + TimeDelta::milliseconds(6000);
        assert_eq!(remotes.prune_faded(t2), 1);
        assert!(remotes.get("u1").is_none());
        assert!(remotes.get("u2").is_some());
    }

    #[test]
    fn test_clamp_after_blocks_removed() {
        let t0 = Utc::now();
        let doc = Document::new(FixedWidthFonts::uniform(4.0, 10.0));
        let mut remotes = RemoteCarets::new(&EditorConfig::default());
        remotes.upsert("u1", "Ada", 1, pos(4, 7), t0);
        remotes.clamp_all(&doc);
        assert_eq!(remotes.get("u1").unwrap().position(), CaretPosition::new(0, 0));
    }
}
