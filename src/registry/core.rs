use std::collections::{BTreeSet, HashMap};

use blake3::Hash;

use crate::error::{Result, WidgetError};
use crate::geometry::Rect;

pub type ZoneId = String;

/// Text painted into a zone, one line per row.
pub type ZoneContent = String;

#[derive(Debug, Clone)]
pub struct ZoneState {
    pub rect: Rect,
    pub content: ZoneContent,
    hash: Option<Hash>,
}

impl ZoneState {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            content: ZoneContent::new(),
            hash: None,
        }
    }

    /// Store `content` if it differs from what is held. Returns whether it did.
    fn replace_content(&mut self, content: ZoneContent) -> bool {
        let new_hash = blake3::hash(content.as_bytes());
        if self.hash == Some(new_hash) {
            return false;
        }
        self.content = content;
        self.hash = Some(new_hash);
        true
    }
}

/// Tracks zones by id. Dirty ids are kept ordered so repaint order is stable.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    entries: HashMap<ZoneId, ZoneState>,
    dirty: BTreeSet<ZoneId>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt freshly solved rects: moved or new zones become dirty, vanished
    /// zones are dropped.
    pub fn sync_layout(&mut self, solved: &HashMap<ZoneId, Rect>) {
        self.entries.retain(|id, _| solved.contains_key(id));
        self.dirty.retain(|id| solved.contains_key(id));

        for (id, rect) in solved {
            let state = self
                .entries
                .entry(id.clone())
                .or_insert_with(|| ZoneState::new(*rect));
            if state.rect != *rect || state.hash.is_none() {
                state.rect = *rect;
                self.dirty.insert(id.clone());
            }
        }
    }

    pub fn apply_content(&mut self, zone_id: &str, content: ZoneContent) -> Result<()> {
        let entry = self
            .entries
            .get_mut(zone_id)
            .ok_or_else(|| WidgetError::ZoneNotFound(zone_id.to_string()))?;
        if entry.replace_content(content) {
            self.dirty.insert(zone_id.to_string());
        }
        Ok(())
    }

    pub fn take_dirty(&mut self) -> Vec<(ZoneId, ZoneState)> {
        let ids = std::mem::take(&mut self.dirty);
        ids.into_iter()
            .filter_map(|id| self.entries.get(&id).map(|state| (id, state.clone())))
            .collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn rect_of(&self, zone_id: &str) -> Option<Rect> {
        self.entries.get(zone_id).map(|state| state.rect)
    }

    pub fn content_of(&self, zone_id: &str) -> Option<&str> {
        self.entries.get(zone_id).map(|state| state.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(ids: &[&str]) -> HashMap<ZoneId, Rect> {
        ids.iter()
            .enumerate()
            .map(|(row, id)| (id.to_string(), Rect::new(0, row as u16, 10, 1)))
            .collect()
    }

    #[test]
    fn new_zones_start_dirty_in_id_order() {
        let mut registry = ZoneRegistry::new();
        registry.sync_layout(&solved(&["b", "a"]));
        let dirty: Vec<_> = registry.take_dirty().into_iter().map(|(id, _)| id).collect();
        assert_eq!(dirty, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn identical_content_is_not_repainted() {
        let mut registry = ZoneRegistry::new();
        registry.sync_layout(&solved(&["zone"]));
        registry.take_dirty();

        registry.apply_content("zone", "房間：1 人".to_string()).unwrap();
        assert_eq!(registry.take_dirty().len(), 1);

        registry.apply_content("zone", "房間：1 人".to_string()).unwrap();
        assert!(!registry.has_dirty());
        assert_eq!(registry.content_of("zone"), Some("房間：1 人"));
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let mut registry = ZoneRegistry::new();
        let err = registry.apply_content("missing", String::new()).unwrap_err();
        assert!(matches!(err, WidgetError::ZoneNotFound(id) if id == "missing"));
    }

    #[test]
    fn vanished_zones_are_dropped() {
        let mut registry = ZoneRegistry::new();
        registry.sync_layout(&solved(&["a", "b"]));
        registry.sync_layout(&solved(&["a"]));
        assert!(registry.rect_of("b").is_none());
        assert!(registry.take_dirty().iter().all(|(id, _)| id == "a"));
    }
}
