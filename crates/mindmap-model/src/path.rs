//! Positional addressing: child-index paths from the root.
//!
//! Paths are always derived by walking parent links, never stored, so they are
//! never stale — only possibly unresolvable after the tree is rebuilt.

use crate::map::MindMap;
use crate::topic::TopicId;

/// Child indices locating `id` from the root (empty for the root itself or
/// for a stale id).
pub fn position_path(map: &MindMap, id: TopicId) -> Vec<usize> {
    let mut path = Vec::new();
    let mut cur = id;
    while let Some(parent) = map.parent(cur) {
        let Some(idx) = map.children(parent).iter().position(|&c| c == cur) else {
            return Vec::new();
        };
        path.push(idx);
        cur = parent;
    }
    path.reverse();
    path
}

/// Walks the path from the root; `None` if any index is out of bounds at any
/// depth (the tree was restructured).
pub fn resolve_position_path(map: &MindMap, path: &[usize]) -> Option<TopicId> {
    let mut cur = map.root()?;
    for &idx in path {
        cur = *map.children(cur).get(idx)?;
    }
    Some(cur)
}

impl MindMap {
    pub fn position_path(&self, id: TopicId) -> Vec<usize> {
        position_path(self, id)
    }

    /// Re-finds a topic after the tree object was rebuilt from text.
    pub fn find_for_position_path(&self, path: &[usize]) -> Option<TopicId> {
        resolve_position_path(self, path)
    }
}
