use indexmap::IndexMap;

use crate::extra::{Extra, ExtraKind};
use crate::topic::{ATTR_COLLAPSED, ATTR_LEFT_SIDE, ATTR_TOPIC_LINK_UID, TopicData, TopicId};

const NO_CHILDREN: &[TopicId] = &[];
const NO_EXTRAS: &[Extra] = &[];

/// The mind map document: a single-rooted topic tree plus map-level
/// attributes.
///
/// Topics live in an arena with tombstoned slots, so [`TopicId`] handles stay
/// stable while the external editing surface mutates the tree. Deep clones
/// copy the whole arena, keeping ids valid in the clone.
///
/// Layout state is not stored here. The map only carries a generation counter
/// that every structural mutation (and [`MindMap::reset_payload`]) bumps;
/// layout snapshots record the generation they were computed against and
/// become stale as soon as it moves.
#[derive(Debug, Clone, Default)]
pub struct MindMap {
    slots: Vec<Option<TopicData>>,
    root: Option<TopicId>,
    attributes: IndexMap<String, String>,
    generation: u64,
}

impl MindMap {
    /// A map with a single empty root topic.
    pub fn new() -> Self {
        let mut map = Self::default();
        map.install_root(String::new());
        map
    }

    /// A map with no root at all ("nothing to render").
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<TopicId> {
        self.root
    }

    pub(crate) fn install_root(&mut self, text: String) -> TopicId {
        if let Some(root) = self.root {
            return root;
        }
        let id = self.alloc(TopicData {
            text,
            ..TopicData::default()
        });
        self.root = Some(id);
        self.touch();
        id
    }

    fn alloc(&mut self, data: TopicData) -> TopicId {
        if let Some(idx) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[idx] = Some(data);
            TopicId(idx as u32)
        } else {
            self.slots.push(Some(data));
            TopicId((self.slots.len() - 1) as u32)
        }
    }

    fn get(&self, id: TopicId) -> Option<&TopicData> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    fn get_mut(&mut self, id: TopicId) -> Option<&mut TopicData> {
        self.slots.get_mut(id.index()).and_then(|s| s.as_mut())
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Monotonic counter identifying the current tree revision.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidates every cached layout handle derived from this map.
    pub fn reset_payload(&mut self) {
        self.touch();
    }

    pub fn contains(&self, id: TopicId) -> bool {
        self.get(id).is_some()
    }

    pub fn topic_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    // -- topic content ----------------------------------------------------

    pub fn text(&self, id: TopicId) -> &str {
        self.get(id).map_or("", |t| t.text.as_str())
    }

    pub fn set_text(&mut self, id: TopicId, text: impl Into<String>) {
        if let Some(topic) = self.get_mut(id) {
            topic.text = text.into();
            self.touch();
        }
    }

    pub fn children(&self, id: TopicId) -> &[TopicId] {
        self.get(id).map_or(NO_CHILDREN, |t| t.children.as_slice())
    }

    pub fn parent(&self, id: TopicId) -> Option<TopicId> {
        self.get(id).and_then(|t| t.parent)
    }

    /// Depth of the topic: 0 for the root, 1 for its direct children, …
    pub fn topic_level(&self, id: TopicId) -> usize {
        let mut level = 0usize;
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            level += 1;
            cur = parent;
        }
        level
    }

    pub fn attribute(&self, id: TopicId, name: &str) -> Option<&str> {
        self.get(id)
            .and_then(|t| t.attributes.get(name))
            .map(String::as_str)
    }

    /// Sets (`Some`) or removes (`None`) a topic attribute.
    pub fn set_attribute(&mut self, id: TopicId, name: &str, value: Option<&str>) {
        if let Some(topic) = self.get_mut(id) {
            match value {
                Some(v) => {
                    topic.attributes.insert(name.to_string(), v.to_string());
                }
                None => {
                    topic.attributes.shift_remove(name);
                }
            }
            self.touch();
        }
    }

    pub fn attributes(&self, id: TopicId) -> impl Iterator<Item = (&str, &str)> {
        self.get(id)
            .into_iter()
            .flat_map(|t| t.attributes.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extra(&self, id: TopicId, kind: ExtraKind) -> Option<&Extra> {
        self.get(id)
            .and_then(|t| t.extras.iter().find(|e| e.kind() == kind))
    }

    pub fn extras(&self, id: TopicId) -> &[Extra] {
        self.get(id).map_or(NO_EXTRAS, |t| t.extras.as_slice())
    }

    /// Attaches the extra, replacing any existing one of the same kind.
    pub fn set_extra(&mut self, id: TopicId, extra: Extra) {
        let kind = extra.kind();
        if let Some(topic) = self.get_mut(id) {
            topic.extras.retain(|e| e.kind() != kind);
            topic.extras.push(extra);
            self.touch();
        }
    }

    pub fn remove_extra(&mut self, id: TopicId, kind: ExtraKind) -> Option<Extra> {
        let topic = self.get_mut(id)?;
        let idx = topic.extras.iter().position(|e| e.kind() == kind)?;
        let removed = topic.extras.remove(idx);
        self.touch();
        Some(removed)
    }

    // -- structure --------------------------------------------------------

    /// Appends a new child topic; `None` if the parent id is stale.
    pub fn add_child(&mut self, parent: TopicId, text: impl Into<String>) -> Option<TopicId> {
        if !self.contains(parent) {
            return None;
        }
        let id = self.alloc(TopicData {
            text: text.into(),
            parent: Some(parent),
            ..TopicData::default()
        });
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        self.touch();
        Some(id)
    }

    /// Detaches the topic from its parent and frees the whole subtree.
    /// Removing the root leaves an empty (rootless) map.
    pub fn remove_topic(&mut self, id: TopicId) {
        let Some(parent) = self.parent(id) else {
            if self.root == Some(id) {
                self.root = None;
                self.free_subtree(id);
                self.touch();
            }
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        self.free_subtree(id);
        self.touch();
    }

    fn free_subtree(&mut self, id: TopicId) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(cur.index()) {
                if let Some(data) = slot.take() {
                    stack.extend(data.children);
                }
            }
        }
    }

    /// Pre-order traversal of the whole tree (root first). Iterative so that
    /// pathologically deep documents cannot exhaust the call stack.
    pub fn pre_order(&self) -> Vec<TopicId> {
        let mut out = Vec::with_capacity(self.topic_count());
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(cur) = stack.pop() {
            out.push(cur);
            for &child in self.children(cur).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    // -- map attributes ---------------------------------------------------

    pub fn map_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_map_attribute(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                self.attributes.insert(name.to_string(), v.to_string());
            }
            None => {
                self.attributes.shift_remove(name);
            }
        }
        self.touch();
    }

    pub fn map_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // -- collapse / side flags --------------------------------------------

    pub fn is_collapsed(&self, id: TopicId) -> bool {
        self.attribute(id, ATTR_COLLAPSED) == Some("true")
    }

    pub fn set_collapsed(&mut self, id: TopicId, collapsed: bool) {
        self.set_attribute(id, ATTR_COLLAPSED, collapsed.then_some("true"));
    }

    /// Strips the collapse attribute from every topic ("unfold all").
    pub fn remove_collapse_attributes(&mut self) {
        for id in self.pre_order() {
            self.set_attribute(id, ATTR_COLLAPSED, None);
        }
    }

    pub fn is_left_sided(&self, id: TopicId) -> bool {
        self.attribute(id, ATTR_LEFT_SIDE) == Some("true")
    }

    pub fn set_left_sided(&mut self, id: TopicId, left: bool) {
        self.set_attribute(id, ATTR_LEFT_SIDE, left.then_some("true"));
    }

    // -- identity & pruning -----------------------------------------------

    /// A topic may be pruned silently only if it carries no text, no extras
    /// and no attributes beyond the side marker.
    pub fn can_be_lost(&self, id: TopicId) -> bool {
        let Some(topic) = self.get(id) else {
            return true;
        };
        topic.text.is_empty()
            && topic.extras.is_empty()
            && topic.attributes.keys().all(|k| k == ATTR_LEFT_SIDE)
    }

    /// Resolves a TOPIC extra to its target by stored identity.
    pub fn find_topic_for_link(&self, uid: &str) -> Option<TopicId> {
        self.pre_order()
            .into_iter()
            .find(|&id| self.attribute(id, ATTR_TOPIC_LINK_UID) == Some(uid))
    }

    /// Returns the topic's link uid, assigning a fresh one when absent.
    /// `None` if the id is stale.
    pub fn assign_link_uid(&mut self, id: TopicId) -> Option<String> {
        if !self.contains(id) {
            return None;
        }
        if let Some(uid) = self.attribute(id, ATTR_TOPIC_LINK_UID) {
            return Some(uid.to_string());
        }
        let next = self
            .pre_order()
            .into_iter()
            .filter_map(|t| self.attribute(t, ATTR_TOPIC_LINK_UID))
            .filter_map(|uid| uid.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        let uid = next.to_string();
        self.set_attribute(id, ATTR_TOPIC_LINK_UID, Some(&uid));
        Some(uid)
    }

    /// Builds a TOPIC extra jumping to `target`, assigning its uid on demand.
    pub fn make_topic_jump(&mut self, target: TopicId) -> Option<Extra> {
        self.assign_link_uid(target).map(Extra::TopicJump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra::FileParams;

    #[test]
    fn new_map_has_single_empty_root() {
        let map = MindMap::new();
        let root = map.root().unwrap();
        assert_eq!(map.text(root), "");
        assert!(map.children(root).is_empty());
        assert_eq!(map.topic_count(), 1);
    }

    #[test]
    fn add_and_remove_children() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        let a = map.add_child(root, "a").unwrap();
        let b = map.add_child(root, "b").unwrap();
        let a1 = map.add_child(a, "a1").unwrap();
        assert_eq!(map.children(root), &[a, b]);
        assert_eq!(map.topic_level(a1), 2);

        map.remove_topic(a);
        assert_eq!(map.children(root), &[b]);
        assert!(!map.contains(a));
        assert!(!map.contains(a1));
        assert_eq!(map.topic_count(), 2);
    }

    #[test]
    fn removing_root_leaves_rootless_map() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.add_child(root, "child");
        map.remove_topic(root);
        assert!(map.root().is_none());
        assert_eq!(map.topic_count(), 0);
        assert!(map.pre_order().is_empty());
    }

    #[test]
    fn extras_at_most_one_per_kind() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_extra(root, Extra::Link("http://a".into()));
        map.set_extra(root, Extra::Link("http://b".into()));
        assert_eq!(map.extras(root).len(), 1);
        assert_eq!(
            map.extra(root, ExtraKind::Link),
            Some(&Extra::Link("http://b".into()))
        );
        assert!(map.remove_extra(root, ExtraKind::Link).is_some());
        assert!(map.extra(root, ExtraKind::Link).is_none());
    }

    #[test]
    fn can_be_lost_predicate() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        let child = map.add_child(root, "").unwrap();
        assert!(map.can_be_lost(child));

        map.set_left_sided(child, true);
        assert!(map.can_be_lost(child));

        map.set_collapsed(child, true);
        assert!(!map.can_be_lost(child));
        map.set_collapsed(child, false);

        map.set_text(child, "x");
        assert!(!map.can_be_lost(child));
        map.set_text(child, "");

        map.set_extra(
            child,
            Extra::File {
                uri: "doc.txt".into(),
                params: FileParams::new(),
            },
        );
        assert!(!map.can_be_lost(child));
    }

    #[test]
    fn topic_jump_resolution() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        let target = map.add_child(root, "target").unwrap();
        let jump = map.make_topic_jump(target).unwrap();
        let Extra::TopicJump(uid) = &jump else {
            panic!("expected topic jump");
        };
        assert_eq!(map.find_topic_for_link(uid), Some(target));

        // uid assignment is sticky
        assert_eq!(map.make_topic_jump(target).unwrap(), jump);
        assert!(map.find_topic_for_link("no-such-uid").is_none());
    }

    #[test]
    fn generation_moves_on_mutation_and_reset() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        let g0 = map.generation();
        map.set_text(root, "hello");
        assert_ne!(map.generation(), g0);
        let g1 = map.generation();
        map.reset_payload();
        assert_ne!(map.generation(), g1);
    }

    #[test]
    fn clone_is_deep_and_keeps_ids() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        let child = map.add_child(root, "child").unwrap();

        let mut copy = map.clone();
        copy.set_text(child, "edited");
        assert_eq!(map.text(child), "child");
        assert_eq!(copy.text(child), "edited");
    }
}
