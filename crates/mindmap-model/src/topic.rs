use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::extra::Extra;

/// Per-topic flag hiding the subtree from layout and traversal.
pub const ATTR_COLLAPSED: &str = "collapsed";
/// Explicit side marker for first-level topics (`"true"` means left side).
pub const ATTR_LEFT_SIDE: &str = "leftSide";
/// Stable identity a TOPIC extra points at; assigned lazily on demand.
pub const ATTR_TOPIC_LINK_UID: &str = "topicLinkUID";

/// Handle to a topic inside one [`crate::MindMap`] arena.
///
/// Ids stay valid across content edits of the same map instance (and its
/// clones) but are not meaningful across a reparse; use position paths to
/// survive reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId(pub(crate) u32);

impl TopicId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TopicData {
    pub(crate) text: String,
    pub(crate) extras: Vec<Extra>,
    pub(crate) attributes: IndexMap<String, String>,
    pub(crate) children: Vec<TopicId>,
    pub(crate) parent: Option<TopicId>,
}
