#![forbid(unsafe_code)]

//! Mind map document model (headless).
//!
//! The crate owns the topic tree (a strictly tree-shaped arena of typed nodes
//! with attached "extras"), positional addressing, the search engine and the
//! line-oriented text codec. Layout and export live in `mindmap-render`.

pub mod codec;
pub mod error;
pub mod extra;
pub mod map;
pub mod path;
pub mod search;
pub mod topic;

pub use error::{Error, Result};
pub use extra::{Extra, ExtraKind, FILE_PARAM_SHOW_WITH_SYSTEM_TOOL, FileParams};
pub use map::MindMap;
pub use topic::{ATTR_COLLAPSED, ATTR_LEFT_SIDE, ATTR_TOPIC_LINK_UID, TopicId};
