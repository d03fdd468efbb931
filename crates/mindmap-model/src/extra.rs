use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameter map carried by FILE extras (e.g. backend open-policy flags).
/// Insertion order is preserved so packed documents stay deterministic.
pub type FileParams = IndexMap<String, String>;

/// FILE extra parameter asking the host to open the target with the system
/// tool instead of in-app.
pub const FILE_PARAM_SHOW_WITH_SYSTEM_TOOL: &str = "showWithSystemTool";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtraKind {
    Note,
    File,
    Link,
    TopicJump,
}

impl ExtraKind {
    /// All kinds in the order extras are serialized by the codec.
    pub const ALL: [ExtraKind; 4] = [
        ExtraKind::Note,
        ExtraKind::File,
        ExtraKind::Link,
        ExtraKind::TopicJump,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ExtraKind::Note => "NOTE",
            ExtraKind::File => "FILE",
            ExtraKind::Link => "LINK",
            ExtraKind::TopicJump => "TOPIC",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "NOTE" => Some(ExtraKind::Note),
            "FILE" => Some(ExtraKind::File),
            "LINK" => Some(ExtraKind::Link),
            "TOPIC" => Some(ExtraKind::TopicJump),
            _ => None,
        }
    }
}

/// Typed auxiliary data attached to a topic; at most one per kind per topic.
///
/// A closed sum so exporters can switch on kind exhaustively; adding a kind is
/// a compile-time-checked exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extra {
    /// Free-form note text.
    Note(String),
    /// A file URI, root-relative or absolute, with open-policy parameters.
    File { uri: String, params: FileParams },
    /// A plain URI link.
    Link(String),
    /// An intra-map jump, resolved by the target topic's stored link uid.
    TopicJump(String),
}

impl Extra {
    pub fn kind(&self) -> ExtraKind {
        match self {
            Extra::Note(_) => ExtraKind::Note,
            Extra::File { .. } => ExtraKind::File,
            Extra::Link(_) => ExtraKind::Link,
            Extra::TopicJump(_) => ExtraKind::TopicJump,
        }
    }

    /// The string payload used by the search engine and the codec.
    pub fn content(&self) -> &str {
        match self {
            Extra::Note(text) => text,
            Extra::File { uri, .. } => uri,
            Extra::Link(uri) => uri,
            Extra::TopicJump(uid) => uid,
        }
    }
}
