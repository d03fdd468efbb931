pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed serialized document. Parsing is all-or-nothing; no partial
    /// tree is ever returned alongside this error.
    #[error("malformed mind map document (line {line}): {message}")]
    Parse { line: usize, message: String },
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
