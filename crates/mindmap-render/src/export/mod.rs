//! Pluggable export backends.
//!
//! Every backend receives the same inputs (map, config snapshot, selected
//! options, byte sink) and is responsible for its own flush.

use std::io::Write;

use indexmap::IndexMap;
use mindmap_model::MindMap;

use crate::Result;
use crate::config::MindMapConfig;

pub mod freemind;
pub mod svg;

pub use freemind::FreeMindExporter;
pub use svg::SvgExporter;

/// A boolean knob a backend exposes to its caller.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptionFlag {
    pub key: &'static str,
    pub label: &'static str,
    pub default_value: bool,
}

/// Option selections keyed by flag key; unset flags fall back to the flag's
/// declared default.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    values: IndexMap<String, bool>,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: &ExportOptionFlag, value: bool) -> Self {
        self.values.insert(flag.key.to_string(), value);
        self
    }

    pub fn get(&self, flag: &ExportOptionFlag) -> bool {
        self.values
            .get(flag.key)
            .copied()
            .unwrap_or(flag.default_value)
    }
}

pub trait Exporter {
    /// Short name shown to the caller.
    fn name(&self) -> &'static str;

    /// One-line description of the produced format.
    fn reference(&self) -> &'static str;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    /// Backend-specific option flags, `None` when the backend has none.
    fn make_options(&self) -> Option<&'static [ExportOptionFlag]>;

    fn do_export(
        &self,
        map: &MindMap,
        config: &MindMapConfig,
        options: &ExportOptions,
        sink: &mut dyn Write,
    ) -> Result<()>;
}

/// All built-in backends in presentation order.
pub fn standard_exporters() -> Vec<Box<dyn Exporter>> {
    vec![Box::new(SvgExporter), Box::new(FreeMindExporter)]
}
