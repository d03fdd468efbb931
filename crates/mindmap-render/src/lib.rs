#![forbid(unsafe_code)]

//! Rendering and export for `mindmap-model` documents.
//!
//! The pipeline is layout (`layout_map`), draw-call replay (`draw_map`) over
//! a backend-neutral [`Gfx`] surface, and pluggable export backends (SVG and
//! FreeMind). Everything is headless and deterministic: the same document and
//! config always produce the same bytes.

pub mod config;
pub mod draw;
pub mod export;
pub mod gfx;
pub mod layout;
pub mod text;

pub use config::{Color, FontDescriptor, MindMapConfig};
pub use draw::draw_map;
pub use export::{ExportOptionFlag, ExportOptions, Exporter, standard_exporters};
pub use gfx::{Gfx, PathSegment, Point, RasterImage, StrokeKind, VectorShape};
pub use layout::{CanvasSize, Element, MindMapLayout, Rect, layout_map};
pub use text::{DeterministicTextMeasurer, TextMeasurer, TextMetrics};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The export sink refused bytes.
    #[error("export failed: {0}")]
    ExportIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
