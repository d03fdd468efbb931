//! Text measurement used by the layout engine and the drawing backends.

use serde::{Deserialize, Serialize};

use crate::config::FontDescriptor;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_height: f64,
    pub ascent: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, font: &FontDescriptor) -> TextMetrics;

    fn max_ascent(&self, font: &FontDescriptor) -> f64 {
        self.measure("M", font).ascent
    }
}

/// Font-file-free measurer producing deterministic metrics from the font size
/// and fixed width/height factors. Good enough for headless layout where all
/// backends share the same measurer, which is what keeps draw-call replay
/// bit-exact across backends.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    /// Average glyph width as a fraction of the font size; 0 means default.
    pub char_width_factor: f64,
    /// Line height as a fraction of the font size; 0 means default.
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    pub fn normalized_lines(text: &str) -> Vec<&str> {
        if text.is_empty() {
            return vec![""];
        }
        text.split('\n').collect()
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, font: &FontDescriptor) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };

        let font_size = font.size.max(1.0);
        let lines = Self::normalized_lines(text);
        let max_chars = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let bold_factor = if font.bold { 1.05 } else { 1.0 };
        let line_height = font_size * line_height_factor;
        TextMetrics {
            width: max_chars as f64 * font_size * char_width_factor * bold_factor,
            height: lines.len() as f64 * line_height,
            line_height,
            ascent: font_size * 0.8,
            line_count: lines.len(),
        }
    }
}
