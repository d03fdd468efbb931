use serde::{Deserialize, Serialize};

/// RGBA color. Alpha is only honored by backends that can express it
/// (the SVG backend emits `fill-opacity` when alpha < 255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb` form used by the tree-outline export format.
    pub fn to_html(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `rgb(r,g,b)` form used by the SVG backend.
    pub fn to_svg_rgb(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    pub fn alpha_fraction(self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 14.0,
            bold: true,
            italic: false,
        }
    }
}

impl FontDescriptor {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            size: self.size * factor,
            ..self.clone()
        }
    }
}

/// Immutable-per-render snapshot of visual parameters.
///
/// Every render call receives its own clone, so concurrent renders of
/// distinct map clones with different settings never interfere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapConfig {
    pub scale: f64,
    pub draw_background: bool,

    pub paper_color: Color,
    pub connector_color: Color,
    pub element_border_color: Color,
    pub root_text_color: Color,
    pub root_background_color: Color,
    pub first_level_text_color: Color,
    pub first_level_background_color: Color,
    pub other_level_text_color: Color,
    pub other_level_background_color: Color,
    pub collapsator_border_color: Color,
    pub collapsator_background_color: Color,

    pub element_border_width: f64,
    pub connector_width: f64,
    pub collapsator_size: f64,
    pub text_margins: f64,
    pub icon_size: f64,
    pub paper_margins: f64,
    pub round_radius: f64,

    pub first_level_horizontal_inset: f64,
    pub first_level_vertical_inset: f64,
    pub other_level_horizontal_inset: f64,
    pub other_level_vertical_inset: f64,

    pub font: FontDescriptor,
}

impl Default for MindMapConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            draw_background: true,

            paper_color: Color::rgb(0x61, 0x7B, 0x94),
            connector_color: Color::rgb(0x46, 0x46, 0x46),
            element_border_color: Color::rgb(0x46, 0x46, 0x46),
            root_text_color: Color::rgb(0xFF, 0xFF, 0xFF),
            root_background_color: Color::rgb(0x03, 0x1A, 0x31),
            first_level_text_color: Color::rgb(0x00, 0x00, 0x00),
            first_level_background_color: Color::rgb(0xB1, 0xBF, 0xCC),
            other_level_text_color: Color::rgb(0x00, 0x00, 0x00),
            other_level_background_color: Color::rgb(0xFD, 0xFD, 0xFD),
            collapsator_border_color: Color::rgb(0x46, 0x46, 0x46),
            collapsator_background_color: Color::rgb(0xFF, 0xFF, 0xFF),

            element_border_width: 1.0,
            connector_width: 1.5,
            collapsator_size: 16.0,
            text_margins: 10.0,
            icon_size: 10.0,
            paper_margins: 20.0,
            round_radius: 14.0,

            first_level_horizontal_inset: 60.0,
            first_level_vertical_inset: 30.0,
            other_level_horizontal_inset: 30.0,
            other_level_vertical_inset: 16.0,

            font: FontDescriptor::default(),
        }
    }
}

impl MindMapConfig {
    pub fn scaled(&self, value: f64) -> f64 {
        value * self.scale
    }

    pub fn text_color_for_level(&self, level: usize) -> Color {
        match level {
            0 => self.root_text_color,
            1 => self.first_level_text_color,
            _ => self.other_level_text_color,
        }
    }

    pub fn background_color_for_level(&self, level: usize) -> Color {
        match level {
            0 => self.root_background_color,
            1 => self.first_level_background_color,
            _ => self.other_level_background_color,
        }
    }

    /// Vertical gap between sibling blocks whose topics sit at `child_level`.
    pub fn sibling_gap(&self, child_level: usize) -> f64 {
        if child_level <= 1 {
            self.scaled(self.first_level_vertical_inset)
        } else {
            self.scaled(self.other_level_vertical_inset)
        }
    }

    /// Horizontal gap between a parent box and its children at `child_level`.
    pub fn parent_gap(&self, child_level: usize) -> f64 {
        if child_level <= 1 {
            self.scaled(self.first_level_horizontal_inset)
        } else {
            self.scaled(self.other_level_horizontal_inset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_rendering() {
        let c = Color::rgb(0x03, 0x1A, 0x31);
        assert_eq!(c.to_html(), "#031a31");
        assert_eq!(c.to_svg_rgb(), "rgb(3,26,49)");
        assert_eq!(Color::rgba(0, 0, 0, 128).alpha_fraction(), 128.0 / 255.0);
    }

    #[test]
    fn per_level_color_slots() {
        let cfg = MindMapConfig::default();
        assert_eq!(cfg.text_color_for_level(0), cfg.root_text_color);
        assert_eq!(cfg.text_color_for_level(1), cfg.first_level_text_color);
        assert_eq!(cfg.text_color_for_level(7), cfg.other_level_text_color);
        assert_eq!(
            cfg.background_color_for_level(2),
            cfg.other_level_background_color
        );
    }
}
