//! SVG export backend.
//!
//! An [`SvgGfx`] surface records the draw-call replay as SVG elements; the
//! exporter wraps the body in the document header and writes it to the sink.
//! All numbers are printed with at most three decimals for stable output.

use std::fmt::Write as _;
use std::io::Write;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use mindmap_model::MindMap;

use crate::Result;
use crate::config::{Color, FontDescriptor, MindMapConfig};
use crate::draw::draw_map;
use crate::export::{ExportOptionFlag, ExportOptions, Exporter};
use crate::gfx::{Gfx, PathSegment, RasterImage, StrokeKind, VectorShape, dash_pattern};
use crate::layout::{CanvasSize, Rect, layout_map};
use crate::text::{DeterministicTextMeasurer, TextMeasurer};

pub const OPT_UNFOLD_ALL: ExportOptionFlag = ExportOptionFlag {
    key: "unfoldAll",
    label: "Unfold all topics",
    default_value: false,
};

pub const OPT_DRAW_BACKGROUND: ExportOptionFlag = ExportOptionFlag {
    key: "drawBackground",
    label: "Draw background",
    default_value: true,
};

static SVG_OPTIONS: [ExportOptionFlag; 2] = [OPT_UNFOLD_ALL, OPT_DRAW_BACKGROUND];

fn fmt(value: f64) -> String {
    let mut s = format!("{value:.3}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" { "0".to_string() } else { s }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Clone)]
struct GfxState {
    translate_x: f64,
    translate_y: f64,
    stroke_width: f64,
    stroke_kind: StrokeKind,
    font: FontDescriptor,
}

impl Default for GfxState {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            stroke_width: 1.0,
            stroke_kind: StrokeKind::Solid,
            font: FontDescriptor::default(),
        }
    }
}

/// [`Gfx`] implementation emitting SVG elements into a string buffer. The
/// accumulated translation is folded into coordinates at emission time, so
/// the output carries no `transform` attributes.
pub struct SvgGfx<'a> {
    buffer: String,
    measurer: &'a dyn TextMeasurer,
    state: GfxState,
    stack: Vec<GfxState>,
    clip_serial: usize,
    clip_open: bool,
}

impl<'a> SvgGfx<'a> {
    pub fn new(measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            buffer: String::with_capacity(8 * 1024),
            measurer,
            state: GfxState::default(),
            stack: Vec::new(),
            clip_serial: 0,
            clip_open: false,
        }
    }

    pub fn finish(mut self) -> String {
        if self.clip_open {
            self.buffer.push_str("</g>\n");
        }
        self.buffer
    }

    fn tx(&self, x: f64) -> f64 {
        x + self.state.translate_x
    }

    fn ty(&self, y: f64) -> f64 {
        y + self.state.translate_y
    }

    fn stroke_attrs(&self, color: Color) -> String {
        let mut attrs = format!(
            " stroke=\"{}\" stroke-width=\"{}\"",
            color.to_svg_rgb(),
            fmt(self.state.stroke_width)
        );
        if let Some((on, off)) = dash_pattern(self.state.stroke_width, self.state.stroke_kind) {
            let cap = match self.state.stroke_kind {
                StrokeKind::Dashed => "round",
                _ => "butt",
            };
            let _ = write!(
                attrs,
                " stroke-linecap=\"{cap}\" stroke-dasharray=\"{},{}\"",
                fmt(on),
                fmt(off)
            );
        }
        attrs
    }

    fn fill_attrs(fill: Option<Color>) -> String {
        match fill {
            Some(color) => {
                let mut attrs = format!(" fill=\"{}\"", color.to_svg_rgb());
                if color.a < 255 {
                    let _ = write!(attrs, " fill-opacity=\"{:.2}\"", color.alpha_fraction());
                }
                attrs
            }
            None => " fill=\"none\"".to_string(),
        }
    }

    fn paint_attrs(&self, border: Option<Color>, fill: Option<Color>) -> String {
        let mut attrs = Self::fill_attrs(fill);
        if let Some(color) = border {
            attrs.push_str(&self.stroke_attrs(color));
        }
        attrs
    }

    fn font_attrs(&self) -> String {
        let font = &self.state.font;
        let mut attrs = format!(
            " font-family=\"{}\" font-size=\"{}\"",
            escape_xml(&font.family),
            fmt(font.size)
        );
        if font.bold {
            attrs.push_str(" font-weight=\"bold\"");
        }
        if font.italic {
            attrs.push_str(" font-style=\"italic\"");
        }
        attrs
    }

    fn path_data(&self, segments: &[PathSegment]) -> String {
        let mut d = String::new();
        for segment in segments {
            if !d.is_empty() {
                d.push(' ');
            }
            match segment {
                PathSegment::MoveTo(p) => {
                    let _ = write!(d, "M{},{}", fmt(self.tx(p.x)), fmt(self.ty(p.y)));
                }
                PathSegment::LineTo(p) => {
                    let _ = write!(d, "L{},{}", fmt(self.tx(p.x)), fmt(self.ty(p.y)));
                }
                PathSegment::CubicTo(c1, c2, p) => {
                    let _ = write!(
                        d,
                        "C{},{} {},{} {},{}",
                        fmt(self.tx(c1.x)),
                        fmt(self.ty(c1.y)),
                        fmt(self.tx(c2.x)),
                        fmt(self.ty(c2.y)),
                        fmt(self.tx(p.x)),
                        fmt(self.ty(p.y))
                    );
                }
                PathSegment::QuadTo(c, p) => {
                    let _ = write!(
                        d,
                        "Q{},{} {},{}",
                        fmt(self.tx(c.x)),
                        fmt(self.ty(c.y)),
                        fmt(self.tx(p.x)),
                        fmt(self.ty(p.y))
                    );
                }
                PathSegment::Close => d.push('Z'),
            }
        }
        d
    }
}

impl Gfx for SvgGfx<'_> {
    fn font_max_ascent(&self) -> f64 {
        self.measurer.max_ascent(&self.state.font)
    }

    fn string_bounds(&self, text: &str) -> Rect {
        let m = self.measurer.measure(text, &self.state.font);
        Rect::new(0.0, 0.0, m.width, m.height)
    }

    fn set_clip(&mut self, bounds: Rect) {
        if self.clip_open {
            self.buffer.push_str("</g>\n");
        }
        let id = self.clip_serial;
        self.clip_serial += 1;
        let _ = writeln!(
            self.buffer,
            "<defs><clipPath id=\"clip{id}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath></defs>",
            fmt(self.tx(bounds.x)),
            fmt(self.ty(bounds.y)),
            fmt(bounds.width),
            fmt(bounds.height)
        );
        let _ = writeln!(self.buffer, "<g clip-path=\"url(#clip{id})\">");
        self.clip_open = true;
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.translate_x += dx;
        self.state.translate_y += dy;
    }

    fn set_stroke(&mut self, width: f64, kind: StrokeKind) {
        self.state.stroke_width = width;
        self.state.stroke_kind = kind;
    }

    fn set_font(&mut self, font: &FontDescriptor) {
        self.state.font = font.clone();
    }

    fn push_state(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn pop_state(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        } else {
            tracing::warn!("pop_state without matching push_state");
        }
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Option<Color>) {
        let stroke = match color {
            Some(c) => self.stroke_attrs(c),
            None => return,
        };
        let _ = writeln!(
            self.buffer,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" fill=\"none\"{stroke}/>",
            fmt(self.tx(x1)),
            fmt(self.ty(y1)),
            fmt(self.tx(x2)),
            fmt(self.ty(y2))
        );
    }

    fn draw_string(&mut self, text: &str, x: f64, y: f64, color: Option<Color>) {
        let fill = Self::fill_attrs(color);
        let font = self.font_attrs();
        let _ = writeln!(
            self.buffer,
            "<text x=\"{}\" y=\"{}\"{font}{fill}>{}</text>",
            fmt(self.tx(x)),
            fmt(self.ty(y)),
            escape_xml(text)
        );
    }

    fn draw_rect(&mut self, rect: Rect, border: Option<Color>, fill: Option<Color>) {
        let _ = writeln!(
            self.buffer,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{}/>",
            fmt(self.tx(rect.x)),
            fmt(self.ty(rect.y)),
            fmt(rect.width),
            fmt(rect.height),
            self.paint_attrs(border, fill)
        );
    }

    fn draw(&mut self, shape: &VectorShape, border: Option<Color>, fill: Option<Color>) {
        match shape {
            VectorShape::Rect(rect) => self.draw_rect(*rect, border, fill),
            VectorShape::RoundedRect {
                rect,
                arc_width,
                arc_height,
            } => {
                let _ = writeln!(
                    self.buffer,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" ry=\"{}\"{}/>",
                    fmt(self.tx(rect.x)),
                    fmt(self.ty(rect.y)),
                    fmt(rect.width),
                    fmt(rect.height),
                    fmt(arc_width / 2.0),
                    fmt(arc_height / 2.0),
                    self.paint_attrs(border, fill)
                );
            }
            VectorShape::Path(segments) => {
                let _ = writeln!(
                    self.buffer,
                    "<path d=\"{}\"{}/>",
                    self.path_data(segments),
                    self.paint_attrs(border, fill)
                );
            }
        }
    }

    fn draw_curve(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Option<Color>) {
        let stroke = match color {
            Some(c) => self.stroke_attrs(c),
            None => return,
        };
        let _ = writeln!(
            self.buffer,
            "<path d=\"M{},{} C{},{} {},{} {},{}\" fill=\"none\"{stroke}/>",
            fmt(self.tx(x1)),
            fmt(self.ty(y1)),
            fmt(self.tx(x1)),
            fmt(self.ty(y2)),
            fmt(self.tx(x1)),
            fmt(self.ty(y2)),
            fmt(self.tx(x2)),
            fmt(self.ty(y2))
        );
    }

    fn draw_oval(&mut self, rect: Rect, border: Option<Color>, fill: Option<Color>) {
        let _ = writeln!(
            self.buffer,
            "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{}/>",
            fmt(self.tx(rect.center_x())),
            fmt(self.ty(rect.center_y())),
            fmt(rect.width / 2.0),
            fmt(rect.height / 2.0),
            self.paint_attrs(border, fill)
        );
    }

    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64) {
        let _ = writeln!(
            self.buffer,
            "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" xlink:href=\"data:image/png;base64,{}\"/>",
            fmt(self.tx(x)),
            fmt(self.ty(y)),
            image.width,
            image.height,
            BASE64.encode(&image.png_data)
        );
    }
}

fn document_header(canvas: CanvasSize) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
         <svg version=\"1.1\" baseProfile=\"tiny\" id=\"svg-root\" width=\"100%\" height=\"100%\" \
         viewBox=\"0 0 {} {}\" xmlns=\"http://www.w3.org/2000/svg\" \
         xmlns:xlink=\"http://www.w3.org/1999/xlink\">\n",
        fmt(canvas.width),
        fmt(canvas.height)
    )
}

pub struct SvgExporter;

impl Exporter for SvgExporter {
    fn name(&self) -> &'static str {
        "SVG image"
    }

    fn reference(&self) -> &'static str {
        "Exports the mind map as a scalable vector image"
    }

    fn extension(&self) -> &'static str {
        "svg"
    }

    fn make_options(&self) -> Option<&'static [ExportOptionFlag]> {
        Some(&SVG_OPTIONS)
    }

    fn do_export(
        &self,
        map: &MindMap,
        config: &MindMapConfig,
        options: &ExportOptions,
        sink: &mut dyn Write,
    ) -> Result<()> {
        // Work on a private clone so export never disturbs the caller's map.
        let mut work = map.clone();
        work.reset_payload();
        if options.get(&OPT_UNFOLD_ALL) {
            work.remove_collapse_attributes();
        }

        let mut cfg = config.clone();
        cfg.scale = 1.0;
        cfg.draw_background = options.get(&OPT_DRAW_BACKGROUND);

        let measurer = DeterministicTextMeasurer::default();
        let mut document = String::with_capacity(16 * 1024);
        match layout_map(&work, &cfg, &measurer) {
            Some(layout) => {
                document.push_str(&document_header(layout.canvas()));
                let mut gfx = SvgGfx::new(&measurer);
                gfx.set_clip(Rect::new(
                    0.0,
                    0.0,
                    layout.canvas().width,
                    layout.canvas().height,
                ));
                draw_map(&work, &layout, &cfg, &mut gfx);
                document.push_str(&gfx.finish());
            }
            None => {
                document.push_str(&document_header(CanvasSize {
                    width: 1.0,
                    height: 1.0,
                }));
            }
        }
        document.push_str("</svg>\n");

        // flush exactly once, also when the write itself failed
        let written = sink.write_all(document.as_bytes());
        let flushed = sink.flush();
        written?;
        flushed?;
        Ok(())
    }
}
