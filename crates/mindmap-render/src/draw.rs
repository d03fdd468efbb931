//! Replays a layout snapshot into a [`Gfx`] backend.
//!
//! Pure read-only pass: background, connectors, topic boxes, text, extras
//! markers and collapsators, in that order, so later items paint over earlier
//! ones identically on every backend.

use mindmap_model::{Extra, MindMap};

use crate::config::MindMapConfig;
use crate::gfx::{Gfx, StrokeKind, VectorShape};
use crate::layout::{MindMapLayout, Rect};

pub fn draw_map(
    map: &MindMap,
    layout: &MindMapLayout,
    config: &MindMapConfig,
    gfx: &mut dyn Gfx,
) {
    if !layout.is_valid_for(map) {
        tracing::warn!("layout snapshot is stale, skipping draw");
        return;
    }

    let canvas = layout.canvas();
    if config.draw_background {
        gfx.draw_rect(
            Rect::new(0.0, 0.0, canvas.width, canvas.height),
            None,
            Some(config.paper_color),
        );
    }

    gfx.set_font(&config.font.scaled(config.scale));

    draw_connectors(map, layout, config, gfx);
    for el in layout.elements() {
        draw_topic(map, config, gfx, el);
    }
}

fn draw_connectors(
    map: &MindMap,
    layout: &MindMapLayout,
    config: &MindMapConfig,
    gfx: &mut dyn Gfx,
) {
    gfx.set_stroke(config.scaled(config.connector_width), StrokeKind::Solid);
    for &id in layout.visible_topics() {
        if map.is_collapsed(id) {
            continue;
        }
        let Some(parent_el) = layout.element(id) else {
            continue;
        };
        for &child in map.children(id) {
            let Some(child_el) = layout.element(child) else {
                continue;
            };
            let (from_x, to_x) = if child_el.left_side {
                (parent_el.bounds.x, child_el.bounds.right())
            } else {
                (parent_el.bounds.right(), child_el.bounds.x)
            };
            gfx.draw_curve(
                from_x,
                parent_el.bounds.center_y(),
                to_x,
                child_el.bounds.center_y(),
                Some(config.connector_color),
            );
        }
    }
}

fn draw_topic(
    map: &MindMap,
    config: &MindMapConfig,
    gfx: &mut dyn Gfx,
    el: &crate::layout::Element,
) {
    let fill = config.background_color_for_level(el.level);
    let border = config.element_border_color;

    gfx.set_stroke(config.scaled(config.element_border_width), StrokeKind::Solid);
    match el.level {
        0 => {
            let arc = config.scaled(config.round_radius);
            let shape = VectorShape::RoundedRect {
                rect: el.bounds,
                arc_width: arc,
                arc_height: arc,
            };
            gfx.draw(&shape, Some(border), Some(fill));
        }
        1 => gfx.draw(&VectorShape::Rect(el.bounds), Some(border), Some(fill)),
        // deeper topics are underlined text, no box
        _ => gfx.draw_line(
            el.bounds.x,
            el.bounds.bottom(),
            el.bounds.right(),
            el.bounds.bottom(),
            Some(border),
        ),
    }

    let text_color = config.text_color_for_level(el.level);
    let ascent = gfx.font_max_ascent();
    for (i, line) in map.text(el.topic).split('\n').enumerate() {
        gfx.draw_string(
            line,
            el.text_block.x,
            el.text_block.y + ascent + i as f64 * el.text_metrics.line_height,
            Some(text_color),
        );
    }

    if let Some(extras) = el.extras_block {
        draw_extras_markers(map, config, gfx, el, extras);
    }

    if let Some(collapsator) = el.collapsator {
        draw_collapsator(config, gfx, collapsator, map.is_collapsed(el.topic));
    }
}

/// One small marker square per extra, in stable extra order.
fn draw_extras_markers(
    map: &MindMap,
    config: &MindMapConfig,
    gfx: &mut dyn Gfx,
    el: &crate::layout::Element,
    block: Rect,
) {
    let icon = config.scaled(config.icon_size);
    let slot = icon + config.scaled(4.0);
    gfx.set_stroke(config.scaled(config.element_border_width), StrokeKind::Solid);
    for (i, extra) in map.extras(el.topic).iter().enumerate() {
        let marker = Rect::new(block.x + i as f64 * slot, block.y, icon, icon);
        let fill = match extra {
            Extra::Note(_) => crate::config::Color::rgb(0xFF, 0xF3, 0xB0),
            Extra::File { .. } => crate::config::Color::rgb(0xC8, 0xE6, 0xC9),
            Extra::Link(_) => crate::config::Color::rgb(0xBB, 0xDE, 0xFB),
            Extra::TopicJump(_) => crate::config::Color::rgb(0xE1, 0xBE, 0xE7),
        };
        gfx.draw_rect(marker, Some(config.element_border_color), Some(fill));
    }
}

fn draw_collapsator(config: &MindMapConfig, gfx: &mut dyn Gfx, rect: Rect, collapsed: bool) {
    gfx.set_stroke(config.scaled(config.element_border_width), StrokeKind::Solid);
    gfx.draw_oval(
        rect,
        Some(config.collapsator_border_color),
        Some(config.collapsator_background_color),
    );
    let inset = rect.width / 4.0;
    let color = Some(config.collapsator_border_color);
    gfx.draw_line(
        rect.x + inset,
        rect.center_y(),
        rect.right() - inset,
        rect.center_y(),
        color,
    );
    if collapsed {
        gfx.draw_line(
            rect.center_x(),
            rect.y + inset,
            rect.center_x(),
            rect.bottom() - inset,
            color,
        );
    }
}
