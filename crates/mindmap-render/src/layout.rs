//! Headless layout engine.
//!
//! Produces a [`MindMapLayout`] side table keyed by topic id; the map itself
//! is never mutated by layout. The snapshot records the map generation it was
//! computed from, so any later mutation (including `reset_payload`) makes it
//! reject with [`MindMapLayout::is_valid_for`].

use mindmap_model::{MindMap, TopicId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::MindMapConfig;
use crate::text::{TextMeasurer, TextMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// Per-topic geometry in canvas coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub topic: TopicId,
    pub level: usize,
    pub left_side: bool,
    /// Full topic box including margins, icons and the collapsator.
    pub bounds: Rect,
    pub text_block: Rect,
    /// Present only when the topic has extras.
    pub extras_block: Option<Rect>,
    /// Present only when the topic has children (collapsed or not).
    pub collapsator: Option<Rect>,
    pub text_metrics: TextMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindMapLayout {
    generation: u64,
    canvas: CanvasSize,
    elements: FxHashMap<TopicId, Element>,
    /// Visible topics in draw order (parents before children).
    order: Vec<TopicId>,
}

impl MindMapLayout {
    /// A layout is only usable against the exact map state it was computed
    /// from; any mutation since then invalidates it wholesale.
    pub fn is_valid_for(&self, map: &MindMap) -> bool {
        self.generation == map.generation()
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn element(&self, id: TopicId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn visible_topics(&self) -> &[TopicId] {
        &self.order
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Deepest element whose bounds contain the point, for hit testing.
    pub fn topic_at(&self, x: f64, y: f64) -> Option<TopicId> {
        self.order
            .iter()
            .rev()
            .find(|&&id| {
                self.elements.get(&id).is_some_and(|el| {
                    x >= el.bounds.x
                        && x <= el.bounds.right()
                        && y >= el.bounds.y
                        && y <= el.bounds.bottom()
                })
            })
            .copied()
    }
}

/// Lays out the whole visible tree. `None` when the map is rootless.
pub fn layout_map(
    map: &MindMap,
    config: &MindMapConfig,
    measurer: &dyn TextMeasurer,
) -> Option<MindMapLayout> {
    let root = map.root()?;
    let ctx = LayoutCtx {
        map,
        config,
        measurer,
        font: config.font.scaled(config.scale),
    };

    let (root_w, root_h) = ctx.own_size(root);

    let mut left_children: Vec<TopicId> = Vec::new();
    let mut right_children: Vec<TopicId> = Vec::new();
    if !map.is_collapsed(root) {
        for &child in map.children(root) {
            if map.is_left_sided(child) {
                left_children.push(child);
            } else {
                right_children.push(child);
            }
        }
    }

    let first_gap = config.parent_gap(1);
    let (left_w, left_h) = ctx.stack_extent(&left_children, 1);
    let (right_w, right_h) = ctx.stack_extent(&right_children, 1);

    let total_h = root_h.max(left_h).max(right_h);
    let margin = config.scaled(config.paper_margins);

    let left_extent = if left_children.is_empty() {
        0.0
    } else {
        left_w + first_gap
    };
    let right_extent = if right_children.is_empty() {
        0.0
    } else {
        right_w + first_gap
    };

    let canvas = CanvasSize {
        width: root_w + left_extent + right_extent + 2.0 * margin,
        height: total_h + 2.0 * margin,
    };

    let root_x = margin + left_extent;
    let center_y = margin + total_h / 2.0;

    let mut out = Placement::default();
    ctx.insert_element(root, 0, false, root_x, center_y - root_h / 2.0, &mut out);
    ctx.place_stack(&right_children, 1, false, root_x + root_w, center_y, &mut out);
    ctx.place_stack(&left_children, 1, true, root_x, center_y, &mut out);

    Some(MindMapLayout {
        generation: map.generation(),
        canvas,
        elements: out.elements,
        order: out.order,
    })
}

#[derive(Default)]
struct Placement {
    elements: FxHashMap<TopicId, Element>,
    order: Vec<TopicId>,
}

struct LayoutCtx<'a> {
    map: &'a MindMap,
    config: &'a MindMapConfig,
    measurer: &'a dyn TextMeasurer,
    font: crate::config::FontDescriptor,
}

impl LayoutCtx<'_> {
    fn visible_children(&self, id: TopicId) -> &[TopicId] {
        if self.map.is_collapsed(id) {
            &[]
        } else {
            self.map.children(id)
        }
    }

    fn icon_slot(&self) -> f64 {
        self.config.scaled(self.config.icon_size) + self.config.scaled(4.0)
    }

    fn collapsator_slot(&self) -> f64 {
        self.config.scaled(self.config.collapsator_size) + self.config.scaled(4.0)
    }

    /// Size of the topic box alone. Independent of collapse state, so folding
    /// a branch never changes any box size, only which boxes exist.
    fn own_size(&self, id: TopicId) -> (f64, f64) {
        let metrics = self.measurer.measure(self.map.text(id), &self.font);
        let margins = self.config.scaled(self.config.text_margins);
        let mut width = metrics.width + 2.0 * margins;
        let height = metrics.height + 2.0 * margins;

        let extras = self.map.extras(id).len();
        if extras > 0 {
            width += extras as f64 * self.icon_slot();
        }
        if !self.map.children(id).is_empty() {
            width += self.collapsator_slot();
        }
        (width, height)
    }

    /// Bounding extent of the topic box plus all visible descendants.
    fn block_size(&self, id: TopicId, level: usize) -> (f64, f64) {
        let (own_w, own_h) = self.own_size(id);
        let children = self.visible_children(id);
        if children.is_empty() {
            return (own_w, own_h);
        }

        let sibling_gap = self.config.sibling_gap(level + 1);
        let mut child_w: f64 = 0.0;
        let mut child_h: f64 = 0.0;
        for (i, &child) in children.iter().enumerate() {
            let (w, h) = self.block_size(child, level + 1);
            child_w = child_w.max(w);
            child_h += h;
            if i > 0 {
                child_h += sibling_gap;
            }
        }
        (
            own_w + self.config.parent_gap(level + 1) + child_w,
            own_h.max(child_h),
        )
    }

    fn stack_extent(&self, topics: &[TopicId], level: usize) -> (f64, f64) {
        let sibling_gap = self.config.sibling_gap(level);
        let mut width: f64 = 0.0;
        let mut height: f64 = 0.0;
        for (i, &id) in topics.iter().enumerate() {
            let (w, h) = self.block_size(id, level);
            width = width.max(w);
            height += h;
            if i > 0 {
                height += sibling_gap;
            }
        }
        (width, height)
    }

    /// Places a vertical stack of sibling blocks centered at `center_y`,
    /// growing away from `edge_x` toward the side given by `left_side`.
    fn place_stack(
        &self,
        topics: &[TopicId],
        level: usize,
        left_side: bool,
        edge_x: f64,
        center_y: f64,
        out: &mut Placement,
    ) {
        if topics.is_empty() {
            return;
        }
        let gap = self.config.parent_gap(level);
        let sibling_gap = self.config.sibling_gap(level);
        let (_, stack_h) = self.stack_extent(topics, level);
        let facing_x = if left_side { edge_x - gap } else { edge_x + gap };

        let mut cursor = center_y - stack_h / 2.0;
        for &id in topics {
            let (_, block_h) = self.block_size(id, level);
            self.place(id, level, left_side, facing_x, cursor + block_h / 2.0, out);
            cursor += block_h + sibling_gap;
        }
    }

    /// Places one topic with its near edge on `facing_x`, vertically centered
    /// on `center_y`, then recurses into its visible children.
    fn place(
        &self,
        id: TopicId,
        level: usize,
        left_side: bool,
        facing_x: f64,
        center_y: f64,
        out: &mut Placement,
    ) {
        let (own_w, own_h) = self.own_size(id);
        let x = if left_side { facing_x - own_w } else { facing_x };
        let bounds_right = x + own_w;
        self.insert_element(id, level, left_side, x, center_y - own_h / 2.0, out);

        let children = self.visible_children(id);
        if !children.is_empty() {
            let edge = if left_side { x } else { bounds_right };
            self.place_stack(children, level + 1, left_side, edge, center_y, out);
        }
    }

    /// Builds the element record with its inner sub-rectangles and registers
    /// it in draw order. The collapsator sits on the child-facing edge and
    /// the text block hugs the opposite edge.
    fn insert_element(
        &self,
        id: TopicId,
        level: usize,
        left_side: bool,
        x: f64,
        y: f64,
        out: &mut Placement,
    ) {
        let (own_w, own_h) = self.own_size(id);
        let bounds = Rect::new(x, y, own_w, own_h);
        let margins = self.config.scaled(self.config.text_margins);
        let metrics = self.measurer.measure(self.map.text(id), &self.font);

        let text_x = if left_side {
            bounds.right() - margins - metrics.width
        } else {
            x + margins
        };
        let text_block = Rect::new(
            text_x,
            y + (own_h - metrics.height) / 2.0,
            metrics.width,
            metrics.height,
        );

        let extras_count = self.map.extras(id).len();
        let extras_block = (extras_count > 0).then(|| {
            let width = extras_count as f64 * self.icon_slot();
            let icon = self.config.scaled(self.config.icon_size);
            let ex = if left_side {
                text_block.x - width
            } else {
                text_block.right() + self.config.scaled(4.0)
            };
            Rect::new(ex, bounds.center_y() - icon / 2.0, width, icon)
        });

        let collapsator = (!self.map.children(id).is_empty()).then(|| {
            let size = self.config.scaled(self.config.collapsator_size);
            let pad = self.config.scaled(2.0);
            let cx = if left_side {
                bounds.x + pad
            } else {
                bounds.right() - size - pad
            };
            Rect::new(cx, bounds.center_y() - size / 2.0, size, size)
        });

        out.order.push(id);
        out.elements.insert(
            id,
            Element {
                topic: id,
                level,
                left_side,
                bounds,
                text_block,
                extras_block,
                collapsator,
                text_metrics: metrics,
            },
        );
    }
}
