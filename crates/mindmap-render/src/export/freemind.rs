//! FreeMind 0.8.1 export backend.
//!
//! Produces a `.mm` XML tree mirroring the topic tree. Intra-map jumps
//! become `#id` links, which requires node ids that are reproducible from
//! structure alone; they are derived from each topic's position path.

use std::io::Write;

use chrono::Utc;
use mindmap_model::{Extra, MindMap, TopicId};

use crate::Result;
use crate::config::MindMapConfig;
use crate::export::{ExportOptionFlag, ExportOptions, Exporter};

const NOTE_HOOK_NAME: &str = "accessories/plugins/NodeNote.properties";

/// Node id from a position path: letter per index below 26, `_`-prefixed
/// decimal above. The underscore keeps adjacent decimal runs apart, so the
/// path-to-id mapping stays injective and `#id` anchors cannot collide.
fn make_uid(path: &[usize]) -> String {
    let mut uid = String::from("mmlink");
    for &idx in path {
        if idx < 26 {
            uid.push((b'A' + idx as u8) as char);
        } else {
            uid.push('_');
            uid.push_str(&idx.to_string());
        }
    }
    uid
}

/// XML attribute escaping; newlines survive as `&#10;` character references
/// and bare carriage returns are dropped.
fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// The strongest link wins the single LINK slot: file, then URI, then jump.
fn link_attribute(map: &MindMap, id: TopicId) -> Option<String> {
    if let Some(Extra::File { uri, .. }) = map.extra(id, mindmap_model::ExtraKind::File) {
        return Some(uri.clone());
    }
    if let Some(Extra::Link(uri)) = map.extra(id, mindmap_model::ExtraKind::Link) {
        return Some(uri.clone());
    }
    if let Some(Extra::TopicJump(uid)) = map.extra(id, mindmap_model::ExtraKind::TopicJump) {
        match map.find_topic_for_link(uid) {
            Some(target) => return Some(format!("#{}", make_uid(&map.position_path(target)))),
            None => {
                tracing::warn!(uid = %uid, "dangling topic jump dropped from export");
            }
        }
    }
    None
}

fn write_topic(
    map: &MindMap,
    id: TopicId,
    level: usize,
    config: &MindMapConfig,
    timestamp: i64,
    lines: &mut Vec<String>,
) {
    let indent = " ".repeat(level + 1);
    let mut node = format!(
        "{indent}<node CREATED=\"{timestamp}\" MODIFIED=\"{timestamp}\" COLOR=\"{}\" \
         BACKGROUND_COLOR=\"{}\" ID=\"{}\"",
        config.text_color_for_level(level).to_html(),
        config.background_color_for_level(level).to_html(),
        make_uid(&map.position_path(id))
    );
    if level == 1 {
        let side = if map.is_left_sided(id) { "left" } else { "right" };
        node.push_str(&format!(" POSITION=\"{side}\""));
    }
    node.push_str(&format!(" TEXT=\"{}\"", escape_attr(map.text(id))));
    if let Some(link) = link_attribute(map, id) {
        node.push_str(&format!(" LINK=\"{}\"", escape_attr(&link)));
    }
    node.push('>');
    lines.push(node);

    lines.push(format!(
        "{indent} <edge COLOR=\"{}\"/>",
        config.connector_color.to_html()
    ));

    if let Some(Extra::Note(note)) = map.extra(id, mindmap_model::ExtraKind::Note) {
        lines.push(format!("{indent} <hook NAME=\"{NOTE_HOOK_NAME}\">"));
        lines.push(format!("{indent}  <text>{}</text>", escape_attr(note)));
        lines.push(format!("{indent} </hook>"));
    }

    for &child in map.children(id) {
        write_topic(map, child, level + 1, config, timestamp, lines);
    }

    lines.push(format!("{indent}</node>"));
}

pub struct FreeMindExporter;

impl Exporter for FreeMindExporter {
    fn name(&self) -> &'static str {
        "FreeMind"
    }

    fn reference(&self) -> &'static str {
        "Exports the mind map as a FreeMind 0.8.1 document"
    }

    fn extension(&self) -> &'static str {
        "mm"
    }

    fn make_options(&self) -> Option<&'static [ExportOptionFlag]> {
        None
    }

    fn do_export(
        &self,
        map: &MindMap,
        config: &MindMapConfig,
        _options: &ExportOptions,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let now = Utc::now();
        let timestamp = now.timestamp_millis();

        let mut lines: Vec<String> = Vec::new();
        lines.push("<?xml version=\"1.0\" encoding=\"UTF-8\"?>".to_string());
        lines.push("<!--".to_string());
        lines.push(format!(
            "Exported {} UTC",
            now.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push("-->".to_string());
        lines.push(format!(
            "<map version=\"0.8.1\" background_color=\"{}\">",
            config.paper_color.to_html()
        ));
        if let Some(root) = map.root() {
            write_topic(map, root, 0, config, timestamp, &mut lines);
        }
        lines.push("</map>".to_string());

        let mut document = lines.join("\r\n");
        document.push_str("\r\n");
        // flush exactly once, also when the write itself failed
        let written = sink.write_all(document.as_bytes());
        let flushed = sink.flush();
        written?;
        flushed?;
        Ok(())
    }
}
