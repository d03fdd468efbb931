//! Line-oriented text codec for mind map documents.
//!
//! The format is an outline: a free-form header with map attribute lines,
//! a `---` separator, then one `#`-run header line per topic (depth = number
//! of `#`), followed by its attribute lines and extra blocks:
//!
//! ```text
//! Mind Map document
//! > __version__=`1.1`
//! ---
//!
//! # Root text
//! > collapsed=`true`
//! - NOTE
//! <pre>note body, newlines encoded as &#10;</pre>
//! ## Child
//! - FILE {"showWithSystemTool":"true"}
//! <pre>docs/readme.md</pre>
//! ```
//!
//! Parsing is all-or-nothing: malformed input yields [`Error::Parse`] and no
//! partial tree. `parse(pack(T))` is structurally equivalent to `T`.

use crate::error::{Error, Result};
use crate::extra::{Extra, ExtraKind, FileParams};
use crate::map::MindMap;
use crate::topic::TopicId;

const FORMAT_VERSION: &str = "1.1";
const VERSION_ATTR: &str = "__version__";
const HEADER_TITLE: &str = "Mind Map document";

impl MindMap {
    /// Serializes the whole document to text.
    pub fn pack(&self) -> String {
        pack(self)
    }

    /// Parses a serialized document; fails without committing partial state.
    pub fn parse(text: &str) -> Result<MindMap> {
        parse(text)
    }
}

pub fn pack(map: &MindMap) -> String {
    let mut out = String::with_capacity(16384);
    out.push_str(HEADER_TITLE);
    out.push('\n');
    out.push_str("> ");
    out.push_str(VERSION_ATTR);
    out.push_str("=`");
    out.push_str(FORMAT_VERSION);
    out.push_str("`\n");
    for (name, value) in map.map_attributes() {
        if name == VERSION_ATTR {
            continue;
        }
        push_attr_line(&mut out, name, value);
    }
    out.push_str("---\n\n");
    if let Some(root) = map.root() {
        pack_topic(map, root, 1, &mut out);
    }
    out
}

fn pack_topic(map: &MindMap, id: TopicId, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push('#');
    }
    out.push(' ');
    out.push_str(&escape_topic_text(map.text(id)));
    out.push('\n');

    for (name, value) in map.attributes(id) {
        push_attr_line(out, name, value);
    }

    for kind in ExtraKind::ALL {
        let Some(extra) = map.extra(id, kind) else {
            continue;
        };
        out.push_str("- ");
        out.push_str(kind.tag());
        if let Extra::File { params, .. } = extra {
            if !params.is_empty() {
                out.push(' ');
                // IndexMap keeps insertion order, so this stays deterministic.
                out.push_str(&serde_json::to_string(params).unwrap_or_default());
            }
        }
        out.push('\n');
        out.push_str("<pre>");
        out.push_str(&escape_pre(extra.content()));
        out.push_str("</pre>\n");
    }

    for &child in map.children(id) {
        pack_topic(map, child, depth + 1, out);
    }
}

fn push_attr_line(out: &mut String, name: &str, value: &str) {
    out.push_str("> ");
    out.push_str(name);
    out.push_str("=`");
    out.push_str(&escape_attr_value(value));
    out.push_str("`\n");
}

pub fn parse(text: &str) -> Result<MindMap> {
    let mut map = MindMap::empty();
    let mut lines = text.lines().enumerate();

    let mut separated = false;
    for (idx, line) in lines.by_ref() {
        let line = line.trim_end();
        if line == "---" {
            separated = true;
            break;
        }
        if let Some(rest) = line.strip_prefix("> ") {
            let (name, value) = parse_attr_line(rest, idx + 1)?;
            // the version marker is part of the framing, not document data
            if name != VERSION_ATTR {
                map.set_map_attribute(&name, Some(&value));
            }
        }
        // anything else in the header is free-form title text
    }
    if !separated {
        return Err(Error::parse(1, "missing `---` document separator"));
    }

    // (depth, topic) stack of the current branch
    let mut stack: Vec<(usize, TopicId)> = Vec::new();

    while let Some((idx, raw)) = lines.next() {
        let line_no = idx + 1;
        // only the line terminator may be stripped here: topic text may be
        // empty or end in spaces, so `# ` and `# abc   ` must survive intact
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with('#') {
            let depth = line.chars().take_while(|&c| c == '#').count();
            let rest = &line[depth..];
            let Some(rest) = rest.strip_prefix(' ') else {
                return Err(Error::parse(line_no, "expected space after topic marker"));
            };
            let topic_text = unescape_topic_text(rest);
            if depth == 1 {
                if map.root().is_some() {
                    return Err(Error::parse(line_no, "multiple root topics"));
                }
                let root = map.install_root(topic_text);
                stack.clear();
                stack.push((1, root));
            } else {
                while stack.last().is_some_and(|&(d, _)| d >= depth) {
                    stack.pop();
                }
                let Some(&(parent_depth, parent)) = stack.last() else {
                    return Err(Error::parse(line_no, "topic without a root"));
                };
                if parent_depth != depth - 1 {
                    return Err(Error::parse(line_no, "invalid topic depth jump"));
                }
                let Some(id) = map.add_child(parent, topic_text) else {
                    return Err(Error::parse(line_no, "invalid topic parent"));
                };
                stack.push((depth, id));
            }
        } else if let Some(rest) = line.strip_prefix("> ") {
            let Some(&(_, topic)) = stack.last() else {
                return Err(Error::parse(line_no, "attribute outside of a topic"));
            };
            let (name, value) = parse_attr_line(rest, line_no)?;
            map.set_attribute(topic, &name, Some(&value));
        } else if let Some(rest) = line.strip_prefix("- ") {
            let Some(&(_, topic)) = stack.last() else {
                return Err(Error::parse(line_no, "extra outside of a topic"));
            };
            let extra = parse_extra(rest, line_no, &mut lines)?;
            if map.extra(topic, extra.kind()).is_some() {
                return Err(Error::parse(line_no, "duplicate extra kind on topic"));
            }
            map.set_extra(topic, extra);
        } else {
            return Err(Error::parse(line_no, "unexpected line"));
        }
    }

    Ok(map)
}

fn parse_extra<'a>(
    rest: &str,
    line_no: usize,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Result<Extra> {
    let (tag, params_raw) = match rest.find(' ') {
        Some(pos) => (&rest[..pos], rest[pos + 1..].trim()),
        None => (rest, ""),
    };
    let Some(kind) = ExtraKind::from_tag(tag) else {
        return Err(Error::parse(line_no, format!("unknown extra kind `{tag}`")));
    };

    let params: FileParams = if params_raw.is_empty() {
        FileParams::new()
    } else if kind == ExtraKind::File {
        serde_json::from_str(params_raw)
            .map_err(|e| Error::parse(line_no, format!("malformed FILE parameters: {e}")))?
    } else {
        return Err(Error::parse(
            line_no,
            "parameters are only allowed on FILE extras",
        ));
    };

    let Some((payload_idx, payload_raw)) = lines.next() else {
        return Err(Error::parse(line_no, "missing extra payload line"));
    };
    let payload_line = payload_raw.trim_end();
    let inner = payload_line
        .strip_prefix("<pre>")
        .and_then(|s| s.strip_suffix("</pre>"));
    let Some(inner) = inner else {
        return Err(Error::parse(
            payload_idx + 1,
            "extra payload must be a single `<pre>…</pre>` line",
        ));
    };
    let content = unescape_pre(inner);

    Ok(match kind {
        ExtraKind::Note => Extra::Note(content),
        ExtraKind::File => Extra::File {
            uri: content,
            params,
        },
        ExtraKind::Link => Extra::Link(content),
        ExtraKind::TopicJump => Extra::TopicJump(content),
    })
}

fn parse_attr_line(rest: &str, line_no: usize) -> Result<(String, String)> {
    let Some(eq) = rest.find('=') else {
        return Err(Error::parse(line_no, "attribute line without `=`"));
    };
    let name = rest[..eq].trim();
    if name.is_empty() {
        return Err(Error::parse(line_no, "attribute with empty name"));
    }
    let Some(quoted) = rest[eq + 1..].strip_prefix('`') else {
        return Err(Error::parse(
            line_no,
            "attribute value must be backtick quoted",
        ));
    };

    let mut value = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    let mut closed = false;
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('n') => value.push('\n'),
                Some(other) => value.push(other),
                None => {
                    return Err(Error::parse(line_no, "dangling escape in attribute value"));
                }
            },
            '`' => {
                closed = true;
                break;
            }
            other => value.push(other),
        }
    }
    if !closed {
        return Err(Error::parse(line_no, "unterminated attribute value"));
    }
    Ok((name.to_string(), value))
}

// -- escaping ------------------------------------------------------------

fn escape_topic_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn unescape_topic_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn escape_attr_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn escape_pre(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("&#10;"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn unescape_pre(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(stripped) = tail.strip_prefix("&amp;") {
            out.push('&');
            rest = stripped;
        } else if let Some(stripped) = tail.strip_prefix("&lt;") {
            out.push('<');
            rest = stripped;
        } else if let Some(stripped) = tail.strip_prefix("&gt;") {
            out.push('>');
            rest = stripped;
        } else if let Some(stripped) = tail.strip_prefix("&#10;") {
            out.push('\n');
            rest = stripped;
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra::FILE_PARAM_SHOW_WITH_SYSTEM_TOOL;
    use crate::topic::{ATTR_COLLAPSED, ATTR_LEFT_SIDE};

    fn sample_map() -> MindMap {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_text(root, "Root & <topic>");
        map.set_map_attribute("fillColor", Some("#112233"));

        let a = map.add_child(root, "left one").unwrap();
        map.set_left_sided(a, true);
        map.set_extra(a, Extra::Note("first line\nsecond <line>".into()));

        let b = map.add_child(root, "right `quoted`").unwrap();
        map.set_collapsed(b, true);
        let mut params = FileParams::new();
        params.insert(FILE_PARAM_SHOW_WITH_SYSTEM_TOOL.into(), "true".into());
        map.set_extra(
            b,
            Extra::File {
                uri: "docs/plan docs/spec & notes.md notes.md".into(),
                params,
            },
        );
        map.set_extra(b, Extra::Link("https://example.com/?a=1&b=2".into()));

        let b1 = map.add_child(b, "deep\nmultiline").unwrap();
        let jump = map.make_topic_jump(a).unwrap();
        map.set_extra(b1, jump);
        map
    }

    fn assert_equivalent(a: &MindMap, b: &MindMap) {
        // packing is deterministic, so structural equivalence reduces to
        // comparing packed text
        assert_eq!(a.pack(), b.pack());
    }

    #[test]
    fn round_trip_preserves_structure_and_content() {
        let map = sample_map();
        let rebuilt = MindMap::parse(&map.pack()).unwrap();
        assert_equivalent(&map, &rebuilt);

        let root = rebuilt.root().unwrap();
        assert_eq!(rebuilt.text(root), "Root & <topic>");
        assert_eq!(rebuilt.children(root).len(), 2);
        assert_eq!(rebuilt.map_attribute("fillColor"), Some("#112233"));

        let a = rebuilt.children(root)[0];
        assert!(rebuilt.is_left_sided(a));
        assert_eq!(
            rebuilt.extra(a, ExtraKind::Note),
            Some(&Extra::Note("first line\nsecond <line>".into()))
        );

        let b = rebuilt.children(root)[1];
        assert!(rebuilt.is_collapsed(b));
        let Some(Extra::File { uri, params }) = rebuilt.extra(b, ExtraKind::File) else {
            panic!("expected FILE extra");
        };
        assert_eq!(uri, "docs/plan docs/spec & notes.md notes.md");
        assert_eq!(params.get("showWithSystemTool").map(String::as_str), Some("true"));
    }

    #[test]
    fn empty_topic_text_round_trips() {
        // MindMap::new() itself produces an empty-text root
        let map = MindMap::new();
        let rebuilt = MindMap::parse(&map.pack()).unwrap();
        let root = rebuilt.root().unwrap();
        assert_eq!(rebuilt.text(root), "");
        assert_equivalent(&map, &rebuilt);

        let mut nested = MindMap::new();
        let r = nested.root().unwrap();
        nested.add_child(r, "");
        let rebuilt = MindMap::parse(&nested.pack()).unwrap();
        let child = rebuilt.children(rebuilt.root().unwrap())[0];
        assert_eq!(rebuilt.text(child), "");
    }

    #[test]
    fn trailing_whitespace_in_topic_text_round_trips() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_text(root, "abc   ");
        map.add_child(root, "   ");

        let rebuilt = MindMap::parse(&map.pack()).unwrap();
        let r = rebuilt.root().unwrap();
        assert_eq!(rebuilt.text(r), "abc   ");
        assert_eq!(rebuilt.text(rebuilt.children(r)[0]), "   ");
    }

    #[test]
    fn version_marker_does_not_become_a_map_attribute() {
        let map = MindMap::new();
        let rebuilt = MindMap::parse(&map.pack()).unwrap();
        assert_eq!(rebuilt.map_attribute("__version__"), None);
        assert_eq!(rebuilt.map_attributes().count(), 0);
    }

    #[test]
    fn round_trip_is_stable_after_one_cycle() {
        let packed = sample_map().pack();
        let repacked = MindMap::parse(&packed).unwrap().pack();
        assert_eq!(packed, repacked);
    }

    #[test]
    fn packed_notes_are_single_line() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_extra(root, Extra::Note("a\nb\nc".into()));
        let packed = map.pack();
        assert!(packed.contains("<pre>a&#10;b&#10;c</pre>"));
    }

    #[test]
    fn rootless_map_round_trips() {
        let map = MindMap::empty();
        let rebuilt = MindMap::parse(&map.pack()).unwrap();
        assert!(rebuilt.root().is_none());
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = MindMap::parse("Just a header line\n# Root\n").unwrap_err();
        assert!(err.to_string().contains("document separator"));
    }

    #[test]
    fn multiple_roots_are_rejected() {
        let err = MindMap::parse("---\n# one\n# two\n").unwrap_err();
        assert!(err.to_string().contains("multiple root topics"));
    }

    #[test]
    fn depth_jump_is_rejected() {
        let err = MindMap::parse("---\n# root\n### grandchild\n").unwrap_err();
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn child_before_root_is_rejected() {
        let err = MindMap::parse("---\n## floating\n").unwrap_err();
        assert!(err.to_string().contains("without a root"));
    }

    #[test]
    fn malformed_extra_payload_is_rejected() {
        let err = MindMap::parse("---\n# root\n- NOTE\nno pre block\n").unwrap_err();
        assert!(err.to_string().contains("<pre>"));
    }

    #[test]
    fn unknown_extra_kind_is_rejected() {
        let err = MindMap::parse("---\n# root\n- BOGUS\n<pre>x</pre>\n").unwrap_err();
        assert!(err.to_string().contains("unknown extra kind"));
    }

    #[test]
    fn duplicate_extra_kind_is_rejected() {
        let text = "---\n# root\n- NOTE\n<pre>a</pre>\n- NOTE\n<pre>b</pre>\n";
        let err = MindMap::parse(text).unwrap_err();
        assert!(err.to_string().contains("duplicate extra"));
    }

    #[test]
    fn unterminated_attribute_is_rejected() {
        let err = MindMap::parse("---\n# root\n> collapsed=`true\n").unwrap_err();
        assert!(err.to_string().contains("unterminated attribute"));
    }

    #[test]
    fn attribute_escaping_round_trips() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_attribute(root, "weird", Some("back`tick\\slash\nline"));
        let rebuilt = MindMap::parse(&map.pack()).unwrap();
        let r = rebuilt.root().unwrap();
        assert_eq!(rebuilt.attribute(r, "weird"), Some("back`tick\\slash\nline"));
    }

    #[test]
    fn collapse_and_side_attributes_survive() {
        let packed = "---\n# root\n## c\n> collapsed=`true`\n> leftSide=`true`\n";
        let map = MindMap::parse(packed).unwrap();
        let c = map.children(map.root().unwrap())[0];
        assert_eq!(map.attribute(c, ATTR_COLLAPSED), Some("true"));
        assert_eq!(map.attribute(c, ATTR_LEFT_SIDE), Some("true"));
    }
}
