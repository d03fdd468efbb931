//! Pattern search over topic text and extras with directional cursor
//! semantics.
//!
//! Each call covers exactly one direction without wrapping; wrap-around is a
//! caller-level two-call protocol (retry with `start = None`).

use std::path::Path;

use regex::Regex;

use crate::extra::{Extra, ExtraKind};
use crate::map::MindMap;
use crate::topic::TopicId;

impl MindMap {
    /// First matching topic strictly after `start` in pre-order, or from the
    /// start of the tree when `start` is `None` (or stale).
    pub fn find_next(
        &self,
        base_folder: Option<&Path>,
        start: Option<TopicId>,
        pattern: &Regex,
        in_topic_text: bool,
        extras: &[ExtraKind],
    ) -> Option<TopicId> {
        let order = self.pre_order();
        let skip = start_offset(&order, start);
        order
            .into_iter()
            .skip(skip)
            .find(|&id| self.topic_matches(base_folder, id, pattern, in_topic_text, extras))
    }

    /// First matching topic strictly before `start` in reverse pre-order, or
    /// from the end of the tree when `start` is `None` (or stale).
    pub fn find_prev(
        &self,
        base_folder: Option<&Path>,
        start: Option<TopicId>,
        pattern: &Regex,
        in_topic_text: bool,
        extras: &[ExtraKind],
    ) -> Option<TopicId> {
        let mut order = self.pre_order();
        order.reverse();
        let skip = start_offset(&order, start);
        order
            .into_iter()
            .skip(skip)
            .find(|&id| self.topic_matches(base_folder, id, pattern, in_topic_text, extras))
    }

    fn topic_matches(
        &self,
        base_folder: Option<&Path>,
        id: TopicId,
        pattern: &Regex,
        in_topic_text: bool,
        extras: &[ExtraKind],
    ) -> bool {
        if in_topic_text && pattern.is_match(self.text(id)) {
            return true;
        }
        for extra in self.extras(id) {
            if !extras.contains(&extra.kind()) {
                continue;
            }
            match extra {
                Extra::File { uri, .. } => {
                    // Relative URIs need the caller's base folder; when it is
                    // missing the criterion is skipped, not failed.
                    let Some(resolved) = resolve_file_uri(base_folder, uri) else {
                        tracing::debug!(uri = %uri, "skipping FILE extra with unresolvable uri");
                        continue;
                    };
                    if pattern.is_match(&resolved) {
                        return true;
                    }
                }
                other => {
                    if pattern.is_match(other.content()) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn start_offset(order: &[TopicId], start: Option<TopicId>) -> usize {
    match start {
        Some(s) => order.iter().position(|&t| t == s).map_or(0, |i| i + 1),
        None => 0,
    }
}

fn resolve_file_uri(base_folder: Option<&Path>, uri: &str) -> Option<String> {
    if uri.contains("://") || Path::new(uri).is_absolute() {
        return Some(uri.to_string());
    }
    base_folder.map(|base| base.join(uri).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra::FileParams;

    fn rx(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn note_search_is_total_with_caller_side_wrap() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.add_child(root, "first");
        let hit = map.add_child(root, "second").unwrap();
        map.set_extra(hit, Extra::Note("contains X marker".into()));

        let pattern = rx("X");
        let kinds = [ExtraKind::Note];

        // whole-tree search finds the only match
        assert_eq!(map.find_next(None, None, &pattern, false, &kinds), Some(hit));
        // strictly-after semantics: starting from the match finds nothing
        assert_eq!(map.find_next(None, Some(hit), &pattern, false, &kinds), None);
        // the caller-level wrap call finds it again
        assert_eq!(map.find_next(None, None, &pattern, false, &kinds), Some(hit));
    }

    #[test]
    fn find_prev_walks_reverse_pre_order() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        let a = map.add_child(root, "match a").unwrap();
        let b = map.add_child(root, "match b").unwrap();

        let pattern = rx("match");
        assert_eq!(map.find_prev(None, None, &pattern, true, &[]), Some(b));
        assert_eq!(map.find_prev(None, Some(b), &pattern, true, &[]), Some(a));
        assert_eq!(map.find_prev(None, Some(a), &pattern, true, &[]), None);
    }

    #[test]
    fn text_matching_requires_text_flag() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_text(root, "needle");
        let pattern = rx("needle");
        assert_eq!(map.find_next(None, None, &pattern, false, &[]), None);
        assert_eq!(map.find_next(None, None, &pattern, true, &[]), Some(root));
    }

    #[test]
    fn extra_kind_filter_is_respected() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_extra(root, Extra::Link("http://needle.example".into()));
        let pattern = rx("needle");
        assert_eq!(
            map.find_next(None, None, &pattern, false, &[ExtraKind::Note]),
            None
        );
        assert_eq!(
            map.find_next(None, None, &pattern, false, &[ExtraKind::Link]),
            Some(root)
        );
    }

    #[test]
    fn relative_file_uri_resolves_against_base_folder() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_extra(
            root,
            Extra::File {
                uri: "docs/readme.md".into(),
                params: FileParams::new(),
            },
        );
        let pattern = rx("project/docs");
        let kinds = [ExtraKind::File];

        // without a base folder the relative URI cannot resolve: skipped
        assert_eq!(map.find_next(None, None, &pattern, false, &kinds), None);
        // with one, the resolved path participates in matching
        assert_eq!(
            map.find_next(Some(Path::new("/project")), None, &pattern, false, &kinds),
            Some(root)
        );
    }

    #[test]
    fn unresolvable_file_does_not_poison_other_criteria() {
        let mut map = MindMap::new();
        let root = map.root().unwrap();
        map.set_extra(
            root,
            Extra::File {
                uri: "rel/path".into(),
                params: FileParams::new(),
            },
        );
        map.set_extra(root, Extra::Note("note with needle".into()));
        let pattern = rx("needle");
        assert_eq!(
            map.find_next(
                None,
                None,
                &pattern,
                false,
                &[ExtraKind::File, ExtraKind::Note]
            ),
            Some(root)
        );
    }
}
