//! Text index: ordered, offset-addressed view of the rendered text
//!
//! The index is rebuilt fresh before every classification pass. All offsets
//! are byte offsets into the shared normalized string; segments are joined
//! by exactly one separator space, so the concatenated text is itself in
//! normalized form.

use crate::model::{DocTree, NodeData, NodeId};

/// Collapse whitespace runs to a single space and trim the ends.
/// Deterministic and idempotent.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// A minimal contiguous run of renderable text under one text leaf
#[derive(Debug, Clone)]
pub struct Segment {
    pub node: NodeId,
    pub raw: String,
    pub norm: String,
    /// `[start, end)` in the shared normalized string
    pub start: usize,
    pub end: usize,
}

/// A tree position expressed as a text leaf plus a raw byte offset into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub raw_offset: usize,
}

#[derive(Debug, Clone)]
pub struct SegmentIndex {
    pub segments: Vec<Segment>,
    /// Concatenation of all segment norms, one space between segments
    pub text: String,
}

/// Tags whose subtree never renders text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

fn renders_text(tree: &DocTree, id: NodeId) -> bool {
    match tree.data(id) {
        Some(NodeData::Element { tag, .. }) => {
            !SKIPPED_TAGS.contains(&tag.as_str())
                && tree.attr(id, "hidden").is_none()
                && tree.attr(id, "aria-hidden") != Some("true")
        }
        Some(NodeData::Text(_)) => true,
        None => false,
    }
}

/// Raw, unnormalized concatenation of every visible text leaf under `root`.
/// Used to check that annotation and teardown leave the text byte-identical.
pub fn raw_text(tree: &DocTree, root: NodeId) -> String {
    fn visit(tree: &DocTree, id: NodeId, out: &mut String) {
        if !renders_text(tree, id) {
            return;
        }
        if let Some(text) = tree.text(id) {
            out.push_str(text);
            return;
        }
        for &child in tree.children(id) {
            visit(tree, child, out);
        }
    }
    let mut out = String::new();
    visit(tree, root, &mut out);
    out
}

/// Normalized text as the reader sees it. Unlike the matching index, which
/// always joins segments with one space, a separator appears here only when
/// the raw bytes around the boundary contain whitespace. Splitting a leaf at
/// a non-whitespace position therefore never changes the result, so wrapping
/// markers leaves the rendered text untouched.
pub fn rendered_text(tree: &DocTree, root: NodeId) -> String {
    fn visit(tree: &DocTree, id: NodeId, out: &mut String, boundary_ws: &mut bool) {
        if !renders_text(tree, id) {
            return;
        }
        if let Some(raw) = tree.text(id) {
            let norm = normalize(raw);
            if norm.is_empty() {
                *boundary_ws |= raw.chars().any(char::is_whitespace);
                return;
            }
            let leading_ws = raw.chars().next().is_some_and(char::is_whitespace);
            if !out.is_empty() && (*boundary_ws || leading_ws) {
                out.push(' ');
            }
            out.push_str(&norm);
            *boundary_ws = raw.chars().last().is_some_and(char::is_whitespace);
            return;
        }
        for &child in tree.children(id) {
            visit(tree, child, out, boundary_ws);
        }
    }
    let mut out = String::new();
    let mut boundary_ws = false;
    visit(tree, root, &mut out, &mut boundary_ws);
    out
}

impl SegmentIndex {
    /// Walk the tree region under `root` and index every visible text leaf
    pub fn build(tree: &DocTree, root: NodeId) -> Self {
        let mut index = Self {
            segments: Vec::new(),
            text: String::new(),
        };
        index.visit(tree, root);
        index
    }

    fn visit(&mut self, tree: &DocTree, id: NodeId) {
        if !renders_text(tree, id) {
            return;
        }
        if let Some(raw) = tree.text(id) {
            let norm = normalize(raw);
            if norm.is_empty() {
                return;
            }
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            let start = self.text.len();
            self.text.push_str(&norm);
            self.segments.push(Segment {
                node: id,
                raw: raw.to_string(),
                norm,
                start,
                end: self.text.len(),
            });
            return;
        }
        for &child in tree.children(id) {
            self.visit(tree, child);
        }
    }

    /// Segment owning a match start: `start <= offset < end`
    fn segment_at(&self, offset: usize) -> Option<&Segment> {
        let i = self.segments.partition_point(|s| s.end <= offset);
        self.segments.get(i).filter(|s| s.start <= offset)
    }

    /// Segment owning a match end (exclusive): `start < offset <= end`
    fn segment_at_end(&self, offset: usize) -> Option<&Segment> {
        let i = self.segments.partition_point(|s| s.end < offset);
        self.segments.get(i).filter(|s| s.start < offset)
    }

    /// Map a normalized offset to the tree position where that normalized
    /// unit begins. Fails only when the offset falls outside every segment.
    pub fn location(&self, offset: usize) -> Option<Boundary> {
        let seg = self.segment_at(offset)?;
        Some(Boundary {
            node: seg.node,
            raw_offset: denormalize(&seg.raw, offset - seg.start, false),
        })
    }

    /// Map an exclusive normalized end offset to the tree position just
    /// after the raw text that produced it.
    pub fn end_location(&self, offset: usize) -> Option<Boundary> {
        let seg = self.segment_at_end(offset)?;
        Some(Boundary {
            node: seg.node,
            raw_offset: denormalize(&seg.raw, offset - seg.start, true),
        })
    }
}

/// Walk raw characters counting normalized bytes: each non-whitespace char
/// contributes its UTF-8 length, each interior whitespace run contributes
/// one. Leading whitespace contributes nothing. With `want_end` the offset
/// returned is the raw byte just past the unit ending at `target`; otherwise
/// it is the raw byte where the unit at `target` starts. Clamped to the raw
/// text's bounds.
fn denormalize(raw: &str, target: usize, want_end: bool) -> usize {
    let mut norm_pos = 0usize;
    let mut started = false;
    let mut chars = raw.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch.is_whitespace() {
            let mut after = i + ch.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                chars.next();
                after = j + next.len_utf8();
            }
            if !started {
                continue;
            }
            if !want_end && norm_pos == target {
                return i;
            }
            norm_pos += 1;
            if want_end && norm_pos >= target {
                return after;
            }
        } else {
            started = true;
            if !want_end && norm_pos == target {
                return i;
            }
            norm_pos += ch.len_utf8();
            if want_end && norm_pos >= target {
                return i + ch.len_utf8();
            }
        }
    }
    raw.len()
}
