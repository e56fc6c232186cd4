//! Range materializer: turn a located match into a marker element
//!
//! Two construction paths, mirroring how a rendered tree constrains
//! wrapping. When both boundaries fall inside one text leaf the leaf is
//! split and the middle piece wrapped directly. When they fall in different
//! leaves under one parent, the boundary leaves are split and the contiguous
//! sibling run between them is extracted and reinserted under the marker.
//! Boundaries under different parents cannot be wrapped without duplicating
//! or losing structure, so those occurrences fail and are dropped by the
//! caller.

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use crate::index::SegmentIndex;
use crate::locate::SpanMatch;
use crate::model::{AnnotationSpan, DocTree, Marker, NodeId};
use crate::style::{self, PresentationMode};

/// Tag used for marker wrapper elements
pub const MARKER_TAG: &str = "mark";
/// Attribute carrying the marker id, for id-based lookup from the tree
pub const MARKER_ID_ATTR: &str = "data-limelight-id";

/// Wrap the tree region covered by `candidate` in a new marker element.
/// The overlap check against existing markers happens in the registry; by
/// the time this runs the candidate range has been accepted.
pub fn materialize(
    tree: &mut DocTree,
    index: &SegmentIndex,
    candidate: &SpanMatch,
    span: &AnnotationSpan,
    mode: PresentationMode,
) -> Result<Marker> {
    let start = index
        .location(candidate.start)
        .context("match start is outside the indexed text")?;
    let end = index
        .end_location(candidate.end)
        .context("match end is outside the indexed text")?;

    let marker_id = Uuid::new_v4();
    let wrapper = if start.node == end.node {
        wrap_within_leaf(tree, start.node, start.raw_offset, end.raw_offset)?
    } else {
        wrap_sibling_run(tree, start.node, start.raw_offset, end.node, end.raw_offset)?
    };

    decorate(tree, wrapper, marker_id, span, mode);

    Ok(Marker {
        id: marker_id,
        span: span.clone(),
        range: (candidate.start, candidate.end),
        kind: candidate.kind,
        node: wrapper,
    })
}

/// Primary path: both boundaries inside one text leaf
fn wrap_within_leaf(
    tree: &mut DocTree,
    leaf: NodeId,
    raw_start: usize,
    raw_end: usize,
) -> Result<NodeId> {
    let len = tree
        .text(leaf)
        .context("boundary node is not a text leaf")?
        .len();
    if raw_start >= raw_end || raw_end > len {
        bail!("degenerate raw range {}..{}", raw_start, raw_end);
    }
    // Split the tail off first so the start offset stays valid
    if raw_end < len {
        tree.split_text(leaf, raw_end)?;
    }
    let middle = if raw_start > 0 {
        tree.split_text(leaf, raw_start)?
    } else {
        leaf
    };

    let parent = tree.parent(middle).context("leaf is detached")?;
    let position = tree.child_index(middle).context("child index missing")?;
    let wrapper = tree.create_element(MARKER_TAG);
    tree.detach(middle);
    tree.insert_child(parent, position, wrapper)?;
    tree.append_child(wrapper, middle)?;
    Ok(wrapper)
}

/// Fallback path: boundaries in different leaves that share a parent. The
/// run between them may include whole elements (inline markup inside the
/// quotation); those move under the marker intact.
fn wrap_sibling_run(
    tree: &mut DocTree,
    start_leaf: NodeId,
    raw_start: usize,
    end_leaf: NodeId,
    raw_end: usize,
) -> Result<NodeId> {
    let parent = tree.parent(start_leaf).context("start leaf is detached")?;
    let end_parent = tree.parent(end_leaf).context("end leaf is detached")?;
    if parent != end_parent {
        bail!("boundaries span different parents; structure would be torn");
    }

    let end_len = tree
        .text(end_leaf)
        .context("end boundary is not a text leaf")?
        .len();
    if raw_end < end_len && raw_end > 0 {
        // keep the tail of the end leaf outside the marker
        tree.split_text(end_leaf, raw_end)?;
    }
    let first = if raw_start > 0 {
        tree.split_text(start_leaf, raw_start)?
    } else {
        start_leaf
    };

    let from = tree.child_index(first).context("start index missing")?;
    let to = tree.child_index(end_leaf).context("end index missing")?;
    if from > to {
        bail!("boundary order inverted after splitting");
    }
    let run: Vec<NodeId> = tree.children(parent)[from..=to].to_vec();

    let wrapper = tree.create_element(MARKER_TAG);
    for &node in &run {
        tree.detach(node);
    }
    tree.insert_child(parent, from, wrapper)?;
    for &node in &run {
        tree.append_child(wrapper, node)?;
    }
    Ok(wrapper)
}

/// Stamp the wrapper with the span's readable attributes and style classes
fn decorate(
    tree: &mut DocTree,
    wrapper: NodeId,
    marker_id: Uuid,
    span: &AnnotationSpan,
    mode: PresentationMode,
) {
    tree.set_attr(wrapper, MARKER_ID_ATTR, &marker_id.to_string());
    tree.set_attr(wrapper, "class", &style::marker_classes(span.manipulation_type, mode));
    tree.set_attr(
        wrapper,
        "data-manipulation-type",
        span.manipulation_type.as_str(),
    );
    tree.set_attr(wrapper, "data-description", &span.manipulation_description);
    tree.set_attr(wrapper, "data-confidence", &format!("{:.2}", span.confidence));
}
