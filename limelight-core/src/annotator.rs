//! Annotation registry: owns the live markers and the apply/clear contract
//!
//! `apply` runs the whole index -> locate -> map -> materialize pipeline
//! synchronously; nothing in here yields or errors out to the caller. Spans
//! that cannot be located, occurrences that collide with an existing
//! marker, and occurrences the tree refuses to wrap are all dropped, and
//! the pass degrades to the subset that worked.

use std::collections::HashMap;

use log::{debug, warn};
use uuid::Uuid;

use crate::index::SegmentIndex;
use crate::locate::{self, SpanMatch, DEFAULT_FUZZY_THRESHOLD};
use crate::materialize::materialize;
use crate::model::{AnnotationSpan, Document, Marker, NodeId};
use crate::style::{self, PresentationMode};

/// Outcome counters for one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub spans_total: usize,
    /// Spans with at least one located occurrence
    pub spans_located: usize,
    pub markers_created: usize,
    /// Occurrences skipped because they intersected an accepted one
    pub overlap_skipped: usize,
    /// Occurrences the tree could not wrap
    pub materialize_failed: usize,
}

/// Owns the id -> marker map for one document view
#[derive(Debug)]
pub struct Annotator {
    markers: HashMap<Uuid, Marker>,
    order: Vec<Uuid>,
    fuzzy_threshold: f64,
}

impl Annotator {
    pub fn new() -> Self {
        Self {
            markers: HashMap::new(),
            order: Vec::new(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    pub fn with_fuzzy_threshold(threshold: f64) -> Self {
        Self {
            fuzzy_threshold: threshold,
            ..Self::new()
        }
    }

    /// Locate and wrap every span occurrence. Clears any markers from a
    /// previous pass first, then rebuilds the index against the current
    /// tree state.
    pub fn apply_annotations(
        &mut self,
        doc: &mut Document,
        spans: &[AnnotationSpan],
        mode: PresentationMode,
    ) -> ApplyReport {
        self.clear_annotations(doc);
        style::ensure_stylesheet(&mut doc.tree, mode);

        let index = SegmentIndex::build(&doc.tree, doc.tree.root());
        let mut report = ApplyReport {
            spans_total: spans.len(),
            ..ApplyReport::default()
        };

        // Claim ranges span by span, in arrival order, before touching the
        // tree; earlier spans win overlap conflicts. A claim stands even if
        // its wrap later fails, so an occurrence blocked by a claim stays
        // blocked for the rest of the pass. Coordinates all resolve against
        // this one index, which mutating the tree mid-claim would invalidate.
        let mut accepted: Vec<(SpanMatch, &AnnotationSpan)> = Vec::new();
        let mut claimed: Vec<SpanMatch> = Vec::new();
        for span in spans {
            let matches = locate::locate(&index.text, &span.original_text, self.fuzzy_threshold);
            if matches.is_empty() {
                debug!(
                    "no occurrence of {:?} span {:?}",
                    span.manipulation_type,
                    preview(&span.original_text)
                );
                continue;
            }
            report.spans_located += 1;
            for m in matches {
                if claimed.iter().any(|c| c.intersects(&m)) {
                    debug!(
                        "occurrence at {}..{} overlaps an existing marker, skipped",
                        m.start, m.end
                    );
                    report.overlap_skipped += 1;
                    continue;
                }
                claimed.push(m);
                accepted.push((m, span));
            }
        }

        // Materialize back to front so boundary splits never invalidate the
        // coordinates of occurrences still waiting.
        accepted.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        for (m, span) in accepted {
            match materialize(&mut doc.tree, &index, &m, span, mode) {
                Ok(marker) => {
                    self.order.push(marker.id);
                    self.markers.insert(marker.id, marker);
                    report.markers_created += 1;
                }
                Err(e) => {
                    warn!(
                        "could not wrap occurrence at {}..{}: {:#}",
                        m.start, m.end, e
                    );
                    report.materialize_failed += 1;
                }
            }
        }

        doc.touch();
        report
    }

    /// Unwrap every marker, restoring the tree to a state textually and
    /// structurally indistinguishable from before annotation. Idempotent;
    /// markers whose wrapper was already removed by outside mutation are
    /// skipped without complaint.
    pub fn clear_annotations(&mut self, doc: &mut Document) {
        if self.markers.is_empty() {
            return;
        }
        for id in std::mem::take(&mut self.order) {
            let Some(marker) = self.markers.remove(&id) else {
                continue;
            };
            let node = marker.node;
            if !doc.tree.contains(node) {
                debug!("marker {} already gone from the tree", id);
                continue;
            }
            let Some(parent) = doc.tree.parent(node) else {
                continue;
            };
            let Some(position) = doc.tree.child_index(node) else {
                continue;
            };
            let children = doc.tree.children(node).to_vec();
            for (offset, child) in children.into_iter().enumerate() {
                doc.tree.detach(child);
                let _ = doc.tree.insert_child(parent, position + offset, child);
            }
            doc.tree.remove(node);
            doc.tree.merge_adjacent_text(parent);
        }
        doc.touch();
    }

    /// Remove annotation state and the injected stylesheet; call when the
    /// hosting view unloads.
    pub fn unload(&mut self, doc: &mut Document) {
        self.clear_annotations(doc);
        style::remove_stylesheet(&mut doc.tree);
    }

    pub fn marker(&self, id: Uuid) -> Option<&Marker> {
        self.markers.get(&id)
    }

    /// Marker owning a wrapper node, for hover/click hit testing
    pub fn marker_for_node(&self, node: NodeId) -> Option<&Marker> {
        self.markers.values().find(|m| m.node == node)
    }

    /// Live markers in document order
    pub fn markers(&self) -> Vec<&Marker> {
        let mut all: Vec<&Marker> = self.markers.values().collect();
        all.sort_by_key(|m| m.range.0);
        all
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

fn preview(text: &str) -> &str {
    let mut end = text.len().min(40);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::MatchKind;
    use crate::model::ManipulationType;

    fn span(text: &str, ty: ManipulationType, confidence: f32) -> AnnotationSpan {
        AnnotationSpan {
            original_text: text.to_string(),
            manipulation_type: ty,
            manipulation_description: format!("{} detected", ty.label()),
            confidence,
        }
    }

    fn doc(content: &str) -> Document {
        Document::from_plain_text("test".to_string(), content)
    }

    #[test]
    fn test_single_span_scenario() {
        let mut doc =
            doc("The sky is falling and you should be very afraid of what comes next.\n");
        let mut annotator = Annotator::new();

        let report = annotator.apply_annotations(
            &mut doc,
            &[span(
                "you should be very afraid",
                ManipulationType::FearMongering,
                0.9,
            )],
            PresentationMode::FullColor,
        );

        assert_eq!(report.markers_created, 1);
        let markers = annotator.markers();
        let marker = markers[0];
        assert_eq!(marker.kind, MatchKind::Exact);
        let wrapped: String = doc
            .tree
            .children(marker.node)
            .iter()
            .filter_map(|&c| doc.tree.text(c))
            .collect();
        assert_eq!(wrapped, "you should be very afraid");
        assert_eq!(
            doc.tree.attr(marker.node, "data-manipulation-type"),
            Some("fear_mongering")
        );
    }

    #[test]
    fn test_round_trip_for_exact_substring() {
        let mut doc = doc("Officials warn that\nthe economy is collapsing\nfaster than expected.\n");
        let rendered = doc.rendered_text();
        let target = "economy is collapsing faster";
        assert!(rendered.contains(target));

        let mut annotator = Annotator::new();
        let report = annotator.apply_annotations(
            &mut doc,
            &[span(target, ManipulationType::FearMongering, 0.8)],
            PresentationMode::FullColor,
        );

        assert!(report.markers_created >= 1);
        let markers = annotator.markers();
        let marker = markers[0];
        let index = SegmentIndex::build(&doc.tree, marker.node);
        assert_eq!(index.text, target);
    }

    #[test]
    fn test_clear_restores_text_and_is_idempotent() {
        let mut doc = doc("The sky is falling and you should be very afraid.\n\nStay calm.\n");
        let before = doc.rendered_text();
        let before_raw = doc.raw_text();
        let mut annotator = Annotator::new();

        annotator.apply_annotations(
            &mut doc,
            &[
                span("you should be very afraid", ManipulationType::FearMongering, 0.9),
                span("Stay calm", ManipulationType::EmotionalAppeal, 0.4),
            ],
            PresentationMode::FullColor,
        );
        assert_eq!(annotator.len(), 2);
        // annotation must not change the rendered text either
        assert_eq!(doc.rendered_text(), before);

        annotator.clear_annotations(&mut doc);
        assert!(annotator.is_empty());
        assert_eq!(doc.rendered_text(), before);
        assert_eq!(doc.raw_text(), before_raw);
        // no marker elements survive
        let mut stack = vec![doc.tree.root()];
        while let Some(id) = stack.pop() {
            assert_ne!(doc.tree.tag(id), Some("mark"));
            stack.extend(doc.tree.children(id));
        }

        // second clear is a no-op
        annotator.clear_annotations(&mut doc);
        assert_eq!(doc.rendered_text(), before);
    }

    #[test]
    fn test_clear_restores_structure_after_cross_leaf_wrap() {
        let mut doc = doc("line one ends here\nline two starts here\n");
        let before_rendered = doc.rendered_text();
        let before_raw = doc.raw_text();
        let mut annotator = Annotator::new();

        // crosses the leaf boundary inside one paragraph
        annotator.apply_annotations(
            &mut doc,
            &[span("ends here line two", ManipulationType::Repetition, 0.6)],
            PresentationMode::FullColor,
        );
        assert_eq!(annotator.len(), 1);

        annotator.clear_annotations(&mut doc);
        assert_eq!(doc.rendered_text(), before_rendered);
        assert_eq!(doc.raw_text(), before_raw);
        // stylesheet sits at index 0 after the first apply
        let p = doc.tree.children(doc.tree.root())[1];
        assert_eq!(doc.tree.tag(p), Some("p"));
        // split leaves were merged back into one text run
        assert_eq!(doc.tree.children(p).len(), 1);
        assert_eq!(
            doc.tree.text(doc.tree.children(p)[0]),
            Some("line one ends here\nline two starts here\n")
        );
    }

    #[test]
    fn test_overlapping_spans_first_wins() {
        let mut doc = doc("you should be very afraid of what comes next\n");
        let mut annotator = Annotator::new();

        let report = annotator.apply_annotations(
            &mut doc,
            &[
                span("you should be very afraid", ManipulationType::FearMongering, 0.9),
                span("be very afraid of what", ManipulationType::Hyperbole, 0.7),
            ],
            PresentationMode::FullColor,
        );

        assert_eq!(report.markers_created, 1);
        assert_eq!(report.overlap_skipped, 1);
        let markers = annotator.markers();
        assert_eq!(
            markers[0].span.manipulation_type,
            ManipulationType::FearMongering
        );
        // no nested markers
        for marker in markers {
            for &child in doc.tree.children(marker.node) {
                assert_ne!(doc.tree.tag(child), Some("mark"));
            }
        }
    }

    #[test]
    fn test_failed_wrap_still_blocks_overlapping_claims() {
        // "sky is" crosses the paragraph boundary, so its wrap fails; the
        // range it claimed still shadows the overlapping "sky" span
        let mut doc = doc("the sky\n\nis falling\n");
        let mut annotator = Annotator::new();
        let report = annotator.apply_annotations(
            &mut doc,
            &[
                span("sky is", ManipulationType::Hyperbole, 0.8),
                span("sky", ManipulationType::LoadedLanguage, 0.6),
            ],
            PresentationMode::FullColor,
        );
        assert_eq!(report.materialize_failed, 1);
        assert_eq!(report.overlap_skipped, 1);
        assert_eq!(report.markers_created, 0);
        assert!(annotator.is_empty());
    }

    #[test]
    fn test_unlocatable_span_is_dropped_silently() {
        let mut doc = doc("nothing interesting here\n");
        let mut annotator = Annotator::new();
        let report = annotator.apply_annotations(
            &mut doc,
            &[span(
                "completely absent quotation text",
                ManipulationType::Strawman,
                0.9,
            )],
            PresentationMode::FullColor,
        );
        assert_eq!(report.spans_total, 1);
        assert_eq!(report.spans_located, 0);
        assert_eq!(report.markers_created, 0);
        assert!(annotator.is_empty());
    }

    #[test]
    fn test_fuzzy_fallback_produces_approximate_marker() {
        let mut doc = doc("be very afraid of of the the future future very afraid friends\n");
        let mut annotator = Annotator::new();
        let report = annotator.apply_annotations(
            &mut doc,
            &[span(
                "be very afraid of the future",
                ManipulationType::FearMongering,
                0.75,
            )],
            PresentationMode::FullColor,
        );
        assert_eq!(report.markers_created, 1);
        assert_eq!(annotator.markers()[0].kind, MatchKind::Approximate);
    }

    #[test]
    fn test_repeated_apply_supersedes_previous_pass() {
        let mut doc = doc("the sky is falling\n");
        let before = doc.rendered_text();
        let mut annotator = Annotator::new();

        let spans = [span("sky is falling", ManipulationType::FearMongering, 0.9)];
        annotator.apply_annotations(&mut doc, &spans, PresentationMode::FullColor);
        annotator.apply_annotations(&mut doc, &spans, PresentationMode::LowContrast);

        assert_eq!(annotator.len(), 1);
        assert_eq!(doc.rendered_text(), before);
    }

    #[test]
    fn test_clear_tolerates_external_mutation() {
        let mut doc = doc("you should be very afraid\n");
        let mut annotator = Annotator::new();
        annotator.apply_annotations(
            &mut doc,
            &[span("be very afraid", ManipulationType::FearMongering, 0.9)],
            PresentationMode::FullColor,
        );
        // outside mutation rips the marker's wrapper out entirely
        let node = annotator.markers()[0].node;
        for child in doc.tree.children(node).to_vec() {
            doc.tree.detach(child);
        }
        doc.tree.remove(node);

        annotator.clear_annotations(&mut doc);
        assert!(annotator.is_empty());
    }

    #[test]
    fn test_unload_removes_stylesheet() {
        let mut doc = doc("some text\n");
        let mut annotator = Annotator::new();
        annotator.apply_annotations(&mut doc, &[], PresentationMode::FullColor);
        assert!(doc
            .tree
            .children(doc.tree.root())
            .iter()
            .any(|&id| doc.tree.tag(id) == Some("style")));
        annotator.unload(&mut doc);
        assert!(!doc
            .tree
            .children(doc.tree.root())
            .iter()
            .any(|&id| doc.tree.tag(id) == Some("style")));
    }
}
