use uuid::Uuid;

use super::{AnnotationSpan, NodeId};
use crate::locate::MatchKind;
use crate::tooltip::TooltipContent;

/// One materialized occurrence of a span: the wrapper element plus enough
/// bookkeeping to tear it down again. The wrapper id is resolved through
/// the live tree at time of use; if the host mutated the tree underneath
/// us, lookup fails and cleanup degrades to a no-op.
#[derive(Debug, Clone)]
pub struct Marker {
    pub id: Uuid,
    pub span: AnnotationSpan,
    /// Normalized-coordinate range claimed during the pass that created it
    pub range: (usize, usize),
    pub kind: MatchKind,
    /// The wrapper element this marker exclusively owns. It re-parents the
    /// wrapped leaves temporarily; they are not owned by the marker.
    pub node: NodeId,
}

impl Marker {
    pub fn tooltip_content(&self) -> TooltipContent {
        TooltipContent {
            title: self.span.manipulation_type.label().to_string(),
            body: self.span.manipulation_description.clone(),
            confidence: self.span.confidence,
        }
    }
}
