//! Limelight Core - engine for annotating classified text in a document tree
//!
//! This crate takes the span list an external text classifier produced,
//! re-locates each quotation inside a live document tree (whose text is
//! fragmented across inline markup and line breaks), and reversibly wraps
//! every located occurrence in a marker element. It also owns the state
//! machine that positions the hover tooltip for those markers. The hosting
//! controller (browser surface, TUI, tests) drives it through
//! `Annotator::apply_annotations` / `clear_annotations`.

pub mod annotator;
pub mod index;
pub mod locate;
pub mod materialize;
pub mod model;
pub mod style;
pub mod tooltip;

pub use annotator::{Annotator, ApplyReport};
pub use index::{normalize, rendered_text, Segment, SegmentIndex};
pub use locate::{MatchKind, SpanMatch, DEFAULT_FUZZY_THRESHOLD};
pub use model::{
    AnnotationSpan, DocTree, Document, ManipulationClass, ManipulationType, Marker, NodeData,
    NodeId,
};
pub use style::PresentationMode;
pub use tooltip::{Point, Rect, Tooltip, TooltipContent};
