//! Category -> presentation mapping and stylesheet injection
//!
//! Presentation is purely cosmetic: the mode changes which style variant a
//! marker's class list selects, never what gets matched or wrapped.

use crate::model::{DocTree, ManipulationClass, ManipulationType, NodeId};

/// Cosmetic style variant selected by the hosting controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationMode {
    #[default]
    FullColor,
    LowContrast,
}

impl PresentationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationMode::FullColor => "full-color",
            PresentationMode::LowContrast => "low-contrast",
        }
    }
}

/// Id of the injected stylesheet element, the guard for idempotent injection
pub const STYLESHEET_ID: &str = "limelight-stylesheet";

/// Highlight class for a technique's class grouping. Fixed lookup on the
/// closed enumeration.
pub fn class_name(class: ManipulationClass) -> &'static str {
    match class {
        ManipulationClass::Emotional => "ll-emotional",
        ManipulationClass::Fallacy => "ll-fallacy",
        ManipulationClass::Rhetorical => "ll-rhetorical",
        ManipulationClass::Evidence => "ll-evidence",
        ManipulationClass::Social => "ll-social",
    }
}

/// Background color pair (full-color, low-contrast) for a class grouping
pub fn class_colors(class: ManipulationClass) -> (&'static str, &'static str) {
    match class {
        ManipulationClass::Emotional => ("#ffadad", "#f5dddd"),
        ManipulationClass::Fallacy => ("#ffd6a5", "#f2e6d8"),
        ManipulationClass::Rhetorical => ("#fdffb6", "#f4f3dc"),
        ManipulationClass::Evidence => ("#a0c4ff", "#dbe4f3"),
        ManipulationClass::Social => ("#bdb2ff", "#e2ddf2"),
    }
}

/// Full class attribute for a marker wrapper
pub fn marker_classes(ty: ManipulationType, mode: PresentationMode) -> String {
    format!(
        "ll-marker {} ll-{}",
        class_name(ty.class()),
        mode.as_str()
    )
}

fn stylesheet_text(mode: PresentationMode) -> String {
    let mut css = String::from(".ll-marker { cursor: pointer; border-radius: 2px; }\n");
    for &class in ManipulationClass::all() {
        let (full, low) = class_colors(class);
        let color = match mode {
            PresentationMode::FullColor => full,
            PresentationMode::LowContrast => low,
        };
        css.push_str(&format!(
            ".ll-marker.{} {{ background-color: {}; }}\n",
            class_name(class),
            color
        ));
    }
    css
}

fn find_stylesheet(tree: &DocTree, root: NodeId) -> Option<NodeId> {
    tree.children(root)
        .iter()
        .copied()
        .find(|&id| tree.attr(id, "id") == Some(STYLESHEET_ID))
}

/// Inject the shared stylesheet once per document view. Re-running with a
/// different mode rewrites the CSS text in place; re-running with the same
/// mode is a no-op. The style branch is invisible to the text index.
pub fn ensure_stylesheet(tree: &mut DocTree, mode: PresentationMode) -> NodeId {
    let root = tree.root();
    if let Some(existing) = find_stylesheet(tree, root) {
        let css = stylesheet_text(mode);
        if let Some(&text) = tree.children(existing).first() {
            if tree.text(text) != Some(css.as_str()) {
                tree.remove(text);
                let fresh = tree.create_text(css);
                let _ = tree.append_child(existing, fresh);
            }
        }
        return existing;
    }
    let style = tree.create_element("style");
    tree.set_attr(style, "id", STYLESHEET_ID);
    let css = tree.create_text(stylesheet_text(mode));
    let _ = tree.append_child(style, css);
    let _ = tree.insert_child(root, 0, style);
    style
}

/// Tear the stylesheet down when the view unloads
pub fn remove_stylesheet(tree: &mut DocTree) {
    let root = tree.root();
    if let Some(style) = find_stylesheet(tree, root) {
        for child in tree.children(style).to_vec() {
            tree.remove(child);
        }
        tree.remove(style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SegmentIndex;

    #[test]
    fn test_injection_is_idempotent() {
        let mut tree = DocTree::new("article");
        let first = ensure_stylesheet(&mut tree, PresentationMode::FullColor);
        let second = ensure_stylesheet(&mut tree, PresentationMode::FullColor);
        assert_eq!(first, second);
        let styles: Vec<_> = tree
            .children(tree.root())
            .iter()
            .filter(|&&id| tree.tag(id) == Some("style"))
            .collect();
        assert_eq!(styles.len(), 1);
    }

    #[test]
    fn test_mode_change_rewrites_css_in_place() {
        let mut tree = DocTree::new("article");
        let style = ensure_stylesheet(&mut tree, PresentationMode::FullColor);
        let full = tree.text(tree.children(style)[0]).unwrap().to_string();
        let style2 = ensure_stylesheet(&mut tree, PresentationMode::LowContrast);
        assert_eq!(style, style2);
        let low = tree.text(tree.children(style)[0]).unwrap().to_string();
        assert_ne!(full, low);
    }

    #[test]
    fn test_stylesheet_is_invisible_to_the_index() {
        let mut tree = DocTree::new("article");
        let p = tree.create_element("p");
        let t = tree.create_text("visible text");
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, t).unwrap();
        let before = SegmentIndex::build(&tree, tree.root()).text;
        ensure_stylesheet(&mut tree, PresentationMode::FullColor);
        let after = SegmentIndex::build(&tree, tree.root()).text;
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_stylesheet() {
        let mut tree = DocTree::new("article");
        ensure_stylesheet(&mut tree, PresentationMode::LowContrast);
        remove_stylesheet(&mut tree);
        assert!(tree.children(tree.root()).is_empty());
        // removing again is harmless
        remove_stylesheet(&mut tree);
    }
}
