use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DocTree;

/// A document view: one tree plus file metadata. All annotation state is
/// scoped to the lifetime of one of these and discarded with it.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub tree: DocTree,
    pub filename: Option<String>,
    pub filepath: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(title: String, tree: DocTree) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            tree,
            filename: None,
            filepath: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a document from file contents, recording where it came from
    pub fn with_file_info(
        title: String,
        content: &str,
        filepath: String,
        filename: String,
    ) -> Self {
        let mut doc = Self::from_plain_text(title, content);
        doc.filepath = Some(filepath);
        doc.filename = Some(filename);
        doc
    }

    /// Build a tree from plain text: blank-line-separated paragraphs become
    /// `<p>` elements, each source line its own text leaf. Keeping lines as
    /// separate leaves preserves the fragmentation the locator has to cope
    /// with in a real rendered tree. Line terminators stay inside the
    /// leaves, so unwrapping and re-merging leaves never changes the raw
    /// text.
    pub fn from_plain_text(title: String, content: &str) -> Self {
        let mut tree = DocTree::new("article");
        let root = tree.root();
        let mut paragraph: Option<super::NodeId> = None;
        for line in content.split_inclusive('\n') {
            if line.trim().is_empty() {
                paragraph = None;
                continue;
            }
            let p = match paragraph {
                Some(p) => p,
                None => {
                    let p = tree.create_element("p");
                    let _ = tree.append_child(root, p);
                    paragraph = Some(p);
                    p
                }
            };
            let leaf = tree.create_text(line);
            let _ = tree.append_child(p, leaf);
        }
        Self::new(title, tree)
    }

    /// Rendered text of the whole tree, in normalized form. Joined on raw
    /// adjacency, so it is unaffected by markers splitting text leaves.
    pub fn rendered_text(&self) -> String {
        crate::index::rendered_text(&self.tree, self.tree.root())
    }

    /// Raw visible text, byte for byte
    pub fn raw_text(&self) -> String {
        crate::index::raw_text(&self.tree, self.tree.root())
    }

    pub fn word_count(&self) -> usize {
        self.rendered_text().split_whitespace().count()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
