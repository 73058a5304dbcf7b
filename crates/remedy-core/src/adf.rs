//! Minimal rich-text document tree accepted by the ticketing service:
//! `{type: "doc", version: 1, content: [paragraph{text}]}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub content: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Paragraph { content: Vec<Node> },
    Text { text: String },
}

impl Document {
    pub fn new() -> Self {
        Self {
            kind: "doc".to_string(),
            version: 1,
            content: Vec::new(),
        }
    }

    /// One paragraph per non-blank line of `text`.
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::new();
        for line in text.lines() {
            doc.push_paragraph(line);
        }
        doc
    }

    /// Appends a paragraph; blank input is ignored.
    pub fn push_paragraph(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.content.push(Node::Paragraph {
            content: vec![Node::Text {
                text: text.to_string(),
            }],
        });
    }

    /// Concatenated paragraph text, one line per paragraph.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        for node in &self.content {
            if let Node::Paragraph { content } = node {
                let line: String = content
                    .iter()
                    .filter_map(|n| match n {
                        Node::Text { text } => Some(text.as_str()),
                        Node::Paragraph { .. } => None,
                    })
                    .collect();
                lines.push(line);
            }
        }
        lines.join("\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_doc_tree() {
        let doc = Document::from_text("Traffic spike on checkout");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "doc",
                "version": 1,
                "content": [{
                    "type": "paragraph",
                    "content": [{ "type": "text", "text": "Traffic spike on checkout" }]
                }]
            })
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let doc = Document::from_text("first\n\n   \nsecond\n");
        assert_eq!(doc.content.len(), 2);
        assert_eq!(doc.plain_text(), "first\nsecond");
    }

    #[test]
    fn empty_text_yields_empty_doc() {
        let doc = Document::from_text("");
        assert!(doc.content.is_empty());
        assert_eq!(doc.kind, "doc");
        assert_eq!(doc.version, 1);
    }
}
