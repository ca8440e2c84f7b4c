//! Search result types.

use textfusion_prompt::ContextSource;

/// One retrieved search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Where the result came from
    pub url: String,

    /// Display label
    pub title: String,

    /// Text excerpt used as model context
    pub content: String,

    /// Relevance score reported by the search service, if any
    pub score: Option<f32>,
}

impl Document {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            score: None,
        }
    }
}

impl ContextSource for Document {
    fn source(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn content(&self) -> &str {
        &self.content
    }
}

/// Search results in retrieval-rank order, at most `k` of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet(Vec<Document>);

impl DocumentSet {
    /// Keep the first `k` documents, preserving order.
    pub fn ranked(mut documents: Vec<Document>, k: usize) -> Self {
        documents.truncate(k);
        Self(documents)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.0.iter()
    }
}

impl IntoIterator for DocumentSet {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DocumentSet {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
