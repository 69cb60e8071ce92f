//! Filtered, paginated listing over the current annotation snapshot.

use serde::Serialize;

use crate::annotation::Annotation;
use crate::error::AnnotationResult;
use crate::repository::AnnotationRepository;

pub const DEFAULT_LIMIT: i64 = 20;

/// Search parameters. Unset filters match everything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    /// Exact match on `uri`.
    pub uri: Option<String>,
    /// Case-sensitive substring of `text`.
    pub text: Option<String>,
    /// Maximum rows returned; zero or negative means all.
    pub limit: i64,
    /// Start position. Positive values collapse to zero. A negative value
    /// counts back from the end of the filtered rows, and `limit` then caps
    /// how many of those trailing rows are returned.
    pub offset: i64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            uri: None,
            text: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl SearchQuery {
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    fn matches(&self, annotation: &Annotation) -> bool {
        if let Some(uri) = &self.uri {
            if annotation.uri() != Some(uri.as_str()) {
                return false;
            }
        }
        match &self.text {
            Some(needle) => annotation.text().is_some_and(|t| t.contains(needle.as_str())),
            None => true,
        }
    }

    /// The slice of `len` filtered rows this query selects.
    fn window(&self, len: usize) -> std::ops::Range<usize> {
        let offset = self.offset.min(0);
        let start = if offset < 0 {
            len.saturating_sub(usize::try_from(offset.unsigned_abs()).unwrap_or(usize::MAX))
        } else {
            0
        };
        let end = match usize::try_from(self.limit) {
            Ok(limit) if limit > 0 => start.saturating_add(limit).min(len),
            _ => len,
        };
        start..end
    }
}

/// Matching rows for one page plus the unpaginated match count.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    pub total: usize,
    pub rows: Vec<Annotation>,
}

/// Apply `query` to an already-fetched set of annotations.
pub fn search(annotations: impl IntoIterator<Item = Annotation>, query: &SearchQuery) -> SearchResult {
    let mut rows: Vec<Annotation> = annotations.into_iter().filter(|a| query.matches(a)).collect();
    let total = rows.len();
    let window = query.window(total);
    rows.truncate(window.end);
    rows.drain(..window.start);
    SearchResult { total, rows }
}

impl AnnotationRepository {
    /// Search the annotations at the branch head.
    pub fn search(&self, query: &SearchQuery) -> AnnotationResult<SearchResult> {
        let rows = self.fetch_all()?.into_iter().map(|(_, a)| a);
        let result = search(rows, query);
        tracing::debug!(total = result.total, returned = result.rows.len(), "search");
        Ok(result)
    }
}
