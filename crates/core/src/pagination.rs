//! Shared list-query and pagination types.
//!
//! List endpoints accept `page`, `limit`, `sortBy`, `sortOrder`, an
//! optional free-text `search`, and entity-specific filters, and return
//! a `{ data, total, page, limit }` envelope.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query parameters for a paginated list request.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    /// Entity-specific filters as raw query pairs.
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Flatten into URL query pairs in a stable order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy".to_string(), sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder".to_string(), order.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }

    /// Stable string form used as a cache-key suffix.
    pub fn cache_suffix(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Paginated list response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_in_stable_order() {
        let q = ListQuery::default()
            .page(2)
            .limit(20)
            .filter("lineId", "l1");
        let pairs = q.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "20".to_string()),
                ("lineId".to_string(), "l1".to_string()),
            ]
        );
    }

    #[test]
    fn cache_suffix_distinguishes_filters() {
        let a = ListQuery::default().page(1).filter("lineId", "l1");
        let b = ListQuery::default().page(1).filter("lineId", "l2");
        assert_ne!(a.cache_suffix(), b.cache_suffix());
    }

    #[test]
    fn empty_query_has_empty_suffix() {
        assert_eq!(ListQuery::default().cache_suffix(), "");
    }
}
