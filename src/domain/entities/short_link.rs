//! Short link entity representing a code-to-URL mapping owned by an account.

use chrono::{DateTime, Utc};

/// A shortened URL with its visit history.
///
/// `owner_id` and `original_url` never change after creation; `visit_history` only grows,
/// in the order visits were recorded.
#[derive(Debug, Clone)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub owner_id: i64,
    pub original_url: String,
    pub visit_history: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortLink {
    pub fn visit_count(&self) -> usize {
        self.visit_history.len()
    }

    pub fn last_visited_at(&self) -> Option<DateTime<Utc>> {
        self.visit_history.last().copied()
    }
}

/// Input data for creating a short link.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub code: String,
    pub owner_id: i64,
    pub original_url: String,
}

#[cfg(test)]
pub(crate) fn sample_link(id: i64, code: &str, owner_id: i64, url: &str) -> ShortLink {
    let now = Utc::now();
    ShortLink {
        id,
        code: code.to_string(),
        owner_id,
        original_url: url.to_string(),
        visit_history: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
