//! Product reviews.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bozor_core::{ProductId, ReviewId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub text: String,
    pub author_id: UserId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

/// A review joined with its author's username, for the product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub author: String,
}

impl std::fmt::Display for ReviewWithAuthor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.author)
    }
}
