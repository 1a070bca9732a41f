//! Read-only access to a built [`Index`].

use crate::index::{Bucket, BucketMap, Category, Index};
use crate::key::BucketKey;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    #[error("no buckets in category {0}")]
    CategoryNotFound(Category),

    #[error("no bucket {key:?} in category {category}")]
    BucketNotFound { category: Category, key: String },
}

impl Index {
    /// Categories holding at least one bucket, in [`Category::ALL`] order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    pub fn buckets(&self, category: Category) -> Result<&BucketMap, QueryError> {
        self.categories
            .get(&category)
            .ok_or(QueryError::CategoryNotFound(category))
    }

    /// Bucket keys of a category in the order they were first seen.
    pub fn bucket_keys(
        &self,
        category: Category,
    ) -> Result<impl Iterator<Item = &BucketKey> + '_, QueryError> {
        Ok(self.buckets(category)?.keys())
    }

    pub fn bucket(&self, category: Category, key: &str) -> Result<&Bucket, QueryError> {
        self.buckets(category)?
            .get(key)
            .ok_or_else(|| QueryError::BucketNotFound {
                category,
                key: key.to_string(),
            })
    }
}
