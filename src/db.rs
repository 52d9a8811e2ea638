use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::{friendship::Friendship, identity::Identity};

pub use in_memory::InMemoryCollection;
pub use scylla_collection::ScyllaCollection;

mod in_memory;
mod pair_claim;
mod scylla_collection;
#[cfg(test)]
pub mod test_util;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Query(String),
}

/// Storage for friendship records.
///
/// Implementations must treat `(a, b)` and `(b, a)` as the same pair, and must
/// only apply `replace` when the stored version still equals the version of
/// the record being written.
#[async_trait]
pub trait FriendshipCollection {
    async fn find_between(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Option<Friendship>, DatabaseError>;

    async fn find_involving(&self, identity: &Identity) -> Result<Vec<Friendship>, DatabaseError>;

    /// Returns `false` without writing if the pair already has a record. An
    /// insert that failed or was cancelled part way must not keep the pair
    /// from being created again.
    async fn insert(&self, friendship: &Friendship) -> Result<bool, DatabaseError>;

    /// Overwrites every mutable field and bumps the version. Returns `false`
    /// without writing if the stored version has moved on, or if no record
    /// with that id exists any more. Callers cannot tell these two apart.
    async fn replace(&self, friendship: &Friendship) -> Result<bool, DatabaseError>;
}
