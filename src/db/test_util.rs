//! Collections that misbehave on purpose, shared by the store and HTTP tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{DatabaseError, FriendshipCollection, InMemoryCollection};
use crate::models::{friendship::Friendship, identity::Identity};

/// Delegates to an in-memory collection but can be told to fail.
#[derive(Default)]
pub struct FlakyCollection {
    pub inner: InMemoryCollection,
    pub fail_find: AtomicBool,
    pub fail_replace: AtomicBool,
}

#[async_trait]
impl FriendshipCollection for FlakyCollection {
    async fn find_between(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Option<Friendship>, DatabaseError> {
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("connection reset".to_owned()));
        }
        self.inner.find_between(a, b).await
    }

    async fn find_involving(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Friendship>, DatabaseError> {
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("connection reset".to_owned()));
        }
        self.inner.find_involving(identity).await
    }

    async fn insert(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        self.inner.insert(friendship).await
    }

    async fn replace(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("connection reset".to_owned()));
        }
        self.inner.replace(friendship).await
    }
}

/// Answers every lookup with a record belonging to somebody else.
pub struct StrayCollection(pub Friendship);

#[async_trait]
impl FriendshipCollection for StrayCollection {
    async fn find_between(
        &self,
        _a: &Identity,
        _b: &Identity,
    ) -> Result<Option<Friendship>, DatabaseError> {
        Ok(Some(self.0.clone()))
    }

    async fn find_involving(&self, _: &Identity) -> Result<Vec<Friendship>, DatabaseError> {
        Ok(vec![self.0.clone()])
    }

    async fn insert(&self, _: &Friendship) -> Result<bool, DatabaseError> {
        Ok(true)
    }

    async fn replace(&self, _: &Friendship) -> Result<bool, DatabaseError> {
        panic!("a stray friendship must never be written");
    }
}

/// Lets another writer sneak in between every lookup and the write after it.
#[derive(Default)]
pub struct RacingCollection {
    pub inner: InMemoryCollection,
}

#[async_trait]
impl FriendshipCollection for RacingCollection {
    async fn find_between(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Option<Friendship>, DatabaseError> {
        let found = self.inner.find_between(a, b).await?;
        if let Some(friendship) = &found {
            let mut other_writer = friendship.clone();
            other_writer.requester.archived = true;
            self.inner.replace(&other_writer).await?;
        }
        Ok(found)
    }

    async fn find_involving(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Friendship>, DatabaseError> {
        self.inner.find_involving(identity).await
    }

    async fn insert(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        self.inner.insert(friendship).await
    }

    async fn replace(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        self.inner.replace(friendship).await
    }
}
