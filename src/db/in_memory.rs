use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DatabaseError, FriendshipCollection};
use crate::models::{friendship::Friendship, identity::Identity};

/// Process-local collection with the same pair and version rules as the
/// Scylla one. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryCollection {
    friendships: Mutex<HashMap<Uuid, Friendship>>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FriendshipCollection for InMemoryCollection {
    async fn find_between(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Option<Friendship>, DatabaseError> {
        Ok(self
            .friendships
            .lock()
            .await
            .values()
            .find(|friendship| friendship.involves(a, b))
            .cloned())
    }

    async fn find_involving(&self, identity: &Identity) -> Result<Vec<Friendship>, DatabaseError> {
        Ok(self
            .friendships
            .lock()
            .await
            .values()
            .filter(|friendship| {
                friendship.requester.id == *identity || friendship.recipient.id == *identity
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        let mut friendships = self.friendships.lock().await;

        if friendships.values().any(|existing| {
            existing.involves(&friendship.requester.id, &friendship.recipient.id)
        }) {
            return Ok(false);
        }

        friendships.insert(friendship.id, friendship.clone());

        Ok(true)
    }

    async fn replace(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        let mut friendships = self.friendships.lock().await;

        let Some(stored) = friendships
            .get_mut(&friendship.id)
            .filter(|stored| stored.version == friendship.version)
        else {
            return Ok(false);
        };

        *stored = Friendship {
            version: friendship.version + 1,
            ..friendship.clone()
        };

        Ok(true)
    }
}
