use std::{future::Future, sync::Arc, time::Duration};

use crate::db::{DatabaseError, FriendshipCollection};
use crate::models::{
    friendship::{Friendship, FriendshipParty, PartyFlag, PartyRole},
    identity::Identity,
};

pub use error::FriendshipError;

mod error;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(100);

/// Reads and updates friendships between two identities, wherever they are
/// stored. Every collection call is bounded by `timeout`.
pub struct FriendshipStore {
    collection: Arc<dyn FriendshipCollection + Send + Sync>,
    timeout: Duration,
}

impl FriendshipStore {
    pub fn new(collection: Arc<dyn FriendshipCollection + Send + Sync>, timeout: Duration) -> Self {
        Self {
            collection,
            timeout,
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DatabaseError>>,
    ) -> Result<T, DatabaseError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| DatabaseError::Timeout(self.timeout))?
    }

    /// The friendship between `caller` and `other`, whichever of them sent
    /// the request.
    pub async fn find(
        &self,
        caller: &Identity,
        other: &Identity,
    ) -> Result<Friendship, FriendshipError> {
        self.bounded(self.collection.find_between(caller, other))
            .await?
            .ok_or(FriendshipError::NotFound)
    }

    /// The counterpart's side of every accepted friendship `caller` is in.
    pub async fn list_accepted(
        &self,
        caller: &Identity,
    ) -> Result<Vec<FriendshipParty>, FriendshipError> {
        let friendships = self.bounded(self.collection.find_involving(caller)).await?;

        Ok(friendships
            .iter()
            .filter(|friendship| friendship.accepted)
            .map(|friendship| friendship.counterpart_of(caller).clone())
            .collect())
    }

    /// Sets `flag` on `other`'s side of the friendship and writes the whole
    /// record back. Fails with [`FriendshipError::Conflict`] if someone else
    /// wrote the record in between.
    pub async fn set_party_flag(
        &self,
        caller: &Identity,
        other: &Identity,
        flag: PartyFlag,
        value: bool,
    ) -> Result<(), FriendshipError> {
        let mut friendship = self.find(caller, other).await?;
        let friendship_id = friendship.id;

        let Some(party) = friendship.party_mut(other) else {
            warn!(
                %friendship_id,
                %other,
                "Friendship returned by the store does not include the other user"
            );
            return Err(FriendshipError::NotAParty {
                friendship_id,
                identity: *other,
            });
        };

        party.set_flag(flag, value);

        debug!(
            %friendship_id,
            %caller,
            %other,
            flag = flag.as_str(),
            value,
            "Updating friendship party flag"
        );

        self.persist(friendship).await.map(|_| ())
    }

    pub async fn create_request(
        &self,
        requester: &Identity,
        recipient: &Identity,
    ) -> Result<Friendship, FriendshipError> {
        if requester == recipient {
            return Err(FriendshipError::SelfFriendship);
        }

        let friendship = Friendship::new(*requester, *recipient);

        if !self.bounded(self.collection.insert(&friendship)).await? {
            return Err(FriendshipError::AlreadyExists);
        }

        debug!(friendship_id = %friendship.id, %requester, %recipient, "Created friend request");

        Ok(friendship)
    }

    /// Moves a pending friendship to accepted. Only the recipient may do this,
    /// and only once.
    pub async fn accept(
        &self,
        caller: &Identity,
        requester: &Identity,
    ) -> Result<Friendship, FriendshipError> {
        let mut friendship = self.find(caller, requester).await?;

        if friendship.get_role_of(caller) != PartyRole::Recipient {
            return Err(FriendshipError::NotRecipient);
        }

        if friendship.accepted {
            return Err(FriendshipError::AlreadyAccepted);
        }

        friendship.accepted = true;

        self.persist(friendship).await
    }

    async fn persist(&self, mut friendship: Friendship) -> Result<Friendship, FriendshipError> {
        if !self.bounded(self.collection.replace(&friendship)).await? {
            warn!(friendship_id = %friendship.id, "Friendship was modified concurrently");
            return Err(FriendshipError::Conflict(friendship.id));
        }

        friendship.version += 1;

        Ok(friendship)
    }
}
