use thiserror::Error;
use uuid::Uuid;

use crate::{db::DatabaseError, models::identity::Identity};

#[derive(Error, Debug)]
pub enum FriendshipError {
    #[error("Friendship not found")]
    NotFound,
    #[error("Friendship already exists")]
    AlreadyExists,
    #[error("Users cannot befriend themselves")]
    SelfFriendship,
    #[error("User {identity} is not a party to friendship {friendship_id}")]
    NotAParty {
        friendship_id: Uuid,
        identity: Identity,
    },
    #[error("Only the recipient can accept a friend request")]
    NotRecipient,
    #[error("Friend request was already accepted")]
    AlreadyAccepted,
    #[error("Friendship {0} was modified concurrently")]
    Conflict(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
