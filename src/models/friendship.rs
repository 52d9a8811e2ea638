use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Identity;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FriendshipParty {
    pub id: Identity,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub blocked: bool,
}

impl FriendshipParty {
    pub fn new(id: Identity) -> Self {
        Self {
            id,
            archived: false,
            favorite: false,
            blocked: false,
        }
    }

    pub fn set_flag(&mut self, flag: PartyFlag, value: bool) {
        match flag {
            PartyFlag::Archived => self.archived = value,
            PartyFlag::Favorite => self.favorite = value,
            PartyFlag::Blocked => self.blocked = value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartyFlag {
    Archived,
    Favorite,
    Blocked,
}

impl PartyFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyFlag::Archived => "archived",
            PartyFlag::Favorite => "favorite",
            PartyFlag::Blocked => "blocked",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartyRole {
    Requester,
    Recipient,
    NotInFriendship,
}

/// A symmetric relationship between two identities.
///
/// Which side is the requester is decided once, when the request is sent, and
/// says nothing about who is acting on the record later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Friendship {
    pub id: Uuid,
    pub requester: FriendshipParty,
    pub recipient: FriendshipParty,
    pub accepted: bool,
    /// Bumped by the collection on every successful replace.
    pub version: i64,
}

impl Friendship {
    pub fn new(requester: Identity, recipient: Identity) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester: FriendshipParty::new(requester),
            recipient: FriendshipParty::new(recipient),
            accepted: false,
            version: 0,
        }
    }

    pub fn involves(&self, a: &Identity, b: &Identity) -> bool {
        (self.requester.id == *a && self.recipient.id == *b)
            || (self.requester.id == *b && self.recipient.id == *a)
    }

    pub fn get_role_of(&self, identity: &Identity) -> PartyRole {
        if self.recipient.id == *identity {
            PartyRole::Recipient
        } else if self.requester.id == *identity {
            PartyRole::Requester
        } else {
            PartyRole::NotInFriendship
        }
    }

    pub fn party_mut(&mut self, identity: &Identity) -> Option<&mut FriendshipParty> {
        match self.get_role_of(identity) {
            PartyRole::Recipient => Some(&mut self.recipient),
            PartyRole::Requester => Some(&mut self.requester),
            PartyRole::NotInFriendship => None,
        }
    }

    /// The party on the other side from `identity`. Anything that isn't the
    /// requester sees the requester as its counterpart.
    pub fn counterpart_of(&self, identity: &Identity) -> &FriendshipParty {
        if self.requester.id == *identity {
            &self.recipient
        } else {
            &self.requester
        }
    }
}
