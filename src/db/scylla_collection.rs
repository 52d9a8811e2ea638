use async_trait::async_trait;
use futures_util::future::try_join_all;
use scylla::{
    cql_to_rust::FromCqlVal,
    macros::{FromUserType, IntoUserType},
    prepared_statement::PreparedStatement,
    QueryResult,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    pair_claim::{self, ClaimSteps},
    DatabaseError, FriendshipCollection,
};
use crate::models::{
    friendship::{Friendship, FriendshipParty},
    identity::Identity,
};

// schema lives in schema.cql; friendship_by_party holds the (low, high) claim and the (high, low) reverse row

#[derive(FromUserType, IntoUserType, Clone)]
struct PartyUdt {
    id: Uuid,
    archived: bool,
    favorite: bool,
    blocked: bool,
}

impl From<&FriendshipParty> for PartyUdt {
    fn from(party: &FriendshipParty) -> Self {
        Self {
            id: party.id.as_uuid(),
            archived: party.archived,
            favorite: party.favorite,
            blocked: party.blocked,
        }
    }
}

impl From<PartyUdt> for FriendshipParty {
    fn from(udt: PartyUdt) -> Self {
        Self {
            id: Identity::from(udt.id),
            archived: udt.archived,
            favorite: udt.favorite,
            blocked: udt.blocked,
        }
    }
}

pub struct ScyllaCollection {
    db: Arc<scylla::Session>,
    find_friendship_id_query: PreparedStatement,
    find_friendship_ids_of_party_query: PreparedStatement,
    get_friendship_query: PreparedStatement,
    claim_pair_query: PreparedStatement,
    add_party_lookup_query: PreparedStatement,
    release_pair_query: PreparedStatement,
    insert_friendship_query: PreparedStatement,
    delete_friendship_query: PreparedStatement,
    replace_friendship_query: PreparedStatement,
}

impl ScyllaCollection {
    pub async fn build(
        known_node_hostname: &str,
        username: &str,
        password: &str,
        keyspace: &str,
    ) -> Result<Self, DatabaseError> {
        let db = Arc::new(
            scylla::SessionBuilder::new()
                .known_node(known_node_hostname)
                .user(username, password)
                .use_keyspace(keyspace, true)
                .build()
                .await
                .map_err(|err| {
                    DatabaseError::Query(format!("Error connecting to scylla cluster: {}", err))
                })?,
        );

        let find_friendship_id_query = Self::prepare(
            &db,
            "SELECT friendship_id FROM friendship_by_party WHERE party_id = ? AND other_id = ?",
            true,
        )
        .await?;

        let find_friendship_ids_of_party_query = Self::prepare(
            &db,
            "SELECT friendship_id FROM friendship_by_party WHERE party_id = ?",
            true,
        )
        .await?;

        let get_friendship_query = Self::prepare(
            &db,
            "SELECT id, requester, recipient, accepted, version FROM friendship WHERE id = ?",
            true,
        )
        .await?;

        let claim_pair_query = Self::prepare(
            &db,
            "INSERT INTO friendship_by_party (party_id, other_id, friendship_id) VALUES (?, ?, ?) IF NOT EXISTS",
            false,
        )
        .await?;

        let add_party_lookup_query = Self::prepare(
            &db,
            "INSERT INTO friendship_by_party (party_id, other_id, friendship_id) VALUES (?, ?, ?)",
            true,
        )
        .await?;

        let release_pair_query = Self::prepare(
            &db,
            "DELETE FROM friendship_by_party WHERE party_id = ? AND other_id = ? IF friendship_id = ?",
            false,
        )
        .await?;

        let delete_friendship_query =
            Self::prepare(&db, "DELETE FROM friendship WHERE id = ?", true).await?;

        let insert_friendship_query = Self::prepare(
            &db,
            "INSERT INTO friendship (id, requester, recipient, accepted, version) VALUES (?, ?, ?, ?, ?)",
            true,
        )
        .await?;

        let replace_friendship_query = Self::prepare(
            &db,
            "UPDATE friendship SET requester = ?, recipient = ?, accepted = ?, version = ? WHERE id = ? IF version = ?",
            false,
        )
        .await?;

        Ok(ScyllaCollection {
            db,
            find_friendship_id_query,
            find_friendship_ids_of_party_query,
            get_friendship_query,
            claim_pair_query,
            add_party_lookup_query,
            release_pair_query,
            insert_friendship_query,
            delete_friendship_query,
            replace_friendship_query,
        })
    }

    async fn prepare(
        db: &scylla::Session,
        query: &str,
        idempotent: bool,
    ) -> Result<PreparedStatement, DatabaseError> {
        let mut prepared = db.prepare(query).await.map_err(|err| {
            DatabaseError::Query(format!("Error preparing query \"{}\": {}", query, err))
        })?;
        prepared.set_is_idempotent(idempotent);
        Ok(prepared)
    }

    async fn get_friendship(&self, id: Uuid) -> Result<Option<Friendship>, DatabaseError> {
        let row = self
            .db
            .execute(&self.get_friendship_query, (id,))
            .await
            .map_err(|err| DatabaseError::Query(format!("Error getting friendship: {}", err)))?
            .rows_typed_or_empty::<(Uuid, PartyUdt, PartyUdt, bool, i64)>()
            .next();

        let Some(row) = row else {
            return Ok(None);
        };

        let (id, requester, recipient, accepted, version) =
            row.map_err(|err| DatabaseError::Query(format!("Error getting friendship: {}", err)))?;

        Ok(Some(Friendship {
            id,
            requester: requester.into(),
            recipient: recipient.into(),
            accepted,
            version,
        }))
    }

    // lightweight transactions answer with an [applied] column first
    fn applied(result: QueryResult, context: &str) -> Result<bool, DatabaseError> {
        result
            .rows
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.columns.into_iter().next().flatten())
            .and_then(|applied| applied.as_boolean())
            .ok_or_else(|| DatabaseError::Query(format!("{}: missing [applied] column", context)))
    }
}

#[async_trait]
impl FriendshipCollection for ScyllaCollection {
    async fn find_between(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Option<Friendship>, DatabaseError> {
        let (low, high) = pair_claim::ordered_pair(a.as_uuid(), b.as_uuid());

        match self.claimed_by(low, high).await? {
            Some(friendship_id) => self.get_friendship(friendship_id).await,
            None => Ok(None),
        }
    }

    async fn find_involving(&self, identity: &Identity) -> Result<Vec<Friendship>, DatabaseError> {
        let mut friendship_ids = Vec::<Uuid>::new();

        for row in self
            .db
            .execute(&self.find_friendship_ids_of_party_query, (identity.as_uuid(),))
            .await
            .map_err(|err| {
                DatabaseError::Query(format!("Error finding friendships of user: {}", err))
            })?
            .rows_typed_or_empty::<(Uuid,)>()
        {
            let row = row.map_err(|err| {
                DatabaseError::Query(format!("Error finding friendships of user: {}", err))
            })?;

            friendship_ids.push(row.0);
        }

        let friendships = try_join_all(
            friendship_ids
                .into_iter()
                .map(|friendship_id| self.get_friendship(friendship_id)),
        )
        .await?;

        Ok(friendships.into_iter().flatten().collect())
    }

    async fn insert(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        pair_claim::insert_claimed(self, friendship).await
    }

    async fn replace(&self, friendship: &Friendship) -> Result<bool, DatabaseError> {
        let result = self
            .db
            .execute(
                &self.replace_friendship_query,
                (
                    PartyUdt::from(&friendship.requester),
                    PartyUdt::from(&friendship.recipient),
                    friendship.accepted,
                    friendship.version + 1,
                    friendship.id,
                    friendship.version,
                ),
            )
            .await
            .map_err(|err| DatabaseError::Query(format!("Error replacing friendship: {}", err)))?;

        Self::applied(result, "Error replacing friendship")
    }
}

#[async_trait]
impl ClaimSteps for ScyllaCollection {
    async fn write_friendship(&self, friendship: &Friendship) -> Result<(), DatabaseError> {
        self.db
            .execute(
                &self.insert_friendship_query,
                (
                    friendship.id,
                    PartyUdt::from(&friendship.requester),
                    PartyUdt::from(&friendship.recipient),
                    friendship.accepted,
                    friendship.version,
                ),
            )
            .await
            .map(|_| ())
            .map_err(|err| DatabaseError::Query(format!("Error inserting friendship: {}", err)))
    }

    async fn delete_friendship(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.db
            .execute(&self.delete_friendship_query, (id,))
            .await
            .map(|_| ())
            .map_err(|err| DatabaseError::Query(format!("Error deleting friendship: {}", err)))
    }

    async fn friendship_exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.get_friendship(id).await?.is_some())
    }

    async fn claim_pair(&self, low: Uuid, high: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = self
            .db
            .execute(&self.claim_pair_query, (low, high, id))
            .await
            .map_err(|err| {
                DatabaseError::Query(format!("Error claiming friendship pair: {}", err))
            })?;

        Self::applied(result, "Error claiming friendship pair")
    }

    async fn claimed_by(&self, low: Uuid, high: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let row = self
            .db
            .execute(&self.find_friendship_id_query, (low, high))
            .await
            .map_err(|err| DatabaseError::Query(format!("Error finding friendship: {}", err)))?
            .rows_typed_or_empty::<(Uuid,)>()
            .next();

        row.transpose()
            .map(|row| row.map(|(friendship_id,)| friendship_id))
            .map_err(|err| DatabaseError::Query(format!("Error finding friendship: {}", err)))
    }

    async fn release_pair(&self, low: Uuid, high: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        self.db
            .execute(&self.release_pair_query, (low, high, id))
            .await
            .map(|_| ())
            .map_err(|err| {
                DatabaseError::Query(format!("Error releasing friendship pair: {}", err))
            })
    }

    async fn add_lookup(&self, party: Uuid, other: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        self.db
            .execute(&self.add_party_lookup_query, (party, other, id))
            .await
            .map(|_| ())
            .map_err(|err| {
                DatabaseError::Query(format!("Error adding reverse friendship lookup: {}", err))
            })
    }
}
