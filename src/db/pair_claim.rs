use async_trait::async_trait;
use uuid::Uuid;

use super::DatabaseError;
use crate::models::friendship::Friendship;

/// Primitive writes a store without multi-row transactions needs to insert a
/// friendship under a unique pair claim.
///
/// The claim row is keyed by the ordered pair `(low, high)` and the reverse
/// lookup row by `(high, low)`. Both point at the friendship id.
#[async_trait]
pub trait ClaimSteps {
    async fn write_friendship(&self, friendship: &Friendship) -> Result<(), DatabaseError>;

    async fn delete_friendship(&self, id: Uuid) -> Result<(), DatabaseError>;

    async fn friendship_exists(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Claims the pair only if nobody holds it.
    async fn claim_pair(&self, low: Uuid, high: Uuid, id: Uuid) -> Result<bool, DatabaseError>;

    async fn claimed_by(&self, low: Uuid, high: Uuid) -> Result<Option<Uuid>, DatabaseError>;

    /// Drops the claim only if it still points at `id`.
    async fn release_pair(&self, low: Uuid, high: Uuid, id: Uuid) -> Result<(), DatabaseError>;

    async fn add_lookup(&self, party: Uuid, other: Uuid, id: Uuid) -> Result<(), DatabaseError>;
}

pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Inserts `friendship` unless its pair is already taken.
///
/// The friendship row goes in before the claim, so a claim never points at a
/// row that was not written. A claim whose row is gone anyway is taken over,
/// and a claim left without its reverse lookup by an interrupted insert gets
/// that lookup written again.
pub async fn insert_claimed<S>(steps: &S, friendship: &Friendship) -> Result<bool, DatabaseError>
where
    S: ClaimSteps + Sync,
{
    let id = friendship.id;
    let (low, high) = ordered_pair(
        friendship.requester.id.as_uuid(),
        friendship.recipient.id.as_uuid(),
    );

    steps.write_friendship(friendship).await?;

    if !steps.claim_pair(low, high, id).await? {
        let reclaimed = match steps.claimed_by(low, high).await? {
            Some(existing) if steps.friendship_exists(existing).await? => {
                steps.add_lookup(high, low, existing).await?;
                discard(steps, id).await;
                return Ok(false);
            }
            Some(stale) => {
                warn!(friendship_id = %stale, "Taking over pair claim with no friendship behind it");
                steps.release_pair(low, high, stale).await?;
                steps.claim_pair(low, high, id).await?
            }
            None => steps.claim_pair(low, high, id).await?,
        };

        if !reclaimed {
            discard(steps, id).await;
            return Ok(false);
        }
    }

    if let Err(err) = steps.add_lookup(high, low, id).await {
        if let Err(release_err) = steps.release_pair(low, high, id).await {
            error!(friendship_id = %id, "Error releasing pair claim: {}", release_err);
        }
        discard(steps, id).await;
        return Err(err);
    }

    Ok(true)
}

// an unreachable friendship row is harmless, so failing to delete it is only logged
async fn discard<S: ClaimSteps + Sync>(steps: &S, id: Uuid) {
    if let Err(err) = steps.delete_friendship(id).await {
        warn!(friendship_id = %id, "Error deleting unclaimed friendship: {}", err);
    }
}
