use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::{
    auth::CallerId,
    models::{
        friendship::{FriendshipParty, PartyFlag},
        identity::Identity,
    },
};

#[derive(Deserialize)]
pub struct FlagRequest {
    #[serde(rename = "friendID")]
    pub friend_id: String,
    pub state: bool,
}

fn caller_identity(caller: &CallerId) -> Result<Identity, ApiError> {
    caller.0.parse().map_err(|_| ApiError::InvalidUserId)
}

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerId>,
) -> Result<Json<Vec<FriendshipParty>>, ApiError> {
    let caller = caller_identity(&caller)?;

    Ok(Json(state.store.list_accepted(&caller).await?))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerId>,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    set_flag(&state, &caller, PartyFlag::Archived, body).await
}

pub async fn favorite(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerId>,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    set_flag(&state, &caller, PartyFlag::Favorite, body).await
}

pub async fn block(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerId>,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    set_flag(&state, &caller, PartyFlag::Blocked, body).await
}

async fn set_flag(
    state: &AppState,
    caller: &CallerId,
    flag: PartyFlag,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))?;
    let caller = caller_identity(caller)?;
    let friend: Identity = request
        .friend_id
        .parse()
        .map_err(|_| ApiError::InvalidFriendId)?;

    state
        .store
        .set_party_flag(&caller, &friend, flag, request.state)
        .await?;

    Ok(Json(json!({ "status": true })))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use std::sync::{atomic::Ordering, Arc};
    use tower::ServiceExt;

    use crate::{
        auth::{
            tests::{token_for, SECRET},
            JWTAuth,
        },
        db::{
            test_util::{FlakyCollection, RacingCollection, StrayCollection},
            FriendshipCollection, InMemoryCollection,
        },
        friendship_store::{FriendshipStore, DEFAULT_STORE_TIMEOUT},
        http::{router, AppState},
        models::{friendship::Friendship, identity::Identity},
    };

    fn app_over(collection: Arc<dyn FriendshipCollection + Send + Sync>) -> (Router, AppState) {
        let state = AppState {
            store: Arc::new(FriendshipStore::new(collection, DEFAULT_STORE_TIMEOUT)),
            jwt_auth: Arc::new(JWTAuth::new(SECRET)),
        };

        (router(state.clone()), state)
    }

    fn app() -> (Router, AppState) {
        app_over(Arc::new(InMemoryCollection::new()))
    }

    fn flag_body(friend: &Identity, state: bool) -> String {
        serde_json::json!({ "friendID": friend.to_string(), "state": state }).to_string()
    }

    async fn friends(state: &AppState) -> (Identity, Identity) {
        let (u1, u2) = (Identity::new_v4(), Identity::new_v4());
        state.store.create_request(&u1, &u2).await.unwrap();
        state.store.accept(&u2, &u1).await.unwrap();
        (u1, u2)
    }

    fn post(uri: &str, uid: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token_for(uid, SECRET)))
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str, uid: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token_for(uid, SECRET)))
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn lists_friend_projections() {
        let (app, state) = app();
        let (u1, u2) = friends(&state).await;

        let (status, body) = send(app, get("/friends", &u1.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!([{
                "id": u2.to_string(),
                "archived": false,
                "favorite": false,
                "blocked": false,
            }])
        );
    }

    #[tokio::test]
    async fn unparsable_caller_is_a_server_error() {
        let (app, _) = app();

        let (status, body) = send(app, get("/friends", "not-an-id")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Invalid UserID");
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (app, _) = app();
        let request = Request::builder()
            .uri("/friends")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Valid access token required");
    }

    #[tokio::test]
    async fn each_route_sets_its_own_flag() {
        let (app, state) = app();
        let (u1, u2) = friends(&state).await;

        for uri in ["/friends/archive", "/friends/favorite", "/friends/block"] {
            let body = serde_json::json!({ "friendID": u2.to_string(), "state": true });
            let (status, body) = send(app.clone(), post(uri, &u1.to_string(), body.to_string())).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, serde_json::json!({ "status": true }));
        }

        let friendship = state.store.find(&u1, &u2).await.unwrap();
        assert!(friendship.recipient.archived);
        assert!(friendship.recipient.favorite);
        assert!(friendship.recipient.blocked);
        assert!(!friendship.requester.archived);
        assert!(!friendship.requester.favorite);
        assert!(!friendship.requester.blocked);
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let (app, state) = app();
        let (u1, _) = friends(&state).await;

        let (status, body) = send(
            app,
            post("/friends/block", &u1.to_string(), "{\"friendID\": 7".to_owned()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_friend_is_a_bad_request() {
        let (app, _) = app();
        let body = serde_json::json!({ "friendID": Identity::new_v4().to_string(), "state": true });

        let (status, body) = send(
            app,
            post("/friends/favorite", &Identity::new_v4().to_string(), body.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Friendship not found");
    }

    #[tokio::test]
    async fn unparsable_friend_is_a_bad_request() {
        let (app, _) = app();
        let body = serde_json::json!({ "friendID": "zzz", "state": false });

        let (status, body) = send(
            app,
            post("/friends/archive", &Identity::new_v4().to_string(), body.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid friendID");
    }

    #[tokio::test]
    async fn concurrent_write_is_a_conflict() {
        let (app, state) = app_over(Arc::new(RacingCollection::default()));
        let (u1, u2) = (Identity::new_v4(), Identity::new_v4());
        let friendship = state.store.create_request(&u1, &u2).await.unwrap();

        let (status, body) = send(
            app,
            post("/friends/favorite", &u1.to_string(), flag_body(&u2, true)),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["error"],
            format!("Friendship {} was modified concurrently", friendship.id)
        );
    }

    #[tokio::test]
    async fn store_failure_while_updating_is_a_server_error() {
        let collection = Arc::new(FlakyCollection::default());
        let (app, state) = app_over(collection.clone());
        let (u1, u2) = friends(&state).await;

        collection.fail_replace.store(true, Ordering::SeqCst);
        let (status, body) = send(
            app.clone(),
            post("/friends/block", &u1.to_string(), flag_body(&u2, true)),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database error: connection reset");

        // a failing lookup is no longer reported as a bad request
        collection.fail_replace.store(false, Ordering::SeqCst);
        collection.fail_find.store(true, Ordering::SeqCst);
        let (status, body) = send(
            app,
            post("/friends/block", &u1.to_string(), flag_body(&u2, true)),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database error: connection reset");
    }

    #[tokio::test]
    async fn store_failure_while_listing_is_a_server_error() {
        let collection = Arc::new(FlakyCollection::default());
        let (app, state) = app_over(collection.clone());
        let (u1, _) = friends(&state).await;

        collection.fail_find.store(true, Ordering::SeqCst);
        let (status, body) = send(app, get("/friends", &u1.to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database error: connection reset");
    }

    #[tokio::test]
    async fn record_without_the_friend_is_a_server_error() {
        let stray = Friendship::new(Identity::new_v4(), Identity::new_v4());
        let (app, _) = app_over(Arc::new(StrayCollection(stray.clone())));
        let friend = Identity::new_v4();

        let (status, body) = send(
            app,
            post("/friends/archive", &Identity::new_v4().to_string(), flag_body(&friend, true)),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            format!("User {} is not a party to friendship {}", friend, stray.id)
        );
    }
}
