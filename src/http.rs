use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{auth::JWTAuth, friendship_store::FriendshipStore};

pub use error::ApiError;

mod error;
mod handler;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FriendshipStore>,
    pub jwt_auth: Arc<JWTAuth>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/friends", get(handler::list_friends))
        .route("/friends/archive", post(handler::archive))
        .route("/friends/favorite", post(handler::favorite))
        .route("/friends/block", post(handler::block))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_caller,
        ))
        .with_state(state)
}
