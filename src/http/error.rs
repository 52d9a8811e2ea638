use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::friendship_store::FriendshipError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Valid access token required")]
    Unauthorized,
    #[error("Invalid UserID")]
    InvalidUserId,
    #[error("Invalid friendID")]
    InvalidFriendId,
    #[error("{0}")]
    MalformedRequest(String),
    #[error("{0}")]
    Friendship(#[from] FriendshipError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidUserId => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidFriendId | ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Friendship(err) => match err {
                FriendshipError::NotFound
                | FriendshipError::AlreadyExists
                | FriendshipError::SelfFriendship
                | FriendshipError::NotRecipient
                | FriendshipError::AlreadyAccepted => StatusCode::BAD_REQUEST,
                FriendshipError::Conflict(_) => StatusCode::CONFLICT,
                FriendshipError::NotAParty { .. } | FriendshipError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
