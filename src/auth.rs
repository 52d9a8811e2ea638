use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{ApiError, AppState};

pub struct JWTAuth {
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Deserialize, Serialize)]
pub struct AccessTokenPayload {
    pub uid: String,
    pub exp: usize,
}

/// The caller's user id exactly as the access token carried it. Handlers
/// decide whether it parses.
#[derive(Clone, Debug)]
pub struct CallerId(pub String);

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid access token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

impl JWTAuth {
    pub fn new(access_token_secret: &str) -> Self {
        let access_token_secret = access_token_secret.as_bytes();

        Self {
            decoding_key: DecodingKey::from_secret(access_token_secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<AccessTokenPayload, AuthError> {
        let token = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        Ok(
            jsonwebtoken::decode::<AccessTokenPayload>(token, &self.decoding_key, &self.validation)?
                .claims,
        )
    }
}

pub async fn require_caller(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match state.jwt_auth.verify_headers(req.headers()) {
        Ok(payload) => {
            req.extensions_mut().insert(CallerId(payload.uid));

            next.run(req).await
        }
        Err(err) => {
            debug!("Rejected request: {}", err);

            ApiError::Unauthorized.into_response()
        }
    }
}
