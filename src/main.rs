use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use friendships::{
    auth::JWTAuth,
    http::{self, AppState},
    init::Init,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let Init {
        store,
        port,
        access_token_secret,
    } = Init::init().await;

    let server_addr = SocketAddr::from(([127, 0, 0, 1], port));

    let server = TcpListener::bind(server_addr).await?;

    info!("Listening on {}", server.local_addr()?);

    let state = AppState {
        store,
        jwt_auth: Arc::new(JWTAuth::new(&access_token_secret)),
    };

    axum::serve(server, http::router(state)).await
}
