use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::db::{FriendshipCollection, InMemoryCollection, ScyllaCollection};
use crate::friendship_store::FriendshipStore;

pub struct Init {
    pub store: Arc<FriendshipStore>,
    pub port: u16,
    pub access_token_secret: String,
}

impl Init {
    pub async fn init() -> Self {
        tracing_subscriber::fmt::init();

        if let Err(err) = dotenv::dotenv() {
            debug!("Not loading .env: {}", err);
        }

        let config = Config::from_env().unwrap_or_else(|err| panic!("{}", err));

        let collection: Arc<dyn FriendshipCollection + Send + Sync> = match config.store_backend {
            StoreBackend::Scylla {
                url,
                username,
                password,
                keyspace,
            } => Arc::new(
                ScyllaCollection::build(&url, &username, &password, &keyspace)
                    .await
                    .expect("Failed to connect to scylla cluster"),
            ),
            StoreBackend::Memory => {
                warn!("Using in-memory friendship store, nothing will be persisted");

                Arc::new(InMemoryCollection::new())
            }
        };

        Self {
            store: Arc::new(FriendshipStore::new(collection, config.store_timeout)),
            port: config.port,
            access_token_secret: config.access_token_secret,
        }
    }
}
