//! Redis session store
//!
//! One Redis hash per session; expiry is left to the deployment's key
//! policy.

use super::{SessionBackend, SessionError, SessionKey};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

/// A session store backed by one Redis hash per session
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    /// Opens a new store
    ///
    /// # Arguments
    ///
    /// * params - Connection parameters, e.g. `redis://127.0.0.1:6379/4`
    pub async fn open<P: AsRef<str>>(params: P) -> Result<Self, SessionError> {
        let client = Client::open(params.as_ref()).map_err(SessionError::backend)?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(SessionError::backend)?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionBackend for RedisBackend {
    async fn read_field(
        &self,
        key: &SessionKey,
        field: &str,
    ) -> Result<Option<String>, SessionError> {
        let mut connection = self.connection.clone();
        connection
            .hget(key.as_str(), field)
            .await
            .map_err(SessionError::backend)
    }

    async fn write_fields(
        &self,
        key: &SessionKey,
        fields: &[(String, String)],
    ) -> Result<(), SessionError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        connection
            .hset_multiple::<_, _, _, ()>(key.as_str(), fields)
            .await
            .map_err(SessionError::backend)
    }

    async fn remove_fields(
        &self,
        key: &SessionKey,
        fields: &[String],
    ) -> Result<(), SessionError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        connection
            .hdel::<_, _, ()>(key.as_str(), fields.to_vec())
            .await
            .map_err(SessionError::backend)
    }
}
