//! In memory session store

use super::{SessionBackend, SessionError, SessionKey};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A session store keeping all state in process memory
///
/// Sessions never expire; intended for tests and development.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    sessions: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryBackend {
    /// Creates a new store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn read_field(
        &self,
        key: &SessionKey,
        field: &str,
    ) -> Result<Option<String>, SessionError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(key.as_str())
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    async fn write_fields(
        &self,
        key: &SessionKey,
        fields: &[(String, String)],
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(key.as_str().to_string()).or_default();
        for (field, value) in fields {
            session.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn remove_fields(
        &self,
        key: &SessionKey,
        fields: &[String],
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(key.as_str()) {
            for field in fields {
                session.remove(field);
            }
        }
        Ok(())
    }
}
