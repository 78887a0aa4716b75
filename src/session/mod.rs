//! Session state persistence
//!
//! Every session is one hash in an external key/value store, keyed by
//! `{msisdn}:{session_id}`. The engine reads and writes individual fields
//! through a [`SessionBackend`]; the reserved field names live here as
//! constants.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::HashMap, error::Error, fmt, sync::Arc};

pub mod memory;

/// Redis session store
///
/// Available with enabled "session-redis" feature
#[cfg(feature = "session-redis")]
pub mod redis;

/// 1-based index of the form step currently awaiting input; absent outside a form
pub const FORM_STEP: &str = "FORM_STEP";

/// JSON encoded normalized path that led to the present cursor
pub const PROCESSED_PATH: &str = "PROCESSED_PATH";

/// The last successfully rendered prompt, used for invalid input re-display
pub const LAST_SUCCESS_RESPONSE: &str = "LAST_SUCCESS_RESPONSE";

/// `1` or `0` - whether the last input validated
pub const VALID_LAST_INPUT: &str = "USSD_VALID_LAST_INPUT";

/// Name of the menu or form step currently displayed
pub const RESPONSE_MENU_NAME: &str = "USSD_RESPONSE_MENU_NAME";

/// An error returned by a session store
#[derive(Debug)]
pub enum SessionError {
    /// The backend failed to execute an operation
    Backend(Box<dyn Error + Send + Sync>),
    /// A value could not be serialized or deserialized
    Serialize(serde_json::Error),
}

impl SessionError {
    /// Wraps a backend error
    pub fn backend<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        SessionError::Backend(Box::new(err))
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionError::Backend(err) => write!(out, "session backend error: {}", err),
            SessionError::Serialize(err) => write!(out, "session serialization error: {}", err),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Backend(err) => Some(err.as_ref()),
            SessionError::Serialize(err) => Some(err),
        }
    }
}

/// A hash style key/value store holding the state of every session
///
/// Implementations must namespace all fields under the given key and may
/// expire whole sessions according to their own policy.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Returns the value of a field, or `None` when it is not set
    async fn read_field(
        &self,
        key: &SessionKey,
        field: &str,
    ) -> Result<Option<String>, SessionError>;

    /// Writes the given fields in one operation
    async fn write_fields(
        &self,
        key: &SessionKey,
        fields: &[(String, String)],
    ) -> Result<(), SessionError>;

    /// Removes the given fields
    async fn remove_fields(&self, key: &SessionKey, fields: &[String])
        -> Result<(), SessionError>;
}

/// Identifies a session in the store
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a key for a subscriber and session id
    pub fn new<M, S>(msisdn: M, session_id: S) -> Self
    where
        M: fmt::Display,
        S: fmt::Display,
    {
        SessionKey(format!("{}:{}", msisdn, session_id))
    }

    /// Returns the key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        out.write_str(&self.0)
    }
}

/// A session manager
#[derive(Clone)]
pub struct SessionManager {
    backend: Arc<dyn SessionBackend>,
}

impl SessionManager {
    /// Creates a new manager
    ///
    /// # Arguments
    ///
    /// * backend - A session store backend
    pub fn new<B>(backend: B) -> Self
    where
        B: SessionBackend + 'static,
    {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Returns a session for a subscriber and session id
    pub fn get_session<M, S>(&self, msisdn: M, session_id: S) -> Session
    where
        M: fmt::Display,
        S: fmt::Display,
    {
        self.get_session_by_key(SessionKey::new(msisdn, session_id))
    }

    /// Returns a session by key
    pub fn get_session_by_key(&self, key: SessionKey) -> Session {
        Session {
            key,
            backend: self.backend.clone(),
        }
    }
}

/// A handle to the state of one session
#[derive(Clone)]
pub struct Session {
    key: SessionKey,
    backend: Arc<dyn SessionBackend>,
}

impl Session {
    /// Returns the key of the session
    pub fn get_key(&self) -> &SessionKey {
        &self.key
    }

    /// Returns the raw value of a field
    pub async fn get(&self, field: &str) -> Result<Option<String>, SessionError> {
        self.backend.read_field(&self.key, field).await
    }

    /// Returns the value of a field decoded from JSON
    pub async fn get_value<O>(&self, field: &str) -> Result<Option<O>, SessionError>
    where
        O: DeserializeOwned,
    {
        match self.get(field).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(SessionError::Serialize),
            None => Ok(None),
        }
    }

    /// Writes the value of a field
    pub async fn set<V>(&self, field: &str, value: V) -> Result<(), SessionError>
    where
        V: Into<String>,
    {
        self.backend
            .write_fields(&self.key, &[(field.to_string(), value.into())])
            .await
    }

    /// Removes a field
    pub async fn remove(&self, field: &str) -> Result<(), SessionError> {
        self.backend
            .remove_fields(&self.key, &[field.to_string()])
            .await
    }

    /// Applies a state patch
    ///
    /// Fields patched to null are deleted. Strings and numbers are written
    /// as-is, maps and arrays are JSON encoded, anything else is logged and
    /// skipped.
    pub async fn apply(&self, patch: &StatePatch) -> Result<(), SessionError> {
        let mut removed: Vec<String> = Vec::new();
        let mut written: Vec<(String, String)> = Vec::new();
        for (field, value) in &patch.entries {
            match value {
                None | Some(Value::Null) => removed.push(field.clone()),
                Some(Value::String(value)) => written.push((field.clone(), value.clone())),
                Some(Value::Number(value)) => written.push((field.clone(), value.to_string())),
                Some(value @ Value::Object(_)) | Some(value @ Value::Array(_)) => {
                    match serde_json::to_string(value) {
                        Ok(encoded) => written.push((field.clone(), encoded)),
                        Err(err) => {
                            log::warn!("error saving state data of field {}: {}", field, err)
                        }
                    }
                }
                Some(Value::Bool(_)) => {
                    log::warn!("cannot save data of field {} to the session", field)
                }
            }
        }
        if !removed.is_empty() {
            self.backend.remove_fields(&self.key, &removed).await?;
        }
        if !written.is_empty() {
            self.backend.write_fields(&self.key, &written).await?;
        }
        Ok(())
    }
}

/// A set of session field changes produced while evaluating a turn
///
/// A field set to a value will be written, a cleared field will be deleted.
#[derive(Clone, Debug, Default)]
pub struct StatePatch {
    entries: HashMap<String, Option<Value>>,
}

impl StatePatch {
    /// Creates an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field to a value
    pub fn set<F, V>(&mut self, field: F, value: V)
    where
        F: Into<String>,
        V: Into<Value>,
    {
        self.entries.insert(field.into(), Some(value.into()));
    }

    /// Marks a field for deletion
    pub fn clear<F: Into<String>>(&mut self, field: F) {
        self.entries.insert(field.into(), None);
    }

    /// Returns whether the patch touches a field
    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    /// Returns whether the patch is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges another patch into this one; the other patch wins on conflict
    pub fn merge(&mut self, other: StatePatch) {
        self.entries.extend(other.entries);
    }
}
