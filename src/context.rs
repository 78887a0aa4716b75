use crate::{config::Config, session::Session};
use std::sync::Arc;

/// The immutable input of one turn, shared with every user callback
#[derive(Clone)]
pub struct TurnContext {
    /// Identity of the subscriber
    pub msisdn: String,
    /// Identifier of the dialog session
    pub session_id: String,
    /// Asterisk delimited history of every input in the session
    pub ussd_string: String,
    /// The final token of `ussd_string`
    pub last_input: String,
    /// Handle to the state of the current session
    pub session: Session,
    /// Engine configuration in effect for this turn
    pub config: Arc<Config>,
}

impl TurnContext {
    /// Creates a new context
    pub fn new<M, S, U>(
        msisdn: M,
        session_id: S,
        ussd_string: U,
        session: Session,
        config: Arc<Config>,
    ) -> Self
    where
        M: Into<String>,
        S: Into<String>,
        U: Into<String>,
    {
        let ussd_string = ussd_string.into();
        let last_input = ussd_string
            .rsplit('*')
            .next()
            .unwrap_or("")
            .to_string();
        Self {
            msisdn: msisdn.into(),
            session_id: session_id.into(),
            ussd_string,
            last_input,
            session,
            config,
        }
    }
}
