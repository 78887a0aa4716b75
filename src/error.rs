use crate::session::SessionError;
use std::{error::Error, fmt};

/// An error returned when evaluating a turn
///
/// The first three variants are control signals consumed by
/// [`NavigationController`](crate::NavigationController); they never reach
/// the caller. Everything else indicates a configuration or callback problem
/// and propagates.
#[derive(Debug)]
pub enum NavigationError {
    /// The selected child index does not exist
    InvalidChoice,
    /// The back token was submitted at the root menu
    NavigationBack,
    /// The back token was submitted before the first form step
    FormBack,
    /// A translation could not be resolved
    Translation(String),
    /// The condition callback of a branch failed
    ConditionEvaluation(anyhow::Error),
    /// The condition result is not mapped to a subtree
    ConditionResult(String),
    /// A callback or a menu is not set up correctly
    ImproperlyConfigured(String),
    /// The navigation tree is malformed
    Parse(String),
    /// A step validator failed
    Validator(anyhow::Error),
    /// A post call failed
    PostCall(anyhow::Error),
    /// The session store failed
    Session(SessionError),
}

impl fmt::Display for NavigationError {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        use self::NavigationError::*;
        match self {
            InvalidChoice => write!(out, "invalid selection"),
            NavigationBack => write!(out, "cannot go back from the root menu"),
            FormBack => write!(out, "cannot go back beyond this point"),
            Translation(message) => write!(out, "{}", message),
            ConditionEvaluation(err) => write!(out, "error when evaluating condition: {}", err),
            ConditionResult(result) => {
                write!(out, "condition result '{}' not in mapping keys", result)
            }
            ImproperlyConfigured(message) => write!(out, "{}", message),
            Parse(message) => write!(out, "{}", message),
            Validator(err) => write!(out, "step validator failed: {}", err),
            PostCall(err) => write!(out, "post call failed: {}", err),
            Session(err) => write!(out, "{}", err),
        }
    }
}

impl Error for NavigationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use self::NavigationError::*;
        match self {
            ConditionEvaluation(err) | Validator(err) | PostCall(err) => Some(&**err),
            Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SessionError> for NavigationError {
    fn from(err: SessionError) -> Self {
        NavigationError::Session(err)
    }
}
