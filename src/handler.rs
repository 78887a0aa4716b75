//! Callbacks supplied by the application
//!
//! Plain functions with the matching signature implement each trait, so the
//! traits only need to be implemented by hand when a callback carries state.

use crate::{context::TurnContext, session::StatePatch};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// The outcome reported by a step validator
#[derive(Debug)]
pub enum Validation {
    /// The input was checked
    Checked {
        /// Whether the input is acceptable
        valid: bool,
        /// Session data produced as a side effect of validation
        state: StatePatch,
    },
    /// Session data only, no explicit verdict
    ///
    /// For list steps the verdict comes from the list itself; for any other
    /// step the input is assumed valid and a warning is logged.
    State(StatePatch),
}

impl Validation {
    /// Reports a verdict with no extra session data
    pub fn checked(valid: bool) -> Self {
        Validation::Checked {
            valid,
            state: StatePatch::new(),
        }
    }

    /// Reports a verdict along with extra session data
    pub fn checked_with(valid: bool, state: StatePatch) -> Self {
        Validation::Checked { valid, state }
    }

    /// Reports extra session data without a verdict
    pub fn state(state: StatePatch) -> Self {
        Validation::State(state)
    }
}

/// Validates the input submitted for a form step
#[async_trait]
pub trait StepValidator: Send + Sync {
    /// Returns the validation outcome for a step
    ///
    /// `input` is `None` when a menu is re-displayed without new input.
    async fn validate(
        &self,
        step: i64,
        input: Option<&str>,
        context: &TurnContext,
    ) -> Result<Validation, anyhow::Error>;
}

#[async_trait]
impl<F> StepValidator for F
where
    F: Fn(i64, Option<&str>, &TurnContext) -> Result<Validation, anyhow::Error> + Send + Sync,
{
    async fn validate(
        &self,
        step: i64,
        input: Option<&str>,
        context: &TurnContext,
    ) -> Result<Validation, anyhow::Error> {
        (self)(step, input, context)
    }
}

/// Called after a form step's input has been validated and captured
#[async_trait]
pub trait PostCall: Send + Sync {
    /// Receives the captured data of the whole form, latest value included
    async fn call(
        &self,
        context: &TurnContext,
        data: HashMap<String, String>,
    ) -> Result<(), anyhow::Error>;
}

#[async_trait]
impl<F> PostCall for F
where
    F: Fn(&TurnContext, HashMap<String, String>) -> Result<(), anyhow::Error> + Send + Sync,
{
    async fn call(
        &self,
        context: &TurnContext,
        data: HashMap<String, String>,
    ) -> Result<(), anyhow::Error> {
        (self)(context, data)
    }
}

/// Decides which subtree a conditional branch resolves to
#[async_trait]
pub trait Condition: Send + Sync {
    /// Returns a key of the branch mapping
    async fn evaluate(&self, context: &TurnContext) -> Result<String, anyhow::Error>;
}

#[async_trait]
impl<F> Condition for F
where
    F: Fn(&TurnContext) -> Result<String, anyhow::Error> + Send + Sync,
{
    async fn evaluate(&self, context: &TurnContext) -> Result<String, anyhow::Error> {
        (self)(context)
    }
}

/// Resolves the language a turn is rendered in
#[async_trait]
pub trait LanguageResolver: Send + Sync {
    /// Returns a non-empty language tag
    async fn resolve(&self, context: &TurnContext) -> Result<String, anyhow::Error>;
}

#[async_trait]
impl<F> LanguageResolver for F
where
    F: Fn(&TurnContext) -> Result<String, anyhow::Error> + Send + Sync,
{
    async fn resolve(&self, context: &TurnContext) -> Result<String, anyhow::Error> {
        (self)(context)
    }
}

/// The phase a dynamic menu callback is invoked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Rendering the menu
    Menu,
    /// Validating a submitted choice
    Validate,
    /// Resolving a validated choice to its item
    Select,
}

/// Everything a dynamic menu or item producer gets to work with
pub struct MenuRequest<'a> {
    /// The turn being evaluated
    pub context: &'a TurnContext,
    /// The input being processed, when there is one
    pub input: Option<&'a str>,
    /// The resolved language
    pub lang: Option<&'a str>,
    /// Captured form data gathered from the session
    pub data: &'a HashMap<String, String>,
    /// Session changes produced so far in this turn
    pub state: &'a StatePatch,
    /// The phase the callback is invoked for
    pub scope: Scope,
}

/// Produces the items of a dynamic list
#[async_trait]
pub trait ItemsProducer: Send + Sync {
    /// Returns the items to offer
    async fn produce(&self, request: &MenuRequest<'_>) -> Result<Vec<Value>, anyhow::Error>;
}

#[async_trait]
impl<F> ItemsProducer for F
where
    F: Fn(&MenuRequest<'_>) -> Result<Vec<Value>, anyhow::Error> + Send + Sync,
{
    async fn produce(&self, request: &MenuRequest<'_>) -> Result<Vec<Value>, anyhow::Error> {
        (self)(request)
    }
}

/// Produces the fully rendered prompt of a form step
#[async_trait]
pub trait MenuProducer: Send + Sync {
    /// Returns the rendered prompt, framing prefix included
    async fn produce(&self, request: &MenuRequest<'_>) -> Result<String, anyhow::Error>;
}

#[async_trait]
impl<F> MenuProducer for F
where
    F: Fn(&MenuRequest<'_>) -> Result<String, anyhow::Error> + Send + Sync,
{
    async fn produce(&self, request: &MenuRequest<'_>) -> Result<String, anyhow::Error> {
        (self)(request)
    }
}
