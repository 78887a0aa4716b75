//! A session oriented menu engine for USSD and chat channels
//!
//! Given a declaratively built navigation tree of menus, step by step form
//! flows and conditional branches, the engine computes the response for the
//! next turn of a dialog and keeps the evolving session state in an external
//! key/value store. Each turn arrives as the full asterisk delimited history
//! of the user's inputs, the way USSD gateways deliver it; WhatsApp and
//! Telegram bots get the same responses without the `CON `/`END ` framing.
//!
//! ```no_run
//! use palaver::{
//!     session::{memory::MemoryBackend, SessionManager},
//!     Channel, FormFlow, FormStep, ListInput, NavigationController, NavigationMenu, TurnContext,
//!     Validation,
//! };
//!
//! fn validator(
//!     _step: i64,
//!     _input: Option<&str>,
//!     _context: &TurnContext,
//! ) -> Result<Validation, anyhow::Error> {
//!     Ok(Validation::checked(true))
//! }
//!
//! # async fn run() -> Result<(), palaver::NavigationError> {
//! let order = FormFlow::new(validator)
//!     .step(FormStep::new("Name", "CON What is your name?"))
//!     .step(FormStep::new("Drink", ListInput::new("Choose a drink:", vec!["Tea", "Coffee"])))
//!     .step(FormStep::new("Done", "END Thanks {Name}, enjoy your {Drink}"));
//! let root = NavigationMenu::new("home", "Welcome")
//!     .child(NavigationMenu::new("order", "Order").form(order));
//! let controller =
//!     NavigationController::new(root, SessionManager::new(MemoryBackend::new()))?;
//! let response = controller
//!     .navigate("254700000001", "session-1", "1", Channel::Ussd)
//!     .await?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

mod channel;
mod config;
mod context;
mod error;
mod form;
mod handler;
mod list;
mod navigator;
mod path;
mod text;
mod tree;

pub mod session;

pub use self::{
    channel::{Channel, UnknownChannel},
    config::{Config, ConfigError},
    context::TurnContext,
    error::NavigationError,
    form::{FormFlow, FormStep, StepMenu},
    handler::{
        Condition, ItemsProducer, LanguageResolver, MenuProducer, MenuRequest, PostCall, Scope,
        StepValidator, Validation,
    },
    list::ListInput,
    navigator::NavigationController,
    path::normalize,
    text::Text,
    tree::{ConditionalFlow, NavNode, NavigationMenu},
};

pub use async_trait::async_trait;
