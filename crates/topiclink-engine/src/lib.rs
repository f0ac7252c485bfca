//! # Topiclink Engine
//!
//! Reconciles a declared set of function-to-topic bindings against the
//! live state of a messaging backend.
//!
//! This crate provides:
//! - The [`MessagingBackend`] boundary over the cloud API
//! - Binding resolution and per-binding action classification
//! - Action execution, including the invoke-grant side channel
//! - Durable deployment-state tracking with drift cleanup
//! - The [`Reconciler`] orchestrating deploy, remove, and teardown
//!
//! ## Architecture
//!
//! A deploy fans out over every declared binding concurrently: each
//! binding is resolved, classified into exactly one action, and
//! executed independently. Once *all* bindings have settled, the state
//! tracker runs exactly once, diffing the outcome set against the
//! previous deployment's record and deleting orphaned subscriptions.
//!
//! ## Key Invariants
//!
//! - At most one subscription per (topic, function) pair is ever created
//! - The state tracker only observes fully-settled outcome sets
//! - Backend failures outside the expected-absence set are fatal; no
//!   retries anywhere
//! - No component terminates the process; errors propagate to the caller

mod backend;
mod classify;
mod config;
mod execute;
mod memory;
mod permission;
mod reconciler;
mod resolve;
mod state;

pub use backend::{FUNCTION_PROTOCOL, MessagingBackend, PolicyStatement, SubscriptionSummary};
pub use classify::{classify_deploy, classify_remove};
pub use config::{ReconcilerConfig, TraceConfig};
pub use execute::{BindingOutcome, execute_deploy, execute_remove};
pub use memory::{BackendCall, MemoryBackend};
pub use permission::MESSAGING_PRINCIPAL;
pub use reconciler::{DeploySummary, Reconciler};
pub use state::{STATE_SEPARATOR, StateKey, StateOutcome};
