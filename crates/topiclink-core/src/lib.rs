pub mod action;
pub mod arn;
pub mod binding;
pub mod error;
pub mod filter;

pub use action::{DeployAction, RemoveAction};
pub use binding::{Binding, TopicTarget};
pub use error::{EngineError, Result};
pub use filter::{FilterPolicy, required_update};
