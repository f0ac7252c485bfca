//! `topiclink` binary internals, exposed as a library so integration
//! tests can exercise manifest loading directly.

pub mod cli;
pub mod commands;
pub mod manifest;
pub mod output;
