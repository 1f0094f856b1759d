//! Operator command line.
//!
//! - [`command`] - clap definitions
//! - [`run`] - configuration resolution and dispatch
//! - [`output`] - human and JSON rendering

pub mod check;
pub mod command;
pub mod monitor;
pub mod output;
pub mod reconcile;
pub mod run;
pub mod server;

pub use command::Cli;
pub use run::execute;
