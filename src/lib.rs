//! querychat - a conversational SQL front end.
//!
//! Natural-language questions are translated to SQL by a remote backend,
//! confirmed by the user, executed, and rendered onto an append-only
//! timeline. Literal `SELECT` statements skip translation and confirmation.
//!
//! This library exposes the core modules for the binary and integration tests.

pub mod backend;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod query;
pub mod render;
pub mod repl;
pub mod timeline;
pub mod translate;
