#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for the Micro Integrator management API.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `commands/`: command handlers grouped by resource
//! - `client.rs`: errors, invocation context, and the authenticated request helper
//! - `response.rs`: decoding of management API responses
//! - `marshal.rs`: conversion of typed records into ordered template contexts
//! - `output.rs`: format specifications and template rendering
//! - `models.rs`: wire records returned by the management API
//! - `config.rs` / `credentials.rs`: on-disk environment and credential state
//! - `telemetry.rs`: tracing subscriber setup
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod credentials;
pub(crate) mod marshal;
pub(crate) mod models;
pub(crate) mod output;
pub(crate) mod response;
pub(crate) mod telemetry;

pub use cli::run;
