//! Command handlers grouped by resource.

pub(crate) mod artifacts;
pub(crate) mod auth;
pub(crate) mod env;
pub(crate) mod loggers;
pub(crate) mod logs;
pub(crate) mod roles;
pub(crate) mod state;
pub(crate) mod templates;
pub(crate) mod transactions;
pub(crate) mod users;
