//! Command handlers grouped by concern.

pub(crate) mod account;
pub(crate) mod check;
pub(crate) mod links;
