//! Command handlers, one module per command.

pub(crate) mod fetch;
pub(crate) mod manifest;
pub(crate) mod search;
