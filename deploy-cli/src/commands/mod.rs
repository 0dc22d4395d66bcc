//! CLI command handlers: thin glue between parsed arguments, the `app`
//! composition layer, and output formatting.

pub(crate) mod deploy;
pub(crate) mod history;
pub(crate) mod profile;
