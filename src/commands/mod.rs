//! Command handlers for the byeboros CLI.
//!
//! This module contains implementations for all CLI subcommands. The MCP tools call the same
//! handlers, so both interfaces report the same messages and structures.

mod analysis;
mod auth;
mod categories;
mod init;
mod mcp;
mod record;
mod transactions;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, error, info};

pub use analysis::analysis;
pub use auth::{auth, auth_verify};
pub use categories::{categories_list, categories_save, save_categories};
pub use init::init;
pub use mcp::mcp;
pub use record::record;
pub use transactions::transactions;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and MCP server interfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// The structured data as pretty-printed JSON, if there is any.
    pub fn json(&self) -> Option<String> {
        let structure = self.structure()?;
        match serde_json::to_string_pretty(structure) {
            Ok(json) => Some(json),
            Err(e) => {
                error!("Unable to serialize the command output: {e}");
                None
            }
        }
    }

    /// Print the message to `info!` (stderr) and the structured data, if it exists, as JSON to
    /// stdout so it can be piped.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(json) = self.json() {
            debug!("Writing {} bytes of JSON to stdout", json.len());
            println!("{json}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_output() {
        let out = Out::new("Found 2", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(out.json().unwrap(), "[\n  \"a\",\n  \"b\"\n]");
        let message_only: Out<Vec<String>> = "Done".into();
        assert_eq!(message_only.json(), None);
        assert_eq!(message_only.message(), "Done");
    }
}
