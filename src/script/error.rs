//! Script-related errors

use thiserror::Error;

use super::classify::ScriptType;

/// Errors raised while parsing, building or serializing scripts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Malformed script: {0}")]
    MalformedScript(String),
    #[error("Invalid script template: {0}")]
    InvalidScriptTemplate(String),
    #[error("Invalid signature in slot {index}")]
    InvalidSignature { index: usize },
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Unsupported script type: {0:?}")]
    UnsupportedScriptType(ScriptType),
    #[error("Incomplete script: {needed} more signature(s) needed")]
    IncompleteScript { needed: usize },
}

impl ScriptError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ScriptError::MalformedScript(msg.into())
    }

    pub(crate) fn template(msg: impl Into<String>) -> Self {
        ScriptError::InvalidScriptTemplate(msg.into())
    }
}
