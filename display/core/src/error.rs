//! Engine Errors
//!
//! The engine is headless with respect to error UI: it never shows a dialog,
//! it only reports. Failures fall into four buckets:
//!
//! | Class            | Realization                                         |
//! |------------------|-----------------------------------------------------|
//! | UserVisibleNone  | nothing is ever rendered for an error               |
//! | SilentNoOp       | `Ok(Reply::Done)` + a `debug!` line                 |
//! | LoggedWarning    | `Ok(Reply::Done)` + a `warn!` line                  |
//! | FatalToHost      | `Err(EngineError)` returned from the dispatcher     |
//!
//! Only the last class is represented here. Nothing is retried by the engine;
//! retry policy belongs to the host.

use thiserror::Error;

/// Routing failures surfaced to the host
#[derive(Debug, Error)]
pub enum EngineError {
    /// A state-mutating command arrived before `loadContent`
    #[error("engine not initialized: `{command}` requires loadContent first")]
    NotInitialized {
        /// Wire name of the rejected command
        command: &'static str,
    },

    /// A known command name carried arguments of the wrong shape
    #[error("malformed `{command}` command: {source}")]
    MalformedCommand {
        /// Wire name of the rejected command
        command: String,
        /// Underlying deserialization failure
        #[source]
        source: serde_json::Error,
    },

    /// Arguments parsed but hold a value the engine cannot act on
    #[error("invalid argument for `{command}`: {reason}")]
    InvalidArgument {
        /// Wire name of the rejected command
        command: &'static str,
        /// What was wrong with the value
        reason: String,
    },
}

impl EngineError {
    /// Wire name of the command that failed
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::NotInitialized { command } | Self::InvalidArgument { command, .. } => command,
            Self::MalformedCommand { command, .. } => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_command() {
        let err = EngineError::NotInitialized {
            command: "loadTextSlides",
        };
        assert_eq!(err.command(), "loadTextSlides");
        assert!(err.to_string().contains("loadContent"));

        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = EngineError::MalformedCommand {
            command: "seek".to_string(),
            source,
        };
        assert_eq!(err.command(), "seek");
        assert!(err.to_string().starts_with("malformed `seek`"));
    }
}
