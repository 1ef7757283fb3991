//! Typed error hierarchy for the board core.
//!
//! - `BoardError` — store lookups and inserts
//! - `SyncError` / `SyncErrorKind` — tagged position-sync failures, carried as values
//! - `ConfigError` — board.toml loading and validation

use std::fmt;

use thiserror::Error;

use crate::board::ItemId;

/// Errors from the in-memory board store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Item {id} not found on the board")]
    UnknownItem { id: ItemId },

    #[error("Item {id} already exists on the board")]
    DuplicateItem { id: ItemId },
}

/// Failure classes reported by the position sync client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncErrorKind {
    /// 401/403: the session must be re-validated.
    Auth,
    /// No response: connect failure, timeout, or a body that could not be read.
    Network,
    /// Non-2xx other than auth, or a 2xx carrying a failure acknowledgement.
    Server,
}

impl fmt::Display for SyncErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncErrorKind::Auth => write!(f, "auth"),
            SyncErrorKind::Network => write!(f, "network"),
            SyncErrorKind::Server => write!(f, "server"),
        }
    }
}

/// A failed position sync. Returned as a value, never propagated with `?`
/// across the sync client's public surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct SyncError {
    pub kind: SyncErrorKind,
    pub message: String,
}

impl SyncError {
    pub fn new(kind: SyncErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::Auth, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::Network, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(SyncErrorKind::Server, message)
    }
}

/// Errors from loading `.corkboard/board.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file at {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_error_unknown_item_carries_id() {
        let err = BoardError::UnknownItem { id: ItemId(42) };
        match &err {
            BoardError::UnknownItem { id } => assert_eq!(*id, ItemId(42)),
            _ => panic!("Expected UnknownItem"),
        }
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn sync_error_display_includes_kind_and_message() {
        let err = SyncError::server("HTTP 500: boom");
        assert_eq!(err.kind, SyncErrorKind::Server);
        assert_eq!(err.to_string(), "server error: HTTP 500: boom");
    }

    #[test]
    fn sync_error_constructors_tag_kind() {
        assert_eq!(SyncError::auth("x").kind, SyncErrorKind::Auth);
        assert_eq!(SyncError::network("x").kind, SyncErrorKind::Network);
        assert_eq!(SyncError::server("x").kind, SyncErrorKind::Server);
    }

    #[test]
    fn config_error_invalid_names_field() {
        let err = ConfigError::Invalid {
            field: "board.margin",
            message: "must not be negative".into(),
        };
        assert!(err.to_string().contains("board.margin"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&BoardError::DuplicateItem { id: ItemId(1) });
        assert_std_error(&SyncError::network("refused"));
        assert_std_error(&ConfigError::Invalid {
            field: "api.base_url",
            message: "empty".into(),
        });
    }
}
