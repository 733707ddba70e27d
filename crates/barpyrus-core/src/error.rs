//! Error types for barpyrus operations.
//!
//! [`BarError`] covers every failure the panel can observe. Only a few of them
//! are fatal: losing the bar or the window-manager stream ends the main loop,
//! everything else is logged at the boundary that owns the failing resource.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`BarError`].
pub type Result<T> = std::result::Result<T, BarError>;

/// Error type for all barpyrus operations.
#[derive(Debug, Error)]
pub enum BarError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is not valid YAML or fails validation
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Process / Channel Errors
    // =========================================================================
    /// Spawning an external process failed
    #[error("Failed to spawn {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer closed its output
    #[error("End of stream on channel {channel}")]
    EndOfStream { channel: String },

    /// Reading from a channel failed
    #[error("Failed to read from channel {channel}")]
    ChannelRead {
        channel: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing to a channel failed
    #[error("Failed to write to channel {channel}")]
    ChannelWrite {
        channel: String,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Multiplexing Errors
    // =========================================================================
    /// Waiting for readiness failed
    #[error("Readiness wait failed")]
    Poll {
        #[source]
        source: std::io::Error,
    },

    /// Installing a signal handler failed
    #[error("Failed to register handler for signal {signal}")]
    Signal {
        signal: i32,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Window Manager Errors
    // =========================================================================
    /// A herbstclient command exited unsuccessfully
    #[error("Command {args:?} exited with code {exit_code:?} (stdout {stdout:?})")]
    WmCommand {
        args: Vec<String>,
        exit_code: Option<i32>,
        stdout: String,
    },

    // =========================================================================
    // Parsing Errors
    // =========================================================================
    /// Unparseable input from an external process
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in barpyrus)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BarError {
    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a Spawn error
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a Signal error
    pub fn signal(signal: i32, source: std::io::Error) -> Self {
        Self::Signal { signal, source }
    }

    /// Create an EndOfStream error
    pub fn end_of_stream(channel: impl Into<String>) -> Self {
        Self::EndOfStream {
            channel: channel.into(),
        }
    }

    /// Create a ChannelRead error
    pub fn channel_read(channel: impl Into<String>, source: std::io::Error) -> Self {
        Self::ChannelRead {
            channel: channel.into(),
            source,
        }
    }

    /// Create a ChannelWrite error
    pub fn channel_write(channel: impl Into<String>, source: std::io::Error) -> Self {
        Self::ChannelWrite {
            channel: channel.into(),
            source,
        }
    }

    /// Create a Parse error
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Error classification helpers
    // =========================================================================

    /// Returns true if the peer of a channel closed its output.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream { .. })
    }

    /// Returns true if the error should end the main loop regardless of who
    /// owns the failing resource.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Poll { .. } | Self::Internal { .. })
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create ~/.config/barpyrus/config.yaml or omit --config to use defaults")
            }
            Self::ConfigInvalid { .. } => Some("Check the YAML syntax and field types"),
            Self::Spawn { .. } => Some("Check that the program is installed and in $PATH"),
            Self::WmCommand { .. } => Some("Check that herbstluftwm is running"),
            _ => None,
        }
    }
}
