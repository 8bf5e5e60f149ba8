//! Error types for mirror runs

use std::error::Error;
use std::fmt;
use std::io;

/// Main error type for mirror operations
///
/// Errors split into two classes. Fatal errors (see [`MirrorError::is_fatal`])
/// abort the whole run. Everything else is a per-item failure that the
/// walkers log, count and step over.
#[derive(Debug)]
pub enum MirrorError {
	/// The remote current directory is outside the configured root
	ConfinementViolation { cwd: String, root: String },

	/// The remote cursor position can no longer be trusted
	CursorLost { context: String, source: RemoteError },

	/// A single remote operation failed (delete, store, mkdir, rmdir, list, cwd)
	Transfer { op: &'static str, path: String, source: RemoteError },

	/// Failed to reach or log in to the remote server
	Connection { host: String, source: RemoteError },

	/// Building the backup archive failed
	Archive { message: String },

	/// Invalid configuration
	InvalidConfig { message: String },
}

impl MirrorError {
	/// Whether this error must abort the run instead of being recovered per item
	pub fn is_fatal(&self) -> bool {
		!matches!(self, MirrorError::Transfer { .. })
	}

	pub(crate) fn transfer(op: &'static str, path: impl Into<String>, source: RemoteError) -> Self {
		MirrorError::Transfer { op, path: path.into(), source }
	}
}

impl fmt::Display for MirrorError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MirrorError::ConfinementViolation { cwd, root } => {
				write!(f, "Safety error: remote directory {} is outside {}", cwd, root)
			}
			MirrorError::CursorLost { context, source } => {
				write!(f, "Remote directory position lost ({}): {}", context, source)
			}
			MirrorError::Transfer { op, path, source } => {
				write!(f, "Failed to {} {}: {}", op, path, source)
			}
			MirrorError::Connection { host, source } => {
				write!(f, "Failed to connect to {}: {}", host, source)
			}
			MirrorError::Archive { message } => write!(f, "Backup archive failed: {}", message),
			MirrorError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
		}
	}
}

impl Error for MirrorError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			MirrorError::CursorLost { source, .. }
			| MirrorError::Transfer { source, .. }
			| MirrorError::Connection { source, .. } => Some(source),
			_ => None,
		}
	}
}

/// Errors reported by a remote filesystem backend
#[derive(Debug)]
pub enum RemoteError {
	/// The server answered, but refused the command
	Rejected { message: String },

	/// The connection itself failed
	Transport { message: String },
}

impl RemoteError {
	pub fn rejected(message: impl Into<String>) -> Self {
		RemoteError::Rejected { message: message.into() }
	}

	pub fn transport(message: impl Into<String>) -> Self {
		RemoteError::Transport { message: message.into() }
	}
}

impl fmt::Display for RemoteError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RemoteError::Rejected { message } => write!(f, "rejected: {}", message),
			RemoteError::Transport { message } => write!(f, "transport error: {}", message),
		}
	}
}

impl Error for RemoteError {}

impl From<io::Error> for RemoteError {
	fn from(e: io::Error) -> Self {
		RemoteError::Transport { message: e.to_string() }
	}
}


// vim: ts=4
