//! Remote filesystem abstraction
//!
//! The mirror engine only needs the primitive command set of a stateful,
//! cursor-based file server: print/change the working directory, list it,
//! make and remove directories, store and delete files. There is no stat
//! call, so the engine never asks whether a name is a file or a directory.
//!
//! Two backends implement the trait:
//! - [`FtpRemote`]: FTP over explicit TLS
//! - [`MemoryRemote`]: an in-process server used by tests

pub mod ftp;
pub mod memory;

pub use ftp::FtpRemote;
pub use memory::MemoryRemote;

use crate::error::RemoteError;
use std::io::Read;

/// Result type for remote primitives
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Primitive commands of a cursor-based remote filesystem
///
/// All names passed to `mkdir`, `rmdir`, `delete` and `store` are relative
/// to the current directory.
pub trait RemoteFs {
	/// Current directory as reported by the server
	fn pwd(&mut self) -> RemoteResult<String>;

	/// Change the current directory (absolute or relative path)
	fn cwd(&mut self, path: &str) -> RemoteResult<()>;

	/// Move to the parent of the current directory
	fn cdup(&mut self) -> RemoteResult<()>;

	/// Names in the current directory
	fn list(&mut self) -> RemoteResult<Vec<String>>;

	fn mkdir(&mut self, name: &str) -> RemoteResult<()>;

	fn rmdir(&mut self, name: &str) -> RemoteResult<()>;

	fn delete(&mut self, name: &str) -> RemoteResult<()>;

	/// Store `reader` as `name` in binary mode, returning bytes written
	fn store(&mut self, name: &str, reader: &mut dyn Read) -> RemoteResult<u64>;

	/// End the session
	fn quit(&mut self) -> RemoteResult<()>;
}

/// Last path segment of a listing entry
///
/// Some servers answer NLST with paths instead of bare names.
pub(crate) fn entry_name(entry: &str) -> &str {
	let trimmed = entry.trim_end_matches('/');
	trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_entry_name() {
		assert_eq!(entry_name("a.txt"), "a.txt");
		assert_eq!(entry_name("/site/sub/a.txt"), "a.txt");
		assert_eq!(entry_name("sub/"), "sub");
		assert_eq!(entry_name("."), ".");
	}
}

// vim: ts=4
