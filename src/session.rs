//! Confinement-checked remote session
//!
//! [`RemoteSession`] wraps a [`RemoteFs`] and is the only way the walkers
//! talk to the server. Every command that moves the cursor or changes the
//! tree is followed by a confinement check against the live `pwd` reply.
//! Once a check fails the session is poisoned: every later call returns the
//! same fatal error without sending anything to the server.

use std::io::Read;
use std::ops::{Deref, DerefMut};

use tracing::{debug, error};

use crate::error::MirrorError;
use crate::remote::RemoteFs;

/// Absolute remote directory that bounds a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRoot(String);

impl RemoteRoot {
	/// Normalize and validate an absolute remote path
	///
	/// Trailing slashes are dropped. `/` itself is refused since it would
	/// confine nothing.
	pub fn new(path: &str) -> Result<Self, MirrorError> {
		if !path.starts_with('/') {
			return Err(MirrorError::InvalidConfig {
				message: format!("remote root must be absolute, got {:?}", path),
			});
		}
		let trimmed = path.trim_end_matches('/');
		if trimmed.is_empty() {
			return Err(MirrorError::InvalidConfig {
				message: "remote root must not be /".to_string(),
			});
		}
		if trimmed.split('/').any(|s| s == "." || s == "..") {
			return Err(MirrorError::InvalidConfig {
				message: format!("remote root must not contain . or .., got {:?}", path),
			});
		}
		Ok(RemoteRoot(trimmed.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Whether `cwd` is the root or nested under it, segment-wise
	pub fn contains(&self, cwd: &str) -> bool {
		let cwd = if cwd.len() > 1 { cwd.trim_end_matches('/') } else { cwd };
		match cwd.strip_prefix(self.0.as_str()) {
			Some(rest) => rest.is_empty() || rest.starts_with('/'),
			None => false,
		}
	}

	/// Absolute form of a path relative to the root
	pub fn join(&self, relative: &str) -> String {
		if relative.is_empty() {
			self.0.clone()
		} else {
			format!("{}/{}", self.0, relative)
		}
	}
}

impl std::fmt::Display for RemoteRoot {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Checks the live remote directory against the root
#[derive(Debug, Clone)]
pub struct ConfinementGuard {
	root: RemoteRoot,
}

impl ConfinementGuard {
	pub fn new(root: RemoteRoot) -> Self {
		ConfinementGuard { root }
	}

	pub fn root(&self) -> &RemoteRoot {
		&self.root
	}

	/// Ask the server where the cursor is and fail if it left the root
	///
	/// A failed `pwd` is treated as a lost cursor: without an answer the
	/// position cannot be proven safe.
	pub fn verify<R: RemoteFs + ?Sized>(&self, remote: &mut R) -> Result<String, MirrorError> {
		let cwd = remote.pwd().map_err(|source| MirrorError::CursorLost {
			context: "querying current directory".to_string(),
			source,
		})?;

		if !self.root.contains(&cwd) {
			return Err(MirrorError::ConfinementViolation {
				cwd,
				root: self.root.as_str().to_string(),
			});
		}
		Ok(cwd)
	}
}

/// Outcome of an idempotent directory creation
#[derive(Debug)]
pub enum MakeDir {
	Created,
	AlreadyPresent,
	Failed(MirrorError),
}

/// A remote filesystem bound to a root
pub struct RemoteSession<R: RemoteFs> {
	remote: R,
	guard: ConfinementGuard,
	poisoned: Option<(String, String)>,
	depth: usize,
}

impl<R: RemoteFs> RemoteSession<R> {
	/// Enter the root on a logged-in connection and check confinement
	pub fn open(mut remote: R, root: RemoteRoot) -> Result<Self, MirrorError> {
		remote.cwd(root.as_str()).map_err(|source| MirrorError::CursorLost {
			context: format!("entering root {}", root),
			source,
		})?;

		let mut session = RemoteSession {
			remote,
			guard: ConfinementGuard::new(root),
			poisoned: None,
			depth: 0,
		};
		session.verify()?;
		Ok(session)
	}

	pub fn root(&self) -> &RemoteRoot {
		self.guard.root()
	}

	/// Levels below the root the cursor is expected to be at
	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn is_poisoned(&self) -> bool {
		self.poisoned.is_some()
	}

	/// The wrapped backend, for inspection
	pub fn remote(&self) -> &R {
		&self.remote
	}

	/// Check confinement, poisoning the session on failure
	pub fn verify(&mut self) -> Result<String, MirrorError> {
		self.ensure_usable()?;
		match self.guard.verify(&mut self.remote) {
			Ok(cwd) => Ok(cwd),
			Err(err) => {
				self.poison(&err);
				Err(err)
			}
		}
	}

	/// Names in the current directory
	pub fn list(&mut self) -> Result<Vec<String>, MirrorError> {
		self.ensure_usable()?;
		self.remote.list().map_err(|e| MirrorError::transfer("list", self.here(), e))
	}

	/// Enter child directory `name`
	///
	/// A refused `cwd` is a per-item error and leaves the cursor where it
	/// was. Prefer [`RemoteSession::descend`], which guarantees the return.
	pub fn enter(&mut self, name: &str) -> Result<(), MirrorError> {
		self.ensure_usable()?;
		if let Err(e) = self.remote.cwd(name) {
			return Err(MirrorError::transfer("enter", name, e));
		}
		self.depth += 1;
		self.verify()?;
		Ok(())
	}

	/// Return to the parent directory
	///
	/// Failure here is fatal: the cursor position is no longer known.
	pub fn leave(&mut self) -> Result<(), MirrorError> {
		self.ensure_usable()?;
		if let Err(source) = self.remote.cdup() {
			let err =
				MirrorError::CursorLost { context: "returning to parent".to_string(), source };
			self.poison(&err);
			return Err(err);
		}
		self.depth = self.depth.saturating_sub(1);
		self.verify()?;
		Ok(())
	}

	/// Enter `name` and return a guard that leaves it again
	pub fn descend(&mut self, name: &str) -> Result<DirGuard<'_, R>, MirrorError> {
		self.enter(name)?;
		Ok(DirGuard { session: self, name: name.to_string(), left: false })
	}

	/// Create `name` unless it already exists
	///
	/// Only fatal errors are returned as `Err`. A refused `mkdir` is checked
	/// against a fresh listing to tell an existing entry from a real failure.
	pub fn make_dir(&mut self, name: &str) -> Result<MakeDir, MirrorError> {
		self.ensure_usable()?;
		let result = self.remote.mkdir(name);
		self.verify()?;

		match result {
			Ok(()) => Ok(MakeDir::Created),
			Err(e) => match self.list() {
				Ok(names) if names.iter().any(|n| n == name) => Ok(MakeDir::AlreadyPresent),
				Ok(_) => Ok(MakeDir::Failed(MirrorError::transfer("create", name, e))),
				Err(list_err) if list_err.is_fatal() => Err(list_err),
				Err(_) => Ok(MakeDir::Failed(MirrorError::transfer("create", name, e))),
			},
		}
	}

	/// Remove the empty child directory `name`
	pub fn remove_dir(&mut self, name: &str) -> Result<(), MirrorError> {
		self.ensure_usable()?;
		let result = self.remote.rmdir(name);
		self.verify()?;
		result.map_err(|e| MirrorError::transfer("remove", name, e))
	}

	/// Delete file `name` in the current directory
	pub fn delete_file(&mut self, name: &str) -> Result<(), MirrorError> {
		self.ensure_usable()?;
		self.remote.delete(name).map_err(|e| MirrorError::transfer("delete", name, e))
	}

	/// Store `reader` as `name` in the current directory
	pub fn store(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, MirrorError> {
		self.ensure_usable()?;
		self.remote.store(name, reader).map_err(|e| MirrorError::transfer("store", name, e))
	}

	/// Log out and hand back the backend
	pub fn close(mut self) -> Result<R, MirrorError> {
		self.ensure_usable()?;
		if let Err(e) = self.remote.quit() {
			// The work is done at this point
			error!("Logout failed: {}", e);
		}
		Ok(self.remote)
	}

	/// Hand back the backend without logging out
	pub fn into_remote(self) -> R {
		self.remote
	}

	fn here(&self) -> String {
		format!("<{} +{}>", self.guard.root(), self.depth)
	}

	fn poison(&mut self, err: &MirrorError) {
		let cwd = match err {
			MirrorError::ConfinementViolation { cwd, .. } => cwd.clone(),
			_ => "<unknown>".to_string(),
		};
		self.poisoned = Some((cwd, self.guard.root().as_str().to_string()));
	}

	fn ensure_usable(&self) -> Result<(), MirrorError> {
		match &self.poisoned {
			Some((cwd, root)) => {
				Err(MirrorError::ConfinementViolation { cwd: cwd.clone(), root: root.clone() })
			}
			None => Ok(()),
		}
	}
}

/// Scoped stay inside a child directory
///
/// Call [`DirGuard::finish`] to leave and see the result. If the guard is
/// dropped on an error path, it still returns to the parent, unless the
/// session is poisoned.
pub struct DirGuard<'a, R: RemoteFs> {
	session: &'a mut RemoteSession<R>,
	name: String,
	left: bool,
}

impl<'a, R: RemoteFs> DirGuard<'a, R> {
	/// Leave the directory
	pub fn finish(mut self) -> Result<(), MirrorError> {
		self.left = true;
		self.session.leave()
	}
}

impl<'a, R: RemoteFs> Deref for DirGuard<'a, R> {
	type Target = RemoteSession<R>;

	fn deref(&self) -> &Self::Target {
		self.session
	}
}

impl<'a, R: RemoteFs> DerefMut for DirGuard<'a, R> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.session
	}
}

impl<'a, R: RemoteFs> Drop for DirGuard<'a, R> {
	fn drop(&mut self) {
		if self.left || self.session.is_poisoned() {
			return;
		}
		debug!("Leaving {} on unwind", self.name);
		if let Err(e) = self.session.leave() {
			error!("Could not return from {}: {}", self.name, e);
		}
	}
}


// vim: ts=4
