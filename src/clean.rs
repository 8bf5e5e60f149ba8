//! Recursive removal of the remote tree
//!
//! The cleaner walks what the server actually has, not what the local tree
//! says should be there. Entries are removed bottom-up so every directory
//! is empty by the time it is removed.

use tracing::{error, info, warn};

use crate::error::MirrorError;
use crate::probe::Classify;
use crate::remote::RemoteFs;
use crate::session::RemoteSession;
use crate::types::{join_relative, EntryKind, MirrorReport, TreeEntry};
use crate::walk::NodeGate;

/// Deletes every filtered-in entry below a remote directory
pub struct RecursiveCleaner<'a, C: Classify> {
	gate: NodeGate<'a>,
	classifier: C,
}

impl<'a, C: Classify> RecursiveCleaner<'a, C> {
	pub fn new(gate: NodeGate<'a>, classifier: C) -> Self {
		RecursiveCleaner { gate, classifier }
	}

	/// Clean the current remote directory, located at `relative` below the root
	///
	/// Per-item failures are logged and counted in `report`; only fatal
	/// errors are returned.
	pub fn clean<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		relative: &str,
		report: &mut MirrorReport,
	) -> Result<(), MirrorError> {
		self.clean_level(session, relative, report).map(|_| ())
	}

	/// Returns whether everything listed in this directory was removed
	fn clean_level<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		relative: &str,
		report: &mut MirrorReport,
	) -> Result<bool, MirrorError> {
		let remote_path = session.root().join(relative);
		if !self.gate.admit(session, relative, &remote_path)? {
			report.skipped += 1;
			return Ok(false);
		}

		let names = match session.list() {
			Ok(names) => names,
			Err(e) if e.is_fatal() => return Err(e),
			// Some servers refuse NLST on an empty directory. Treat the
			// listing as empty and let the parent's rmdir decide.
			Err(e) => {
				warn!("Listing of {} refused, treating it as empty: {}", remote_path, e);
				return Ok(true);
			}
		};

		let mut emptied = true;
		for name in names {
			let mut entry = TreeEntry::unknown(name);
			if entry.is_self_or_parent() {
				continue;
			}

			let child = join_relative(relative, &entry.name);
			let child_remote_path = session.root().join(&child);
			if !self.gate.allows(&child) {
				info!("Skipped: {}", child_remote_path);
				report.skipped += 1;
				emptied = false;
				continue;
			}

			entry.kind = self.classifier.classify(session, &entry.name)?;
			let removed = match entry.kind {
				EntryKind::Directory => {
					self.remove_tree(session, &entry.name, &child, &child_remote_path, report)?
				}
				_ => self.delete_file(session, &entry.name, &child_remote_path, report)?,
			};
			emptied &= removed;
		}

		Ok(emptied)
	}

	fn remove_tree<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		name: &str,
		relative: &str,
		remote_path: &str,
		report: &mut MirrorReport,
	) -> Result<bool, MirrorError> {
		let emptied = match session.descend(name) {
			Ok(mut guard) => {
				let emptied = self.clean_level(&mut *guard, relative, report)?;
				guard.finish()?;
				emptied
			}
			Err(e) if e.is_fatal() => return Err(e),
			Err(e) => {
				error!("Failed to enter {}: {}", remote_path, e);
				report.failures += 1;
				return Ok(false);
			}
		};

		if !emptied {
			info!("Kept remote folder: {}/", remote_path);
			return Ok(false);
		}

		match session.remove_dir(name) {
			Ok(()) => {
				info!("Deleted remote folder: {}/", remote_path);
				report.dirs_removed += 1;
				Ok(true)
			}
			Err(e) if e.is_fatal() => Err(e),
			Err(e) => {
				error!("Failed to delete folder {}: {}", remote_path, e);
				report.failures += 1;
				Ok(false)
			}
		}
	}

	fn delete_file<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		name: &str,
		remote_path: &str,
		report: &mut MirrorReport,
	) -> Result<bool, MirrorError> {
		match session.delete_file(name) {
			Ok(()) => {
				info!("Deleted remote file: {}", remote_path);
				report.files_deleted += 1;
				Ok(true)
			}
			Err(e) if e.is_fatal() => Err(e),
			Err(e) => {
				error!("Failed to delete: {} - {}", remote_path, e);
				report.failures += 1;
				Ok(false)
			}
		}
	}
}


// vim: ts=4
