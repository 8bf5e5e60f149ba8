//! Recursive upload of the local tree

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::MirrorError;
use crate::remote::RemoteFs;
use crate::session::{MakeDir, RemoteSession};
use crate::types::MirrorReport;
use crate::walk::NodeGate;

/// Replicates a local directory tree under the remote root
pub struct RecursiveUploader<'a> {
	gate: NodeGate<'a>,
	local_root: PathBuf,
}

impl<'a> RecursiveUploader<'a> {
	/// `local_root` is the directory that maps onto the remote root
	pub fn new(gate: NodeGate<'a>, local_root: impl Into<PathBuf>) -> Self {
		RecursiveUploader { gate, local_root: local_root.into() }
	}

	/// Upload `local_path` into the current remote directory
	///
	/// The local root itself is not re-created: its children go straight
	/// into the remote root. Per-item failures are logged and counted in
	/// `report`; only fatal errors are returned.
	pub fn upload<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		local_path: &Path,
		report: &mut MirrorReport,
	) -> Result<(), MirrorError> {
		let relative = self.relative(local_path);
		let remote_path = session.root().join(&relative);
		if !self.gate.admit(session, &relative, &remote_path)? {
			report.skipped += 1;
			return Ok(());
		}

		if relative.is_empty() {
			return self.upload_children(session, local_path, report);
		}

		let name = match local_path.file_name() {
			Some(name) => name.to_string_lossy().into_owned(),
			None => {
				error!("Cannot upload {}: no file name", local_path.display());
				report.failures += 1;
				return Ok(());
			}
		};

		match fs::metadata(local_path) {
			Ok(meta) if meta.is_dir() => {
				self.upload_dir(session, local_path, &name, &remote_path, report)
			}
			Ok(_) => self.upload_file(session, local_path, &name, &remote_path, report),
			Err(e) => {
				error!("Failed to upload: {} - {}", local_path.display(), e);
				report.failures += 1;
				Ok(())
			}
		}
	}

	fn upload_children<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		local_dir: &Path,
		report: &mut MirrorReport,
	) -> Result<(), MirrorError> {
		let mut children: Vec<PathBuf> = match fs::read_dir(local_dir) {
			Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
			Err(e) => {
				error!("Failed to read {}: {}", local_dir.display(), e);
				report.failures += 1;
				return Ok(());
			}
		};
		children.sort();

		for child in children {
			self.upload(session, &child, report)?;
		}
		Ok(())
	}

	fn upload_dir<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		local_dir: &Path,
		name: &str,
		remote_path: &str,
		report: &mut MirrorReport,
	) -> Result<(), MirrorError> {
		match session.make_dir(name)? {
			MakeDir::Created => {
				info!("Created remote folder: {}/", remote_path);
				report.dirs_created += 1;
			}
			MakeDir::AlreadyPresent => debug!("Remote folder exists: {}/", remote_path),
			MakeDir::Failed(e) => {
				error!("Failed to create folder {}: {}", remote_path, e);
				report.failures += 1;
				return Ok(());
			}
		}

		match session.descend(name) {
			Ok(mut guard) => {
				self.upload_children(&mut *guard, local_dir, report)?;
				guard.finish()
			}
			Err(e) if e.is_fatal() => Err(e),
			Err(e) => {
				error!("Failed to enter {}: {}", remote_path, e);
				report.failures += 1;
				Ok(())
			}
		}
	}

	fn upload_file<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		local_file: &Path,
		name: &str,
		remote_path: &str,
		report: &mut MirrorReport,
	) -> Result<(), MirrorError> {
		let mut file = match fs::File::open(local_file) {
			Ok(f) => f,
			Err(e) => {
				error!("Failed to upload: {} - {}", local_file.display(), e);
				report.failures += 1;
				return Ok(());
			}
		};

		match session.store(name, &mut file) {
			Ok(bytes) => {
				info!("Uploaded: {} -> {}", local_file.display(), remote_path);
				report.files_uploaded += 1;
				report.bytes_uploaded += bytes;
				Ok(())
			}
			Err(e) if e.is_fatal() => Err(e),
			Err(e) => {
				error!("Failed to upload: {} - {}", local_file.display(), e);
				report.failures += 1;
				Ok(())
			}
		}
	}

	/// Path below the local root with `/` separators
	fn relative(&self, local_path: &Path) -> String {
		relative_path(&self.local_root, local_path)
	}
}

/// `path` relative to `root`, joined with `/`; empty for the root itself
pub fn relative_path(root: &Path, path: &Path) -> String {
	let rel = path.strip_prefix(root).unwrap_or(path);
	rel.components()
		.filter_map(|c| match c {
			Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
			_ => None,
		})
		.collect::<Vec<_>>()
		.join("/")
}


// vim: ts=4
