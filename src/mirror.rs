//! Mirror runs: clean the remote root, then upload the local tree
//!
//! ```rust,ignore
//! use dirmirror::mirror::MirrorBuilder;
//! use dirmirror::remote::MemoryRemote;
//!
//! let mirror = MirrorBuilder::new()
//!     .source("./dist")
//!     .remote_root("/site")
//!     .excluded_subtree("media")
//!     .build()?;
//! let (report, remote) = mirror.run_on(MemoryRemote::new().with_dir("/site"))?;
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::archive::ArchiveBuilder;
use crate::clean::RecursiveCleaner;
use crate::config::{Config, Credentials};
use crate::error::MirrorError;
use crate::exclusion::{PathFilter, DEFAULT_EXCLUDED_SUBTREE};
use crate::probe::ProbeClassifier;
use crate::remote::{FtpRemote, RemoteFs};
use crate::session::{RemoteRoot, RemoteSession};
use crate::types::MirrorReport;
use crate::upload::RecursiveUploader;
use crate::walk::NodeGate;

/// A validated mirror job
#[derive(Debug, Clone)]
pub struct Mirror {
	source: PathBuf,
	root: RemoteRoot,
	filter: PathFilter,
	include_excluded: bool,
}

impl Mirror {
	/// Build a job from a loaded configuration
	pub fn from_config(config: &Config) -> Result<Self, MirrorError> {
		MirrorBuilder::new()
			.source(&config.source)
			.remote_root(&config.remote_root)
			.excluded_subtree(&config.excluded_subtree)
			.exclude_patterns(config.exclude_patterns.clone())
			.include_excluded(config.include_excluded)
			.build()
	}

	pub fn source(&self) -> &Path {
		&self.source
	}

	pub fn root(&self) -> &RemoteRoot {
		&self.root
	}

	pub fn filter(&self) -> &PathFilter {
		&self.filter
	}

	/// Zip the filtered local tree into `output_dir`
	pub fn backup(&self, output_dir: &Path, prefix: &str) -> Result<PathBuf, MirrorError> {
		ArchiveBuilder::new(&self.filter)
			.output_dir(output_dir)
			.prefix(prefix)
			.build(&self.source, self.include_excluded)
	}

	/// Clean then upload on an open session
	///
	/// Clean finishes completely before upload starts. Per-item failures are
	/// counted in the report; fatal errors stop the run where it is.
	pub fn run<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
	) -> Result<MirrorReport, MirrorError> {
		let mut report = MirrorReport::default();
		let gate = NodeGate::new(&self.filter, self.include_excluded);

		info!("Cleaning remote files...");
		RecursiveCleaner::new(gate, ProbeClassifier).clean(session, "", &mut report)?;

		info!("Uploading files...");
		RecursiveUploader::new(gate, &self.source).upload(session, &self.source, &mut report)?;

		session.verify()?;
		Ok(report)
	}

	/// Open a session on `remote`, run, and log out
	///
	/// Returns the backend so callers can inspect it. After a fatal error the
	/// backend is dropped without logging out.
	pub fn run_on<R: RemoteFs>(&self, remote: R) -> Result<(MirrorReport, R), MirrorError> {
		let mut session = RemoteSession::open(remote, self.root.clone())?;
		let report = self.run(&mut session)?;
		let remote = session.close()?;
		Ok((report, remote))
	}
}

/// Builder for [`Mirror`]
#[derive(Debug, Clone)]
pub struct MirrorBuilder {
	source: Option<PathBuf>,
	remote_root: Option<String>,
	excluded_subtree: String,
	exclude_patterns: Vec<String>,
	include_excluded: bool,
}

impl MirrorBuilder {
	pub fn new() -> Self {
		MirrorBuilder {
			source: None,
			remote_root: None,
			excluded_subtree: DEFAULT_EXCLUDED_SUBTREE.to_string(),
			exclude_patterns: Vec::new(),
			include_excluded: false,
		}
	}

	pub fn source(mut self, path: impl AsRef<Path>) -> Self {
		self.source = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn remote_root(mut self, root: impl Into<String>) -> Self {
		self.remote_root = Some(root.into());
		self
	}

	pub fn excluded_subtree(mut self, name: impl Into<String>) -> Self {
		self.excluded_subtree = name.into();
		self
	}

	pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
		self.exclude_patterns = patterns;
		self
	}

	pub fn include_excluded(mut self, include: bool) -> Self {
		self.include_excluded = include;
		self
	}

	/// Validate and build; the source must be an existing directory
	pub fn build(self) -> Result<Mirror, MirrorError> {
		let source = self.source.ok_or_else(|| MirrorError::InvalidConfig {
			message: "no source directory given".to_string(),
		})?;
		if !source.is_dir() {
			return Err(MirrorError::InvalidConfig {
				message: format!("source {} is not a directory", source.display()),
			});
		}

		let root = self.remote_root.ok_or_else(|| MirrorError::InvalidConfig {
			message: "no remote root given".to_string(),
		})?;
		let root = RemoteRoot::new(&root)?;

		let filter = PathFilter::from_settings(&self.excluded_subtree, &self.exclude_patterns)
			.map_err(|e| MirrorError::InvalidConfig { message: e.to_string() })?;

		Ok(Mirror { source, root, filter, include_excluded: self.include_excluded })
	}
}

impl Default for MirrorBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Full run against the configured FTPS server
///
/// The backup archive, when requested, is written before any connection is
/// made; a failed backup stops the run.
pub fn run_ftp(config: &Config, credentials: &Credentials) -> Result<MirrorReport, MirrorError> {
	config.validate()?;
	let mirror = Mirror::from_config(config)?;

	if config.backup {
		mirror.backup(&config.backup_dir, &config.backup_prefix)?;
	}

	let remote = FtpRemote::connect(&config.ftp_settings(credentials))?;
	let (report, _) = mirror.run_on(remote)?;
	Ok(report)
}


// vim: ts=4
