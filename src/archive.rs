//! Local backup archive of the filtered tree

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::MirrorError;
use crate::exclusion::PathFilter;
use crate::upload::relative_path;

/// Default archive name prefix
pub const DEFAULT_ARCHIVE_PREFIX: &str = "dist";

/// Packs the filtered local tree into one zip file
pub struct ArchiveBuilder<'a> {
	filter: &'a PathFilter,
	output_dir: PathBuf,
	prefix: String,
}

impl<'a> ArchiveBuilder<'a> {
	pub fn new(filter: &'a PathFilter) -> Self {
		ArchiveBuilder {
			filter,
			output_dir: PathBuf::from("."),
			prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
		}
	}

	/// Directory the archive is written to (default: current directory)
	pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.output_dir = dir.into();
		self
	}

	/// File name prefix (default: `dist`)
	pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Write every filtered-in file under `local_root` into a new archive
	///
	/// Entries are keyed by their path relative to `local_root`. Any I/O
	/// error aborts the archive.
	pub fn build(&self, local_root: &Path, include_excluded: bool) -> Result<PathBuf, MirrorError> {
		let entries = self.collect(local_root, include_excluded)?;

		let archive_path = self.output_dir.join(archive_name(&self.prefix, Local::now()));
		write_zip_archive(&archive_path, &entries)?;

		info!("Backup created: {} ({} files)", archive_path.display(), entries.len());
		Ok(archive_path)
	}

	/// Files to pack, as (source path, entry name), in name order
	fn collect(
		&self,
		local_root: &Path,
		include_excluded: bool,
	) -> Result<Vec<(PathBuf, String)>, MirrorError> {
		let mut entries = Vec::new();
		// Links are followed, matching what the uploader sends
		let walker = WalkDir::new(local_root)
			.follow_links(true)
			.sort_by_file_name()
			.into_iter()
			.filter_entry(|e| {
				self.filter.should_process(&relative_path(local_root, e.path()), include_excluded)
			});

		for entry in walker {
			let entry = entry.map_err(|e| MirrorError::Archive {
				message: format!("cannot walk {}: {}", local_root.display(), e),
			})?;
			if entry.file_type().is_dir() {
				continue;
			}
			let name = relative_path(local_root, entry.path());
			entries.push((entry.into_path(), name));
		}

		Ok(entries)
	}
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.zip`
pub fn archive_name(prefix: &str, timestamp: DateTime<Local>) -> String {
	format!("{}_{}.zip", prefix, timestamp.format("%Y%m%d_%H%M%S"))
}

fn write_zip_archive(
	archive_path: &Path,
	entries: &[(PathBuf, String)],
) -> Result<(), MirrorError> {
	let archive_err = |what: String, e: &dyn std::fmt::Display| MirrorError::Archive {
		message: format!("{}: {}", what, e),
	};

	let file = File::create(archive_path)
		.map_err(|e| archive_err(format!("cannot create {}", archive_path.display()), &e))?;
	let mut writer = ZipWriter::new(file);
	let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

	for (source_path, entry_name) in entries {
		let mut source = File::open(source_path)
			.map_err(|e| archive_err(format!("cannot open {}", source_path.display()), &e))?;
		writer
			.start_file(entry_name.as_str(), options)
			.map_err(|e| archive_err(format!("cannot start entry {}", entry_name), &e))?;
		io::copy(&mut source, &mut writer)
			.map_err(|e| archive_err(format!("cannot add {}", source_path.display()), &e))?;
		info!("Backed up: {}", source_path.display());
	}

	writer.finish().map_err(|e| archive_err("cannot finalize archive".to_string(), &e))?;
	Ok(())
}


// vim: ts=4
