use std::fmt;

/// Kind of a remote entry as far as the walker knows
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntryKind {
	File,
	Directory,
	/// Not probed yet
	Unknown,
}

/// One name seen while walking a remote directory
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TreeEntry {
	pub name: String,
	pub kind: EntryKind,
}

impl TreeEntry {
	pub fn unknown(name: impl Into<String>) -> Self {
		TreeEntry { name: name.into(), kind: EntryKind::Unknown }
	}

	/// `.` and `..` show up in some server listings
	pub fn is_self_or_parent(&self) -> bool {
		self.name == "." || self.name == ".."
	}
}

/// Counters collected over one run
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct MirrorReport {
	pub files_deleted: usize,
	pub dirs_removed: usize,
	pub files_uploaded: usize,
	pub dirs_created: usize,
	pub bytes_uploaded: u64,
	pub skipped: usize,
	pub failures: usize,
}

impl MirrorReport {
	pub fn has_failures(&self) -> bool {
		self.failures > 0
	}
}

impl fmt::Display for MirrorReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"deleted {} files, removed {} dirs, uploaded {} files ({} bytes), \
			 created {} dirs, skipped {}, failed {}",
			self.files_deleted,
			self.dirs_removed,
			self.files_uploaded,
			self.bytes_uploaded,
			self.dirs_created,
			self.skipped,
			self.failures
		)
	}
}

/// Join a relative path and a child name with `/`
pub fn join_relative(parent: &str, name: &str) -> String {
	if parent.is_empty() {
		name.to_string()
	} else {
		format!("{}/{}", parent, name)
	}
}

// vim: ts=4
