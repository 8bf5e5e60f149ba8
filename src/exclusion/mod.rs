//! Path inclusion policy
//!
//! One policy object decides, for every path the walkers and the archive
//! builder touch, whether that path takes part in the run. The decision is
//! a pure function of the path's segments, so it can be evaluated at every
//! recursion level independently.

mod patterns;

pub use patterns::PatternMatcher;

/// Name of the subtree skipped unless explicitly included
pub const DEFAULT_EXCLUDED_SUBTREE: &str = "media";

/// Decides which paths participate in a mirror run
#[derive(Debug, Clone)]
pub struct PathFilter {
	excluded_subtree: String,
	patterns: PatternMatcher,
}

impl PathFilter {
	/// Create a filter for the given excluded subtree name
	pub fn new(excluded_subtree: impl Into<String>) -> Self {
		PathFilter { excluded_subtree: excluded_subtree.into(), patterns: PatternMatcher::empty() }
	}

	/// Filter from user-supplied settings
	///
	/// The subtree name must be a single non-empty path segment: an empty
	/// name would match the root itself and skip the whole run.
	pub fn from_settings(
		excluded_subtree: &str,
		patterns: &[String],
	) -> Result<Self, ExclusionError> {
		if excluded_subtree.is_empty()
			|| excluded_subtree.contains(|c: char| c == '/' || c == '\\')
			|| excluded_subtree == "."
			|| excluded_subtree == ".."
		{
			return Err(ExclusionError::InvalidSubtreeName(excluded_subtree.to_string()));
		}
		PathFilter::new(excluded_subtree).with_patterns(patterns)
	}

	/// Add glob patterns that exclude paths regardless of the inclusion flag
	pub fn with_patterns(mut self, patterns: &[String]) -> Result<Self, ExclusionError> {
		self.patterns = PatternMatcher::new(patterns)?;
		Ok(self)
	}

	pub fn excluded_subtree(&self) -> &str {
		&self.excluded_subtree
	}

	/// Check whether `path` takes part in the run
	///
	/// `path` is relative to the tree root (local source or remote root).
	/// Segments are split on both `/` and `\`. The path is rejected when the
	/// excluded subtree name is one of its segments and
	/// `include_excluded_subtree` is false, or when an extra pattern matches.
	pub fn should_process(&self, path: &str, include_excluded_subtree: bool) -> bool {
		if !include_excluded_subtree && self.has_excluded_segment(path) {
			return false;
		}

		if self.patterns.is_excluded(&normalize_separators(path)) {
			return false;
		}

		true
	}

	fn has_excluded_segment(&self, path: &str) -> bool {
		path.split(|c: char| c == '/' || c == '\\').any(|segment| segment == self.excluded_subtree)
	}
}

impl Default for PathFilter {
	fn default() -> Self {
		Self::new(DEFAULT_EXCLUDED_SUBTREE)
	}
}

fn normalize_separators(path: &str) -> String {
	path.replace('\\', "/")
}

/// Errors that can occur during exclusion processing
#[derive(Debug)]
pub enum ExclusionError {
	/// Failed to parse a glob pattern
	InvalidPattern(String),

	/// Excluded subtree name is empty or not a single segment
	InvalidSubtreeName(String),
}

impl std::fmt::Display for ExclusionError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ExclusionError::InvalidPattern(msg) => {
				write!(f, "Invalid exclusion pattern: {}", msg)
			}
			ExclusionError::InvalidSubtreeName(name) => {
				write!(f, "excluded subtree must be a single name, got {:?}", name)
			}
		}
	}
}

impl std::error::Error for ExclusionError {}


// vim: ts=4
