//! Glob-based extra exclusions

use super::ExclusionError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Pattern matcher using globset for efficient matching
#[derive(Debug, Clone)]
pub struct PatternMatcher {
	/// Original pattern strings
	patterns: Vec<String>,

	/// Compiled exclusion patterns
	exclude_set: GlobSet,
}

impl PatternMatcher {
	/// Create a new pattern matcher
	pub fn new(exclude_patterns: &[String]) -> Result<Self, ExclusionError> {
		let exclude_set = Self::build_glob_set(exclude_patterns)?;
		Ok(Self { patterns: exclude_patterns.to_vec(), exclude_set })
	}

	/// Matcher that excludes nothing
	pub fn empty() -> Self {
		Self { patterns: Vec::new(), exclude_set: GlobSet::empty() }
	}

	/// Build a GlobSet from patterns
	///
	/// `*` does not cross `/`, so `*.log` only matches at the top level and
	/// `**/*.log` matches everywhere.
	fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ExclusionError> {
		let mut builder = GlobSetBuilder::new();

		for pattern in patterns {
			let glob = GlobBuilder::new(pattern)
				.literal_separator(true)
				.build()
				.map_err(|e| ExclusionError::InvalidPattern(format!("{}: {}", pattern, e)))?;
			builder.add(glob);
		}

		builder.build().map_err(|e| {
			ExclusionError::InvalidPattern(format!("Failed to build pattern set: {}", e))
		})
	}

	/// Check if a relative path is excluded by any pattern
	pub fn is_excluded(&self, path: &str) -> bool {
		!self.patterns.is_empty() && self.exclude_set.is_match(Path::new(path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pattern_matching() {
		let matcher =
			PatternMatcher::new(&["**/*.map".to_string(), "drafts/**".to_string()]).unwrap();

		assert!(matcher.is_excluded("index.js.map"));
		assert!(matcher.is_excluded("assets/index.js.map"));
		assert!(matcher.is_excluded("drafts/post.html"));
		assert!(!matcher.is_excluded("assets/index.js"));
	}

	#[test]
	fn test_star_does_not_cross_separator() {
		let matcher = PatternMatcher::new(&["*.tmp".to_string()]).unwrap();

		assert!(matcher.is_excluded("a.tmp"));
		assert!(!matcher.is_excluded("sub/a.tmp"));
	}

	#[test]
	fn test_invalid_pattern() {
		let result = PatternMatcher::new(&["[invalid".to_string()]);
		assert!(matches!(result, Err(ExclusionError::InvalidPattern(_))));
	}

	#[test]
	fn test_empty_matcher() {
		let matcher = PatternMatcher::empty();
		assert!(!matcher.is_excluded("anything"));
	}
}

// vim: ts=4
