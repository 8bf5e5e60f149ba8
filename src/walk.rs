//! Per-node admission step shared by the cleaner and the uploader

use tracing::info;

use crate::error::MirrorError;
use crate::exclusion::PathFilter;
use crate::remote::RemoteFs;
use crate::session::RemoteSession;

/// Confinement check plus filter decision for one node
///
/// Both walkers call [`NodeGate::admit`] first thing at every node, so they
/// cannot drift apart in what they skip.
#[derive(Debug, Clone, Copy)]
pub struct NodeGate<'a> {
	filter: &'a PathFilter,
	include_excluded: bool,
}

impl<'a> NodeGate<'a> {
	pub fn new(filter: &'a PathFilter, include_excluded: bool) -> Self {
		NodeGate { filter, include_excluded }
	}

	/// Filter decision alone, for paths not yet visited
	pub fn allows(&self, relative: &str) -> bool {
		self.filter.should_process(relative, self.include_excluded)
	}

	/// Verify confinement, then decide whether `relative` is processed
	///
	/// Returns `Ok(false)` for a skipped node. Confinement failures are
	/// returned as errors.
	pub fn admit<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		relative: &str,
		remote_path: &str,
	) -> Result<bool, MirrorError> {
		session.verify()?;
		if !self.allows(relative) {
			info!("Skipped: {}", remote_path);
			return Ok(false);
		}
		Ok(true)
	}
}


// vim: ts=4
