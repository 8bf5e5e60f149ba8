//! Remote entry classification
//!
//! The remote protocol cannot say whether a name is a file or a directory.
//! [`ProbeClassifier`] finds out by trying to enter the name: if the server
//! lets us in it is a directory, otherwise it is taken to be a file.
//!
//! A directory we are not allowed to enter is reported as a file. The later
//! delete attempt then fails and is logged as a per-item failure.

use tracing::debug;

use crate::error::MirrorError;
use crate::remote::RemoteFs;
use crate::session::RemoteSession;
use crate::types::EntryKind;

/// Strategy for telling files from directories on the remote side
pub trait Classify {
	/// Classify child `name` of the current remote directory
	///
	/// Must leave the cursor where it found it. Only fatal errors are
	/// returned; the result is never [`EntryKind::Unknown`].
	fn classify<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		name: &str,
	) -> Result<EntryKind, MirrorError>;
}

/// Classifies by trial descent
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeClassifier;

impl Classify for ProbeClassifier {
	fn classify<R: RemoteFs>(
		&self,
		session: &mut RemoteSession<R>,
		name: &str,
	) -> Result<EntryKind, MirrorError> {
		match session.descend(name) {
			Ok(guard) => {
				guard.finish()?;
				Ok(EntryKind::Directory)
			}
			Err(e) if e.is_fatal() => Err(e),
			Err(e) => {
				debug!("Probe of {} refused, treating as file: {}", name, e);
				Ok(EntryKind::File)
			}
		}
	}
}


// vim: ts=4
