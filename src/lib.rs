//! # dirmirror - Confined directory mirroring over FTPS
//!
//! dirmirror replaces the contents of one remote directory with the
//! contents of a local directory. The remote side is a plain cursor-based
//! file server: it can list, change, make and remove directories and store
//! and delete files, but cannot tell a file from a directory. The mirror
//! works around that by probing, and checks after every directory change
//! that the cursor is still inside the configured root.
//!
//! A run always deletes everything first and uploads everything after. One
//! named subtree (`media` by default) is left alone unless it is explicitly
//! included.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dirmirror::config::{Config, Credentials};
//! use dirmirror::mirror::run_ftp;
//!
//! let mut config = Config::load(None)?;
//! config.apply_env();
//! let report = run_ftp(&config, &Credentials::from_env()?)?;
//! println!("{}", report);
//! ```

pub mod archive;
pub mod clean;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod logging;
pub mod mirror;
pub mod probe;
pub mod remote;
pub mod session;
pub mod types;
pub mod upload;
pub mod walk;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{MirrorError, RemoteError};
pub use exclusion::PathFilter;
pub use mirror::{Mirror, MirrorBuilder};
pub use session::{RemoteRoot, RemoteSession};
pub use types::{EntryKind, MirrorReport, TreeEntry};

// vim: ts=4
