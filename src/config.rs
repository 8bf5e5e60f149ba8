//! Configuration for mirror runs
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (`--config PATH`, or `./dirmirror.toml` when present)
//! 3. Environment variables (`DIRMIRROR_*`)
//! 4. CLI flags (highest priority)
//!
//! Credentials never come from the config file: they are read from `FTP_USER`
//! and `FTP_PASS`, which an optional dotenv file (`../.env` by default) can
//! supply.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::archive::DEFAULT_ARCHIVE_PREFIX;
use crate::error::MirrorError;
use crate::exclusion::{PathFilter, DEFAULT_EXCLUDED_SUBTREE};
use crate::remote::ftp::FtpSettings;
use crate::session::RemoteRoot;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "dirmirror.toml";

pub const ENV_USER: &str = "FTP_USER";
pub const ENV_PASSWORD: &str = "FTP_PASS";
pub const ENV_HOST: &str = "DIRMIRROR_HOST";
pub const ENV_ROOT: &str = "DIRMIRROR_ROOT";

/// Dotenv file read before the environment is consulted
pub const DEFAULT_ENV_FILE: &str = "../.env";

/// Settings for one mirror run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// TREES
	// ========================================================================
	/// Local directory whose contents are mirrored
	pub source: PathBuf,

	/// Absolute remote directory that receives the contents
	pub remote_root: String,

	// ========================================================================
	// SERVER
	// ========================================================================
	pub host: String,

	pub port: u16,

	/// Connection timeout in seconds
	pub connect_timeout_secs: u64,

	// ========================================================================
	// FILTERING
	// ========================================================================
	/// Directory name skipped at any depth unless `include_excluded` is set
	pub excluded_subtree: String,

	/// Process the excluded subtree too
	pub include_excluded: bool,

	/// Glob patterns (relative to the tree roots) that are always skipped
	pub exclude_patterns: Vec<String>,

	// ========================================================================
	// BACKUP
	// ========================================================================
	/// Write a zip of the filtered local tree before touching the server
	pub backup: bool,

	pub backup_dir: PathBuf,

	pub backup_prefix: String,

	/// Dotenv file with `FTP_USER` / `FTP_PASS`; skipped when absent
	pub env_file: PathBuf,

	// ========================================================================
	// OUTPUT & LOGGING
	// ========================================================================
	/// Log level (trace, debug, info, warn, error)
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			source: PathBuf::from("../dist"),
			remote_root: String::new(),
			host: String::new(),
			port: 21,
			connect_timeout_secs: 30,
			excluded_subtree: DEFAULT_EXCLUDED_SUBTREE.to_string(),
			include_excluded: false,
			exclude_patterns: vec![],
			backup: false,
			backup_dir: PathBuf::from("."),
			backup_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
			env_file: PathBuf::from(DEFAULT_ENV_FILE),
			log_level: "info".to_string(),
		}
	}
}

impl Config {
	/// Defaults overlaid with a config file
	///
	/// An explicit `path` must exist. Without one, `./dirmirror.toml` is
	/// used when present.
	pub fn load(path: Option<&Path>) -> Result<Self, MirrorError> {
		match path {
			Some(path) => Self::from_file(path),
			None => {
				let default = Path::new(DEFAULT_CONFIG_FILE);
				if default.is_file() {
					Self::from_file(default)
				} else {
					Ok(Config::default())
				}
			}
		}
	}

	pub fn from_file(path: &Path) -> Result<Self, MirrorError> {
		let text = fs::read_to_string(path).map_err(|e| MirrorError::InvalidConfig {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;
		Self::from_toml(&text).map_err(|e| match e {
			MirrorError::InvalidConfig { message } => MirrorError::InvalidConfig {
				message: format!("{}: {}", path.display(), message),
			},
			other => other,
		})
	}

	pub fn from_toml(text: &str) -> Result<Self, MirrorError> {
		toml::from_str(text).map_err(|e| MirrorError::InvalidConfig { message: e.to_string() })
	}

	/// Apply `DIRMIRROR_*` variables from the process environment
	pub fn apply_env(&mut self) {
		self.apply_env_with(|key| std::env::var(key).ok());
	}

	/// Apply `DIRMIRROR_*` variables from `lookup`
	pub fn apply_env_with<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
		if let Some(host) = lookup(ENV_HOST).filter(|v| !v.is_empty()) {
			self.host = host;
		}
		if let Some(root) = lookup(ENV_ROOT).filter(|v| !v.is_empty()) {
			self.remote_root = root;
		}
	}

	/// Check the settings a run depends on
	pub fn validate(&self) -> Result<(), MirrorError> {
		if self.host.trim().is_empty() {
			return Err(invalid(format!(
				"no host given (config file, {} or --host)",
				ENV_HOST
			)));
		}
		if self.port == 0 {
			return Err(invalid("port must not be 0".to_string()));
		}
		if self.remote_root.is_empty() {
			return Err(invalid(format!(
				"no remote root given (config file, {} or --root)",
				ENV_ROOT
			)));
		}
		self.root()?;
		self.filter()?;
		if self.backup_prefix.is_empty() {
			return Err(invalid("backup prefix must not be empty".to_string()));
		}
		Ok(())
	}

	pub fn root(&self) -> Result<RemoteRoot, MirrorError> {
		RemoteRoot::new(&self.remote_root)
	}

	/// Path filter described by this configuration
	pub fn filter(&self) -> Result<PathFilter, MirrorError> {
		PathFilter::from_settings(&self.excluded_subtree, &self.exclude_patterns)
			.map_err(|e| invalid(e.to_string()))
	}

	pub fn ftp_settings(&self, credentials: &Credentials) -> FtpSettings {
		FtpSettings {
			host: self.host.clone(),
			port: self.port,
			user: credentials.user.clone(),
			password: credentials.password.clone(),
			connect_timeout: Duration::from_secs(self.connect_timeout_secs),
		}
	}
}

/// Load `KEY=value` lines from `path` into the process environment
///
/// Returns whether a file was read. A missing file is not an error, and
/// variables that are already set keep their values.
pub fn load_env_file(path: &Path) -> Result<bool, MirrorError> {
	if !path.is_file() {
		return Ok(false);
	}
	dotenvy::from_path(path)
		.map_err(|e| invalid(format!("cannot read {}: {}", path.display(), e)))?;
	Ok(true)
}

/// Values given on the command line; `None` leaves the config untouched
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub source: Option<PathBuf>,
	pub remote_root: Option<String>,
	pub host: Option<String>,
	pub port: Option<u16>,
	pub excluded_subtree: Option<String>,
	pub env_file: Option<PathBuf>,
	pub include_excluded: bool,
	pub backup: bool,
	pub verbose: bool,
}

impl CliOverrides {
	pub fn apply(&self, config: &mut Config) {
		if let Some(source) = &self.source {
			config.source = source.clone();
		}
		if let Some(root) = &self.remote_root {
			config.remote_root = root.clone();
		}
		if let Some(host) = &self.host {
			config.host = host.clone();
		}
		if let Some(port) = self.port {
			config.port = port;
		}
		if let Some(name) = &self.excluded_subtree {
			config.excluded_subtree = name.clone();
		}
		if let Some(path) = &self.env_file {
			config.env_file = path.clone();
		}
		// Switches can only turn things on
		config.include_excluded |= self.include_excluded;
		config.backup |= self.backup;
		if self.verbose {
			config.log_level = "debug".to_string();
		}
	}
}

/// Login for the remote server
#[derive(Clone)]
pub struct Credentials {
	pub user: String,
	pub password: String,
}

impl Credentials {
	/// Read `FTP_USER` / `FTP_PASS` from the process environment
	pub fn from_env() -> Result<Self, MirrorError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, MirrorError> {
		let user = lookup(ENV_USER)
			.filter(|v| !v.is_empty())
			.ok_or_else(|| invalid(format!("{} is not set", ENV_USER)))?;
		let password = lookup(ENV_PASSWORD)
			.ok_or_else(|| invalid(format!("{} is not set", ENV_PASSWORD)))?;
		Ok(Credentials { user, password })
	}
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials").field("user", &self.user).finish()
	}
}

fn invalid(message: String) -> MirrorError {
	MirrorError::InvalidConfig { message }
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use tempfile::TempDir;

	fn valid() -> Config {
		Config {
			host: "ftp.example.com".to_string(),
			remote_root: "/site".to_string(),
			..Default::default()
		}
	}

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert_eq!(config.port, 21);
		assert_eq!(config.excluded_subtree, "media");
		assert!(!config.include_excluded);
		assert!(!config.backup);
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_config_from_toml() {
		let config = Config::from_toml(
			r#"
			host = "ftp.example.com"
			remoteRoot = "/site/"
			excludedSubtree = "images"
			excludePatterns = ["**/*.map"]
			backup = true
			"#,
		)
		.unwrap();

		assert_eq!(config.host, "ftp.example.com");
		assert_eq!(config.remote_root, "/site/");
		assert_eq!(config.excluded_subtree, "images");
		assert!(config.backup);
		assert_eq!(config.port, 21);
		assert!(config.validate().is_ok());
		assert_eq!(config.root().unwrap().as_str(), "/site");

		let filter = config.filter().unwrap();
		assert!(!filter.should_process("images/x.png", false));
		assert!(!filter.should_process("assets/app.js.map", true));
	}

	#[test]
	fn test_config_unknown_type_is_rejected() {
		let result = Config::from_toml("port = \"twenty-one\"");
		assert!(matches!(result, Err(MirrorError::InvalidConfig { .. })));
	}

	#[test]
	fn test_load_explicit_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("mirror.toml");
		fs::write(&path, "host = \"h\"\nremoteRoot = \"/r\"\n").unwrap();

		let config = Config::load(Some(&path)).unwrap();
		assert_eq!(config.host, "h");
		assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
	}

	#[test]
	fn test_env_then_cli_priority() {
		let env: HashMap<&str, &str> =
			[(ENV_HOST, "env-host"), (ENV_ROOT, "/env-root")].iter().cloned().collect();

		let mut config = valid();
		config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));
		assert_eq!(config.host, "env-host");
		assert_eq!(config.remote_root, "/env-root");

		let cli = CliOverrides {
			host: Some("cli-host".to_string()),
			include_excluded: true,
			verbose: true,
			..Default::default()
		};
		cli.apply(&mut config);
		assert_eq!(config.host, "cli-host");
		assert_eq!(config.remote_root, "/env-root");
		assert!(config.include_excluded);
		assert_eq!(config.log_level, "debug");
	}

	#[test]
	fn test_validate_rejects_bad_values() {
		let mut config = valid();
		config.remote_root = "relative".to_string();
		assert!(config.validate().is_err());

		let mut config = valid();
		config.remote_root = "/".to_string();
		assert!(config.validate().is_err());

		let mut config = valid();
		config.excluded_subtree = "a/b".to_string();
		assert!(config.validate().is_err());

		let mut config = valid();
		config.excluded_subtree = String::new();
		assert!(config.validate().is_err());

		let mut config = valid();
		config.exclude_patterns = vec!["[".to_string()];
		assert!(config.validate().is_err());

		let mut config = valid();
		config.port = 0;
		assert!(config.validate().is_err());

		assert!(valid().validate().is_ok());
	}

	#[test]
	fn test_env_file_fills_missing_variables_only() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join(".env");
		fs::write(
			&path,
			"DIRMIRROR_TEST_ENVFILE_USER=deploy\nDIRMIRROR_TEST_ENVFILE_KEPT=from-file\n",
		)
		.unwrap();
		std::env::set_var("DIRMIRROR_TEST_ENVFILE_KEPT", "from-process");

		assert!(load_env_file(&path).unwrap());
		assert_eq!(std::env::var("DIRMIRROR_TEST_ENVFILE_USER").unwrap(), "deploy");
		assert_eq!(std::env::var("DIRMIRROR_TEST_ENVFILE_KEPT").unwrap(), "from-process");
	}

	#[test]
	fn test_missing_env_file_is_skipped() {
		let dir = TempDir::new().unwrap();
		assert!(!load_env_file(&dir.path().join(".env")).unwrap());
	}

	#[test]
	fn test_credentials_from_lookup() {
		let creds = Credentials::from_lookup(|key| match key {
			ENV_USER => Some("deploy".to_string()),
			ENV_PASSWORD => Some("secret".to_string()),
			_ => None,
		})
		.unwrap();
		assert_eq!(creds.user, "deploy");
		assert!(!format!("{:?}", creds).contains("secret"));

		assert!(Credentials::from_lookup(|_| None).is_err());
	}
}

// vim: ts=4
