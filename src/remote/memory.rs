//! In-process remote filesystem
//!
//! Behaves like a small FTP server: one current directory, names resolved
//! against it, `mkdir` refusing existing names, `rmdir` refusing non-empty
//! directories. Faults can be injected per command and path, and every
//! command is recorded so tests can check what the engine sent.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use super::{RemoteFs, RemoteResult};
use crate::error::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
	Dir,
	File(Vec<u8>),
}

/// Simulated cursor-based file server
#[derive(Debug, Clone)]
pub struct MemoryRemote {
	nodes: BTreeMap<String, Node>,
	cwd: String,
	ops: Vec<String>,
	denied: BTreeSet<String>,
	faults: BTreeSet<(String, String)>,
	redirects: BTreeMap<String, String>,
	list_dots: bool,
}

impl MemoryRemote {
	/// Empty server with only `/`
	pub fn new() -> Self {
		let mut nodes = BTreeMap::new();
		nodes.insert("/".to_string(), Node::Dir);
		MemoryRemote {
			nodes,
			cwd: "/".to_string(),
			ops: Vec::new(),
			denied: BTreeSet::new(),
			faults: BTreeSet::new(),
			redirects: BTreeMap::new(),
			list_dots: true,
		}
	}

	/// Add a directory (and any missing parents)
	pub fn with_dir(mut self, path: &str) -> Self {
		let path = normalize(path);
		self.create_parents(&path);
		self.nodes.insert(path, Node::Dir);
		self
	}

	/// Add a file (and any missing parent directories)
	pub fn with_file(mut self, path: &str, contents: &[u8]) -> Self {
		let path = normalize(path);
		self.create_parents(&path);
		self.nodes.insert(path, Node::File(contents.to_vec()));
		self
	}

	/// Refuse to enter `path`, as a server does for a directory without permission
	pub fn deny_entry(mut self, path: &str) -> Self {
		self.denied.insert(normalize(path));
		self
	}

	/// Make `op` (e.g. `"DELE"`, `"STOR"`, `"MKD"`) fail for `path`
	pub fn fail_op(mut self, op: &str, path: &str) -> Self {
		self.faults.insert((op.to_string(), normalize(path)));
		self
	}

	/// Entering `from` puts the cursor at `to` instead
	pub fn redirect(mut self, from: &str, to: &str) -> Self {
		self.redirects.insert(normalize(from), normalize(to));
		self
	}

	/// Whether listings include `.` and `..` (default: yes)
	pub fn list_dots(mut self, enabled: bool) -> Self {
		self.list_dots = enabled;
		self
	}

	/// Commands received so far, e.g. `"CWD sub"`, `"DELE a.txt"`
	pub fn ops(&self) -> &[String] {
		&self.ops
	}

	/// Current directory without recording a command
	pub fn current_dir(&self) -> &str {
		&self.cwd
	}

	pub fn exists(&self, path: &str) -> bool {
		self.nodes.contains_key(&normalize(path))
	}

	pub fn is_dir(&self, path: &str) -> bool {
		self.nodes.get(&normalize(path)) == Some(&Node::Dir)
	}

	pub fn read_file(&self, path: &str) -> Option<&[u8]> {
		match self.nodes.get(&normalize(path)) {
			Some(Node::File(data)) => Some(data),
			_ => None,
		}
	}

	/// Every path below `root`, relative to it
	pub fn paths_under(&self, root: &str) -> BTreeSet<String> {
		let root = normalize(root);
		let prefix = if root == "/" { "/".to_string() } else { format!("{}/", root) };
		self.nodes
			.keys()
			.filter_map(|path| path.strip_prefix(prefix.as_str()))
			.filter(|rel| !rel.is_empty())
			.map(String::from)
			.collect()
	}

	/// Files below `root`, relative to it
	pub fn files_under(&self, root: &str) -> BTreeSet<String> {
		let root = normalize(root);
		self.paths_under(&root)
			.into_iter()
			.filter(|rel| !self.is_dir(&join(&root, rel)))
			.collect()
	}

	fn record(&mut self, op: &str, arg: Option<&str>) {
		match arg {
			Some(arg) => self.ops.push(format!("{} {}", op, arg)),
			None => self.ops.push(op.to_string()),
		}
	}

	fn check_fault(&self, op: &str, path: &str) -> RemoteResult<()> {
		if self.faults.contains(&(op.to_string(), path.to_string())) {
			return Err(RemoteError::rejected(format!("550 {} failed: {}", op, path)));
		}
		Ok(())
	}

	fn create_parents(&mut self, path: &str) {
		let mut current = parent(path);
		let mut missing = Vec::new();
		while !self.nodes.contains_key(&current) {
			missing.push(current.clone());
			current = parent(&current);
		}
		for dir in missing {
			self.nodes.insert(dir, Node::Dir);
		}
	}

	fn resolve(&self, path: &str) -> String {
		let mut segments: Vec<&str> = if path.starts_with('/') {
			Vec::new()
		} else {
			self.cwd.split('/').filter(|s| !s.is_empty()).collect()
		};

		for segment in path.split('/') {
			match segment {
				"" | "." => {}
				".." => {
					segments.pop();
				}
				s => segments.push(s),
			}
		}

		format!("/{}", segments.join("/"))
	}

	fn children(&self, dir: &str) -> Vec<String> {
		self.nodes
			.keys()
			.filter(|path| path.as_str() != "/" && parent(path) == dir)
			.map(|path| name_of(path).to_string())
			.collect()
	}
}

impl Default for MemoryRemote {
	fn default() -> Self {
		Self::new()
	}
}

impl RemoteFs for MemoryRemote {
	fn pwd(&mut self) -> RemoteResult<String> {
		self.record("PWD", None);
		Ok(self.cwd.clone())
	}

	fn cwd(&mut self, path: &str) -> RemoteResult<()> {
		self.record("CWD", Some(path));
		let target = self.resolve(path);
		self.check_fault("CWD", &target)?;

		if self.denied.contains(&target) {
			return Err(RemoteError::rejected(format!("550 {}: Permission denied", path)));
		}

		match self.nodes.get(&target) {
			Some(Node::Dir) => {
				self.cwd = self.redirects.get(&target).cloned().unwrap_or(target);
				Ok(())
			}
			Some(Node::File(_)) => {
				Err(RemoteError::rejected(format!("550 {}: Not a directory", path)))
			}
			None => Err(RemoteError::rejected(format!("550 {}: No such file or directory", path))),
		}
	}

	fn cdup(&mut self) -> RemoteResult<()> {
		self.record("CDUP", None);
		self.check_fault("CDUP", &self.cwd)?;
		self.cwd = parent(&self.cwd);
		Ok(())
	}

	fn list(&mut self) -> RemoteResult<Vec<String>> {
		self.record("NLST", None);
		self.check_fault("NLST", &self.cwd)?;

		let mut names = Vec::new();
		if self.list_dots {
			names.push(".".to_string());
			names.push("..".to_string());
		}
		names.extend(self.children(&self.cwd));
		Ok(names)
	}

	fn mkdir(&mut self, name: &str) -> RemoteResult<()> {
		self.record("MKD", Some(name));
		let target = self.resolve(name);
		self.check_fault("MKD", &target)?;

		if self.nodes.contains_key(&target) {
			return Err(RemoteError::rejected(format!("550 {}: File exists", name)));
		}
		if self.nodes.get(&parent(&target)) != Some(&Node::Dir) {
			return Err(RemoteError::rejected(format!("550 {}: No such file or directory", name)));
		}
		self.nodes.insert(target, Node::Dir);
		Ok(())
	}

	fn rmdir(&mut self, name: &str) -> RemoteResult<()> {
		self.record("RMD", Some(name));
		let target = self.resolve(name);
		self.check_fault("RMD", &target)?;

		match self.nodes.get(&target) {
			Some(Node::Dir) if target != "/" => {
				if !self.children(&target).is_empty() {
					return Err(RemoteError::rejected(format!(
						"550 {}: Directory not empty",
						name
					)));
				}
				self.nodes.remove(&target);
				Ok(())
			}
			_ => Err(RemoteError::rejected(format!("550 {}: Not a directory", name))),
		}
	}

	fn delete(&mut self, name: &str) -> RemoteResult<()> {
		self.record("DELE", Some(name));
		let target = self.resolve(name);
		self.check_fault("DELE", &target)?;

		match self.nodes.get(&target) {
			Some(Node::File(_)) => {
				self.nodes.remove(&target);
				Ok(())
			}
			Some(Node::Dir) => Err(RemoteError::rejected(format!("550 {}: Is a directory", name))),
			None => Err(RemoteError::rejected(format!("550 {}: No such file", name))),
		}
	}

	fn store(&mut self, name: &str, reader: &mut dyn Read) -> RemoteResult<u64> {
		self.record("STOR", Some(name));
		let target = self.resolve(name);
		self.check_fault("STOR", &target)?;

		if self.nodes.get(&target) == Some(&Node::Dir) {
			return Err(RemoteError::rejected(format!("553 {}: Is a directory", name)));
		}

		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		let len = data.len() as u64;
		self.nodes.insert(target, Node::File(data));
		Ok(len)
	}

	fn quit(&mut self) -> RemoteResult<()> {
		self.record("QUIT", None);
		Ok(())
	}
}

fn normalize(path: &str) -> String {
	let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
	format!("/{}", segments.join("/"))
}

fn parent(path: &str) -> String {
	match path.rfind('/') {
		Some(0) | None => "/".to_string(),
		Some(idx) => path[..idx].to_string(),
	}
}

fn name_of(path: &str) -> &str {
	path.rsplit('/').next().unwrap_or(path)
}

fn join(root: &str, rel: &str) -> String {
	if root == "/" {
		format!("/{}", rel)
	} else {
		format!("{}/{}", root, rel)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> MemoryRemote {
		MemoryRemote::new().with_file("/site/a.txt", b"a").with_file("/site/sub/b.txt", b"b")
	}

	#[test]
	fn test_cwd_and_cdup() {
		let mut remote = sample();
		remote.cwd("/site").unwrap();
		remote.cwd("sub").unwrap();
		assert_eq!(remote.pwd().unwrap(), "/site/sub");

		remote.cdup().unwrap();
		assert_eq!(remote.pwd().unwrap(), "/site");

		assert!(remote.cwd("a.txt").is_err());
		assert!(remote.cwd("missing").is_err());
		assert_eq!(remote.current_dir(), "/site");
	}

	#[test]
	fn test_list_includes_dots() {
		let mut remote = sample();
		remote.cwd("/site").unwrap();
		let names = remote.list().unwrap();
		assert_eq!(names, vec![".", "..", "a.txt", "sub"]);

		let mut remote = sample().list_dots(false);
		remote.cwd("/site").unwrap();
		assert_eq!(remote.list().unwrap(), vec!["a.txt", "sub"]);
	}

	#[test]
	fn test_mkdir_refuses_existing() {
		let mut remote = sample();
		remote.cwd("/site").unwrap();
		assert!(remote.mkdir("sub").is_err());
		assert!(remote.mkdir("new").is_ok());
		assert!(remote.is_dir("/site/new"));
	}

	#[test]
	fn test_rmdir_requires_empty() {
		let mut remote = sample();
		remote.cwd("/site").unwrap();
		assert!(remote.rmdir("sub").is_err());

		remote.cwd("sub").unwrap();
		remote.delete("b.txt").unwrap();
		remote.cdup().unwrap();
		assert!(remote.rmdir("sub").is_ok());
		assert!(!remote.exists("/site/sub"));
	}

	#[test]
	fn test_store_and_read_back() {
		let mut remote = sample();
		remote.cwd("/site/sub").unwrap();
		let written = remote.store("c.txt", &mut &b"hello"[..]).unwrap();
		assert_eq!(written, 5);
		assert_eq!(remote.read_file("/site/sub/c.txt"), Some(&b"hello"[..]));
	}

	#[test]
	fn test_fault_injection_and_ops_log() {
		let mut remote = sample().fail_op("DELE", "/site/a.txt");
		remote.cwd("/site").unwrap();
		assert!(remote.delete("a.txt").is_err());
		assert!(remote.exists("/site/a.txt"));
		assert_eq!(remote.ops(), &["CWD /site".to_string(), "DELE a.txt".to_string()]);
	}

	#[test]
	fn test_paths_under() {
		let remote = sample();
		let paths: Vec<String> = remote.paths_under("/site").into_iter().collect();
		assert_eq!(paths, vec!["a.txt", "sub", "sub/b.txt"]);

		let files: Vec<String> = remote.files_under("/site").into_iter().collect();
		assert_eq!(files, vec!["a.txt", "sub/b.txt"]);
	}
}

// vim: ts=4
