/// Integration tests for full mirror runs against the in-memory server
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use dirmirror::config::Config;
use dirmirror::remote::MemoryRemote;
use dirmirror::{Mirror, MirrorBuilder};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Local tree: a.txt, sub/b.txt, media/c.txt
fn local_tree() -> TempDir {
	let dir = TempDir::new().expect("Failed to create temp dir");
	fs::create_dir_all(dir.path().join("sub")).unwrap();
	fs::create_dir_all(dir.path().join("media")).unwrap();
	fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
	fs::write(dir.path().join("sub/b.txt"), b"beta").unwrap();
	fs::write(dir.path().join("media/c.txt"), b"gamma").unwrap();
	dir
}

/// Server with stale content, including a media file only the server has
fn stale_remote() -> MemoryRemote {
	MemoryRemote::new()
		.with_file("/www/old.txt", b"old")
		.with_file("/www/sub/stale.txt", b"stale")
		.with_file("/www/media/keep.png", b"png")
		.with_file("/outside/untouched.txt", b"x")
}

fn mirror(source: &Path, include_excluded: bool) -> Mirror {
	MirrorBuilder::new()
		.source(source)
		.remote_root("/www")
		.include_excluded(include_excluded)
		.build()
		.expect("valid mirror job")
}

fn set(items: &[&str]) -> BTreeSet<String> {
	items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_mirror_leaves_excluded_subtree_alone() {
	let tree = local_tree();

	let (report, remote) = mirror(tree.path(), false).run_on(stale_remote()).unwrap();

	assert_eq!(remote.files_under("/www"), set(&["a.txt", "media/keep.png", "sub/b.txt"]));
	assert_eq!(remote.read_file("/www/a.txt"), Some(&b"alpha"[..]));
	assert_eq!(remote.read_file("/www/sub/b.txt"), Some(&b"beta"[..]));
	assert!(remote.exists("/outside/untouched.txt"));

	assert_eq!(report.files_deleted, 2);
	assert_eq!(report.dirs_removed, 1);
	assert_eq!(report.files_uploaded, 2);
	assert_eq!(report.dirs_created, 1);
	assert!(!report.has_failures());
}

#[test]
fn test_mirror_with_excluded_subtree_included() {
	let tree = local_tree();

	let (report, remote) = mirror(tree.path(), true).run_on(stale_remote()).unwrap();

	assert_eq!(remote.files_under("/www"), set(&["a.txt", "media/c.txt", "sub/b.txt"]));
	assert!(!remote.exists("/www/media/keep.png"));
	assert_eq!(report.files_uploaded, 3);
	assert_eq!(report.bytes_uploaded, 14);
	assert!(!report.has_failures());
}

#[test]
fn test_mirror_into_empty_root() {
	let tree = local_tree();

	let (report, remote) =
		mirror(tree.path(), false).run_on(MemoryRemote::new().with_dir("/www")).unwrap();

	assert_eq!(remote.paths_under("/www"), set(&["a.txt", "sub", "sub/b.txt"]));
	assert_eq!(report.files_deleted, 0);
	assert_eq!(report.skipped, 1);
}

#[test]
fn test_server_without_dot_entries() {
	let tree = local_tree();
	let remote = stale_remote().list_dots(false);

	let (report, remote) = mirror(tree.path(), false).run_on(remote).unwrap();

	assert_eq!(remote.files_under("/www"), set(&["a.txt", "media/keep.png", "sub/b.txt"]));
	assert!(!report.has_failures());
}

// ============================================================================
// Repeated runs
// ============================================================================

#[test]
fn test_second_run_is_clean() {
	let tree = local_tree();
	let job = mirror(tree.path(), false);

	let (_, remote) = job.run_on(stale_remote()).unwrap();
	let (report, remote) = job.run_on(remote).unwrap();

	assert!(!report.has_failures());
	assert_eq!(report.files_deleted, 2);
	assert_eq!(report.files_uploaded, 2);
	assert_eq!(remote.files_under("/www"), set(&["a.txt", "media/keep.png", "sub/b.txt"]));
}

// ============================================================================
// Per-item failures
// ============================================================================

#[test]
fn test_failed_delete_does_not_stop_the_run() {
	let tree = TempDir::new().unwrap();
	fs::write(tree.path().join("new.txt"), b"new").unwrap();

	let mut remote = MemoryRemote::new();
	for i in 1..=5 {
		remote = remote.with_file(&format!("/www/f{}.txt", i), b"x");
	}
	let remote = remote.fail_op("DELE", "/www/f3.txt");

	let (report, remote) = mirror(tree.path(), false).run_on(remote).unwrap();

	assert_eq!(report.files_deleted, 4);
	assert_eq!(report.failures, 1);
	assert_eq!(remote.files_under("/www"), set(&["f3.txt", "new.txt"]));
}

#[test]
fn test_failed_upload_does_not_stop_the_run() {
	let tree = local_tree();
	let remote = MemoryRemote::new().with_dir("/www").fail_op("STOR", "/www/a.txt");

	let (report, remote) = mirror(tree.path(), false).run_on(remote).unwrap();

	assert_eq!(report.failures, 1);
	assert_eq!(report.files_uploaded, 1);
	assert_eq!(remote.files_under("/www"), set(&["sub/b.txt"]));
}

#[test]
fn test_stale_empty_dir_removed_when_listing_refused() {
	let tree = TempDir::new().unwrap();
	fs::write(tree.path().join("a.txt"), b"a").unwrap();
	let remote = MemoryRemote::new().with_dir("/www/olddir").fail_op("NLST", "/www/olddir");

	let (report, remote) = mirror(tree.path(), false).run_on(remote).unwrap();

	assert_eq!(remote.paths_under("/www"), set(&["a.txt"]));
	assert!(!report.has_failures());
}

// ============================================================================
// Backup archive
// ============================================================================

#[test]
fn test_backup_archive_contents() {
	let tree = local_tree();
	let out = TempDir::new().unwrap();

	let archive = mirror(tree.path(), false).backup(out.path(), "site").unwrap();

	let name = archive.file_name().unwrap().to_string_lossy().to_string();
	assert!(name.starts_with("site_"));
	assert!(name.ends_with(".zip"));

	let file = fs::File::open(&archive).unwrap();
	let zip = zip::ZipArchive::new(file).unwrap();
	let names: BTreeSet<String> = zip.file_names().map(String::from).collect();
	assert_eq!(names, set(&["a.txt", "sub/b.txt"]));
}

#[test]
fn test_backup_archive_with_excluded_subtree_included() {
	let tree = local_tree();
	let out = TempDir::new().unwrap();

	let archive = mirror(tree.path(), true).backup(out.path(), "dist").unwrap();

	let zip = zip::ZipArchive::new(fs::File::open(&archive).unwrap()).unwrap();
	let names: BTreeSet<String> = zip.file_names().map(String::from).collect();
	assert_eq!(names, set(&["a.txt", "media/c.txt", "sub/b.txt"]));
}

#[cfg(unix)]
#[test]
fn test_backup_and_upload_agree_on_linked_directory() {
	let tree = TempDir::new().unwrap();
	let target = TempDir::new().unwrap();
	fs::write(tree.path().join("a.txt"), b"a").unwrap();
	fs::write(target.path().join("x.txt"), b"x").unwrap();
	std::os::unix::fs::symlink(target.path(), tree.path().join("assets")).unwrap();
	let out = TempDir::new().unwrap();
	let job = mirror(tree.path(), false);

	let archive = job.backup(out.path(), "dist").unwrap();
	let (report, remote) = job.run_on(MemoryRemote::new().with_dir("/www")).unwrap();

	let zip = zip::ZipArchive::new(fs::File::open(&archive).unwrap()).unwrap();
	let names: BTreeSet<String> = zip.file_names().map(String::from).collect();
	assert_eq!(names, remote.files_under("/www"));
	assert_eq!(names, set(&["a.txt", "assets/x.txt"]));
	assert!(!report.has_failures());
}

// ============================================================================
// Config driven
// ============================================================================

#[test]
fn test_job_from_config_file() {
	let tree = local_tree();
	let conf_dir = TempDir::new().unwrap();
	let conf_path = conf_dir.path().join("dirmirror.toml");
	fs::write(
		&conf_path,
		format!(
			"source = {:?}\nremoteRoot = \"/www\"\nhost = \"ftp.example.com\"\n\
			 excludePatterns = [\"**/*.txt\"]\nexcludedSubtree = \"sub\"\n",
			tree.path().to_string_lossy()
		),
	)
	.unwrap();

	let config = Config::load(Some(&conf_path)).unwrap();
	config.validate().unwrap();
	let job = Mirror::from_config(&config).unwrap();

	let (report, remote) = job.run_on(MemoryRemote::new().with_dir("/www")).unwrap();

	// Every file matches the pattern; only the media folder is created
	assert_eq!(remote.paths_under("/www"), set(&["media"]));
	assert_eq!(report.files_uploaded, 0);
	assert_eq!(report.dirs_created, 1);
}

// vim: ts=4
