//! Filesystem assertions for integration tests

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Map every regular file under `root` (relative path) to its contents
pub fn file_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, std::fs::read(entry.path()).unwrap())
        })
        .collect()
}

/// Assert that no temporary archive is left in `storage`
pub fn assert_no_temp_archive(storage: &Path) {
    if !storage.exists() {
        return;
    }
    let leftovers: Vec<_> = WalkDir::new(storage)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .collect();
    assert!(
        leftovers.is_empty(),
        "temporary archive(s) left behind: {leftovers:?}"
    );
}
