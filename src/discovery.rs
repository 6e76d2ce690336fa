use crate::error::DiscoveryError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the metadata directory that marks a repository root.
pub const MARKER_DIR: &str = ".git";

/// Recursively finds all git repository roots under `root`, in depth-first
/// order with siblings sorted by name.
///
/// The marker directory itself is never descended into, but the rest of a
/// repository's tree is, so repositories cloned inside another one are found
/// too. Any I/O error aborts discovery: a partial list would quietly drop
/// repositories from the report.
pub fn find_git_repos(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }

    let mut repos = Vec::new();
    let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: source.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            source,
        })?;

        if entry.depth() == 0 || !entry.file_type().is_dir() || entry.file_name() != MARKER_DIR {
            continue;
        }

        if let Some(parent) = entry.path().parent() {
            repos.push(parent.to_path_buf());
        }
        walker.skip_current_dir();
    }

    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn mkrepo(base: &Path, rel: &str) -> PathBuf {
        let dir = base.join(rel);
        fs::create_dir_all(dir.join(MARKER_DIR).join("objects")).unwrap();
        dir
    }

    #[test]
    fn test_non_git_dir_returns_empty() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("just/some/dirs")).unwrap();
        let repos = find_git_repos(tmp.path()).unwrap();
        assert!(repos.is_empty(), "Non-git directory should return no repos");
    }

    #[test]
    fn test_root_itself_is_a_repo() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join(MARKER_DIR)).unwrap();
        let repos = find_git_repos(tmp.path()).unwrap();
        assert_eq!(repos, vec![tmp.path().to_path_buf()]);
    }

    #[test]
    fn test_repos_found_in_traversal_order() {
        let tmp = tempfile::tempdir().unwrap();
        let b = mkrepo(tmp.path(), "b-service");
        let a = mkrepo(tmp.path(), "a-team/api");
        let c = mkrepo(tmp.path(), "c-lib");
        let repos = find_git_repos(tmp.path()).unwrap();
        assert_eq!(repos, vec![a, b, c]);
    }

    #[test]
    fn test_marker_interior_is_not_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let outer = mkrepo(tmp.path(), "outer");
        // A marker inside the metadata directory must not produce a repository.
        fs::create_dir_all(outer.join(MARKER_DIR).join("modules/sub").join(MARKER_DIR)).unwrap();
        let repos = find_git_repos(tmp.path()).unwrap();
        assert_eq!(repos, vec![outer]);
    }

    #[test]
    fn test_repo_nested_in_working_tree_is_found() {
        let tmp = tempfile::tempdir().unwrap();
        let outer = mkrepo(tmp.path(), "outer");
        let inner = mkrepo(tmp.path(), "outer/vendor/inner");
        let repos = find_git_repos(tmp.path()).unwrap();
        assert_eq!(repos, vec![outer, inner]);
    }

    #[test]
    fn test_marker_file_is_not_a_repo() {
        // Submodule checkouts use a `.git` file, not a directory.
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join(MARKER_DIR), "gitdir: ../.git/modules/sub").unwrap();
        assert!(find_git_repos(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = find_git_repos(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingRoot(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        mkrepo(tmp.path(), "ok");
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores permission bits; nothing to assert in that case
        let readable_anyway = fs::read_dir(&locked).is_ok();
        let result = find_git_repos(tmp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable_anyway {
            eprintln!("Skipping: running with permissions that bypass mode bits");
            return;
        }
        assert!(matches!(result, Err(DiscoveryError::Walk { .. })), "got {result:?}");
    }
}
