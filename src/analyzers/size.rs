use crate::git::VcsOracle;
use std::path::Path;
use tracing::{debug, warn};

/// Floor used when the size is unknown or zero, so percentages never divide by 0.
pub const MIN_REPOSITORY_SIZE: u64 = 1;

/// Total line count of the files currently tracked in `repo`'s working tree.
///
/// Files that cannot be read (deleted locally, permission denied) count as
/// zero lines. The result is never below [`MIN_REPOSITORY_SIZE`].
pub fn estimate_size(oracle: &dyn VcsOracle, repo: &Path) -> u64 {
    let files = match oracle.tracked_file_list(repo) {
        Ok(files) => files,
        Err(e) => {
            warn!(repo = %repo.display(), "cannot list tracked files, assuming size 1: {e}");
            return MIN_REPOSITORY_SIZE;
        }
    };

    let total: u64 = files.iter()
        .map(|rel| match oracle.line_count(&repo.join(rel)) {
            Ok(n) => n,
            Err(e) => {
                debug!("{e}; counting as 0 lines");
                0
            }
        })
        .sum();

    total.max(MIN_REPOSITORY_SIZE)
}
