//! Discovery of the repository root.

use crate::{
    constants::GIT_DIR,
    errors::{BranchesError, BranchesResult},
};
use std::path::{Path, PathBuf};

/// Walks `start` and its ancestors, returning the first directory that contains a `.git`
/// directory.
///
/// ## Takes
/// - `start` - The directory to start searching from, inclusive.
///
/// ## Returns
/// - `Ok(PathBuf)` - The repository root.
/// - `Err(BranchesError::NotARepository)` - The filesystem root was reached without a match.
pub fn locate_repository(start: &Path) -> BranchesResult<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(GIT_DIR).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| BranchesError::NotARepository(start.to_path_buf()))
}

#[cfg(test)]
mod test {
    use super::locate_repository;
    use crate::errors::BranchesError;
    use std::fs;

    #[test]
    fn finds_root_from_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(locate_repository(&nested).unwrap(), tmp.path());
        assert_eq!(locate_repository(tmp.path()).unwrap(), tmp.path());
    }

    #[test]
    fn git_file_is_not_a_repository() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(".git"), "gitdir: elsewhere").unwrap();

        assert!(matches!(
            locate_repository(tmp.path()),
            Err(BranchesError::NotARepository(_))
        ));
    }

    #[test]
    fn fails_outside_a_repository() {
        let tmp = tempfile::tempdir().unwrap();

        match locate_repository(tmp.path()) {
            Err(BranchesError::NotARepository(path)) => assert_eq!(path, tmp.path()),
            other => panic!("expected NotARepository, got {:?}", other),
        }
    }
}
