use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::MoveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    SkippedExists,
}

pub fn ensure_directory(path: &Path) -> Result<bool, MoveError> {
    if path.is_dir() {
        return Ok(false);
    }
    if path.exists() {
        // A file sitting where the directory should go; fail here with one
        // clear cause instead of a rename warning per would-be member.
        return Err(MoveError::DirectoryCreate {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "path exists but is not a directory",
            ),
        });
    }
    fs::create_dir_all(path).map_err(|source| MoveError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })?;
    info!("created directory {}", path.display());
    Ok(true)
}

/// Moves `source` into `dest_dir` under its own file name, unless a file of
/// that name is already there. Never overwrites; a pre-existing destination
/// is left untouched and the source stays where it is.
pub fn move_into(source: &Path, dest_dir: &Path) -> Result<MoveOutcome, MoveError> {
    let name = match source.file_name() {
        Some(name) => name,
        None => {
            return Err(MoveError::Rename {
                from: source.to_path_buf(),
                to: dest_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "source has no file name",
                ),
            })
        }
    };
    let dest = dest_dir.join(name);
    if dest.exists() {
        debug!("skipping {}: destination exists", source.display());
        return Ok(MoveOutcome::SkippedExists);
    }
    fs::rename(source, &dest).map_err(|source_err| MoveError::Rename {
        from: source.to_path_buf(),
        to: dest.clone(),
        source: source_err,
    })?;
    info!("moved {} -> {}", source.display(), dest.display());
    Ok(MoveOutcome::Moved)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{ensure_directory, move_into, MoveOutcome};

    #[test]
    fn ensure_directory_is_idempotent() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("Documents");
        assert!(ensure_directory(&dir).expect("first create"));
        assert!(!ensure_directory(&dir).expect("second create"));
        assert!(dir.is_dir());
    }

    #[test]
    fn ensure_directory_rejects_a_file_in_the_way() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("Documents");
        fs::write(&path, b"not a directory").expect("write file");

        let err = ensure_directory(&path).expect_err("file blocks the directory");
        assert!(err.to_string().contains("Documents"));
        assert!(path.is_file(), "the blocking file is left untouched");
    }

    #[test]
    fn move_into_never_overwrites() {
        let temp = TempDir::new().expect("tempdir");
        let dest_dir = temp.path().join("Documents");
        fs::create_dir(&dest_dir).expect("dest dir");

        let source = temp.path().join("notes.txt");
        fs::write(&source, b"new").expect("write source");
        fs::write(dest_dir.join("notes.txt"), b"existing").expect("write existing");

        let outcome = move_into(&source, &dest_dir).expect("move");
        assert_eq!(outcome, MoveOutcome::SkippedExists);
        assert!(source.exists(), "source stays in place on skip");
        assert_eq!(
            fs::read(dest_dir.join("notes.txt")).expect("read dest"),
            b"existing"
        );
    }

    #[test]
    fn move_into_moves_when_destination_is_free() {
        let temp = TempDir::new().expect("tempdir");
        let dest_dir = temp.path().join("Documents");
        fs::create_dir(&dest_dir).expect("dest dir");

        let source = temp.path().join("notes.txt");
        fs::write(&source, b"content").expect("write source");

        let outcome = move_into(&source, &dest_dir).expect("move");
        assert_eq!(outcome, MoveOutcome::Moved);
        assert!(!source.exists());
        assert!(dest_dir.join("notes.txt").exists());
    }
}
