use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The filesystem primitives the engine needs. Implementations must never
/// replace an existing destination: a rename onto an occupied name fails with
/// [`io::ErrorKind::AlreadyExists`].
pub trait RenameFs: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

impl<F: RenameFs + ?Sized> RenameFs for Arc<F> {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl RenameFs for StdFs {
    fn exists(&self, path: &Path) -> bool {
        // Dangling symlinks still occupy their name
        fs::symlink_metadata(path).is_ok()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if fs::symlink_metadata(to).is_ok() {
            // A case-insensitive filesystem reports the new spelling as taken
            if is_case_only_change(from, to) && is_same_file(from, to) {
                return rename_via_temp(from, to);
            }

            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }

        fs::rename(from, to)
    }
}

const CASE_TEMP_ATTEMPTS: usize = 16;

/// Same directory, and the leaf names differ only by letter case.
fn is_case_only_change(from: &Path, to: &Path) -> bool {
    let (Some(from_name), Some(to_name)) = (from.file_name(), to.file_name()) else {
        return false;
    };
    from.parent() == to.parent()
        && from_name != to_name
        && from_name.to_string_lossy().to_lowercase() == to_name.to_string_lossy().to_lowercase()
}

/// Two-step rename through a free sibling name. A failed second step moves
/// the file back to `from`.
fn rename_via_temp(from: &Path, to: &Path) -> io::Result<()> {
    let temp_path = free_temp_path(from)?;
    fs::rename(from, &temp_path)?;

    if let Err(err) = fs::rename(&temp_path, to) {
        return match fs::rename(&temp_path, from) {
            Ok(()) => Err(err),
            Err(restore) => Err(io::Error::new(
                err.kind(),
                format!(
                    "{err}; file left at {} (restore failed: {restore})",
                    temp_path.display()
                ),
            )),
        };
    }
    Ok(())
}

fn free_temp_path(from: &Path) -> io::Result<PathBuf> {
    let pid = std::process::id();
    (0..CASE_TEMP_ATTEMPTS)
        .map(|attempt| from.with_file_name(format!(".batchren-case-{pid}-{attempt}.tmp")))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free temporary name next to {}", from.display()),
            )
        })
}

#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}
