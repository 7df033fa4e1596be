use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Removes a file, symlink, or directory tree. Symlinked directories are
/// unlinked, not followed.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        match fs::remove_file(path) {
            // Windows directory symlinks and junctions are removed as directories.
            Err(err) if cfg!(windows) && metadata.file_type().is_symlink() => {
                fs::remove_dir(path).map_err(|_| err)
            }
            other => other,
        }
    }
}

/// Creates, writes, and removes a probe file in `dir`.
pub fn probe_writable(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "path does not exist or is not a directory",
        ));
    }
    let probe = dir.join(format!(".pyship-write-probe-{}", std::process::id()));
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)?;
    let written = file.write_all(b"probe").and_then(|()| file.flush());
    drop(file);
    let removed = fs::remove_file(&probe);
    written?;
    removed
}
