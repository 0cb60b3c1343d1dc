use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use spdlog::debug;

pub fn ensure_dir_exists(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        debug!("Creating directory {}", dir.display());
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Moves `file` into `target_dir`, keeping its name. Returns the new path.
/// Falls back to copy and remove when a rename is not possible, e.g. across devices.
pub fn move_file(file: &Path, target_dir: &Path) -> io::Result<PathBuf> {
    let name = file.file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("{} has no file name", file.display())))?;
    ensure_dir_exists(target_dir)?;
    let target = target_dir.join(name);

    if let Err(e) = fs::rename(file, &target) {
        debug!("Rename of {} failed ({}), copying instead", file.display(), e);
        fs::copy(file, &target)?;
        fs::remove_file(file)?;
    }
    Ok(target)
}
