// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    io,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
};

use fs_err as fs;
use nix::unistd::{linkat, LinkatFlags};
use url::Url;

pub fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn recreate_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn copy_dir(source_dir: &Path, out_dir: &Path) -> io::Result<()> {
    ensure_dir_exists(out_dir)?;

    let contents = fs::read_dir(source_dir)?;

    for entry in contents.flatten() {
        let path = entry.path();

        if let Some(file_name) = path.file_name() {
            let dest = out_dir.join(file_name);
            let meta = entry.metadata()?;

            if meta.is_dir() {
                copy_dir(&path, &dest)?;
            } else if meta.is_file() {
                fs::copy(&path, &dest)?;
            } else if meta.is_symlink() {
                symlink(fs::read_link(&path)?, &dest)?;
            }
        }
    }

    Ok(())
}

pub fn hardlink_or_copy(from: &Path, to: &Path) -> io::Result<()> {
    // Attempt hard link
    let link_result = linkat(None, from, None, to, LinkatFlags::AT_SYMLINK_NOFOLLOW);

    // Copy instead
    if link_result.is_err() {
        fs::copy(from, to)?;
    }

    Ok(())
}

/// Move `from` to `to`, treating a missing `from` as already done
pub fn move_if_exists(from: &Path, to: &Path) -> io::Result<()> {
    if !from.exists() {
        return Ok(());
    }

    if let Some(parent) = to.parent() {
        ensure_dir_exists(parent)?;
    }

    fs::rename(from, to)
}

pub fn uri_file_name(uri: &Url) -> &str {
    let path = uri.path();

    path.rsplit('/').next().unwrap_or_default()
}

pub fn is_root() -> bool {
    use nix::unistd::Uid;

    Uid::effective().is_root()
}

pub fn search_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn move_if_exists_skips_missing_source() {
        let dir = tempfile::tempdir().unwrap();

        let from = dir.path().join("not-there");
        let to = dir.path().join("dest");

        move_if_exists(&from, &to).unwrap();
        assert!(!to.exists());

        fs::write(&from, "contents").unwrap();
        move_if_exists(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "contents");
    }

    #[test]
    fn copy_dir_recurses() {
        let dir = tempfile::tempdir().unwrap();

        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.py"), "a").unwrap();
        fs::write(src.join("nested/b.py"), "b").unwrap();

        let out = dir.path().join("out");
        copy_dir(&src, &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("a.py")).unwrap(), "a");
        assert_eq!(fs::read_to_string(out.join("nested/b.py")).unwrap(), "b");
    }
}
