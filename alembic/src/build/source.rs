// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    io,
    path::{Path, PathBuf},
    process,
    str::FromStr,
    time::Duration,
};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::{request, runtime, style::Styled, util, Paths};

/// A hash-verified source archive
#[derive(Debug, Clone)]
pub struct Archive {
    url: Url,
    hash: Hash,
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub path: PathBuf,
    pub was_cached: bool,
}

/// Fetch an archive into the shared download cache, with progress
/// reporting on the way down
pub fn sync(archive: &Archive, paths: &Paths) -> Result<Fetched, Error> {
    let pb = ProgressBar::new(u64::MAX).with_message(format!(
        "{} {}",
        "Downloading".blue(),
        archive.name().to_owned().bold(),
    ));
    pb.set_style(
        ProgressStyle::with_template(" {spinner} {wide_msg} {binary_bytes_per_sec:>.dim} ")
            .unwrap()
            .tick_chars("--=≡■≡=--"),
    );
    pb.enable_steady_tick(Duration::from_millis(150));

    let fetched = runtime::block_on(archive.fetch(paths.downloads(), &pb));

    pb.finish_and_clear();

    if let Ok(fetched) = &fetched {
        let cached_tag = fetched
            .was_cached
            .then_some(format!("{}", " (cached)".dim()))
            .unwrap_or_default();

        println!("{} {}{cached_tag}", "Fetched".green(), archive.name().to_owned().bold());
    }

    fetched
}

impl Archive {
    pub fn new(url: Url, hash: &str) -> Result<Self, Error> {
        Ok(Self { url, hash: hash.parse()? })
    }

    pub fn name(&self) -> &str {
        util::uri_file_name(&self.url)
    }

    /// Cache path keyed on url and content hash together, so the
    /// entry is busted if either changes
    fn cache_path(&self, downloads: &Path) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(self.url.as_str());
        hasher.update(&self.hash.0);

        let hash = hex::encode(hasher.finalize());

        downloads
            .join(&hash[..5])
            .join(&hash[hash.len() - 5..])
            .join(hash)
    }

    async fn fetch(&self, downloads: &Path, pb: &ProgressBar) -> Result<Fetched, Error> {
        use tokio::fs;

        let path = self.cache_path(downloads);
        let partial_path = path.with_extension("part");

        if let Some(parent) = path.parent() {
            util::ensure_dir_exists(parent)?;
        }

        if path.exists() {
            return Ok(Fetched {
                path,
                was_cached: true,
            });
        }

        let mut stream = request::get(self.url.clone()).await?;

        let mut hasher = Sha256::new();
        let mut out = fs::File::create(&partial_path).await?;

        while let Some(chunk) = stream.next().await {
            let bytes = &chunk?;
            pb.inc(bytes.len() as u64);
            hasher.update(bytes);
            out.write_all(bytes).await?;
        }

        out.flush().await?;

        let hash = hex::encode(hasher.finalize());

        if hash != self.hash.0 {
            fs::remove_file(&partial_path).await?;

            return Err(Error::HashMismatch {
                name: self.name().to_owned(),
                expected: self.hash.0.clone(),
                got: hash,
            });
        }

        fs::rename(partial_path, &path).await?;

        Ok(Fetched {
            path,
            was_cached: false,
        })
    }
}

/// Unpack a tar archive into `dest`, stripping the top-level
/// directory the way release tarballs nest their tree
pub fn unpack(archive: &Path, dest: &Path) -> Result<(), Error> {
    util::ensure_dir_exists(dest)?;

    let output = process::Command::new("tar")
        .arg("xf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .arg("--strip-components=1")
        .output()?;

    if !output.status.success() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        return Err(Error::Unpack(archive.to_path_buf()));
    }

    Ok(())
}

/// Shallow-clone a moving branch for `--head` builds; no integrity
/// hash exists for these
pub fn clone_head(url: &Url, branch: &str, dest: &Path) -> Result<(), Error> {
    let output = process::Command::new("git")
        .args(["clone", "--depth", "1", "--branch", branch, "--", url.as_str()])
        .arg(dest)
        .output()?;

    if !output.status.success() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        return Err(Error::GitFailed(url.clone()));
    }

    Ok(())
}

/// Full sha256 hex digest
#[derive(Debug, Clone)]
pub struct Hash(String);

impl FromStr for Hash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(ParseHashError::Length(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseHashError::Hex(s.to_owned()));
        }

        Ok(Self(s.to_lowercase()))
    }
}

#[derive(Debug, Error)]
pub enum ParseHashError {
    #[error("expected 64 hex chars, got {0}")]
    Length(usize),
    #[error("invalid hex digest: {0}")]
    Hex(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to unpack {0:?}")]
    Unpack(PathBuf),
    #[error("failed to clone {0}")]
    GitFailed(Url),
    #[error("parse hash")]
    ParseHash(#[from] ParseHashError),
    #[error("hash mismatch for {name}, expected {expected:?} got {got:?}")]
    HashMismatch {
        name: String,
        expected: String,
        got: String,
    },
    #[error("request")]
    Request(#[from] request::Error),
    #[error("io")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    use fs_err as fs;

    fn digest(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    fn file_url(path: &Path) -> Url {
        Url::from_file_path(path).unwrap()
    }

    #[test]
    fn hash_rejects_bad_input() {
        assert!(matches!("abc123".parse::<Hash>(), Err(ParseHashError::Length(6))));
        assert!(matches!(
            "zz".repeat(32).parse::<Hash>(),
            Err(ParseHashError::Hex(_))
        ));
        assert!("00".repeat(32).parse::<Hash>().is_ok());
    }

    #[test]
    fn cache_path_is_stable_and_keyed() {
        let downloads = Path::new("/var/cache/alembic/downloads");

        let a = Archive::new("https://example.com/a.tar.gz".parse().unwrap(), &"00".repeat(32)).unwrap();
        let b = Archive::new("https://example.com/a.tar.gz".parse().unwrap(), &"11".repeat(32)).unwrap();

        assert_eq!(a.cache_path(downloads), a.cache_path(downloads));
        assert_ne!(a.cache_path(downloads), b.cache_path(downloads));
    }

    #[test]
    fn fetch_verifies_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");

        let payload = b"not really a tarball";
        let source = dir.path().join("src.tar.gz");
        fs::write(&source, payload).unwrap();

        let archive = Archive::new(file_url(&source), &digest(payload)).unwrap();

        let pb = ProgressBar::hidden();
        let fetched = runtime::block_on(archive.fetch(&downloads, &pb)).unwrap();
        assert!(!fetched.was_cached);
        assert_eq!(fs::read(&fetched.path).unwrap(), payload);

        let fetched = runtime::block_on(archive.fetch(&downloads, &pb)).unwrap();
        assert!(fetched.was_cached);
    }

    #[test]
    fn fetch_rejects_mismatched_digest() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");

        let source = dir.path().join("src.tar.gz");
        fs::write(&source, b"tampered payload").unwrap();

        let archive = Archive::new(file_url(&source), &"00".repeat(32)).unwrap();

        let pb = ProgressBar::hidden();
        let result = runtime::block_on(archive.fetch(&downloads, &pb));

        assert!(matches!(result, Err(Error::HashMismatch { .. })));
        // no partial file is left behind
        assert!(std::fs::read_dir(&downloads)
            .map(|entries| entries
                .flatten()
                .all(|entry| !entry.path().display().to_string().ends_with(".part")))
            .unwrap_or(true));
    }
}
