// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::util;

/// Resolved host directories the evaluator operates out of.
///
/// Staging roots live under `cache_dir`, the [`crate::Defaults`]
/// record is read from `config_dir`.
pub struct Env {
    pub cache_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Env {
    pub fn new(cache_dir: Option<PathBuf>, config_dir: Option<PathBuf>) -> Result<Self, Error> {
        let is_root = util::is_root();

        let cache_dir = resolve_cache_dir(is_root, cache_dir)?;
        let config_dir = resolve_config_dir(is_root, config_dir)?;

        util::ensure_dir_exists(&cache_dir)?;

        Ok(Self { cache_dir, config_dir })
    }
}

fn resolve_cache_dir(is_root: bool, custom: Option<PathBuf>) -> Result<PathBuf, Error> {
    if let Some(dir) = custom {
        Ok(dir)
    } else if is_root {
        Ok(PathBuf::from("/var/cache/alembic"))
    } else {
        Ok(dirs::cache_dir().ok_or(Error::UserCache)?.join("alembic"))
    }
}

fn resolve_config_dir(is_root: bool, custom: Option<PathBuf>) -> Result<PathBuf, Error> {
    if let Some(dir) = custom {
        Ok(dir)
    } else if is_root {
        Ok(PathBuf::from("/etc/alembic"))
    } else {
        Ok(dirs::config_dir().ok_or(Error::UserConfig)?.join("alembic"))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find cache dir, $XDG_CACHE_HOME or $HOME env not set")]
    UserCache,
    #[error("cannot find config dir, $XDG_CONFIG_HOME or $HOME env not set")]
    UserConfig,
    #[error("io")]
    Io(#[from] io::Error),
}
