// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{util, Recipe};

/// Owner of the staging layout and the prefix-derived destinations.
///
/// The stage root is exclusive to one formula at a time; the download
/// cache is shared across formulas and keyed by content hash.
#[derive(Debug, Clone)]
pub struct Paths {
    stage_root: PathBuf,
    downloads: PathBuf,
    prefix: PathBuf,
}

impl Paths {
    pub fn new(recipe: &Recipe, cache_dir: &Path, prefix: impl Into<PathBuf>) -> io::Result<Self> {
        let parsed = &recipe.parsed;

        let paths = Self {
            stage_root: cache_dir
                .join("stage")
                .join(format!("{}-{}", parsed.name, parsed.version)),
            downloads: cache_dir.join("downloads"),
            prefix: prefix.into(),
        };

        util::ensure_dir_exists(&paths.stage_root)?;
        util::ensure_dir_exists(&paths.downloads)?;

        Ok(paths)
    }

    pub fn downloads(&self) -> &Path {
        &self.downloads
    }

    /// Work dir the main source is unpacked into
    pub fn work(&self) -> PathBuf {
        self.stage_root.join("work")
    }

    /// Isolated unpack dir for a build-time resource
    pub fn resource(&self, name: &str) -> PathBuf {
        self.stage_root.join("resources").join(name)
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn bin(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    /// Auxiliary prefix resources install into; its `bin/` is
    /// prepended to the build's search path
    pub fn libexec(&self) -> PathBuf {
        self.prefix.join("libexec")
    }

    pub fn libexec_bin(&self) -> PathBuf {
        self.libexec().join("bin")
    }

    /// `lib/<interpreter>/site-packages` under the prefix
    pub fn site_packages(&self, interpreter_dir: &str) -> PathBuf {
        self.prefix.join("lib").join(interpreter_dir).join("site-packages")
    }

    /// `Applications/<Name>.app/Contents` under the prefix
    pub fn bundle_contents(&self, bundle_name: &str) -> PathBuf {
        self.prefix
            .join("Applications")
            .join(format!("{bundle_name}.app"))
            .join("Contents")
    }
}
