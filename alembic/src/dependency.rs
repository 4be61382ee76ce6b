// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    ffi::OsString,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use fs_err as fs;
use thiserror::Error;

use crate::util;

/// Explicit executable search path used for the dependency gate and
/// every spawned build command.
///
/// Resource prefixes are prepended as they are built, so a
/// freshly-installed tool resolves for all subsequent steps without
/// becoming a persistent dependency.
#[derive(Debug, Clone)]
pub struct Resolver {
    search_path: Vec<PathBuf>,
}

impl Resolver {
    pub fn from_host() -> Self {
        Self {
            search_path: util::search_path(),
        }
    }

    pub fn with_paths(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    pub fn prepend(&mut self, dir: PathBuf) {
        self.search_path.insert(0, dir);
    }

    /// Locate an executable by name on the search path
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }

    /// Fail fast on the first declared dependency that cannot be
    /// located. Runs before any network activity.
    pub fn gate(&self, dependencies: &[formula::Dependency]) -> Result<(), Error> {
        for dependency in dependencies {
            if self.locate(&dependency.name).is_none() {
                return Err(Error::Missing(dependency.name.clone()));
            }
        }

        Ok(())
    }

    /// `PATH` value handed to child processes
    pub fn env_value(&self) -> OsString {
        std::env::join_paths(&self.search_path).unwrap_or_default()
    }
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing dependency: {0}")]
    Missing(String),
}

#[cfg(test)]
mod test {
    use super::*;

    use formula::{Dependency, Phase};

    fn write_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn locate_honors_search_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        write_executable(first.path(), "tool");
        write_executable(second.path(), "tool");

        let resolver = Resolver::with_paths(vec![first.path().into(), second.path().into()]);

        assert_eq!(resolver.locate("tool").unwrap(), first.path().join("tool"));
    }

    #[test]
    fn non_executable_is_not_located() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tool"), "").unwrap();

        let resolver = Resolver::with_paths(vec![dir.path().into()]);
        assert!(resolver.locate("tool").is_none());
    }

    #[test]
    fn gate_fails_on_first_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_executable(dir.path(), "present");

        let resolver = Resolver::with_paths(vec![dir.path().into()]);

        let dependencies = vec![
            Dependency {
                name: "present".to_owned(),
                phase: Phase::Build,
            },
            Dependency {
                name: "absent".to_owned(),
                phase: Phase::Runtime,
            },
        ];

        let result = resolver.gate(&dependencies);
        assert!(matches!(result, Err(Error::Missing(name)) if name == "absent"));
    }

    #[test]
    fn prepend_wins_resolution() {
        let base = tempfile::tempdir().unwrap();
        let aux = tempfile::tempdir().unwrap();

        write_executable(base.path(), "tool");
        let aux_tool = write_executable(aux.path(), "tool");

        let mut resolver = Resolver::with_paths(vec![base.path().into()]);
        resolver.prepend(aux.path().into());

        assert_eq!(resolver.locate("tool").unwrap(), aux_tool);
    }
}
