// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    io,
    path::{Path, PathBuf},
};

use fs_err as fs;
use thiserror::Error;

pub type Parsed = formula::Formula;

#[derive(Debug)]
pub struct Recipe {
    pub path: PathBuf,
    pub source: String,
    pub parsed: Parsed,
}

impl Recipe {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = resolve_path(path)?;
        let source = fs::read_to_string(&path)?;
        let parsed = formula::from_str(&source)?;

        Ok(Self { path, source, parsed })
    }
}

pub fn resolve_path(path: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let path = path.as_ref();

    // Resolve dir to dir + formula.yaml
    let path = if path.is_dir() {
        path.join("formula.yaml")
    } else {
        path.to_path_buf()
    };

    // Ensure it's absolute & exists
    fs::canonicalize(&path).map_err(|_| Error::MissingFormula(path))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("formula file does not exist: {0:?}")]
    MissingFormula(PathBuf),
    #[error("load formula")]
    Load(#[from] io::Error),
    #[error("decode formula")]
    Decode(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn load_resolves_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = include_str!("../../test/ssh-studio.yaml");
        fs::write(dir.path().join("formula.yaml"), source).unwrap();

        let recipe = Recipe::load(dir.path()).unwrap();
        assert_eq!(recipe.parsed.name, "ssh-studio");
        assert_eq!(recipe.source, source);
    }

    #[test]
    fn load_missing_fails() {
        let result = Recipe::load("/nonexistent/formula.yaml");
        assert!(matches!(result, Err(Error::MissingFormula(_))));
    }
}
