// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::{Path, PathBuf};

use fs_err as fs;
use thiserror::Error;

/// Resolved values an edit replacement (or caveats text) may refer to
#[derive(Debug, Clone, Copy)]
pub struct Vars<'a> {
    pub python: &'a Path,
    pub prefix: &'a Path,
    pub site_packages: &'a Path,
}

impl Vars<'_> {
    pub fn expand(&self, text: &str) -> String {
        text.replace("${python}", &self.python.display().to_string())
            .replace("${prefix}", &self.prefix.display().to_string())
            .replace("${site_packages}", &self.site_packages.display().to_string())
    }
}

/// Rewrite every occurrence of `find` in `file` with `replace`.
///
/// A file already carrying `replace` was substituted by an earlier
/// run and is left untouched; rewriting it would corrupt any
/// occurrence of `find` inside the replacement text. A missing token
/// otherwise fails loudly; a silent no-op would ship an artifact that
/// still carries the placeholder.
pub fn apply(file: &Path, find: &str, replace: &str) -> Result<(), Error> {
    let contents = fs::read_to_string(file)?;

    if contents.contains(replace) {
        return Ok(());
    }

    if !contents.contains(find) {
        return Err(Error::TokenNotFound {
            file: file.to_path_buf(),
            token: find.to_owned(),
        });
    }

    fs::write(file, contents.replace(find, replace))?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("token {token:?} not found in {file:?}")]
    TokenNotFound { file: PathBuf, token: String },
    #[error("io")]
    Io(#[from] std::io::Error),
}
