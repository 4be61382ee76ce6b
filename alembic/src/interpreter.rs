// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

use thiserror::Error;

use crate::{dependency::Resolver, Defaults};

pub const NAME: &str = "python3";

/// Resolved Python interpreter the launchers pin and the staged
/// package tree is versioned against
#[derive(Debug, Clone)]
pub struct Interpreter {
    pub path: PathBuf,
    pub major: u32,
    pub minor: u32,
}

impl Interpreter {
    /// Resolve the interpreter from the injected [`Defaults`] or the
    /// search path, then probe its version
    pub fn resolve(defaults: &Defaults, resolver: &Resolver) -> Result<Self, Error> {
        let path = defaults
            .interpreter
            .clone()
            .or_else(|| resolver.locate(NAME))
            .ok_or(Error::Missing)?;

        let (major, minor) = probe(&path)?;

        Ok(Self { path, major, minor })
    }

    /// Versioned component of the site-packages path, e.g. `python3.13`
    pub fn lib_dir(&self) -> String {
        format!("python{}.{}", self.major, self.minor)
    }
}

fn probe(path: &Path) -> Result<(u32, u32), Error> {
    let output = Command::new(path).arg("--version").output()?;

    // Old interpreters reported the version on stderr
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };

    parse_version(&text).ok_or_else(|| Error::Version(text.trim().to_owned()))
}

fn parse_version(text: &str) -> Option<(u32, u32)> {
    let version = text.trim().strip_prefix("Python ")?;

    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;

    Some((major, minor))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing dependency: {NAME}")]
    Missing,
    #[error("probe interpreter")]
    Probe(#[from] io::Error),
    #[error("unrecognized interpreter version: {0:?}")]
    Version(String),
}
