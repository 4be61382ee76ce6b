// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use fs_err as fs;
use serde::Deserialize;
use thiserror::Error;

use crate::Env;

const FILE_NAME: &str = "defaults.yaml";

/// Ambient build-tool state, made explicit.
///
/// Everything the evaluator would otherwise read from the host
/// environment is carried here and injected into
/// [`crate::build::Builder`], keeping executions reproducible and
/// testable in isolation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// External build tool honoring the setup / compile / install protocol
    pub build_tool: String,
    /// Standard options appended to every `setup` invocation
    pub setup_options: Vec<String>,
    /// Interpreter override; resolved from the search path when unset
    pub interpreter: Option<PathBuf>,
    /// Install prefix root
    pub prefix: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            build_tool: "meson".to_owned(),
            setup_options: vec![
                "--buildtype=release".to_owned(),
                "--wrap-mode=nofallback".to_owned(),
            ],
            interpreter: None,
            prefix: PathBuf::from("/usr/local"),
        }
    }
}

impl Defaults {
    /// Load from `<config_dir>/defaults.yaml`, falling back to the
    /// built-in record when no file exists
    pub fn load(env: &Env) -> Result<Self, Error> {
        let path = env.config_dir.join(FILE_NAME);

        if !path.exists() {
            return Ok(Self::default());
        }

        let bytes = fs::read(&path)?;

        Ok(serde_yaml::from_slice(&bytes)?)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("read defaults")]
    Io(#[from] std::io::Error),
    #[error("decode defaults")]
    Decode(#[from] serde_yaml::Error),
}
