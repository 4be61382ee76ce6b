// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Declarative formula documents
//!
//! A formula describes how to fetch, build and install one artifact:
//! source metadata, an integrity-hashed upstream archive, phase-tagged
//! dependencies, nested build-time resources, pre-build edits and the
//! final staging / launcher / bundle layout.

use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;
use url::Url;

pub fn from_slice(bytes: &[u8]) -> Result<Formula, serde_yaml::Error> {
    serde_yaml::from_slice(bytes)
}

pub fn from_str(s: &str) -> Result<Formula, serde_yaml::Error> {
    serde_yaml::from_str(s)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Formula {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub homepage: String,
    #[serde(deserialize_with = "single_as_sequence")]
    pub license: Vec<String>,
    pub upstream: Upstream,
    pub head: Option<Head>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub edits: Vec<Edit>,
    #[serde(default)]
    pub build: Build,
    pub stage: Stage,
    pub entry: Entry,
    pub bundle: Option<Bundle>,
    pub caveats: Option<String>,
    #[serde(default)]
    pub smoke_test: Vec<String>,
}

/// Primary source archive, verified against `sha256` before any
/// build step runs
#[derive(Debug, Clone, Deserialize)]
pub struct Upstream {
    pub url: Url,
    pub sha256: String,
}

/// Moving VCS reference for `--head` builds
#[derive(Debug, Clone, Deserialize)]
pub struct Head {
    pub url: Url,
    #[serde(default = "default_branch")]
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Build,
    Runtime,
}

/// A nested recipe for a tool needed only while building the main
/// formula, installed into an auxiliary prefix
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: Url,
    pub sha256: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Pre-build find-and-replace on a file in the unpacked source tree.
/// `replace` may use `${python}`, `${prefix}` and `${site_packages}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Edit {
    pub file: PathBuf,
    pub find: String,
    pub replace: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub options: Vec<String>,
}

/// Files copied from the source tree into the versioned
/// site-packages directory after the build
#[derive(Debug, Clone, Deserialize)]
pub struct Stage {
    pub package: String,
    pub copy: Vec<Copy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Copy {
    pub source: PathBuf,
    /// Destination relative to the package directory; defaults to the
    /// source file name at the package root
    pub dest: Option<PathBuf>,
}

/// Launcher entry point: executable name under `bin/` and the module
/// the interpreter runs
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub bin: String,
    pub module: String,
}

/// Application bundle descriptor fields
#[derive(Debug, Clone, Deserialize)]
pub struct Bundle {
    pub name: String,
    pub identifier: String,
    pub category: String,
    #[serde(default = "default_minimum_system")]
    pub minimum_system: String,
}

impl<'de> Deserialize<'de> for Dependency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Debug, Deserialize)]
        #[serde(untagged)]
        enum Outer {
            Name(String),
            Tagged(HashMap<String, Phase>),
        }

        match Outer::deserialize(deserializer)? {
            Outer::Name(name) => Ok(Dependency {
                name,
                phase: Phase::Runtime,
            }),
            Outer::Tagged(map) => match map.into_iter().next() {
                Some((name, phase)) => Ok(Dependency { name, phase }),
                // unreachable?
                None => Err(serde::de::Error::custom("missing dependency entry")),
            },
        }
    }
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_minimum_system() -> String {
    "11.0".to_owned()
}

/// Deserialize a single value or sequence of values as a vec
fn single_as_sequence<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::de::Deserializer<'de>,
{
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    enum Value<T> {
        Single(T),
        Sequence(Vec<T>),
    }

    match Value::deserialize(deserializer)? {
        Value::Single(value) => Ok(vec![value]),
        Value::Sequence(sequence) => Ok(sequence),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize() {
        let input = &include_bytes!("../../../test/ssh-studio.yaml")[..];

        let formula = from_slice(input).unwrap();

        assert_eq!(formula.name, "ssh-studio");
        assert_eq!(formula.version, "1.2.3");
        assert_eq!(formula.license, vec!["GPL-3.0-or-later".to_owned()]);
        assert_eq!(formula.head.as_ref().unwrap().branch, "master");

        let build_deps = formula
            .dependencies
            .iter()
            .filter(|dep| dep.phase == Phase::Build)
            .map(|dep| dep.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(build_deps, vec!["meson", "ninja", "pkg-config"]);

        let runtime_deps = formula
            .dependencies
            .iter()
            .filter(|dep| dep.phase == Phase::Runtime)
            .count();
        assert_eq!(runtime_deps, 5);

        assert_eq!(formula.resources.len(), 1);
        assert_eq!(formula.resources[0].name, "blueprint-compiler");

        assert_eq!(formula.stage.package, "ssh_studio");
        assert_eq!(formula.entry.bin, "ssh-studio");
        assert_eq!(formula.entry.module, "ssh_studio.main");

        let bundle = formula.bundle.as_ref().unwrap();
        assert_eq!(bundle.name, "SSH Studio");
        assert_eq!(bundle.minimum_system, "11.0");

        assert_eq!(formula.smoke_test, vec!["--help".to_owned()]);
    }

    #[test]
    fn deserialize_minimal() {
        let input = r#"
name: tiny
version: "0.1"
homepage: https://example.com/tiny
license: MIT
upstream:
  url: https://example.com/tiny-0.1.tar.gz
  sha256: 0000000000000000000000000000000000000000000000000000000000000000
stage:
  package: tiny
  copy:
    - source: src/tiny.py
entry:
  bin: tiny
  module: tiny
"#;

        let formula = from_str(input).unwrap();

        assert!(formula.dependencies.is_empty());
        assert!(formula.resources.is_empty());
        assert!(formula.bundle.is_none());
        assert!(formula.build.options.is_empty());
        assert_eq!(formula.stage.copy[0].dest, None);
    }
}
