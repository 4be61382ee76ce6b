// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use alembic::style::Styled;
use alembic::{build, recipe, Defaults, Env, Recipe};
use clap::Parser;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(about = "Run the smoke test of an installed formula")]
pub struct Command {
    #[arg(short, long, help = "Install prefix the formula was installed under")]
    prefix: Option<PathBuf>,
    #[arg(default_value = "./formula.yaml", help = "Path to formula file")]
    formula: PathBuf,
}

pub fn handle(command: Command, env: Env) -> Result<(), Error> {
    let Command { prefix, formula } = command;

    let recipe = Recipe::load(&formula)?;
    let parsed = &recipe.parsed;

    let defaults = Defaults::load(&env)?;
    let prefix = prefix.unwrap_or_else(|| defaults.prefix.clone());

    let bin = prefix.join("bin").join(&parsed.entry.bin);

    build::smoke_test(&bin, &parsed.smoke_test)?;

    println!(
        "{} {} {}",
        "Verified".green(),
        parsed.name.clone().bold(),
        format!("({})", bin.display()).dim(),
    );

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("recipe")]
    Recipe(#[from] recipe::Error),
    #[error("defaults")]
    Defaults(#[from] alembic::defaults::Error),
    #[error("smoke test")]
    SmokeTest(#[from] build::Error),
}
