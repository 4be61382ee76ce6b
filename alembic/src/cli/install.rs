// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use alembic::build::{self, Builder, Options};
use alembic::style::Styled;
use alembic::{Env, Timing};
use chrono::Local;
use clap::Parser;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(about = "Fetch, build and install a formula")]
pub struct Command {
    #[arg(long, default_value = "false", help = "Build from the formula's head reference")]
    head: bool,
    #[arg(short, long, help = "Install prefix, overriding the configured default")]
    prefix: Option<PathBuf>,
    #[arg(default_value = "./formula.yaml", help = "Path to formula file")]
    formula: PathBuf,
}

pub fn handle(command: Command, env: Env) -> Result<(), Error> {
    let Command { head, prefix, formula } = command;

    let mut timing = Timing::default();

    let mut builder = Builder::new(&formula, &env, Options { head, prefix })?;

    let name = builder.recipe.parsed.name.clone();
    let version = builder.recipe.parsed.version.clone();
    println!("{} {}", "Installing".green(), format!("{name} {version}").bold());

    let installed = builder.run(&mut timing)?;

    println!();
    timing.print_table();

    if let Some(caveats) = &installed.caveats {
        println!();
        println!("{}", "Caveats".yellow().bold());
        println!("{caveats}");
    }

    println!(
        "Install finished successfully at {}",
        Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("build formula")]
    Build(#[from] build::Error),
}
