// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0
use std::path::PathBuf;

use alembic::{env, Env};
use clap::{Args, CommandFactory, Parser};
use clap_complete::{
    generate_to,
    shells::{Bash, Fish, Zsh},
};
use clap_mangen::Man;
use fs_err::{self as fs, File};
use thiserror::Error;

mod check;
mod inspect;
mod install;
mod version;

#[derive(Debug, Parser)]
pub struct Command {
    #[command(flatten)]
    pub global: Global,
    #[command(subcommand)]
    pub subcommand: Option<Subcommand>,
}

#[derive(Debug, Args)]
pub struct Global {
    #[arg(
        short,
        long = "verbose",
        help = "Prints additional information about what alembic is doing",
        default_value = "false",
        global = true
    )]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
    #[arg(long, global = true, hide = true)]
    pub generate_manpages: Option<PathBuf>,
    #[arg(long, global = true, hide = true)]
    pub generate_completions: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Install(install::Command),
    Check(check::Command),
    Inspect(inspect::Command),
    Version(version::Command),
}

pub fn process() -> Result<(), Error> {
    let Command { global, subcommand } = Command::parse();

    if let Some(dir) = global.generate_manpages {
        fs::create_dir_all(&dir)?;
        let main_cmd = Command::command();
        // Generate man page for the main command
        let main_man = Man::new(main_cmd.clone());
        let mut buffer = File::create(dir.join("alembic.1"))?;
        main_man.render(&mut buffer)?;

        // Generate man pages for all subcommands
        for sub in main_cmd.get_subcommands() {
            let sub_man = Man::new(sub.clone());
            let name = format!("alembic-{}.1", sub.get_name());
            let mut buffer = File::create(dir.join(&name))?;
            sub_man.render(&mut buffer)?;
        }
        return Ok(());
    }

    if let Some(dir) = global.generate_completions {
        fs::create_dir_all(&dir)?;
        let mut cmd = Command::command();
        generate_to(Bash, &mut cmd, "alembic", &dir)?;
        generate_to(Fish, &mut cmd, "alembic", &dir)?;
        generate_to(Zsh, &mut cmd, "alembic", &dir)?;
        return Ok(());
    }

    let env = Env::new(global.cache_dir, global.config_dir)?;

    if global.verbose {
        match subcommand {
            Some(Subcommand::Version(_)) => (),
            _ => version::print(),
        }
        println!("cache directory: {:?}", env.cache_dir);
        println!("config directory: {:?}", env.config_dir);
    }

    match subcommand {
        Some(Subcommand::Install(command)) => install::handle(command, env)?,
        Some(Subcommand::Check(command)) => check::handle(command, env)?,
        Some(Subcommand::Inspect(command)) => inspect::handle(command)?,
        Some(Subcommand::Version(command)) => version::handle(command),
        None => (),
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("install")]
    Install(#[from] install::Error),
    #[error("check")]
    Check(#[from] check::Error),
    #[error("inspect")]
    Inspect(#[from] inspect::Error),
    #[error("env")]
    Env(#[from] env::Error),
    #[error("io error")]
    Io(#[from] std::io::Error),
}
