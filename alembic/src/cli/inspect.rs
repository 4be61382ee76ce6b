// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use alembic::style::Styled;
use alembic::{recipe, Recipe};
use clap::Parser;
use formula::Phase;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(about = "Parse a formula and print its install plan")]
pub struct Command {
    #[arg(default_value = "./formula.yaml", help = "Path to formula file")]
    formula: PathBuf,
}

pub fn handle(command: Command) -> Result<(), Error> {
    let recipe = Recipe::load(&command.formula)?;
    let parsed = &recipe.parsed;

    println!("{} {}", parsed.name.clone().bold(), parsed.version.clone().dim());
    if let Some(summary) = &parsed.summary {
        println!("{summary}");
    }
    println!("{} {}", "homepage".dim(), parsed.homepage);
    println!("{} {}", "license".dim(), parsed.license.join(", "));

    if !parsed.dependencies.is_empty() {
        println!();
        println!("{}", "Dependencies".bold());
        for dependency in &parsed.dependencies {
            let tag = match dependency.phase {
                Phase::Build => format!(" {}", "(build)".dim()),
                Phase::Runtime => String::default(),
            };
            println!("  {}{tag}", dependency.name);
        }
    }

    if !parsed.resources.is_empty() {
        println!();
        println!("{}", "Resources".bold());
        for resource in &parsed.resources {
            println!("  {} {}", resource.name, resource.url.as_str().to_owned().dim());
        }
    }

    println!();
    println!("{}", "Staging".bold());
    for copy in &parsed.stage.copy {
        let dest = copy
            .dest
            .clone()
            .unwrap_or_else(|| copy.source.file_name().unwrap_or_default().into());
        println!(
            "  {} {} {}/{}",
            copy.source.display(),
            "→".dim(),
            parsed.stage.package,
            dest.display(),
        );
    }

    println!();
    println!(
        "{} bin/{} {} -m {}",
        "Entry".bold(),
        parsed.entry.bin,
        "→".dim(),
        parsed.entry.module,
    );

    if let Some(bundle) = &parsed.bundle {
        println!(
            "{} Applications/{}.app {}",
            "Bundle".bold(),
            bundle.name,
            format!("({})", bundle.identifier).dim(),
        );
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("recipe")]
    Recipe(#[from] recipe::Error),
}
