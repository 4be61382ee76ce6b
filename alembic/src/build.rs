// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    defaults,
    dependency::{self, Resolver},
    interpreter::{self, Interpreter},
    recipe,
    style::Styled,
    timing,
    util, Defaults, Env, Paths, Recipe, Timing,
};

pub mod edit;
pub mod launcher;
pub mod source;
pub mod step;

use self::edit::Vars;
use self::launcher::{BundleInfo, Launcher};
use self::step::Step;

pub struct Options {
    pub head: bool,
    pub prefix: Option<PathBuf>,
}

/// Evaluates one formula: gate dependencies, build resources into the
/// auxiliary prefix, fetch and verify the main source, then build and
/// stage into the install prefix.
///
/// Execution is strictly sequential and all-or-nothing; the first
/// failing step aborts the run. Intermediate files are left in the
/// stage root for debugging.
pub struct Builder {
    pub recipe: Recipe,
    pub paths: Paths,
    pub defaults: Defaults,
    resolver: Resolver,
    head: bool,
}

/// Summary of a completed install
pub struct Installed {
    pub bin: PathBuf,
    pub caveats: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Setup,
    Compile,
    Install,
    Stage,
    Launcher,
    Bundle,
}

impl Phase {
    pub fn abbrev(&self) -> &'static str {
        match self {
            Phase::Setup => "S",
            Phase::Compile => "C",
            Phase::Install => "I",
            Phase::Stage => "T",
            Phase::Launcher => "L",
            Phase::Bundle => "B",
        }
    }

    pub fn styled(&self, text: String) -> String {
        match self {
            Phase::Setup => text.blue(),
            Phase::Compile => text.yellow(),
            Phase::Install => text.green(),
            Phase::Stage => text.cyan(),
            Phase::Launcher | Phase::Bundle => text.bold(),
        }
        .to_string()
    }
}

impl Builder {
    pub fn new(recipe_path: &Path, env: &Env, options: Options) -> Result<Self, Error> {
        let recipe = Recipe::load(recipe_path)?;

        let defaults = Defaults::load(env)?;

        let prefix = options.prefix.unwrap_or_else(|| defaults.prefix.clone());
        let paths = Paths::new(&recipe, &env.cache_dir, prefix)?;

        Ok(Self {
            recipe,
            paths,
            defaults,
            resolver: Resolver::from_host(),
            head: options.head,
        })
    }

    /// Swap the executable resolver, detaching the run from the
    /// host's `PATH`
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn run(&mut self, timing: &mut Timing) -> Result<Installed, Error> {
        let parsed = self.recipe.parsed.clone();

        // Dependency gate runs before any network activity
        let timer = timing.begin(timing::Kind::Preflight);
        self.resolver.gate(&parsed.dependencies)?;
        let interpreter = Interpreter::resolve(&self.defaults, &self.resolver)?;
        timing.finish(timer);

        let timer = timing.begin(timing::Kind::Resources);
        for resource in &parsed.resources {
            self.resource(resource, &interpreter)?;
        }
        timing.finish(timer);

        let timer = timing.begin(timing::Kind::Fetch);
        let work = self.fetch_main(&parsed)?;
        timing.finish(timer);

        let site_packages = self.paths.site_packages(&interpreter.lib_dir());
        let vars = Vars {
            python: &interpreter.path,
            prefix: self.paths.prefix(),
            site_packages: &site_packages,
        };

        let timer = timing.begin(timing::Kind::Build);
        for edit in &parsed.edits {
            edit::apply(&work.join(&edit.file), &edit.find, &vars.expand(&edit.replace))?;
        }
        self.tool_sequence(
            &work,
            self.paths.prefix(),
            &self.defaults.setup_options,
            &parsed.build.options,
            &interpreter,
        )?;
        timing.finish(timer);

        let timer = timing.begin(timing::Kind::Stage);
        self.stage(&parsed, &work, &site_packages)?;
        let bin = self.launcher(&parsed, &interpreter, &site_packages)?;
        timing.finish(timer);

        if let Some(bundle) = &parsed.bundle {
            let timer = timing.begin(timing::Kind::Bundle);
            self.bundle(&parsed, bundle, &interpreter, &site_packages)?;
            timing.finish(timer);
        }

        Ok(Installed {
            bin,
            caveats: parsed.caveats.as_deref().map(|text| vars.expand(text)),
        })
    }

    /// Build a nested resource into the auxiliary prefix and make its
    /// executables resolvable for all subsequent steps
    fn resource(&mut self, resource: &formula::Resource, interpreter: &Interpreter) -> Result<(), Error> {
        println!("{} {}", "Resource".magenta(), resource.name.clone().bold());

        let archive = source::Archive::new(resource.url.clone(), &resource.sha256)?;
        let fetched = source::sync(&archive, &self.paths)?;

        let dir = self.paths.resource(&resource.name);
        util::recreate_dir(&dir)?;
        source::unpack(&fetched.path, &dir)?;

        self.tool_sequence(&dir, &self.paths.libexec(), &[], &resource.options, interpreter)?;

        self.resolver.prepend(self.paths.libexec_bin());

        Ok(())
    }

    fn fetch_main(&self, parsed: &formula::Formula) -> Result<PathBuf, Error> {
        let work = self.paths.work();
        util::recreate_dir(&work)?;

        if self.head {
            let head = parsed.head.as_ref().ok_or(Error::NoHead)?;

            println!(
                "{} {} ({})",
                "Cloning".blue(),
                head.url.as_str().to_owned().bold(),
                head.branch.clone().dim(),
            );
            source::clone_head(&head.url, &head.branch, &work)?;
        } else {
            let archive = source::Archive::new(parsed.upstream.url.clone(), &parsed.upstream.sha256)?;
            let fetched = source::sync(&archive, &self.paths)?;
            source::unpack(&fetched.path, &work)?;
        }

        Ok(work)
    }

    /// The external tool's three-step protocol: setup, compile,
    /// install. Each non-zero exit aborts the run.
    fn tool_sequence(
        &self,
        work: &Path,
        prefix: &Path,
        std_options: &[String],
        extra_options: &[String],
        interpreter: &Interpreter,
    ) -> Result<(), Error> {
        let tool = self
            .resolver
            .locate(&self.defaults.build_tool)
            .ok_or_else(|| dependency::Error::Missing(self.defaults.build_tool.clone()))?;

        let env = vec![
            ("PATH".to_owned(), self.resolver.env_value()),
            ("HOME".to_owned(), work.as_os_str().to_owned()),
            ("PYTHON".to_owned(), interpreter.path.as_os_str().to_owned()),
        ];

        let setup_args: Vec<String> = ["setup".to_owned(), "build".to_owned(), format!("--prefix={}", prefix.display())]
            .into_iter()
            .chain(std_options.iter().cloned())
            .chain(extra_options.iter().cloned())
            .collect();

        let phases = [
            (Phase::Setup, setup_args),
            (
                Phase::Compile,
                vec!["compile".to_owned(), "-C".to_owned(), "build".to_owned()],
            ),
            (
                Phase::Install,
                vec!["install".to_owned(), "-C".to_owned(), "build".to_owned()],
            ),
        ];

        for (phase, args) in phases {
            println!("{}", phase.styled(format!("│{phase}")));

            Step::Run {
                program: tool.clone(),
                args,
                cwd: work.to_path_buf(),
                env: env.clone(),
            }
            .apply(phase)?;
        }

        Ok(())
    }

    /// Copy the declared source files into the versioned package
    /// directory under the prefix's library path
    fn stage(&self, parsed: &formula::Formula, work: &Path, site_packages: &Path) -> Result<(), Error> {
        let package_dir = site_packages.join(&parsed.stage.package);

        Step::MakeDir {
            path: package_dir.clone(),
        }
        .apply(Phase::Stage)?;

        for copy in &parsed.stage.copy {
            let source = work.join(&copy.source);
            let dest = match &copy.dest {
                Some(dest) => package_dir.join(dest),
                None => package_dir.join(source.file_name().unwrap_or_default()),
            };

            Step::CopyTree { source, dest }.apply(Phase::Stage)?;
        }

        Ok(())
    }

    fn launcher(
        &self,
        parsed: &formula::Formula,
        interpreter: &Interpreter,
        site_packages: &Path,
    ) -> Result<PathBuf, Error> {
        let bin = self.paths.bin().join(&parsed.entry.bin);

        // The build tool may have installed its own entry point; keep
        // it aside in libexec so the pinned launcher owns bin/
        util::move_if_exists(&bin, &self.paths.libexec_bin().join(&parsed.entry.bin))?;

        let script = Launcher {
            interpreter: &interpreter.path,
            site_packages,
            module: &parsed.entry.module,
        }
        .script();

        write_executable(&bin, script)?;

        Ok(bin)
    }

    /// Synthesize the application bundle: descriptor plus a nested
    /// launcher identical in behaviour to the `bin/` one
    fn bundle(
        &self,
        parsed: &formula::Formula,
        bundle: &formula::Bundle,
        interpreter: &Interpreter,
        site_packages: &Path,
    ) -> Result<(), Error> {
        let contents = self.paths.bundle_contents(&bundle.name);

        for dir in ["MacOS", "Resources"] {
            Step::MakeDir {
                path: contents.join(dir),
            }
            .apply(Phase::Bundle)?;
        }

        let plist = BundleInfo {
            name: &bundle.name,
            identifier: &bundle.identifier,
            version: &parsed.version,
            executable: &parsed.entry.bin,
            category: &bundle.category,
            minimum_system: &bundle.minimum_system,
        }
        .plist();

        Step::WriteFile {
            path: contents.join("Info.plist"),
            contents: plist,
        }
        .apply(Phase::Bundle)?;

        let script = Launcher {
            interpreter: &interpreter.path,
            site_packages,
            module: &parsed.entry.module,
        }
        .script();

        write_executable(&contents.join("MacOS").join(&parsed.entry.bin), script)?;

        Ok(())
    }
}

fn write_executable(path: &Path, contents: String) -> Result<(), step::Error> {
    Step::WriteFile {
        path: path.to_path_buf(),
        contents,
    }
    .apply(Phase::Launcher)?;
    Step::SetMode {
        path: path.to_path_buf(),
        mode: 0o755,
    }
    .apply(Phase::Launcher)?;

    Ok(())
}

/// Run the installed entry point with the declared smoke-test
/// arguments; a non-zero exit fails the check
pub fn smoke_test(bin: &Path, args: &[String]) -> Result<(), Error> {
    if !bin.exists() {
        return Err(Error::MissingEntryPoint(bin.to_path_buf()));
    }

    Step::Run {
        program: bin.to_path_buf(),
        args: args.to_vec(),
        cwd: std::env::temp_dir(),
        env: vec![("PATH".to_owned(), Resolver::from_host().env_value())],
    }
    .apply(Phase::Install)?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("formula declares no head reference")]
    NoHead,
    #[error("entry point does not exist: {0:?}")]
    MissingEntryPoint(PathBuf),
    #[error("recipe")]
    Recipe(#[from] recipe::Error),
    #[error("defaults")]
    Defaults(#[from] defaults::Error),
    #[error("dependency")]
    Dependency(#[from] dependency::Error),
    #[error("interpreter")]
    Interpreter(#[from] interpreter::Error),
    #[error("source")]
    Source(#[from] source::Error),
    #[error("edit")]
    Edit(#[from] edit::Error),
    #[error("step")]
    Step(#[from] step::Error),
    #[error("io")]
    Io(#[from] io::Error),
}
