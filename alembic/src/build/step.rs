// SPDX-FileCopyrightText: Copyright © 2024-2025 Alembic Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    ffi::OsString,
    io,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process,
    sync::{Arc, Mutex},
    thread,
};

use fs_err as fs;
use thiserror::Error;

use crate::{style::Styled, util};

use super::Phase;

/// Number of trailing output lines carried in a command failure
const OUTPUT_TAIL: usize = 20;

/// One ordered action of an install sequence.
///
/// The executor's control flow is a plain iteration over these
/// variants; any failure aborts the whole run. `MakeDir` treats an
/// existing directory as success.
#[derive(Debug, Clone)]
pub enum Step {
    /// Spawn an external command with an explicit environment,
    /// streaming its output with a phase tag
    Run {
        program: PathBuf,
        args: Vec<String>,
        cwd: PathBuf,
        env: Vec<(String, OsString)>,
    },
    /// Write a text file, creating parent directories
    WriteFile { path: PathBuf, contents: String },
    /// Copy a file or directory tree
    CopyTree { source: PathBuf, dest: PathBuf },
    /// Set permission bits
    SetMode { path: PathBuf, mode: u32 },
    /// Create a directory (and parents); idempotent
    MakeDir { path: PathBuf },
}

impl Step {
    pub fn apply(&self, phase: Phase) -> Result<(), Error> {
        match self {
            Step::Run {
                program,
                args,
                cwd,
                env,
            } => run(phase, program, args, cwd, env),
            Step::WriteFile { path, contents } => {
                if let Some(parent) = path.parent() {
                    util::ensure_dir_exists(parent)?;
                }
                fs::write(path, contents)?;
                Ok(())
            }
            Step::CopyTree { source, dest } => {
                if source.metadata()?.is_dir() {
                    util::copy_dir(source, dest)?;
                } else {
                    if let Some(parent) = dest.parent() {
                        util::ensure_dir_exists(parent)?;
                    }
                    util::hardlink_or_copy(source, dest)?;
                }
                Ok(())
            }
            Step::SetMode { path, mode } => {
                fs::set_permissions(path, std::fs::Permissions::from_mode(*mode))?;
                Ok(())
            }
            Step::MakeDir { path } => {
                util::ensure_dir_exists(path)?;
                Ok(())
            }
        }
    }
}

fn run(
    phase: Phase,
    program: &Path,
    args: &[String],
    cwd: &Path,
    env: &[(String, OsString)],
) -> Result<(), Error> {
    let mut command = process::Command::new(program);

    command.args(args).current_dir(cwd).env_clear();
    for (key, value) in env {
        command.env(key, value);
    }

    let mut child = command
        .stdout(process::Stdio::piped())
        .stderr(process::Stdio::piped())
        .spawn()
        .map_err(|io| Error::Spawn(program.to_path_buf(), io))?;

    let captured = Arc::new(Mutex::new(Vec::new()));

    // Log stdout and stderr
    let stdout_log = log(phase, child.stdout.take().expect("piped stdout"), captured.clone());
    let stderr_log = log(phase, child.stderr.take().expect("piped stderr"), captured.clone());

    let result = child.wait()?;

    let _ = stdout_log.join();
    let _ = stderr_log.join();

    if result.success() {
        return Ok(());
    }

    let output = {
        let lines = captured.lock().expect("captured output");
        let skip = lines.len().saturating_sub(OUTPUT_TAIL);
        lines[skip..].join("\n")
    };

    match result.code() {
        Some(code) => Err(Error::Command {
            program: program.display().to_string(),
            code,
            output,
        }),
        None => Err(Error::Terminated {
            program: program.display().to_string(),
        }),
    }
}

fn log<R>(phase: Phase, pipe: R, captured: Arc<Mutex<Vec<String>>>) -> thread::JoinHandle<()>
where
    R: io::Read + Send + 'static,
{
    use std::io::BufRead;

    thread::spawn(move || {
        let kind = phase.styled(format!("{}│", phase.abbrev()));
        let tag = format!("{}{kind}", "│".dim());

        let mut lines = io::BufReader::new(pipe).lines();

        while let Some(Ok(line)) = lines.next() {
            println!("{tag} {line}");
            captured.lock().expect("captured output").push(line);
        }
    })
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn {0:?}")]
    Spawn(PathBuf, #[source] io::Error),
    #[error("{program} failed with status code {code}\n{output}")]
    Command {
        program: String,
        code: i32,
        output: String,
    },
    #[error("{program} stopped by signal")]
    Terminated { program: String },
    #[error("io")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn make_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b");

        let step = Step::MakeDir { path: path.clone() };
        step.apply(Phase::Stage).unwrap();
        step.apply(Phase::Stage).unwrap();

        assert!(path.is_dir());
    }

    #[test]
    fn write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/launcher");

        Step::WriteFile {
            path: path.clone(),
            contents: "#!/bin/bash\n".to_owned(),
        }
        .apply(Phase::Launcher)
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/bash\n");
    }

    #[test]
    fn set_mode_applies_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script");
        fs::write(&path, "").unwrap();

        Step::SetMode {
            path: path.clone(),
            mode: 0o755,
        }
        .apply(Phase::Launcher)
        .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn copy_tree_handles_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();

        let src_file = dir.path().join("main.py");
        fs::write(&src_file, "print()").unwrap();

        let src_dir = dir.path().join("ui");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("window.py"), "w").unwrap();

        Step::CopyTree {
            source: src_file,
            dest: dir.path().join("out/pkg/main.py"),
        }
        .apply(Phase::Stage)
        .unwrap();
        Step::CopyTree {
            source: src_dir,
            dest: dir.path().join("out/pkg/ui"),
        }
        .apply(Phase::Stage)
        .unwrap();

        assert!(dir.path().join("out/pkg/main.py").is_file());
        assert!(dir.path().join("out/pkg/ui/window.py").is_file());
    }

    #[test]
    fn run_captures_failure_output() {
        let result = Step::Run {
            program: "/bin/sh".into(),
            args: vec!["-c".to_owned(), "echo broken build; exit 3".to_owned()],
            cwd: std::env::temp_dir(),
            env: vec![("PATH".to_owned(), "/usr/bin:/bin".into())],
        }
        .apply(Phase::Compile);

        match result {
            Err(Error::Command { code, output, .. }) => {
                assert_eq!(code, 3);
                assert!(output.contains("broken build"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn run_missing_program_fails_to_spawn() {
        let result = Step::Run {
            program: "/nonexistent/tool".into(),
            args: vec![],
            cwd: std::env::temp_dir(),
            env: vec![],
        }
        .apply(Phase::Setup);

        assert!(matches!(result, Err(Error::Spawn(..))));
    }
}
