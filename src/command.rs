//! Engine command line construction.
//!
//! [`build_command`] is a pure mapping from settings and folders to the
//! engine's argument vector:
//!
//! ```text
//! <python> -m manga_translator [-v] [--use-gpu] --kernel-size 7 [--font-path <font>]
//!     local -i <input> -o <output> --overwrite [--config-file <file>]
//! ```
//!
//! Every path in it is absolute. [`Invocation`] adds what the process needs
//! around the arguments: the working directory and the environment.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::config::{EngineConfig, probe_font};
use crate::consts::{ENGINE_MODULE, KERNEL_SIZE, LOCAL_SUBCOMMAND, UTF8_ENV};
use crate::paths;

/// Argument vector for translating `input` into `output`.
pub fn build_command(cfg: &EngineConfig, input: &Path, output: &Path) -> Vec<String> {
    let input = paths::resolve(input);
    let output = paths::resolve(output);

    let mut cmd = vec![
        interpreter(&cfg.python_exe),
        "-m".to_string(),
        ENGINE_MODULE.to_string(),
    ];

    if cfg.verbose {
        cmd.push("-v".to_string());
    }

    if cfg.use_gpu {
        cmd.push("--use-gpu".to_string());
    }

    cmd.push("--kernel-size".to_string());
    cmd.push(KERNEL_SIZE.to_string());

    if let Some(font) = font_path(cfg) {
        cmd.push("--font-path".to_string());
        cmd.push(display(&font));
    }

    cmd.extend([
        LOCAL_SUBCOMMAND.to_string(),
        "-i".to_string(),
        display(&input),
        "-o".to_string(),
        display(&output),
    ]);
    if cfg.overwrite {
        cmd.push("--overwrite".to_string());
    }

    let config_file = cfg.config_file.trim();
    if !config_file.is_empty() {
        cmd.push("--config-file".to_string());
        cmd.push(display(&paths::resolve(config_file)));
    }

    cmd
}

/// Explicit font if set, else the first known font in the engine checkout.
fn font_path(cfg: &EngineConfig) -> Option<PathBuf> {
    let explicit = cfg.font_path.trim();
    if !explicit.is_empty() {
        return Some(paths::resolve(explicit));
    }
    let engine_dir = cfg.engine_dir()?;
    probe_font(&paths::resolve(engine_dir))
}

/// Bare program names are left for `PATH` lookup; anything path-like is resolved.
fn interpreter(python_exe: &str) -> String {
    let exe = python_exe.trim();
    if exe.contains(MAIN_SEPARATOR) || exe.contains('/') || exe.starts_with('~') {
        display(&paths::resolve(exe))
    } else {
        exe.to_string()
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Render an argument vector as a single shell-like line for logs.
pub fn format_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One fully resolved engine launch. Built fresh per run, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    /// Created by the runner before spawning.
    pub output_dir: PathBuf,
    /// `None` inherits the caller's working directory.
    pub working_dir: Option<PathBuf>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Resolve everything needed to launch the engine for one folder.
    ///
    /// The engine runs from its checkout when that directory exists; otherwise
    /// it inherits the caller's working directory.
    pub fn prepare(cfg: &EngineConfig, input: &Path, output: &Path) -> Self {
        let argv = build_command(cfg, input, output);

        let working_dir = match cfg.engine_dir() {
            Some(dir) if dir.is_dir() => Some(paths::resolve(dir)),
            Some(dir) => {
                tracing::warn!(
                    engine_dir = %dir.display(),
                    "engine dir is gone, running from the current directory"
                );
                None
            }
            None => None,
        };

        Self {
            argv,
            output_dir: paths::resolve(output),
            working_dir,
            env: UTF8_ENV
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}
