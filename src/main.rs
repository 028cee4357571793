use std::path::PathBuf;
use std::pin::pin;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use manga_localizer::banner::{BannerInfo, print_banner, print_run_summary};
use manga_localizer::command::format_command;
use manga_localizer::config::AppConfig;
use manga_localizer::config::store::JsonSettingsStore;
use manga_localizer::consts::DEFAULT_TARGET_LANG;
use manga_localizer::events::RunEvent;
use manga_localizer::session::Session;

#[derive(Parser)]
#[command(
    name = "manga-localizer",
    version,
    about = "Translate manga folders with manga-image-translator."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: ~/.manga_localizer_ui/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Directory searched for the engine checkout, config file and output root
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Translate every page in a folder
    Translate {
        /// Folder of manga pages
        folder: PathBuf,
    },
    /// Print the engine command without running it
    Command {
        folder: PathBuf,
    },
    /// List pages in a folder and whether each is translated
    Pages {
        folder: PathBuf,

        /// Only show pages whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Create and open the output folder for a manga folder
    OpenOutput {
        folder: PathBuf,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print current settings as JSON
    Show,
    /// Print the settings file location
    Path,
    /// Change one or more settings
    Set(ConfigSet),
}

#[derive(Args)]
struct ConfigSet {
    /// Python executable with the engine installed
    #[arg(long)]
    python: Option<String>,
    /// manga-image-translator checkout
    #[arg(long)]
    engine_dir: Option<String>,
    /// Engine config file (empty string clears it)
    #[arg(long)]
    config_file: Option<String>,
    /// Font file (empty string restores automatic selection)
    #[arg(long)]
    font: Option<String>,
    #[arg(long)]
    gpu: Option<bool>,
    #[arg(long)]
    verbose: Option<bool>,
    #[arg(long)]
    overwrite: Option<bool>,
    #[arg(long)]
    detector: Option<String>,
    #[arg(long)]
    ocr: Option<String>,
    #[arg(long)]
    inpainter: Option<String>,
    /// Target language code, e.g. ENG
    #[arg(long)]
    lang: Option<String>,
    /// Root folder translated chapters are written under
    #[arg(long)]
    output_root: Option<String>,
}

impl ConfigSet {
    fn apply(self, config: &mut AppConfig) {
        let engine = &mut config.engine;
        if let Some(v) = self.python.filter(|v| !v.trim().is_empty()) {
            engine.python_exe = v;
        }
        if let Some(v) = self.engine_dir {
            engine.engine_dir = v;
        }
        if let Some(v) = self.config_file {
            engine.config_file = v;
        }
        if let Some(v) = self.font {
            engine.font_path = v;
        }
        if let Some(v) = self.gpu {
            engine.use_gpu = v;
        }
        if let Some(v) = self.verbose {
            engine.verbose = v;
        }
        if let Some(v) = self.overwrite {
            engine.overwrite = v;
        }
        if let Some(v) = self.detector {
            engine.detector = v;
        }
        if let Some(v) = self.ocr {
            engine.ocr = v;
        }
        if let Some(v) = self.inpainter {
            engine.inpainter = v;
        }
        if let Some(v) = self.lang {
            engine.target_lang = if v.trim().is_empty() {
                DEFAULT_TARGET_LANG.to_string()
            } else {
                v
            };
        }
        if let Some(v) = self.output_root {
            config.output_root = v;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let store = match &cli.settings {
        Some(path) => JsonSettingsStore::with_path(path),
        None => JsonSettingsStore::new()?,
    };
    let settings_path = store.path().to_path_buf();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut session = Session::new(Box::new(store), base_dir);

    match cli.command {
        Command::Translate { folder } => return translate(&mut session, folder).await,
        Command::Command { folder } => {
            println!("{}", format_command(&session.preview_command(&folder)));
        }
        Command::Pages { folder, filter } => {
            let pages = session.pages(&folder, filter.as_deref())?;
            for page in &pages {
                let mark = if session.translated_page(&folder, page).is_some() {
                    "✓"
                } else {
                    " "
                };
                let name = page.file_name().unwrap_or_default().to_string_lossy();
                println!("  [{mark}] {name}");
            }
            println!("\n{} translated", session.progress(&folder)?);
        }
        Command::OpenOutput { folder } => {
            let out = session.open_output_folder(&folder)?;
            println!("Output folder:\n{}", out.display());
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(session.config())?);
            }
            ConfigAction::Path => {
                println!("settings  {}", settings_path.display());
                println!("base dir  {}", session.base_dir().display());
            }
            ConfigAction::Set(set) => {
                session.update_config(|config| set.apply(config))?;
                println!("✓ Settings saved to {}", settings_path.display());
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

async fn translate(session: &mut Session, folder: PathBuf) -> anyhow::Result<ExitCode> {
    let output = session.output_dir_for(&folder);
    let engine = session.config().engine.clone();
    print_banner(&BannerInfo {
        python: &engine.python_exe,
        engine_dir: &engine.engine_dir,
        gpu: engine.use_gpu,
        input: &folder,
        output: &output,
        pages: session.progress(&folder).unwrap_or_default(),
    });

    let handle = session.translate(&folder).await?;
    if let Some(pid) = handle.pid() {
        println!("engine started (pid {pid})\n");
    }

    let mut exit_code = -1;
    let mut events = pin!(handle.into_stream());
    while let Some(event) = events.next().await {
        match event {
            RunEvent::LogLine(line) => println!("{line}"),
            RunEvent::Completed(code) => exit_code = code,
        }
    }

    print_run_summary(exit_code, session.progress(&folder).ok());
    Ok(match u8::try_from(exit_code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    })
}
