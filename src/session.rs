//! Ties settings, page browsing and the runner together.
//!
//! This is what a front end talks to: it owns the current [`AppConfig`], saves
//! it through an injected [`SettingsStore`], and validates everything before a
//! run so configuration mistakes surface synchronously.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::command::{Invocation, build_command, format_command};
use crate::config::store::SettingsStore;
use crate::config::{AppConfig, ConfigError};
use crate::library::{self, Progress};
use crate::paths;
use crate::runner::{RunError, RunHandle, Runner};

pub struct Session {
    store: Box<dyn SettingsStore>,
    runner: Runner,
    base_dir: PathBuf,
    config: AppConfig,
}

impl Session {
    /// Load settings and fill in anything discoverable under `base_dir`.
    pub fn new(store: Box<dyn SettingsStore>, base_dir: impl AsRef<Path>) -> Self {
        let base_dir = paths::resolve(base_dir);
        let mut config = store.load();
        if config.autofill(&base_dir)
            && let Err(e) = store.save(&config)
        {
            tracing::warn!(error = %e, "could not save discovered settings");
        }
        Self {
            store,
            runner: Runner::new(),
            base_dir,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Change settings and persist them.
    pub fn update_config(&mut self, f: impl FnOnce(&mut AppConfig)) -> Result<()> {
        f(&mut self.config);
        self.store.save(&self.config).context("failed to save settings")
    }

    /// Output folder for the given input folder.
    pub fn output_dir_for(&self, input: &Path) -> PathBuf {
        self.config.output_dir_for(&self.base_dir, input)
    }

    /// The command `translate` would run, without running it.
    pub fn preview_command(&self, input: &Path) -> Vec<String> {
        build_command(&self.config.engine, input, &self.output_dir_for(input))
    }

    /// Check everything a run depends on, before anything is spawned.
    fn validate(&self, input: &Path) -> Result<(), ConfigError> {
        let resolved = paths::resolve(input);
        if !resolved.is_dir() {
            return Err(ConfigError::InputFolderMissing(resolved));
        }
        self.config.engine.require_engine_dir()?;
        self.config.engine.ensure_valid()
    }

    /// Translate every page in `input`.
    ///
    /// Rejects immediately when a run is in flight or the configuration is
    /// incomplete. Returns once the engine has been spawned; follow its output
    /// through the returned handle.
    pub async fn translate(&mut self, input: &Path) -> Result<RunHandle, RunError> {
        if self.runner.is_busy() {
            return Err(RunError::Busy);
        }
        self.validate(input)?;

        let input = paths::resolve(input);
        let output = self.output_dir_for(&input);

        self.config.last_open_dir = input.display().to_string();
        self.config.output_root = self.config.output_root_abs(&self.base_dir).display().to_string();
        if let Err(e) = self.store.save(&self.config) {
            tracing::warn!(error = %e, "could not save settings before run");
        }

        let invocation = Invocation::prepare(&self.config.engine, &input, &output);
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            "Running:\n{}",
            format_command(&invocation.argv)
        );

        self.runner.start(invocation).await
    }

    /// Pages in `input`, optionally narrowed by a name filter.
    pub fn pages(&self, input: &Path, filter: Option<&str>) -> Result<Vec<PathBuf>> {
        let pages = library::list_pages(input)
            .with_context(|| format!("failed to list pages in {}", input.display()))?;
        Ok(match filter {
            Some(query) => library::filter_pages(&pages, query)
                .into_iter()
                .cloned()
                .collect(),
            None => pages,
        })
    }

    /// How many pages of `input` already have a translation.
    pub fn progress(&self, input: &Path) -> Result<Progress> {
        let pages = self.pages(input, None)?;
        Ok(library::progress(&pages, &self.output_dir_for(input)))
    }

    /// Translated counterpart of one page, if it exists yet.
    pub fn translated_page(&self, input: &Path, page: &Path) -> Option<PathBuf> {
        library::translated_output_for(&self.output_dir_for(input), page).filter(|p| p.exists())
    }

    /// Create the output folder for `input` and ask the OS to show it.
    ///
    /// Opening is best effort (headless systems have nothing to open it with);
    /// the folder path is returned either way.
    pub fn open_output_folder(&self, input: &Path) -> Result<PathBuf> {
        let out = self.output_dir_for(input);
        std::fs::create_dir_all(&out)
            .with_context(|| format!("failed to create {}", out.display()))?;
        if let Err(e) = open::that(&out) {
            tracing::debug!(error = %e, "could not open output folder");
        }
        Ok(out)
    }
}
