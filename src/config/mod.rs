//! User settings: the engine snapshot and where output goes.
//!
//! Persisted as JSON by a [`SettingsStore`](store::SettingsStore). Every field
//! has a default so older or partial documents still load.

pub mod store;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_OUTPUT_ROOT, DEFAULT_PYTHON, DEFAULT_TARGET_LANG, ENGINE_CHECKOUT_DIR,
    ENGINE_CONFIG_FILE, ENGINE_MODULE, FONT_CANDIDATES,
};
use crate::paths;

/// Problems caught before the engine is ever spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("font path does not exist: {}", .0.display())]
    FontNotFound(PathBuf),
    #[error("engine dir is not set; point it at your manga-image-translator checkout")]
    EngineDirUnset,
    #[error("engine dir does not exist: {}", .0.display())]
    EngineDirMissing(PathBuf),
    #[error("input folder does not exist or is not a directory: {}", .0.display())]
    InputFolderMissing(PathBuf),
}

/// The choices that shape one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interpreter with the engine installed.
    pub python_exe: String,
    /// Engine checkout (the folder containing `manga_translator/`).
    pub engine_dir: String,
    pub config_file: String,

    pub use_gpu: bool,
    pub detector: String,
    pub ocr: String,
    pub inpainter: String,

    pub target_lang: String,
    pub font_path: String,
    pub overwrite: bool,
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            python_exe: DEFAULT_PYTHON.to_string(),
            engine_dir: String::new(),
            config_file: String::new(),
            use_gpu: false,
            detector: "default".to_string(),
            ocr: "48px".to_string(),
            inpainter: "lama_large".to_string(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            font_path: String::new(),
            overwrite: true,
            verbose: true,
        }
    }
}

impl EngineConfig {
    /// Reject an explicit font that isn't on disk.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        let font = self.font_path.trim();
        if !font.is_empty() {
            let path = paths::expand_home(Path::new(font));
            if !path.exists() {
                return Err(ConfigError::FontNotFound(path));
            }
        }
        Ok(())
    }

    /// The engine checkout, home-expanded. `None` when unset.
    pub fn engine_dir(&self) -> Option<PathBuf> {
        let dir = self.engine_dir.trim();
        (!dir.is_empty()).then(|| paths::expand_home(Path::new(dir)))
    }

    /// Engine dir that must exist for a run to start.
    pub fn require_engine_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = self.engine_dir().ok_or(ConfigError::EngineDirUnset)?;
        if !dir.is_dir() {
            return Err(ConfigError::EngineDirMissing(dir));
        }
        Ok(dir)
    }
}

/// Everything the application remembers between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub last_open_dir: String,
    pub output_root: String,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_open_dir: String::new(),
            output_root: DEFAULT_OUTPUT_ROOT.to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Output root as an absolute path. Relative roots hang off `base`.
    pub fn output_root_abs(&self, base: &Path) -> PathBuf {
        let root = self.output_root.trim();
        if root.is_empty() {
            return paths::resolve(base.join(DEFAULT_OUTPUT_ROOT));
        }
        let root = paths::expand_home(Path::new(root));
        if root.is_absolute() {
            paths::resolve(root)
        } else {
            paths::resolve(base.join(root))
        }
    }

    /// Where translated pages for `input` land: `<output root>/<folder name>`.
    pub fn output_dir_for(&self, base: &Path, input: &Path) -> PathBuf {
        let root = self.output_root_abs(base);
        match paths::resolve(input).file_name() {
            Some(name) => root.join(name),
            None => root,
        }
    }

    /// Fill unset paths from the layout next to the application.
    ///
    /// Looks for the engine checkout and its config file under `base`, picks a
    /// font out of the engine's `fonts/` folder, and pins the output root to an
    /// absolute path outside the engine checkout. Returns whether anything
    /// changed so the caller knows to save.
    pub fn autofill(&mut self, base: &Path) -> bool {
        let mut changed = false;

        if self.engine.engine_dir.trim().is_empty() {
            let candidate = base.join(ENGINE_CHECKOUT_DIR);
            if candidate.join(ENGINE_MODULE).is_dir() {
                tracing::info!(engine_dir = %candidate.display(), "found engine checkout");
                self.engine.engine_dir = candidate.display().to_string();
                changed = true;
            }
        }

        if self.engine.config_file.trim().is_empty() {
            let candidate = base.join(ENGINE_CONFIG_FILE);
            if candidate.is_file() {
                self.engine.config_file = candidate.display().to_string();
                changed = true;
            }
        }

        if self.engine.font_path.trim().is_empty()
            && let Some(engine_dir) = self.engine.engine_dir()
            && let Some(font) = probe_font(&engine_dir)
        {
            self.engine.font_path = font.display().to_string();
            changed = true;
        }

        let desired = paths::resolve(base.join(DEFAULT_OUTPUT_ROOT));
        let current = self.output_root.trim();
        let normalized = if current.is_empty() {
            desired
        } else {
            let abs = self.output_root_abs(base);
            let lowered = abs.to_string_lossy().replace('\\', "/").to_lowercase();
            if lowered.contains(ENGINE_CHECKOUT_DIR) {
                desired
            } else {
                abs
            }
        };
        let normalized = normalized.display().to_string();
        if normalized != self.output_root {
            self.output_root = normalized;
            changed = true;
        }

        changed
    }
}

/// First of [`FONT_CANDIDATES`] present under `<engine_dir>/fonts/`.
pub fn probe_font(engine_dir: &Path) -> Option<PathBuf> {
    let fonts = engine_dir.join("fonts");
    FONT_CANDIDATES
        .iter()
        .map(|name| fonts.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_match_engine_recommendations() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.python_exe, "python");
        assert_eq!(cfg.detector, "default");
        assert_eq!(cfg.ocr, "48px");
        assert_eq!(cfg.inpainter, "lama_large");
        assert_eq!(cfg.target_lang, "ENG");
        assert!(cfg.overwrite);
        assert!(cfg.verbose);
        assert!(!cfg.use_gpu);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"engine": {"use_gpu": true}, "unknown": 1}"#).unwrap();
        assert!(cfg.engine.use_gpu);
        assert_eq!(cfg.engine.ocr, "48px");
        assert_eq!(cfg.output_root, "output");
    }

    #[test]
    fn ensure_valid_rejects_missing_font() {
        let cfg = EngineConfig {
            font_path: "/definitely/not/here.ttf".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            cfg.ensure_valid(),
            Err(ConfigError::FontNotFound(_))
        ));
    }

    #[test]
    fn ensure_valid_accepts_empty_or_existing_font() {
        assert!(EngineConfig::default().ensure_valid().is_ok());

        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("f.ttf");
        fs::write(&font, b"").unwrap();
        let cfg = EngineConfig {
            font_path: font.display().to_string(),
            ..EngineConfig::default()
        };
        assert!(cfg.ensure_valid().is_ok());
    }

    #[test]
    fn require_engine_dir_errors() {
        let cfg = EngineConfig::default();
        assert!(matches!(
            cfg.require_engine_dir(),
            Err(ConfigError::EngineDirUnset)
        ));

        let cfg = EngineConfig {
            engine_dir: "/no/such/engine".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            cfg.require_engine_dir(),
            Err(ConfigError::EngineDirMissing(_))
        ));
    }

    #[test]
    fn output_root_relative_hangs_off_base() {
        let base = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            output_root: "out".to_string(),
            ..AppConfig::default()
        };
        let canonical = base.path().canonicalize().unwrap();
        assert_eq!(cfg.output_root_abs(base.path()), canonical.join("out"));
    }

    #[test]
    fn output_root_empty_defaults_to_output() {
        let base = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            output_root: String::new(),
            ..AppConfig::default()
        };
        let canonical = base.path().canonicalize().unwrap();
        assert_eq!(cfg.output_root_abs(base.path()), canonical.join("output"));
    }

    #[test]
    fn output_dir_uses_input_folder_name() {
        let base = tempfile::tempdir().unwrap();
        let cfg = AppConfig::default();
        let out = cfg.output_dir_for(base.path(), Path::new("/tmp/manga/ch1"));
        assert!(out.ends_with("output/ch1"));
    }

    #[test]
    fn probe_font_prefers_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = dir.path().join("fonts");
        fs::create_dir_all(&fonts).unwrap();
        fs::write(fonts.join("anime_ace_3.ttf"), b"").unwrap();
        assert_eq!(
            probe_font(dir.path()).unwrap(),
            fonts.join("anime_ace_3.ttf")
        );

        fs::write(fonts.join("comic shanns 2.ttf"), b"").unwrap();
        assert_eq!(
            probe_font(dir.path()).unwrap(),
            fonts.join("comic shanns 2.ttf")
        );
    }

    #[test]
    fn probe_font_none_without_fonts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(probe_font(dir.path()).is_none());
    }

    #[test]
    fn autofill_discovers_engine_layout() {
        let base = tempfile::tempdir().unwrap();
        let engine = base.path().join("manga-image-translator");
        fs::create_dir_all(engine.join("manga_translator")).unwrap();
        fs::create_dir_all(engine.join("fonts")).unwrap();
        fs::write(engine.join("fonts").join("anime_ace_3.ttf"), b"").unwrap();
        fs::write(base.path().join("mit-config.json"), b"{}").unwrap();

        let mut cfg = AppConfig::default();
        assert!(cfg.autofill(base.path()));

        assert_eq!(cfg.engine.engine_dir, engine.display().to_string());
        assert!(cfg.engine.config_file.ends_with("mit-config.json"));
        assert!(cfg.engine.font_path.ends_with("anime_ace_3.ttf"));
        assert!(Path::new(&cfg.output_root).is_absolute());

        // Second pass has nothing left to do.
        assert!(!cfg.autofill(base.path()));
    }

    #[test]
    fn autofill_keeps_user_choices() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir_all(base.path().join("manga-image-translator/manga_translator")).unwrap();
        let out = tempfile::tempdir().unwrap();
        let out_abs = out.path().canonicalize().unwrap().display().to_string();

        let mut cfg = AppConfig {
            output_root: out_abs.clone(),
            engine: EngineConfig {
                engine_dir: "/my/engine".to_string(),
                ..EngineConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(!cfg.autofill(base.path()));
        assert_eq!(cfg.engine.engine_dir, "/my/engine");
        assert_eq!(cfg.output_root, out_abs);
    }

    #[test]
    fn autofill_moves_output_out_of_engine_checkout() {
        let base = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig {
            output_root: "manga-image-translator/result".to_string(),
            ..AppConfig::default()
        };
        assert!(cfg.autofill(base.path()));
        let expected = base.path().canonicalize().unwrap().join("output");
        assert_eq!(cfg.output_root, expected.display().to_string());
    }
}
