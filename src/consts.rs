//! Project-wide constants.

use std::path::PathBuf;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");

/// Python module the engine is invoked through (`python -m <module>`).
pub const ENGINE_MODULE: &str = "manga_translator";

/// Engine subcommand for translating a local folder.
pub const LOCAL_SUBCOMMAND: &str = "local";

/// Inpainting mask dilation passed to the engine. Not user-configurable.
pub const KERNEL_SIZE: u32 = 7;

/// Font files probed under `<engine_dir>/fonts/`, most preferred first.
pub const FONT_CANDIDATES: &[&str] = &["comic shanns 2.ttf", "anime_ace_3.ttf"];

/// Environment forced on the engine so its output is always UTF-8.
pub const UTF8_ENV: &[(&str, &str)] = &[("PYTHONUTF8", "1"), ("PYTHONIOENCODING", "utf-8")];

/// Page extensions recognised when listing a folder (lowercase, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Default interpreter when none is configured.
pub const DEFAULT_PYTHON: &str = "python";

/// Default engine language code.
pub const DEFAULT_TARGET_LANG: &str = "ENG";

/// Directory name the engine checkout is expected under, next to the app.
pub const ENGINE_CHECKOUT_DIR: &str = "manga-image-translator";

/// Engine config file expected next to the app.
pub const ENGINE_CONFIG_FILE: &str = "mit-config.json";

/// Output root used when none is configured, relative to the base dir.
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

/// Default settings path: `~/.manga_localizer_ui/settings.json`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".manga_localizer_ui").join("settings.json"))
}
