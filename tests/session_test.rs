#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use manga_localizer::config::store::{JsonSettingsStore, SettingsStore};
use manga_localizer::config::{AppConfig, ConfigError};
use manga_localizer::runner::RunError;
use manga_localizer::session::Session;

/// A stand-in interpreter that prints its cwd and arguments, then writes one
/// "translated" page into the folder after `-o`.
const FAKE_PYTHON: &str = r#"#!/bin/sh
echo "cwd: $(pwd -P)"
echo "args: $*"
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
echo "warning on stderr" >&2
touch "$out/001.png"
exit 0
"#;

struct Fixture {
    _root: tempfile::TempDir,
    base: PathBuf,
    engine: PathBuf,
    input: PathBuf,
    settings: PathBuf,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let base = root.path().canonicalize().unwrap();

    let engine = base.join("manga-image-translator");
    fs::create_dir_all(engine.join("manga_translator")).unwrap();
    fs::create_dir_all(engine.join("fonts")).unwrap();
    fs::write(engine.join("fonts").join("anime_ace_3.ttf"), b"").unwrap();

    let python = base.join("fake-python");
    fs::write(&python, FAKE_PYTHON).unwrap();
    fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();

    let input = base.join("manga").join("ch1");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("001.png"), b"").unwrap();
    fs::write(input.join("002.png"), b"").unwrap();

    let settings = base.join("settings").join("settings.json");
    let store = JsonSettingsStore::with_path(&settings);
    let mut config = AppConfig::default();
    config.engine.python_exe = python.display().to_string();
    store.save(&config).unwrap();

    Fixture {
        _root: root,
        base,
        engine,
        input,
        settings,
    }
}

fn session(fx: &Fixture) -> Session {
    Session::new(Box::new(JsonSettingsStore::with_path(&fx.settings)), &fx.base)
}

#[test]
fn session_discovers_engine_and_saves() {
    let fx = fixture();
    let session = session(&fx);

    assert_eq!(
        session.config().engine.engine_dir,
        fx.engine.display().to_string()
    );
    assert!(session.config().engine.font_path.ends_with("anime_ace_3.ttf"));

    let saved = JsonSettingsStore::with_path(&fx.settings).load();
    assert_eq!(saved, *session.config());
    assert_eq!(session.base_dir(), fx.base.as_path());
}

#[tokio::test]
async fn translate_runs_engine_end_to_end() {
    let fx = fixture();
    let mut session = session(&fx);
    assert_eq!(session.progress(&fx.input).unwrap().to_string(), "0/2");

    let outcome = session.translate(&fx.input).await.unwrap().wait().await;
    assert_eq!(outcome.exit_code, 0);

    let output = fx.base.join("output").join("ch1");
    assert_eq!(outcome.lines[0], format!("cwd: {}", fx.engine.display()));
    let args = &outcome.lines[1];
    assert!(args.starts_with("args: -m manga_translator -v --kernel-size 7 --font-path "));
    assert!(args.contains(&format!(
        "local -i {} -o {} --overwrite",
        fx.input.display(),
        output.display()
    )));
    assert_eq!(outcome.lines[2], "warning on stderr");

    assert!(output.is_dir());
    assert_eq!(session.progress(&fx.input).unwrap().to_string(), "1/2");

    let saved = JsonSettingsStore::with_path(&fx.settings).load();
    assert_eq!(saved.last_open_dir, fx.input.display().to_string());
}

#[tokio::test]
async fn translate_while_running_is_busy() {
    let fx = fixture();
    let mut session = session(&fx);

    let slow = fx.base.join("slow-python");
    fs::write(&slow, "#!/bin/sh\nsleep 0.5\necho slow done\n").unwrap();
    fs::set_permissions(&slow, fs::Permissions::from_mode(0o755)).unwrap();
    session
        .update_config(|c| c.engine.python_exe = slow.display().to_string())
        .unwrap();

    let first = session.translate(&fx.input).await.unwrap();
    let second = session.translate(&fx.input).await;
    assert!(matches!(second, Err(RunError::Busy)));

    let outcome = first.wait().await;
    assert_eq!(outcome.lines, ["slow done"]);
    assert_eq!(outcome.exit_code, 0);
    assert!(!session.runner().is_busy());
}

#[tokio::test]
async fn deleted_engine_dir_is_a_config_error() {
    let fx = fixture();
    let mut session = session(&fx);
    fs::remove_dir_all(&fx.engine).unwrap();

    let err = session.translate(&fx.input).await.err().unwrap();
    assert!(matches!(
        err,
        RunError::Config(ConfigError::EngineDirMissing(_))
    ));
    assert!(!session.runner().is_busy());
}

#[test]
fn corrupt_settings_fall_back_to_defaults() {
    let fx = fixture();
    fs::write(&fx.settings, "not json at all").unwrap();

    let session = session(&fx);
    // Defaults, then autofill from the base dir.
    assert_eq!(session.config().engine.python_exe, "python");
    assert_eq!(
        session.config().engine.engine_dir,
        fx.engine.display().to_string()
    );
}

#[test]
fn preview_matches_output_location() {
    let fx = fixture();
    let session = session(&fx);
    let cmd = session.preview_command(Path::new(&fx.input));
    let at = cmd.iter().position(|a| a == "-o").unwrap();
    assert_eq!(
        cmd[at + 1],
        fx.base.join("output").join("ch1").display().to_string()
    );
}
