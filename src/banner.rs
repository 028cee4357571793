//! Run header and completion summary display.

use std::path::Path;

use crate::consts::{AUTHOR, HOMEPAGE};
use crate::library::Progress;

/// Run configuration for display before the engine starts.
pub struct BannerInfo<'a> {
    pub python: &'a str,
    pub engine_dir: &'a str,
    pub gpu: bool,
    pub input: &'a Path,
    pub output: &'a Path,
    pub pages: Progress,
}

/// Print the header shown before a run.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║       M A N G A   L O C A L I Z E R   ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   python    {}
   engine    {}
   device    {}
   input     {}
   output    {}
   pages     {} translated
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        info.python,
        if info.engine_dir.is_empty() {
            "(not set)"
        } else {
            info.engine_dir
        },
        if info.gpu { "gpu" } else { "cpu" },
        info.input.display(),
        info.output.display(),
        info.pages,
    );
}

/// The line printed once the engine exits.
pub fn completion_line(exit_code: i32) -> String {
    format!("Done. Exit code: {exit_code}")
}

/// Print the summary after a run: exit code and fresh page progress.
pub fn print_run_summary(exit_code: i32, pages: Option<Progress>) {
    println!("\n{}", completion_line(exit_code));
    if let Some(pages) = pages {
        if pages.is_complete() {
            println!("pages: {pages} translated, chapter complete");
        } else {
            println!("pages: {pages} translated");
        }
    }
}
