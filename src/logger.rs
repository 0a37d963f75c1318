//! Terminal logging for the server.
//!
//! - `log!` always prints, with a colored `[module]` prefix
//! - `debug!` prints only with `--verbose` (per-request and per-push lines)
//! - [`ProgressLine`] shows per-kind counters while the catalog loads
//!
//! ```ignore
//! log!("serve"; "https://{}", addr);
//! debug!("push"; "/{}", route);
//! ```
//!
//! Request handlers log from many threads at once. Each line is written
//! under the stdout lock, so lines never interleave.

use crossterm::{
    cursor, queue,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Set once from `--verbose` before the catalog loads.
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

// ============================================================================
// Macros
// ============================================================================

/// Log a message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log only when `--verbose` is set. Arguments are not formatted otherwise.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Output
// ============================================================================

/// Print one line, over a partially drawn progress row if there is one.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    clear_row(&mut out);
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

fn clear_row(out: &mut impl Write) {
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

/// `[module]`, colored by module.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => tag.bright_blue().bold().to_string(),
        "push" => tag.bright_magenta().bold().to_string(),
        "load" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.yellow().bold().to_string(),
        _ => tag.bright_cyan().bold().to_string(),
    }
}

// ============================================================================
// Progress line
// ============================================================================

/// Counters for a bulk load, redrawn in place: `[load] markup(4/9) scripts(120/412)`.
///
/// `inc` is called from rayon workers; a redraw is skipped when another
/// thread is already drawing.
pub struct ProgressLine {
    counters: Vec<Counter>,
    drawing: Mutex<()>,
}

struct Counter {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
}

impl ProgressLine {
    /// Counters with a zero total are left out.
    pub fn new(totals: &[(&'static str, usize)]) -> Self {
        let counters = totals
            .iter()
            .copied()
            .filter(|&(_, total)| total > 0)
            .map(|(label, total)| Counter {
                label,
                total,
                done: Default::default(),
            })
            .collect();

        let progress = Self {
            counters,
            drawing: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    pub fn inc(&self, label: &str) {
        let Some(counter) = self.counters.iter().find(|c| c.label == label) else {
            return;
        };
        counter.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.drawing.try_lock() {
            self.draw(false);
        }
    }

    fn render(&self) -> String {
        self.counters
            .iter()
            .map(|c| format!("{}({}/{})", c.label, c.done.load(Ordering::Relaxed), c.total))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn draw(&self, newline: bool) {
        let mut out = stdout().lock();
        clear_row(&mut out);
        write!(out, "{} {}", prefix("load"), self.render()).ok();
        if newline {
            writeln!(out).ok();
        }
        out.flush().ok();
    }

    /// Leave the final counts on screen.
    pub fn finish(self) {
        {
            let _guard = self.drawing.lock();
            self.draw(true);
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    /// Load failed midway: erase the partial counts.
    fn drop(&mut self) {
        let mut out = stdout().lock();
        clear_row(&mut out);
        out.flush().ok();
    }
}
