//! Terminal output: prefixed log lines, a transform progress line and the
//! serve status line.
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "{} modules", count);
//! debug!("transform"; "`{}` unmatched, copied", id);
//!
//! let progress = ProgressLine::new(&[("modules", 42)]);
//! progress.inc("modules");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Set by `--verbose`.
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Lines held by an active progress display; log lines are printed above it.
static BAR_LINES: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// macros
// ============================================================================

/// Log a message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Run a block only with `--verbose`.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

// ============================================================================
// log lines
// ============================================================================

/// Print `[module] message`, above the progress line if one is showing.
#[allow(clippy::cast_possible_truncation)]
pub fn log(module: &str, message: &str) {
    let mut stdout = stdout().lock();

    let bar_lines = BAR_LINES.load(Ordering::SeqCst);
    if bar_lines > 0 {
        execute!(stdout, cursor::MoveUp(bar_lines as u16)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(stdout, "{} {message}", prefix(module)).ok();
    for _ in 0..bar_lines {
        writeln!(stdout).ok();
    }
    stdout.flush().ok();
}

fn prefix(module: &str) -> String {
    let text = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => text.bright_blue().bold().to_string(),
        "watch" => text.bright_green().bold().to_string(),
        "error" => text.bright_red().bold().to_string(),
        "warning" => text.yellow().bold().to_string(),
        "commit" => text.bright_cyan().bold().to_string(),
        _ => text.bright_magenta().bold().to_string(),
    }
}

// ============================================================================
// watch status
// ============================================================================

/// `HH:MM:SS` of the current UTC time.
fn clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

/// Status block for rebuilds in serve mode.
///
/// Each message replaces the previous one, so the terminal shows the
/// outcome of the latest rebuild only.
pub struct WatchStatus {
    /// Lines printed by the previous message.
    last_lines: usize,
}

static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    pub fn success(&mut self, message: &str) {
        self.replace(&format!("{} {message}", "✓".green()));
    }

    /// `summary`, then `detail` on the following lines.
    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            format!("{} {summary}", "✗".red())
        } else {
            format!("{} {summary}\n{detail}", "✗".red())
        };
        self.replace(&message);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn replace(&mut self, message: &str) {
        let mut stdout = stdout().lock();
        if self.last_lines > 0 {
            execute!(stdout, cursor::MoveUp(self.last_lines as u16)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }
        writeln!(stdout, "{} {message}", format!("[{}]", clock()).dimmed()).ok();
        stdout.flush().ok();
        self.last_lines = line_count(message);
    }
}

fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

// ============================================================================
// progress line
// ============================================================================

/// In-place counters: `[build] modules(42/69)`.
///
/// Workers call `inc` concurrently; a refresh is skipped when another
/// thread is already drawing.
pub struct ProgressLine {
    counters: Vec<Counter>,
    drawing: Mutex<()>,
}

struct Counter {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl ProgressLine {
    /// Counters with a zero total are left out.
    pub fn new(items: &[(&'static str, usize)]) -> Self {
        let counters = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| Counter {
                name,
                total,
                current: AtomicUsize::new(0),
            })
            .collect();

        BAR_LINES.store(1, Ordering::SeqCst);
        let progress = Self {
            counters,
            drawing: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    pub fn inc(&self, name: &str) {
        let Some(counter) = self.counters.iter().find(|c| c.name == name) else {
            return;
        };
        counter.current.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.drawing.try_lock() {
            self.draw(false);
        }
    }

    fn render(&self) -> String {
        self.counters
            .iter()
            .map(|c| format!("{}({}/{})", c.name, c.current.load(Ordering::Relaxed), c.total))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn draw(&self, keep: bool) {
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        let line = format!("{} {}", prefix("build"), self.render());
        if keep {
            writeln!(stdout, "{line}").ok();
        } else {
            write!(stdout, "{line}").ok();
        }
        stdout.flush().ok();
    }

    /// Draw the final counts and leave the line in place.
    pub fn finish(self) {
        BAR_LINES.store(0, Ordering::SeqCst);
        {
            let _guard = self.drawing.lock();
            self.draw(true);
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_LINES.store(0, Ordering::SeqCst);
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}
