//! Process-wide `tracing` setup for the `fiscal` binary.
//!
//! One registry carries a reloadable global level, a stdout layer behind its
//! own on/off gate, and a file layer whose target can be attached after
//! start-up. The setters below act on that registry once
//! [`init_logging`] has run.

use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use anyhow::Result;
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info";

/// Local-time event format: `2025-03-01 14:02:11.042  INFO payroll.rs:88 message`.
struct LocalTimeFormat;

impl LocalTimeFormat {
    /// Shortens `fiscal-core/src/calculations/payroll.rs` to `calculations/payroll.rs`.
    fn short_path(path: &str) -> &str {
        path.rsplit_once("src/")
            .or_else(|| path.rsplit_once("src\\"))
            .map_or(path, |(_, rest)| rest)
    }

    fn level_style(level: Level) -> &'static str {
        match level {
            Level::ERROR => "\x1b[1;31m",
            Level::WARN => "\x1b[1;33m",
            Level::INFO => "\x1b[1;32m",
            Level::DEBUG => "\x1b[1;34m",
            Level::TRACE => "\x1b[1;35m",
        }
    }
}

impl<S, N> FormatEvent<S, N> for LocalTimeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

        if ansi {
            write!(
                writer,
                "\x1b[2m{timestamp}\x1b[0m {}{:>5}\x1b[0m ",
                Self::level_style(*meta.level()),
                meta.level()
            )?;
        } else {
            write!(writer, "{timestamp} {:>5} ", meta.level())?;
        }

        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            let file = Self::short_path(file);
            if ansi {
                write!(writer, "\x1b[36m{file}:{line}\x1b[0m ")?;
            } else {
                write!(writer, "{file}:{line} ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// A [`MakeWriter`] whose file is attached after initialization.
/// Records are dropped while no file is attached.
#[derive(Clone)]
struct LogFileSlot(Arc<Mutex<Option<File>>>);

impl LogFileSlot {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match &mut *self.0 {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0 {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFileSlot {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.lock())
    }
}

type SetLevelFn = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;
type SetStdoutFn = Box<dyn Fn(bool) -> Result<()> + Send + Sync>;

static APP_NAME: OnceLock<String> = OnceLock::new();
static SET_LOG_LEVEL: OnceLock<SetLevelFn> = OnceLock::new();
static SET_STDOUT_ENABLED: OnceLock<SetStdoutFn> = OnceLock::new();
static LOG_FILE: OnceLock<LogFileSlot> = OnceLock::new();

fn store_level_handle<S>(handle: reload::Handle<EnvFilter, S>)
where
    S: Subscriber + Send + Sync + 'static,
{
    let _ = SET_LOG_LEVEL.set(Box::new(move |directive: &str| {
        let filter = EnvFilter::try_new(directive)
            .map_err(|e| anyhow::anyhow!("invalid log level '{directive}': {e}"))?;
        handle
            .reload(filter)
            .map_err(|e| anyhow::anyhow!("log level reload failed: {e}"))
    }));
}

fn store_stdout_handle<S>(handle: reload::Handle<EnvFilter, S>)
where
    S: Subscriber + Send + Sync + 'static,
{
    let _ = SET_STDOUT_ENABLED.set(Box::new(move |enabled: bool| {
        // The global level still caps what "trace" lets through.
        let gate = if enabled { "trace" } else { "off" };
        handle
            .reload(EnvFilter::new(gate))
            .map_err(|e| anyhow::anyhow!("stdout gate reload failed: {e}"))
    }));
}

/// Changes the global log filter. Accepts a bare level (`warn`, `debug`) or
/// any `EnvFilter` directive (`info,fiscal_core=debug`).
pub fn set_log_level(directive: &str) -> Result<()> {
    match SET_LOG_LEVEL.get() {
        Some(set) => set(directive),
        None => anyhow::bail!("logging not yet initialized"),
    }
}

/// Shows or hides stdout output without affecting the log file.
pub fn set_stdout_enabled(enabled: bool) -> Result<()> {
    match SET_STDOUT_ENABLED.get() {
        Some(set) => set(enabled),
        None => anyhow::bail!("logging not yet initialized"),
    }
}

/// Appends log output to `path`, replacing any file already attached.
/// The parent directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open log file '{}': {e}", path.display()))?;

    match LOG_FILE.get() {
        Some(slot) => {
            *slot.lock() = Some(file);
            Ok(())
        }
        None => anyhow::bail!("logging not yet initialized"),
    }
}

/// Executable name, or `fiscal` when it cannot be determined.
pub fn app_name() -> &'static str {
    APP_NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "fiscal".to_string())
    })
}

/// Installs the global subscriber. Call once at start-up; later calls are
/// no-ops.
///
/// - Level: `RUST_LOG` when set, otherwise `info`.
/// - Stdout: colored on a terminal, plain when piped.
/// - File: inactive until [`enable_file_logging`].
pub fn init_logging() {
    let _ = app_name();

    let slot = LogFileSlot(Arc::new(Mutex::new(None)));
    let _ = LOG_FILE.set(slot.clone());

    let (stdout_gate, stdout_handle) = reload::Layer::new(EnvFilter::new("trace"));
    let (level_filter, level_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    );

    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalTimeFormat)
        .with_ansi(io::stdout().is_terminal())
        .with_filter(stdout_gate);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalTimeFormat)
        .with_ansi(false)
        .with_writer(slot);

    if tracing_subscriber::registry()
        .with(level_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        store_level_handle(level_handle);
        store_stdout_handle(stdout_handle);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn short_path_strips_crate_prefix() {
        assert_eq!(
            LocalTimeFormat::short_path("fiscal-core/src/calculations/payroll.rs"),
            "calculations/payroll.rs"
        );
        assert_eq!(LocalTimeFormat::short_path("src/main.rs"), "main.rs");
        assert_eq!(LocalTimeFormat::short_path("build.rs"), "build.rs");
    }

    #[test]
    fn detached_slot_discards_writes() {
        let slot = LogFileSlot(Arc::new(Mutex::new(None)));
        let mut writer = slot.make_writer();

        assert_eq!(writer.write(b"dropped").unwrap(), 7);
        writer.flush().unwrap();
    }

    #[test]
    fn attached_slot_writes_to_file() {
        let path = std::env::temp_dir().join(format!("fiscal-log-{}.log", std::process::id()));
        let file = File::create(&path).unwrap();
        let slot = LogFileSlot(Arc::new(Mutex::new(Some(file))));

        {
            let mut writer = slot.make_writer();
            writer.write_all(b"hello log\n").unwrap();
            writer.flush().unwrap();
        }

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(contents, "hello log\n");
    }
}
