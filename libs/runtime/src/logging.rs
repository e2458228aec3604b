use crate::config::{LoggingConfig, Section};
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

// -------- level helpers --------

/// Unknown strings fall back to INFO; "off"/"none" disable output.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

// -------- rotating file writer --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

/// Resolve a log file path against `base_dir` (home_dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating_writer(section: &Section, log_path: &Path) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let rot = FileRotate::new(
        log_path,
        AppendCount::new(section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

// -------- layer plan --------

/// Logging sections split into the catch-all and the named subsystems.
struct LogPlan<'a> {
    default_section: Option<&'a Section>,
    subsystems: Vec<(&'a str, &'a Section)>,
}

impl<'a> LogPlan<'a> {
    fn from_config(cfg: &'a LoggingConfig) -> Self {
        let mut subsystems: Vec<(&str, &Section)> = cfg
            .iter()
            .filter(|(k, _)| k.as_str() != DEFAULT_SECTION)
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        subsystems.sort_by(|a, b| a.0.cmp(b.0));

        Self {
            default_section: cfg.get(DEFAULT_SECTION),
            subsystems,
        }
    }

    fn subsystem_names(&self) -> Vec<String> {
        self.subsystems.iter().map(|(n, _)| n.to_string()).collect()
    }

    /// Console filter: named subsystems at their own level, everything else
    /// at the default section's level (OFF when there is no default section).
    fn console_targets(&self) -> Targets {
        let default_level = self
            .default_section
            .map(|s| parse_level(&s.console_level))
            .unwrap_or(LevelFilter::OFF);

        self.subsystems
            .iter()
            .fold(Targets::new().with_default(default_level), |t, (name, s)| {
                t.with_target(name.to_string(), parse_level(&s.console_level))
            })
    }

    fn layers(&self, base_dir: &Path) -> Vec<BoxedLayer> {
        let ansi = std::io::stdout().is_terminal();
        let mut layers: Vec<BoxedLayer> = Vec::new();

        layers.push(
            fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(self.console_targets())
                .boxed(),
        );

        for (name, section) in &self.subsystems {
            let Some(writer) = file_writer_for(name, section, base_dir) else {
                continue;
            };
            let level = parse_level(&section.file_level);
            let prefix = name.to_string();
            let filter = FilterFn::new(move |meta: &tracing::Metadata<'_>| {
                matches_prefix(meta.target(), &prefix) && *meta.level() <= level
            });
            layers.push(json_file_layer(writer).with_filter(filter).boxed());
        }

        if let Some(section) = self.default_section {
            if let Some(writer) = file_writer_for(DEFAULT_SECTION, section, base_dir) {
                let level = parse_level(&section.file_level);
                let claimed = self.subsystem_names();
                let filter = FilterFn::new(move |meta: &tracing::Metadata<'_>| {
                    let target = meta.target();
                    !claimed.iter().any(|c| matches_prefix(target, c)) && *meta.level() <= level
                });
                layers.push(json_file_layer(writer).with_filter(filter).boxed());
            }
        }

        layers
    }
}

fn json_file_layer<S>(writer: RotWriter) -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_current_span(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(writer)
}

fn file_writer_for(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let log_path = resolve_log_path(&section.file, base_dir);
    match open_rotating_writer(section, &log_path) {
        Ok(w) => Some(w),
        Err(e) => {
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: logging sections, "default" being the catch-all
/// - `base_dir`: directory that relative log file paths are resolved against (server.home_dir)
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let layers = LogPlan::from_config(cfg).layers(base_dir);
    let _ = Registry::default().with(layers).try_init();
}

fn init_default_logging() {
    let _ = fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

// =================== tests ===================
