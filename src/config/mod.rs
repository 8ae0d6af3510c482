use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;
use serde::Serialize;
use tracing::debug;

use crate::{
    channel::SettleDelay,
    error::{Error, Result},
    history::HistoryMode,
    process::EngineCommand,
};

pub mod apply;

pub const ISO_8601: &str = "%Y-%m-%dT%H:%M:%S";

const KEYS: &[&str] = &[
    "DATAFILE_SEPARATOR",
    "TERMINAL",
    "CANVAS_SIZE",
    "SAMPLES",
    "ISOSAMPLES",
    "TIME_FORMAT",
    "KEY_POSITION",
    "ENGINE_PATH",
    "HISTORY_PATH",
    "HISTORY_MODE",
    "SETTLE_DELAY_MS",
    "SETTLE_DELAY_PER_KB_MS",
    "QUERY_WINDOW_MS",
];

/// Engine settings applied once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotSettings {
    pub separator: String,
    pub terminal: String,
    pub canvas: (u32, u32),
    pub samples: u32,
    pub isosamples: u32,
    pub time_format: String,
    pub key: String,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            separator: " ".into(),
            terminal: "wxt".into(),
            canvas: (800, 480),
            samples: 128,
            isosamples: 128,
            time_format: ISO_8601.into(),
            key: "top left".into(),
        }
    }
}

impl PlotSettings {
    pub fn validate(&self) -> Result<()> {
        check_separator(&self.separator)
    }
}

/// The separator is sent inside double quotes, so it must be non-empty and
/// free of quotes and line breaks.
pub fn check_separator(separator: &str) -> Result<()> {
    let reason = if separator.is_empty() {
        "separator must not be empty"
    } else if separator.contains('"') {
        "separator must not contain a double quote"
    } else if separator.contains(['\n', '\r']) {
        "separator must not contain a line break"
    } else {
        return Ok(());
    };
    Err(invalid("DATAFILE_SEPARATOR", separator, reason))
}

/// How the session launches and talks to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOptions {
    pub engine: String,
    pub history_path: Option<PathBuf>,
    pub history_mode: HistoryMode,
    pub settle_delay: SettleDelay,
    pub query_window: Duration,
}

impl SessionOptions {
    pub fn engine_command(&self) -> EngineCommand {
        EngineCommand::new(self.engine.clone())
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            engine: "gnuplot".into(),
            history_path: Some(default_history_path()),
            history_mode: HistoryMode::Truncate,
            settle_delay: SettleDelay::default(),
            query_window: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub plot: PlotSettings,
    pub session: SessionOptions,
}

/// Raw key/value options from the rc file, overlaid with `PLOTPIPE_*` env vars.
#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let config_path = default_config_path();
        let mut map = HashMap::new();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(|l| l.ok()) {
                    if let Some((k, v)) = parse_line(&line) {
                        map.insert(k, v);
                    }
                }
            }
        }

        // Environment takes precedence over the rc file
        for (k, v) in env::vars() {
            if let Some(key) = k.strip_prefix("PLOTPIPE_") {
                if KEYS.contains(&key) {
                    map.insert(key.to_string(), v);
                }
            }
        }

        Self { inner: map, config_path }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inner: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            config_path: default_config_path(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    /// Resolve every recognised key, falling back to defaults. Values that are
    /// present but malformed are rejected here, once.
    pub fn settings(&self) -> Result<Settings> {
        for key in self.inner.keys().filter(|k| !KEYS.contains(&k.as_str())) {
            debug!("ignoring unrecognised option {}", key);
        }

        let plot_defaults = PlotSettings::default();
        let session_defaults = SessionOptions::default();

        let plot = PlotSettings {
            separator: self.string("DATAFILE_SEPARATOR", plot_defaults.separator),
            terminal: self.string("TERMINAL", plot_defaults.terminal),
            canvas: match self.get("CANVAS_SIZE") {
                Some(v) => parse_canvas(v).ok_or_else(|| invalid("CANVAS_SIZE", v, "expected W,H"))?,
                None => plot_defaults.canvas,
            },
            samples: self.number("SAMPLES", plot_defaults.samples)?,
            isosamples: self.number("ISOSAMPLES", plot_defaults.isosamples)?,
            time_format: self.string("TIME_FORMAT", plot_defaults.time_format),
            key: self.string("KEY_POSITION", plot_defaults.key),
        };

        let history_mode = match self.get("HISTORY_MODE") {
            None => session_defaults.history_mode,
            Some(v) if v.eq_ignore_ascii_case("append") => HistoryMode::Append,
            Some(v) if v.eq_ignore_ascii_case("truncate") => HistoryMode::Truncate,
            Some(v) => return Err(invalid("HISTORY_MODE", v, "expected append or truncate")),
        };

        let base = self.number("SETTLE_DELAY_MS", session_defaults.settle_delay.base.as_millis() as u64)?;
        let per_kb = self.number("SETTLE_DELAY_PER_KB_MS", 0u64)?;
        let window = self.number("QUERY_WINDOW_MS", session_defaults.query_window.as_millis() as u64)?;

        let session = SessionOptions {
            engine: self.string("ENGINE_PATH", session_defaults.engine),
            history_path: match self.get("HISTORY_PATH") {
                Some("") => None,
                Some(p) => Some(PathBuf::from(p)),
                None => session_defaults.history_path,
            },
            history_mode,
            settle_delay: SettleDelay {
                base: Duration::from_millis(base),
                per_kb: Duration::from_millis(per_kb),
            },
            query_window: Duration::from_millis(window),
        };

        plot.validate()?;
        Ok(Settings { plot, session })
    }

    fn string(&self, key: &str, default: String) -> String {
        self.get(key).map(str::to_string).unwrap_or(default)
    }

    fn number<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            Some(v) => v
                .trim()
                .parse::<T>()
                .map_err(|_| invalid(key, v, "expected a non-negative integer")),
            None => Ok(default),
        }
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (k, v) = line.split_once('=')?;
    // Quote values that need surrounding whitespace, e.g. a space separator
    Some((k.trim().to_string(), unquote(v.trim()).to_string()))
}

fn unquote(v: &str) -> &str {
    v.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(v)
}

fn parse_canvas(v: &str) -> Option<(u32, u32)> {
    let (w, h) = v.split_once([',', 'x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn invalid(key: &str, value: &str, reason: &str) -> Error {
    Error::Config {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("plotpipe").join("plotpiperc")
}

pub fn default_history_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.cache_dir().to_path_buf())
        .unwrap_or_else(env::temp_dir);
    base.join("plotpipe.hist")
}
