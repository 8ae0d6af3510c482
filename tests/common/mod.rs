#![allow(dead_code)]

use std::{fs, path::Path, time::Duration};

use plotpipe::{EngineCommand, HistoryMode, Session, SessionOptions, SettleDelay};

pub fn options(dir: &Path) -> SessionOptions {
    SessionOptions {
        engine: "sh".into(),
        history_path: Some(dir.join("cache").join("plot.hist")),
        history_mode: HistoryMode::Truncate,
        settle_delay: SettleDelay::fixed(Duration::from_millis(5)),
        query_window: Duration::from_millis(300),
    }
}

/// A stand-in engine that answers `show datafile separator` with `reply`
/// (printf escapes allowed), prints a quoted word for `print stray`, and
/// silently swallows everything else.
pub fn separator_engine(reply: &str) -> EngineCommand {
    let script = format!(
        r#"while IFS= read -r line; do case "$line" in "show datafile separator") printf '{}\n' ;; "print stray") printf '"oops"\n' ;; esac; done"#,
        reply
    );
    EngineCommand::new("sh").arg("-c").arg(script)
}

pub const PIPE_REPLY: &str = r#"\tdatafile fields separated by "|""#;
pub const WHITESPACE_REPLY: &str = r#"\tdatafile fields separated by whitespace"#;

/// Echoes every command back on stdout.
pub fn echo_engine() -> EngineCommand {
    EngineCommand::new("cat")
}

pub fn started(engine: EngineCommand, dir: &Path) -> Session {
    let mut session = Session::new(engine, options(dir));
    session.start().expect("engine should start");
    session
}

pub fn history(dir: &Path) -> String {
    fs::read_to_string(dir.join("cache").join("plot.hist")).unwrap_or_default()
}
