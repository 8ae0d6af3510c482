//! Engine session: process lifecycle, command access and cleanup.
//!
//! A session moves `Uninitialized -> Running -> Closed` exactly once. Commands
//! before `start` fail with [`Error::NotStarted`]; after `teardown` they are
//! accepted and ignored.

use std::{
    io,
    path::Path,
    process::ExitStatus,
    time::Duration,
};

use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::{
    channel::CommandChannel,
    config::{apply, check_separator, PlotSettings, SessionOptions},
    data::{stager, Matrix},
    error::{Error, Result},
    history::HistoryLog,
    process::{self, EngineCommand},
};

pub mod temp_files;

use temp_files::TempFiles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Running,
    Closed,
}

pub struct Session {
    engine: EngineCommand,
    options: SessionOptions,
    plot: PlotSettings,
    state: SessionState,
    child: Option<Child>,
    channel: Option<CommandChannel>,
    files: TempFiles,
    history_error: Option<io::Error>,
}

impl Session {
    pub fn new(engine: EngineCommand, options: SessionOptions) -> Self {
        Self {
            engine,
            options,
            plot: PlotSettings::default(),
            state: SessionState::Uninitialized,
            child: None,
            channel: None,
            files: TempFiles::default(),
            history_error: None,
        }
    }

    /// Start the engine named in `options` and apply `plot` settings.
    pub async fn launch(options: SessionOptions, plot: PlotSettings) -> Result<Self> {
        let mut session = Self::new(options.engine_command(), options);
        session.start()?;
        session.apply_settings(plot).await?;
        Ok(session)
    }

    /// Spawn the engine and open the history log. Spawn failure is returned
    /// as-is and leaves the session uninitialized; history failure only
    /// degrades logging (see [`Session::history_degraded`]).
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }
        let handle = process::spawn(&self.engine)?;

        let history = match &self.options.history_path {
            Some(path) => {
                let (log, err) = HistoryLog::open(path, self.options.history_mode);
                if let Some(e) = &err {
                    warn!("history disabled, cannot open {}: {}", path.display(), e);
                }
                self.history_error = err;
                log
            }
            None => HistoryLog::disabled(),
        };

        self.child = Some(handle.child);
        self.channel = Some(CommandChannel::new(
            handle.stdin,
            handle.stdout,
            history,
            self.options.settle_delay,
            self.options.query_window,
        ));
        self.state = SessionState::Running;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Why the history log is a no-op, if opening it failed.
    pub fn history_degraded(&self) -> Option<&io::Error> {
        self.history_error.as_ref()
    }

    pub fn history_path(&self) -> Option<&Path> {
        self.channel.as_ref().and_then(|c| c.history().path())
    }

    pub fn plot_settings(&self) -> &PlotSettings {
        &self.plot
    }

    pub fn data_files(&self) -> impl Iterator<Item = &Path> {
        self.files.paths()
    }

    fn channel(&mut self) -> Result<Option<&mut CommandChannel>> {
        live_channel(self.state, &mut self.channel)
    }

    pub async fn send(&mut self, command: &str) -> Result<()> {
        match self.channel()? {
            Some(ch) => ch.send(command).await,
            None => Ok(()),
        }
    }

    pub async fn send_with_delay(&mut self, command: &str, delay: Duration) -> Result<()> {
        match self.channel()? {
            Some(ch) => ch.send_with_delay(command, delay).await,
            None => Ok(()),
        }
    }

    pub async fn query(&mut self, command: &str) -> Result<String> {
        match self.channel()? {
            Some(ch) => ch.query(command).await,
            None => Ok(String::new()),
        }
    }

    pub async fn set(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("set {}", arg)).await
    }

    pub async fn unset(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("unset {}", arg)).await
    }

    pub async fn plot(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("plot {}", arg)).await
    }

    pub async fn splot(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("splot {}", arg)).await
    }

    /// Send the five startup `set` commands for `plot` and remember them as
    /// the session's defaults.
    pub async fn apply_settings(&mut self, plot: PlotSettings) -> Result<()> {
        plot.validate()?;
        if let Some(ch) = self.channel()? {
            apply::apply(ch, &plot).await?;
        }
        self.plot = plot;
        Ok(())
    }

    pub async fn set_datafile_separator(&mut self, separator: Option<&str>) -> Result<()> {
        let sep = separator.unwrap_or(&self.plot.separator).to_string();
        check_separator(&sep)?;
        self.set(&apply::separator_command(&sep)).await
    }

    pub async fn set_term(&mut self, terminal: Option<&str>, canvas: Option<(u32, u32)>) -> Result<()> {
        let term = terminal.unwrap_or(&self.plot.terminal).to_string();
        let size = canvas.unwrap_or(self.plot.canvas);
        self.set(&apply::term_command(&term, size)).await
    }

    pub async fn set_time_format(&mut self, fmt: Option<&str>) -> Result<()> {
        let fmt = fmt.unwrap_or(&self.plot.time_format).to_string();
        self.set(&apply::time_format_command(&fmt)).await
    }

    /// Ask the engine which datafile separator is active.
    pub async fn resolve_separator(&mut self) -> Result<String> {
        match self.channel()? {
            Some(ch) => stager::resolve_separator(ch).await,
            None => Ok(self.plot.separator.clone()),
        }
    }

    /// Stage `matrix` as a data file at `path`, removed again at teardown.
    pub async fn write_file(&mut self, path: impl AsRef<Path>, matrix: &Matrix) -> Result<()> {
        // Borrows only the channel field, leaving `files` free
        let Some(ch) = live_channel(self.state, &mut self.channel)? else {
            return Ok(());
        };
        stager::write_file(ch, &mut self.files, path.as_ref(), matrix).await
    }

    /// Send `rows` as an inline block terminated by `EOD`. Returns `$name`.
    pub async fn write_inline<S: AsRef<str>>(&mut self, name: &str, rows: &[S]) -> Result<String> {
        self.write_inline_with(name, rows, stager::DEFAULT_TERMINATOR)
            .await
    }

    pub async fn write_inline_with<S: AsRef<str>>(
        &mut self,
        name: &str,
        rows: &[S],
        terminator: &str,
    ) -> Result<String> {
        match self.channel()? {
            Some(ch) => stager::write_inline(ch, name, rows, terminator).await,
            None => Ok(format!("${}", name)),
        }
    }

    /// Delete one staged data file before teardown.
    pub fn remove_data_file(&mut self, path: impl AsRef<Path>) -> bool {
        self.files.remove(path.as_ref())
    }

    /// Release everything the session owns: engine stdin and stdout, the
    /// history log, and every staged data file. Each step runs even if an
    /// earlier one fails. Only the first call does anything.
    pub fn teardown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let was_running = self.state == SessionState::Running;
        self.state = SessionState::Closed;

        if let Some(ch) = self.channel.as_mut() {
            ch.close();
        }
        self.files.clear();

        if was_running {
            info!(program = %self.engine.program, "session closed");
        }
    }

    /// Tear down if needed, then wait for the engine to exit on its own.
    pub async fn wait(&mut self) -> Result<Option<ExitStatus>> {
        self.teardown();
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        let status = child.wait().await?;
        debug!(?status, "engine exited");
        self.child = None;
        Ok(Some(status))
    }

    pub fn engine(&self) -> &EngineCommand {
        &self.engine
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

/// `Ok(None)` once closed: callers treat that as "do nothing".
fn live_channel(
    state: SessionState,
    channel: &mut Option<CommandChannel>,
) -> Result<Option<&mut CommandChannel>> {
    match state {
        SessionState::Uninitialized => Err(Error::NotStarted),
        SessionState::Running => Ok(channel.as_mut()),
        SessionState::Closed => Ok(None),
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
