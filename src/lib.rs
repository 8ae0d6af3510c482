//! Drive a long-lived gnuplot process through its command pipe.
//!
//! A [`Session`] owns the engine process, a history log of every command sent,
//! and the data files staged for plotting. Commands are fire-and-forget: the
//! engine never acknowledges them, so each send is followed by a short settle
//! delay.
//!
//! ```no_run
//! use plotpipe::{Config, Matrix, Session};
//!
//! # async fn demo() -> plotpipe::Result<()> {
//! let settings = Config::load().settings()?;
//! let mut gp = Session::launch(settings.session, settings.plot).await?;
//! let data = Matrix::default().with_column([1, 2, 3]).with_column([1, 4, 9]);
//! gp.write_file("squares.dat", &data).await?;
//! gp.plot("'squares.dat' using 1:2 with lines").await?;
//! gp.teardown();
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod data;
pub mod error;
pub mod history;
pub mod process;
pub mod session;

pub use channel::{CommandChannel, SettleDelay};
pub use config::{Config, PlotSettings, SessionOptions, Settings};
pub use data::{Matrix, Value};
pub use error::{Error, Result};
pub use history::{HistoryLog, HistoryMode};
pub use process::EngineCommand;
pub use session::{Session, SessionState};
