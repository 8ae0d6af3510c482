mod cli;

use std::io::{self, Write};

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use plotpipe::{Config, HistoryMode, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);

    // CLI flags override rc file and environment
    let mut cfg = Config::load();
    if let Some(engine) = &args.engine {
        cfg.set("ENGINE_PATH", engine.as_str());
    }
    if let Some(term) = &args.terminal {
        cfg.set("TERMINAL", term.as_str());
    }
    if let Some(size) = &args.size {
        cfg.set("CANVAS_SIZE", size.as_str());
    }
    let mut settings = cfg
        .settings()
        .with_context(|| format!("invalid configuration (rc file: {})", cfg.config_path.display()))?;
    if args.append_history {
        settings.session.history_mode = HistoryMode::Append;
    }

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let mut session = Session::launch(settings.session, settings.plot).await?;
    if let Some(e) = session.history_degraded() {
        eprintln!("{} history disabled: {}", "warning:".yellow(), e);
    }

    let interactive = io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("{}", "plotpipe> ".cyan());
            io::stdout().flush().ok();
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }
        let result = match line.strip_prefix('?') {
            Some(q) => session.query(q.trim()).await.map(|reply| print!("{}", reply)),
            None => session.send(line).await,
        };
        if let Err(e) = result {
            // A broken pipe means the engine is gone; nothing further can be sent
            warn!("engine command failed: {}", e);
            eprintln!("{} {}", "error:".red(), e);
            break;
        }
    }

    if let Some(status) = session.wait().await? {
        info!(%status, "engine finished");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PLOTPIPE_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
