use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "plotpipe", about = "Forward commands from stdin to a gnuplot session", version)]
pub struct Cli {
    /// Engine executable (overrides ENGINE_PATH).
    #[arg(long)]
    pub engine: Option<String>,

    /// Output terminal type, e.g. png or qt (overrides TERMINAL).
    #[arg(long)]
    pub terminal: Option<String>,

    /// Canvas size as WIDTHxHEIGHT (overrides CANVAS_SIZE).
    #[arg(long, value_name = "WxH")]
    pub size: Option<String>,

    /// Append to the history file instead of truncating it.
    #[arg(long = "append-history")]
    pub append_history: bool,

    /// Print the resolved configuration as JSON and exit.
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Log every command sent (same as PLOTPIPE_LOG=debug).
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
