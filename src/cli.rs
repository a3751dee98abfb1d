use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use commentions::{Keying, ServeConfig, serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "commentions", about = "Serve the comment-connections puzzle", version)]
pub struct Cli {
    /// Address to bind the HTTP listener on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Article feed snapshot: a JSON document with an `articles` array.
    #[arg(long, default_value = "feed.json")]
    feed: PathBuf,

    /// Directory of discussion-page snapshots named by link digest.
    #[arg(long, default_value = "pages")]
    pages: PathBuf,

    /// How session keys are minted.
    #[arg(long, value_enum, default_value = "daily")]
    keying: KeyingArg,

    /// Expose the answer key at GET /get-solution.
    #[arg(long)]
    expose_solution: bool,

    /// Overall budget, in seconds, for one puzzle generation run.
    #[arg(long)]
    generate_deadline_secs: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KeyingArg {
    /// One shared puzzle per UTC calendar day.
    Daily,
    /// A fresh puzzle per start-game call.
    Token,
}

impl From<KeyingArg> for Keying {
    fn from(value: KeyingArg) -> Self {
        match value {
            KeyingArg::Daily => Keying::Daily,
            KeyingArg::Token => Keying::Token,
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServeConfig {
        addr: cli.addr,
        feed_path: cli.feed,
        pages_dir: cli.pages,
        keying: cli.keying.into(),
        expose_solution: cli.expose_solution,
        generate_deadline: cli.generate_deadline_secs.map(Duration::from_secs),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config))?;
    Ok(())
}
