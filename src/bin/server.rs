use std::path::PathBuf;

use clap::Parser;
use rudis::{config::Config, server, Error};

#[derive(Parser, Debug)]
struct Args {
    /// The port to listen on (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a `key value` configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }

    server::run(config).await
}
