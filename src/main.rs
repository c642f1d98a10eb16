use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use mimic::{Contract, Error, MockStore, Server};

#[derive(Debug, Parser)]
#[command(name = "mimic", version, about = "Contract-driven HTTP mock server")]
struct Options {
    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: u16,

    /// Path to the contract description (JSON)
    #[arg(long, env = "CONTRACT_SPEC")]
    spec: PathBuf,

    /// Let overrides saved without a query constraint answer any query
    #[arg(long, env = "IGNORE_QUERY_HASH")]
    ignore_query_hash: bool,

    /// Log every resolution decision
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let options = Options::parse();

    let default_level = if options.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(error) = run(options).await {
        log::error!("{}", error);
        process::exit(1);
    }
}

async fn run(options: Options) -> Result<(), Error> {
    let contract = Contract::from_file(&options.spec)?;

    let mut store = MockStore::new();
    if options.ignore_query_hash {
        store = store.ignoring_query_hash();
    }

    let address = SocketAddr::from(([0, 0, 0, 0], options.port));
    let server = Server::bind(address, Arc::new(contract), store).await?;

    server.serve().await
}
