use clap::Parser;
use env_logger::Env;
use log::info;
use server::{GameServer, ServerConfig};
use tokio::net::TcpListener;

/// Authoritative server for a two-team, ten-round shooter
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Port to listen on
    port: u16,
    /// Players required before the first round starts
    #[clap(value_parser = clap::value_parser!(u8).range(1..=6))]
    num_players: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig::new(args.port, args.num_players as usize);

    let listener = TcpListener::bind(config.bind_address()).await?;
    let server = GameServer::new(config);

    tokio::select! {
        result = server.serve(listener) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
