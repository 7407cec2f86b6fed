use clap::Parser;
use client::Client;
use env_logger::Env;
use log::info;

/// Headless player for the team shooter server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address
    ip: String,
    /// Server port
    port: u16,
    /// Player slot to request; 0-2 play for team A, 3-5 for team B
    #[arg(value_parser = clap::value_parser!(u8).range(0..=5))]
    id: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let url = format!("ws://{}:{}/ws", args.ip, args.port);

    let client = Client::connect(&url, args.id).await?;
    let game = client.run().await?;

    info!("Played {} rounds", game.round);
    print!("{}", game.scoreboard());
    Ok(())
}
