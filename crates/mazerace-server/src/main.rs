use std::time::Duration;

use clap::Parser;
use mazerace::prelude::*;
use tracing_subscriber::EnvFilter;

/// Real-time multiplayer maze race server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to listen on
    #[clap(short, long, default_value = "0.0.0.0:8080")]
    bind: String,
    /// Base seed for board generation (defaults to the wall clock)
    #[clap(short, long)]
    seed: Option<u64>,
    /// Maze width in cells
    #[clap(long, default_value = "10")]
    board_width: usize,
    /// Maze height in cells
    #[clap(long, default_value = "5")]
    board_height: usize,
    /// Player tokens, one character each; also sets the lobby size
    #[clap(short, long, default_value = "@$")]
    tokens: String,
    /// Milliseconds between stats snapshots
    #[clap(long, default_value = "1000")]
    stats_interval_ms: u64,
}

impl Args {
    fn lobby_config(&self) -> LobbyConfig {
        let defaults = LobbyConfig::default();
        LobbyConfig {
            tokens: self.tokens.chars().map(Token).collect(),
            board_width: self.board_width,
            board_height: self.board_height,
            seed: self.seed.unwrap_or(defaults.seed),
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.lobby_config();
    tracing::info!(
        bind = %args.bind,
        seed = config.seed,
        tokens = %args.tokens,
        "starting mazerace"
    );

    let server = MazeraceServer::builder()
        .bind(&args.bind)
        .lobby_config(config)
        .stats_interval(Duration::from_millis(args.stats_interval_ms))
        .build()
        .await?;

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["mazerace"]);
        assert_eq!(args.bind, "0.0.0.0:8080");
        let config = args.lobby_config();
        assert_eq!(config.tokens, vec![Token('@'), Token('$')]);
        assert_eq!((config.board_width, config.board_height), (10, 5));
        assert_eq!(args.stats_interval_ms, 1000);
    }

    #[test]
    fn test_flags_reach_lobby_config() {
        let args = Args::parse_from([
            "mazerace",
            "--seed",
            "9",
            "--tokens",
            "abc",
            "--board-width",
            "4",
            "--board-height",
            "2",
        ]);
        let config = args.lobby_config();
        assert_eq!(config.seed, 9);
        assert_eq!(config.tokens, vec![Token('a'), Token('b'), Token('c')]);
        assert_eq!((config.board_width, config.board_height), (4, 2));
        assert_eq!(config.window_width, 41);
    }
}
