use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8181";
pub const DEFAULT_PLAYER_ADDR: &str = "127.0.0.1:8181";

/// Command line of the game server.
#[derive(Parser, Debug, Clone)]
#[command(name = "chess-duel-server", version, about = "Hosts a two-player chess game over WebSocket")]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_SERVER_ADDR)]
    pub addr: SocketAddr,

    /// Drop a client that sends no complete frame for this long
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout_secs: u64,

    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub ping_interval_secs: u64,

    /// Messages a client may send per rate window
    #[arg(long, default_value_t = 9)]
    pub rate_limit: usize,

    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window_ms: u64,

    /// Frames queued per client before it is dropped
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub outbox_capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub read_timeout: Duration,
    pub ping_interval: Duration,
    pub rate_limit: usize,
    pub rate_window: Duration,
    pub outbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8181)),
            read_timeout: Duration::from_secs(120),
            ping_interval: Duration::from_secs(10),
            rate_limit: 9,
            rate_window: Duration::from_secs(1),
            outbox_capacity: 5,
        }
    }
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            addr: args.addr,
            read_timeout: Duration::from_secs(args.read_timeout_secs),
            ping_interval: Duration::from_secs(args.ping_interval_secs),
            rate_limit: args.rate_limit,
            rate_window: Duration::from_millis(args.rate_window_ms),
            outbox_capacity: args.outbox_capacity as usize,
        }
    }
}

/// Command line of the automated player.
#[derive(Parser, Debug, Clone)]
#[command(name = "chess-duel-ai", version, about = "Joins a chess-duel server and plays itself")]
pub struct PlayerArgs {
    /// Server to connect to, as host:port
    #[arg(long, default_value = DEFAULT_PLAYER_ADDR)]
    pub addr: String,

    /// Plies the search looks ahead
    #[arg(long, default_value_t = 2)]
    pub depth: u32,

    /// Pause before answering a move
    #[arg(long, default_value_t = 75)]
    pub think_delay_ms: u64,

    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout_secs: u64,

    /// Fixes the tie-breaking of the search
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub addr: String,
    pub depth: u32,
    pub think_delay: Duration,
    pub read_timeout: Duration,
    pub rejoin_interval: Duration,
    pub outbox_capacity: usize,
    pub seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_PLAYER_ADDR.to_string(),
            depth: crate::search::DEFAULT_DEPTH,
            think_delay: Duration::from_millis(75),
            read_timeout: Duration::from_secs(120),
            rejoin_interval: Duration::from_secs(1),
            outbox_capacity: 180,
            seed: None,
        }
    }
}

impl From<PlayerArgs> for PlayerConfig {
    fn from(args: PlayerArgs) -> Self {
        Self {
            addr: args.addr,
            depth: args.depth,
            think_delay: Duration::from_millis(args.think_delay_ms),
            read_timeout: Duration::from_secs(args.read_timeout_secs),
            seed: args.seed,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults_match_config_default() {
        let args = ServerArgs::parse_from(["chess-duel-server"]);
        assert_eq!(ServerConfig::from(args), ServerConfig::default());
    }

    #[test]
    fn test_server_overrides() {
        let args = ServerArgs::parse_from([
            "chess-duel-server",
            "--addr",
            "127.0.0.1:9000",
            "--rate-limit",
            "3",
            "--rate-window-ms",
            "250",
        ]);
        let config = ServerConfig::from(args);
        assert_eq!(config.addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.rate_limit, 3);
        assert_eq!(config.rate_window, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        assert!(ServerArgs::try_parse_from(["chess-duel-server", "--ping-interval-secs", "0"]).is_err());
        assert!(ServerArgs::try_parse_from(["chess-duel-server", "--outbox-capacity", "0"]).is_err());
        assert!(ServerArgs::try_parse_from(["chess-duel-server", "--read-timeout-secs", "0"]).is_err());
        assert!(PlayerArgs::try_parse_from(["chess-duel-ai", "--read-timeout-secs", "0"]).is_err());
        assert!(PlayerArgs::try_parse_from(["chess-duel-ai", "--read-timeout-secs", "1"]).is_ok());
    }

    #[test]
    fn test_player_defaults_match_config_default() {
        let args = PlayerArgs::parse_from(["chess-duel-ai"]);
        assert_eq!(PlayerConfig::from(args), PlayerConfig::default());

        let args = PlayerArgs::parse_from(["chess-duel-ai", "--depth", "0", "--seed", "7"]);
        let config = PlayerConfig::from(args);
        assert_eq!(config.depth, 0);
        assert_eq!(config.seed, Some(7));
    }
}
