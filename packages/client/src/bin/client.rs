//! Interactive Roomlink chat client.
//!
//! Joins one room at a time over WebSocket, reconnects automatically with
//! exponential backoff and keeps unsent messages in an offline queue.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin roomlink-client -- --user alice --room general
//! cargo run --bin roomlink-client -- -u bob -r general --queue-file bob-queue.json
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use roomlink_client::{
    config::{ClientConfig, DEFAULT_SERVER_URL},
    domain::{BackoffPolicy, Credential, FlushPolicy, RoomId, UserId},
    error::ClientError,
    session::Identity,
    ui::run_client,
};
use roomlink_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "roomlink-client")]
#[command(about = "Realtime chat client with reconnect and offline queue", long_about = None)]
struct Args {
    /// Your user id as known to the server
    #[arg(short = 'u', long)]
    user: String,

    /// Room to join on start
    #[arg(short = 'r', long)]
    room: String,

    /// Chat server base URL
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    url: String,

    /// Session cookie sent with every connection attempt
    #[arg(long)]
    cookie: Option<String>,

    /// Persist the offline queue to this file
    #[arg(long)]
    queue_file: Option<PathBuf>,

    /// Discard queued messages for other rooms when flushing
    #[arg(long)]
    drop_stale_queue: bool,

    /// First reconnect delay in milliseconds
    #[arg(long, default_value_t = 1_000)]
    backoff_base_ms: u64,

    /// Upper bound for the reconnect delay in milliseconds
    #[arg(long, default_value_t = 30_000)]
    backoff_max_ms: u64,

    /// Keystroke inactivity before "stopped typing" is sent, in milliseconds
    #[arg(long, default_value_t = 2_000)]
    typing_idle_ms: u64,
}

impl Args {
    fn into_parts(self) -> Result<(ClientConfig, Identity, RoomId), ClientError> {
        let identity = Identity::new(
            UserId::new(self.user)?,
            self.cookie.map(Credential::new).transpose()?,
        );
        let room = RoomId::new(self.room)?;

        let flush_policy = if self.drop_stale_queue {
            FlushPolicy::DropOtherRooms
        } else {
            FlushPolicy::RetainOtherRooms
        };
        let mut config = ClientConfig::default()
            .with_server_url(self.url)
            .with_backoff(BackoffPolicy::new(
                Duration::from_millis(self.backoff_base_ms),
                Duration::from_millis(self.backoff_max_ms),
            ))
            .with_typing_idle(Duration::from_millis(self.typing_idle_ms))
            .with_flush_policy(flush_policy);
        if let Some(path) = self.queue_file {
            config = config.with_queue_path(path);
        }
        Ok((config, identity, room))
    }
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let result = match args.into_parts() {
        Ok((config, identity, room)) => run_client(config, identity, room).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
