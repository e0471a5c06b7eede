use std::time::Duration;

use clap::{Parser, Subcommand};

use redcall::{ClientConfig, Commands, Connection, RespValue, SetOptions, Ttl};

#[derive(Parser)]
#[command(name = "redcall")]
#[command(about = "Send typed commands to a Redis-compatible store")]
struct Args {
    /// Server address (defaults to $REDCALL_ADDR, then 127.0.0.1:6379)
    #[arg(short, long)]
    addr: Option<String>,

    /// Connect timeout in milliseconds
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    Ping {
        message: Option<String>,
    },
    Get {
        key: String,
    },
    Set {
        key: String,
        value: String,
        /// Expire after this many milliseconds
        #[arg(long)]
        px: Option<u64>,
        /// Only set if the key does not exist
        #[arg(long, conflicts_with = "xx")]
        nx: bool,
        /// Only set if the key already exists
        #[arg(long)]
        xx: bool,
    },
    Del {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    Incr {
        key: String,
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        by: i64,
    },
    Decr {
        key: String,
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        by: i64,
    },
    Ttl {
        key: String,
    },
    Keys {
        #[arg(default_value = "*")]
        pattern: String,
    },
    /// Iterate the keyspace with SCAN, printing keys page by page
    Scan {
        #[arg(long = "match")]
        pattern: Option<String>,
        #[arg(long)]
        count: Option<usize>,
    },
    Hgetall {
        key: String,
    },
    Publish {
        channel: String,
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(ms) = args.connect_timeout_ms {
        config.connect_timeout = Duration::from_millis(ms);
    }

    let conn = Connection::connect(&config).await?;
    tracing::info!("Connected to {}", conn.peer());

    match args.command {
        Cmd::Ping { message } => println!("{}", conn.ping(message.as_deref()).await?),
        Cmd::Get { key } => match conn.get(key).await? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Cmd::Set {
            key,
            value,
            px,
            nx,
            xx,
        } => {
            let mut options = SetOptions::new();
            if let Some(ms) = px {
                options = options.expire(Duration::from_millis(ms));
            }
            if nx {
                options = options.nx();
            } else if xx {
                options = options.xx();
            }
            match conn.set(key, value, options).await? {
                RespValue::BulkString(None) => println!("(nil)"),
                _ => println!("OK"),
            }
        }
        Cmd::Del { keys } => match conn.del(&keys).await? {
            RespValue::Integer(n) => println!("{}", n),
            other => println!("{:?}", other),
        },
        Cmd::Incr { key, by } => println!("{}", conn.incr_by(key, by).await?),
        Cmd::Decr { key, by } => println!("{}", conn.decr_by(key, by).await?),
        Cmd::Ttl { key } => match conn.ttl(key).await? {
            Ttl::Missing => println!("(no such key)"),
            ttl => match ttl.as_duration() {
                Some(left) => println!("{}s", left.as_secs()),
                None => println!("(no expiry)"),
            },
        },
        Cmd::Keys { pattern } => {
            for key in conn.keys(pattern).await? {
                println!("{}", key);
            }
        }
        Cmd::Scan { pattern, count } => {
            conn.scan_all(pattern.as_deref(), count, |page| {
                for key in page {
                    println!("{}", key);
                }
            })
            .await?;
        }
        Cmd::Hgetall { key } => {
            let mut fields: Vec<_> = conn.hgetall(key).await?.into_iter().collect();
            fields.sort();
            for (field, value) in fields {
                println!("{}: {}", field, value);
            }
        }
        Cmd::Publish { channel, message } => {
            let receivers = conn.publish(channel, message).await?;
            println!("{}", receivers);
        }
    }

    Ok(())
}
