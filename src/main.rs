use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rosc::OscType;
use tracing_subscriber::EnvFilter;

use xair_osc::address;
use xair_osc::constants::{DEFAULT_BROADCAST_ADDRESS, MIXER_PORT};
use xair_osc::params::presets;
use xair_osc::{DiscoveryOptions, MixerDiscoverer, OscClient, Parameter, UnitValue};

#[derive(Parser)]
#[clap(name = "xair", about = "Talk OSC to X-Air mixers")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find mixers on the local network
    Discover {
        #[clap(short, long, default_value_t = 5000)]
        timeout_ms: u64,
        #[clap(short, long, default_value_t = DEFAULT_BROADCAST_ADDRESS)]
        broadcast: IpAddr,
        #[clap(long, default_value_t = MIXER_PORT)]
        port: u16,
        /// Print the devices as JSON
        #[clap(long)]
        json: bool,
    },
    /// Query an address and print the reply
    Get {
        host: IpAddr,
        address: String,
        #[clap(long, default_value_t = MIXER_PORT)]
        port: u16,
        #[clap(short, long, default_value_t = 2000)]
        timeout_ms: u64,
    },
    /// Send one value to an address
    Set {
        host: IpAddr,
        address: String,
        #[clap(long, default_value_t = MIXER_PORT)]
        port: u16,
        #[clap(long)]
        int: Option<i32>,
        #[clap(long)]
        float: Option<f32>,
        #[clap(long)]
        string: Option<String>,
    },
    /// Read or move a channel fader in decibels
    Fader {
        host: IpAddr,
        channel: u8,
        /// Level to set; reads the current level when omitted
        #[clap(long, allow_hyphen_values = true)]
        db: Option<f64>,
        #[clap(long, default_value_t = MIXER_PORT)]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Discover {
            timeout_ms,
            broadcast,
            port,
            json,
        } => {
            let options = DiscoveryOptions {
                timeout: Duration::from_millis(timeout_ms),
                broadcast_address: broadcast,
                port,
            };
            let devices = MixerDiscoverer::new()?.discover(options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else if devices.is_empty() {
                println!("No mixers found");
            } else {
                for device in devices {
                    println!(
                        "{:<6} {:<24} {}",
                        device.model,
                        device.name,
                        device.socket_addr()
                    );
                }
            }
        }
        Command::Get {
            host,
            address,
            port,
            timeout_ms,
        } => {
            let client = OscClient::connect(SocketAddr::new(host, port))?
                .with_query_timeout(Duration::from_millis(timeout_ms));
            let reply = client.query(&address)?;
            println!("{} {:?}", reply.addr, reply.args);
            client.close()?;
        }
        Command::Set {
            host,
            address,
            port,
            int,
            float,
            string,
        } => {
            let arg = match (int, float, string) {
                (Some(i), _, _) => OscType::Int(i),
                (_, Some(f), _) => OscType::Float(f),
                (_, _, Some(s)) => OscType::String(s),
                _ => return Err("one of --int, --float or --string is required".into()),
            };
            let client = OscClient::connect(SocketAddr::new(host, port))?;
            client.set(&address, vec![arg])?;
            client.close()?;
        }
        Command::Fader {
            host,
            channel,
            db,
            port,
        } => {
            let client = Arc::new(
                OscClient::connect(SocketAddr::new(host, port))?
                    .with_query_timeout(Duration::from_secs(2)),
            );
            let fader = Parameter::new(
                client.clone(),
                address::channel(channel, "mix/fader")?,
                presets::fader(),
            );
            match db {
                Some(db) => fader.update_unit(presets::DECIBELS, db)?,
                None => match fader.fetch_unit(presets::DECIBELS)? {
                    UnitValue::Number(db) => println!("{}: {db:.1} dB", fader.address()),
                    other => println!("{}: {other}", fader.address()),
                },
            }
            client.close()?;
        }
    }
    Ok(())
}
