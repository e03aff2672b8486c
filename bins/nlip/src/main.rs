//! nlip - show and add interface addresses, show routes.

mod commands;

use std::time::Duration;

use clap::{Parser, Subcommand};
use nlroute::netlink::{RequestSession, SessionOptions};

#[derive(Parser)]
#[command(name = "nlip", version, about = "Address and route query tool")]
struct Cli {
    /// Use IPv4 only.
    #[arg(short = '4')]
    ipv4: bool,

    /// Use IPv6 only.
    #[arg(short = '6', conflicts_with = "ipv4")]
    ipv6: bool,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Give up on a kernel reply after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage IP addresses.
    #[command(visible_alias = "a", visible_alias = "addr")]
    Address(commands::address::AddressCmd),

    /// Show the routing table.
    #[command(visible_alias = "r")]
    Route(commands::route::RouteCmd),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let output = commands::Output {
        json: cli.json,
        pretty: cli.pretty,
    };

    let family = match (cli.ipv4, cli.ipv6) {
        (true, false) => Some(libc::AF_INET as u8),
        (false, true) => Some(libc::AF_INET6 as u8),
        _ => None,
    };

    let mut options = SessionOptions::new();
    if let Some(secs) = cli.timeout {
        options = options.recv_timeout(Duration::from_secs(secs));
    }
    let mut session = RequestSession::open_with(options)?;

    let result = match cli.command {
        Command::Address(cmd) => cmd.run(&mut session, output, family),
        Command::Route(cmd) => cmd.run(&mut session, output, family),
    };
    session.close();

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
