//! Clap derive structures for the `windoh` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "windoh",
    version,
    about = "Configure static IP and DNS-over-HTTPS on Windows",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Default, Args)]
pub struct GlobalOpts {
    /// Load configuration from FILE instead of ./windoh.jsonc
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Network interface name (e.g. "Ethernet", "Wi-Fi")
    #[arg(long, short = 'i', global = true, value_name = "NAME")]
    pub interface: Option<String>,

    /// Only configure DNS, skip the static IP stages
    #[arg(long, global = true)]
    pub dns_only: bool,

    /// IPv4 address (e.g. 192.168.1.100)
    #[arg(long, global = true, value_name = "ADDR")]
    pub ipv4: Option<String>,

    /// IPv4 subnet mask (e.g. 255.255.255.0)
    #[arg(long, global = true, value_name = "MASK")]
    pub ipv4_mask: Option<String>,

    /// IPv4 default gateway
    #[arg(long, global = true, value_name = "GW")]
    pub ipv4_gateway: Option<String>,

    /// IPv6 address
    #[arg(long, global = true, value_name = "ADDR")]
    pub ipv6: Option<String>,

    /// IPv6 prefix length (e.g. 64)
    #[arg(long, global = true, value_name = "LEN")]
    pub ipv6_prefix: Option<String>,

    /// IPv6 gateway (link-local address)
    #[arg(long, global = true, value_name = "GW")]
    pub ipv6_gateway: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure DNS with Cloudflare (1.1.1.1) + DoH
    Cloudflare,
    /// Configure DNS with Google (8.8.8.8) + DoH
    Google,
    /// Configure DNS with custom servers from the config file
    Custom,
    /// Show current DNS encryption status
    Status,
    /// List available network interfaces
    Interfaces,
}
