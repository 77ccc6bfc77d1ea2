//! Configuration file loading and merging with CLI overrides.
//!
//! The file is JSON with comments (`windoh.jsonc` in the working directory
//! unless `-c` names another path). CLI flags win over file values;
//! defaults fill whatever is left.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::cli::GlobalOpts;
use crate::net::types::{DnsProvider, InterfaceConfig, StaticIpv4, StaticIpv6};
use crate::net::validation::{
    validate_doh_template, validate_interface_alias, validate_ipv4, validate_ipv6,
};

pub const DEFAULT_CONFIG_FILE: &str = "windoh.jsonc";

const DEFAULT_IPV4_MASK: &str = "255.255.255.0";
const DEFAULT_IPV6_PREFIX: &str = "64";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no interface specified; use -i/--interface or the config file")]
    MissingInterface,
    #[error("invalid interface name: {0:?}")]
    InvalidInterface(String),
    #[error("invalid IPv4 address: {0:?}")]
    InvalidIpv4(String),
    #[error("invalid IPv6 address: {0:?}")]
    InvalidIpv6(String),
    #[error("invalid IPv6 prefix length: {0:?}")]
    InvalidPrefix(String),
    #[error("custom mode requires dns.ipv4_servers in the config file")]
    MissingCustomDns,
    #[error("custom mode requires doh.template in the config file")]
    MissingDohTemplate,
    #[error("DoH template must be an https:// URL: {0:?}")]
    InvalidDohTemplate(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub interface: InterfaceSection,
    pub ipv4: Ipv4Section,
    pub ipv6: Ipv6Section,
    pub dns: DnsSection,
    pub doh: DohSection,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InterfaceSection {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Ipv4Section {
    pub address: Option<String>,
    #[serde(alias = "netmask")]
    pub mask: Option<String>,
    pub gateway: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Ipv6Section {
    pub address: Option<String>,
    pub prefix: Option<String>,
    pub gateway: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DnsSection {
    pub ipv4_servers: Vec<String>,
    pub ipv6_servers: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DohSection {
    pub template: Option<String>,
}

/// Load the explicit path, or the default file when present. Returns the
/// path actually loaded, if any.
pub fn load(explicit: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => Ok((parse_file(path)?, Some(path.to_path_buf()))),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                Ok((parse_file(default)?, Some(default.to_path_buf())))
            } else {
                Ok((FileConfig::default(), None))
            }
        }
    }
}

pub fn parse_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)?;
    let stripped = json_comments::StripComments::new(content.as_bytes());
    Ok(serde_json::from_reader(stripped)?)
}

/// Merge file and CLI input into the final read-only configuration.
pub fn resolve_interface(file: &FileConfig, cli: &GlobalOpts) -> Result<InterfaceConfig> {
    let interface = pick(&cli.interface, &file.interface.name).ok_or(ConfigError::MissingInterface)?;
    if !validate_interface_alias(&interface) {
        return Err(ConfigError::InvalidInterface(interface));
    }

    let ipv4 = match pick(&cli.ipv4, &file.ipv4.address) {
        Some(address) => {
            let mask = pick(&cli.ipv4_mask, &file.ipv4.mask)
                .unwrap_or_else(|| DEFAULT_IPV4_MASK.to_string());
            let gateway = pick(&cli.ipv4_gateway, &file.ipv4.gateway).unwrap_or_default();
            check_ipv4(&address)?;
            check_ipv4(&mask)?;
            check_ipv4(&gateway)?;
            Some(StaticIpv4 {
                address,
                mask,
                gateway,
            })
        }
        None => None,
    };

    let ipv6 = match pick(&cli.ipv6, &file.ipv6.address) {
        Some(address) => {
            let prefix = pick(&cli.ipv6_prefix, &file.ipv6.prefix)
                .unwrap_or_else(|| DEFAULT_IPV6_PREFIX.to_string());
            let gateway = pick(&cli.ipv6_gateway, &file.ipv6.gateway);
            check_ipv6(&address)?;
            if !prefix.parse::<u8>().is_ok_and(|p| p <= 128) {
                return Err(ConfigError::InvalidPrefix(prefix));
            }
            if let Some(gateway) = &gateway {
                check_ipv6(gateway)?;
            }
            Some(StaticIpv6 {
                address,
                prefix,
                gateway,
            })
        }
        None => None,
    };

    Ok(InterfaceConfig {
        interface,
        ipv4,
        ipv6,
        dns_only: cli.dns_only,
    })
}

/// Synthesize the "custom" provider from the dns/doh config sections.
/// Requires at least an IPv4 primary and a DoH template; everything else
/// is optional and skipped downstream when absent.
pub fn custom_provider(file: &FileConfig) -> Result<DnsProvider> {
    let mut ipv4 = file.dns.ipv4_servers.iter().filter(|s| !s.trim().is_empty());
    let ipv4_primary = ipv4.next().cloned().ok_or(ConfigError::MissingCustomDns)?;
    let ipv4_secondary = ipv4.next().cloned().unwrap_or_default();

    let mut ipv6 = file.dns.ipv6_servers.iter().filter(|s| !s.trim().is_empty());
    let ipv6_primary = ipv6.next().cloned().unwrap_or_default();
    let ipv6_secondary = ipv6.next().cloned().unwrap_or_default();

    for address in [&ipv4_primary, &ipv4_secondary] {
        check_ipv4(address)?;
    }
    for address in [&ipv6_primary, &ipv6_secondary] {
        check_ipv6(address)?;
    }

    let doh_template = file
        .doh
        .template
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::MissingDohTemplate)?;
    if !validate_doh_template(&doh_template) {
        return Err(ConfigError::InvalidDohTemplate(doh_template));
    }

    Ok(DnsProvider {
        name: "Custom".to_string(),
        ipv4_primary,
        ipv4_secondary,
        ipv6_primary,
        ipv6_secondary,
        doh_template,
    })
}

/// CLI value over file value; empty strings count as unset.
fn pick(cli: &Option<String>, file: &Option<String>) -> Option<String> {
    cli.clone()
        .or_else(|| file.clone())
        .filter(|v| !v.trim().is_empty())
}

fn check_ipv4(addr: &str) -> Result<()> {
    if validate_ipv4(addr) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIpv4(addr.to_string()))
    }
}

fn check_ipv6(addr: &str) -> Result<()> {
    if validate_ipv6(addr) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIpv6(addr.to_string()))
    }
}
