#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "IPv4",
            AddressFamily::Ipv6 => "IPv6",
        }
    }
}

/// Static IPv4 assignment: address, subnet mask and default gateway.
/// The gateway may be empty when the network supplies one.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StaticIpv4 {
    pub address: String,
    pub mask: String,
    pub gateway: String,
}

/// Static IPv6 assignment. The gateway is a link-local next hop and is
/// optional; without one the default route is left to router advertisement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StaticIpv6 {
    pub address: String,
    pub prefix: String,
    pub gateway: Option<String>,
}

/// Everything the configuration pipeline needs to know about the target
/// interface. Built once from merged file and CLI input, read-only after.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InterfaceConfig {
    pub interface: String,
    pub ipv4: Option<StaticIpv4>,
    pub ipv6: Option<StaticIpv6>,
    pub dns_only: bool,
}

/// A DNS provider profile: four server addresses plus the DoH template URL.
/// Secondary or IPv6 entries may be empty, in which case the corresponding
/// pipeline steps are skipped.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DnsProvider {
    pub name: String,
    pub ipv4_primary: String,
    pub ipv4_secondary: String,
    pub ipv6_primary: String,
    pub ipv6_secondary: String,
    pub doh_template: String,
}

impl DnsProvider {
    /// The provider's non-empty DNS addresses, IPv4 first.
    pub fn dns_addresses(&self) -> impl Iterator<Item = &str> {
        [
            &self.ipv4_primary,
            &self.ipv4_secondary,
            &self.ipv6_primary,
            &self.ipv6_secondary,
        ]
        .into_iter()
        .map(String::as_str)
        .filter(|address| !address.is_empty())
    }
}

/// Encryption attributes of one configured DNS server, rebuilt on every
/// status query.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DnsServerRecord {
    pub address: String,
    pub has_template: bool,
    pub autoupgrade: bool,
    pub udp_fallback: bool,
}

impl DnsServerRecord {
    /// The fail-safe starting point: no template, no auto-upgrade, and UDP
    /// fallback assumed enabled until the tool says otherwise.
    pub fn insecure(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            has_template: false,
            autoupgrade: false,
            udp_fallback: true,
        }
    }

    /// A server counts as encrypted only with a template present,
    /// auto-upgrade on, and UDP fallback off.
    pub fn encrypted(&self) -> bool {
        self.has_template && self.autoupgrade && !self.udp_fallback
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OverallVerdict {
    NoDnsConfigured,
    FullyEncrypted,
    NotFullyEncrypted,
}

#[derive(Clone, Default, Debug)]
pub struct StatusReport {
    pub ipv4: Vec<DnsServerRecord>,
    pub ipv6: Vec<DnsServerRecord>,
}

impl StatusReport {
    pub fn records(&self, family: AddressFamily) -> &[DnsServerRecord] {
        match family {
            AddressFamily::Ipv4 => &self.ipv4,
            AddressFamily::Ipv6 => &self.ipv6,
        }
    }

    pub fn any_fallback(&self) -> bool {
        self.ipv4.iter().chain(&self.ipv6).any(|r| r.udp_fallback)
    }

    pub fn any_unencrypted(&self) -> bool {
        self.ipv4.iter().chain(&self.ipv6).any(|r| !r.encrypted())
    }

    pub fn summary(&self, family: AddressFamily) -> String {
        let records = self.records(family);
        let total = records.len();
        if total == 0 {
            return "NO DNS CONFIGURED".to_string();
        }
        let encrypted = records.iter().filter(|r| r.encrypted()).count();
        if encrypted == total {
            format!("ENCRYPTED ({encrypted}/{total} servers)")
        } else {
            format!("PARTIALLY ENCRYPTED ({encrypted}/{total} servers)")
        }
    }

    pub fn overall(&self) -> OverallVerdict {
        if self.ipv4.is_empty() && self.ipv6.is_empty() {
            OverallVerdict::NoDnsConfigured
        } else if self.any_unencrypted() || self.any_fallback() {
            OverallVerdict::NotFullyEncrypted
        } else {
            OverallVerdict::FullyEncrypted
        }
    }
}
