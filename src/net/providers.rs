use crate::net::types::DnsProvider;

/// Every address a built-in provider may have installed an encryption
/// template for. Rollback deletes templates for all of them, so this list
/// must grow whenever a provider is added or rollback leaks templates.
pub const ROLLBACK_DNS_SERVERS: [&str; 8] = [
    "1.1.1.1",
    "1.0.0.1",
    "2606:4700:4700::1111",
    "2606:4700:4700::1001",
    "8.8.8.8",
    "8.8.4.4",
    "2001:4860:4860::8888",
    "2001:4860:4860::8844",
];

impl DnsProvider {
    pub fn cloudflare() -> Self {
        Self {
            name: "Cloudflare".to_string(),
            ipv4_primary: "1.1.1.1".to_string(),
            ipv4_secondary: "1.0.0.1".to_string(),
            ipv6_primary: "2606:4700:4700::1111".to_string(),
            ipv6_secondary: "2606:4700:4700::1001".to_string(),
            doh_template: "https://cloudflare-dns.com/dns-query".to_string(),
        }
    }

    pub fn google() -> Self {
        Self {
            name: "Google".to_string(),
            ipv4_primary: "8.8.8.8".to_string(),
            ipv4_secondary: "8.8.4.4".to_string(),
            ipv6_primary: "2001:4860:4860::8888".to_string(),
            ipv6_secondary: "2001:4860:4860::8844".to_string(),
            doh_template: "https://dns.google/dns-query".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_set_covers_builtin_providers() {
        for provider in [DnsProvider::cloudflare(), DnsProvider::google()] {
            for address in provider.dns_addresses() {
                assert!(
                    ROLLBACK_DNS_SERVERS.contains(&address),
                    "{} address {address} missing from rollback set",
                    provider.name
                );
            }
        }
    }

    #[test]
    fn test_builtin_templates_are_https() {
        for provider in [DnsProvider::cloudflare(), DnsProvider::google()] {
            assert!(provider.doh_template.starts_with("https://"));
        }
    }
}
