//! The ordered configuration pipeline and its best-effort rollback.
//!
//! Stages run in a fixed order: static IPv4, static IPv6, IPv4 DNS, IPv6
//! DNS, DoH templates. The first failed stage stops the pipeline, triggers
//! a full rollback, and surfaces as the returned error.

use thiserror::Error;

use crate::net::process::NetshRunner;
use crate::net::providers::ROLLBACK_DNS_SERVERS;
use crate::net::types::{DnsProvider, InterfaceConfig};
use crate::output;

const STAGE_STATIC_IPV4: &str = "static IPv4";
const STAGE_STATIC_IPV6: &str = "static IPv6";
const STAGE_DNS_IPV4: &str = "IPv4 DNS";
const STAGE_DNS_IPV6: &str = "IPv6 DNS";
const STAGE_DOH: &str = "DoH";

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("{stage}: failed to launch netsh: {source}")]
    Launch {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage}: netsh exited with code {code}")]
    Command { stage: &'static str, code: i32 },
}

impl ApplyError {
    #[allow(dead_code)]
    pub fn stage(&self) -> &'static str {
        match self {
            ApplyError::Launch { stage, .. } | ApplyError::Command { stage, .. } => stage,
        }
    }
}

async fn checked<R: NetshRunner>(
    runner: &R,
    stage: &'static str,
    args: String,
) -> Result<(), ApplyError> {
    match runner.run(&args).await {
        Ok(0) => Ok(()),
        Ok(code) => Err(ApplyError::Command { stage, code }),
        Err(source) => Err(ApplyError::Launch { stage, source }),
    }
}

/// Apply the full configuration for one provider. On the first failed
/// stage the rollback runs before the error is returned.
pub async fn apply_provider<R: NetshRunner>(
    runner: &R,
    config: &InterfaceConfig,
    provider: &DnsProvider,
) -> Result<(), ApplyError> {
    match run_stages(runner, config, provider).await {
        Ok(()) => Ok(()),
        Err(err) => {
            output::error(&err.to_string());
            rollback(runner, &config.interface).await;
            Err(err)
        }
    }
}

async fn run_stages<R: NetshRunner>(
    runner: &R,
    config: &InterfaceConfig,
    provider: &DnsProvider,
) -> Result<(), ApplyError> {
    if !config.dns_only {
        apply_static_ipv4(runner, config).await?;
        apply_static_ipv6(runner, config).await?;
    }
    apply_dns_ipv4(runner, &config.interface, provider).await?;
    apply_dns_ipv6(runner, &config.interface, provider).await?;
    apply_doh(runner, provider).await?;
    Ok(())
}

async fn apply_static_ipv4<R: NetshRunner>(
    runner: &R,
    config: &InterfaceConfig,
) -> Result<(), ApplyError> {
    let Some(ipv4) = &config.ipv4 else {
        output::info("No IPv4 configuration specified, skipping");
        return Ok(());
    };

    output::info("Configuring static IPv4 address...");
    checked(
        runner,
        STAGE_STATIC_IPV4,
        format!(
            "interface ipv4 set address name=\"{}\" static {} {} {}",
            config.interface, ipv4.address, ipv4.mask, ipv4.gateway
        ),
    )
    .await?;

    output::success(&format!(
        "IPv4: {}/{} gateway {}",
        ipv4.address, ipv4.mask, ipv4.gateway
    ));
    Ok(())
}

async fn apply_static_ipv6<R: NetshRunner>(
    runner: &R,
    config: &InterfaceConfig,
) -> Result<(), ApplyError> {
    let Some(ipv6) = &config.ipv6 else {
        output::info("No IPv6 configuration specified, skipping");
        return Ok(());
    };

    output::info("Configuring static IPv6 address...");
    checked(
        runner,
        STAGE_STATIC_IPV6,
        format!(
            "interface ipv6 set address interface=\"{}\" address={}/{}",
            config.interface, ipv6.address, ipv6.prefix
        ),
    )
    .await?;

    if let Some(gateway) = ipv6.gateway.as_deref().filter(|g| !g.is_empty()) {
        // Replace the default route through the link-local gateway. Route
        // failure is deliberately non-fatal: router advertisement usually
        // installs ::/0 on its own.
        runner
            .run_silent(&format!(
                "interface ipv6 delete route ::/0 interface=\"{}\"",
                config.interface
            ))
            .await;

        let add_route = format!(
            "interface ipv6 add route ::/0 interface=\"{}\" nexthop={}",
            config.interface, gateway
        );
        if !matches!(runner.run(&add_route).await, Ok(0)) {
            output::error("Warning: Could not add IPv6 default route");
        }
    }

    output::success(&format!(
        "IPv6: {}/{} gateway {}",
        ipv6.address,
        ipv6.prefix,
        ipv6.gateway.as_deref().unwrap_or("")
    ));
    Ok(())
}

async fn apply_dns_ipv4<R: NetshRunner>(
    runner: &R,
    interface: &str,
    provider: &DnsProvider,
) -> Result<(), ApplyError> {
    output::info("Configuring IPv4 DNS servers...");
    checked(
        runner,
        STAGE_DNS_IPV4,
        format!(
            "interface ipv4 set dnsservers name=\"{interface}\" static {} primary validate=no",
            provider.ipv4_primary
        ),
    )
    .await?;

    if !provider.ipv4_secondary.is_empty() {
        checked(
            runner,
            STAGE_DNS_IPV4,
            format!(
                "interface ipv4 add dnsservers name=\"{interface}\" {} index=2 validate=no",
                provider.ipv4_secondary
            ),
        )
        .await?;
    }

    output::success(&format!(
        "IPv4 DNS: {}",
        listed(&provider.ipv4_primary, &provider.ipv4_secondary)
    ));
    Ok(())
}

async fn apply_dns_ipv6<R: NetshRunner>(
    runner: &R,
    interface: &str,
    provider: &DnsProvider,
) -> Result<(), ApplyError> {
    if provider.ipv6_primary.is_empty() {
        output::info("No IPv6 DNS servers for this provider, skipping");
        return Ok(());
    }

    output::info("Configuring IPv6 DNS servers...");
    checked(
        runner,
        STAGE_DNS_IPV6,
        format!(
            "interface ipv6 set dnsservers name=\"{interface}\" static {} primary validate=no",
            provider.ipv6_primary
        ),
    )
    .await?;

    if !provider.ipv6_secondary.is_empty() {
        checked(
            runner,
            STAGE_DNS_IPV6,
            format!(
                "interface ipv6 add dnsservers name=\"{interface}\" {} index=2 validate=no",
                provider.ipv6_secondary
            ),
        )
        .await?;
    }

    output::success(&format!(
        "IPv6 DNS: {}",
        listed(&provider.ipv6_primary, &provider.ipv6_secondary)
    ));
    Ok(())
}

async fn apply_doh<R: NetshRunner>(runner: &R, provider: &DnsProvider) -> Result<(), ApplyError> {
    output::info("Configuring DNS-over-HTTPS encryption...");
    for server in provider.dns_addresses() {
        // The address may or may not already carry a template.
        runner
            .run_silent(&format!("dns delete encryption server={server}"))
            .await;

        checked(
            runner,
            STAGE_DOH,
            format!(
                "dns add encryption server={server} dohtemplate={} autoupgrade=yes udpfallback=no",
                provider.doh_template
            ),
        )
        .await?;
    }

    output::success(&format!(
        "DoH template: {} (autoupgrade=yes, udpfallback=no)",
        provider.doh_template
    ));
    Ok(())
}

/// Best-effort revert: DNS back to DHCP on both families, then every known
/// provider template removed. Never fails, no matter how little of the
/// pipeline actually ran.
pub async fn rollback<R: NetshRunner>(runner: &R, interface: &str) {
    println!();
    output::info("Rolling back changes...");

    runner
        .run_silent(&format!(
            "interface ipv4 set dnsservers name=\"{interface}\" source=dhcp"
        ))
        .await;
    output::info("IPv4 DNS reset to DHCP");

    runner
        .run_silent(&format!(
            "interface ipv6 set dnsservers name=\"{interface}\" source=dhcp"
        ))
        .await;
    output::info("IPv6 DNS reset to DHCP");

    for server in ROLLBACK_DNS_SERVERS {
        runner
            .run_silent(&format!("dns delete encryption server={server}"))
            .await;
    }
    output::info("DoH encryption templates removed");

    output::info("Rollback complete");
}

fn listed(primary: &str, secondary: &str) -> String {
    if secondary.is_empty() {
        primary.to_string()
    } else {
        format!("{primary}, {secondary}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::process::mock::MockNetsh;
    use crate::net::types::{StaticIpv4, StaticIpv6};

    fn full_config() -> InterfaceConfig {
        InterfaceConfig {
            interface: "Ethernet".to_string(),
            ipv4: Some(StaticIpv4 {
                address: "192.168.1.100".to_string(),
                mask: "255.255.255.0".to_string(),
                gateway: "192.168.1.1".to_string(),
            }),
            ipv6: Some(StaticIpv6 {
                address: "2001:db8::100".to_string(),
                prefix: "64".to_string(),
                gateway: Some("fe80::1".to_string()),
            }),
            dns_only: false,
        }
    }

    fn dns_only_config() -> InterfaceConfig {
        InterfaceConfig {
            interface: "Ethernet".to_string(),
            ipv4: None,
            ipv6: None,
            dns_only: true,
        }
    }

    fn rollback_commands(interface: &str) -> Vec<String> {
        let mut commands = vec![
            format!("interface ipv4 set dnsservers name=\"{interface}\" source=dhcp"),
            format!("interface ipv6 set dnsservers name=\"{interface}\" source=dhcp"),
        ];
        commands.extend(
            ROLLBACK_DNS_SERVERS
                .iter()
                .map(|server| format!("dns delete encryption server={server}")),
        );
        commands
    }

    fn doh_commands(server: &str, template: &str) -> Vec<String> {
        vec![
            format!("dns delete encryption server={server}"),
            format!(
                "dns add encryption server={server} dohtemplate={template} \
                 autoupgrade=yes udpfallback=no"
            ),
        ]
    }

    #[tokio::test]
    async fn test_full_cloudflare_run() {
        let runner = MockNetsh::new();
        let result = apply_provider(&runner, &full_config(), &DnsProvider::cloudflare()).await;
        assert!(result.is_ok());

        let template = "https://cloudflare-dns.com/dns-query";
        let mut expected = vec![
            "interface ipv4 set address name=\"Ethernet\" static 192.168.1.100 255.255.255.0 192.168.1.1".to_string(),
            "interface ipv6 set address interface=\"Ethernet\" address=2001:db8::100/64".to_string(),
            "interface ipv6 delete route ::/0 interface=\"Ethernet\"".to_string(),
            "interface ipv6 add route ::/0 interface=\"Ethernet\" nexthop=fe80::1".to_string(),
            "interface ipv4 set dnsservers name=\"Ethernet\" static 1.1.1.1 primary validate=no".to_string(),
            "interface ipv4 add dnsservers name=\"Ethernet\" 1.0.0.1 index=2 validate=no".to_string(),
            "interface ipv6 set dnsservers name=\"Ethernet\" static 2606:4700:4700::1111 primary validate=no".to_string(),
            "interface ipv6 add dnsservers name=\"Ethernet\" 2606:4700:4700::1001 index=2 validate=no".to_string(),
        ];
        for server in [
            "1.1.1.1",
            "1.0.0.1",
            "2606:4700:4700::1111",
            "2606:4700:4700::1001",
        ] {
            expected.extend(doh_commands(server, template));
        }

        assert_eq!(runner.issued(), expected);
        assert!(!runner.issued().iter().any(|c| c.contains("source=dhcp")));
    }

    #[tokio::test]
    async fn test_pipeline_is_repeatable() {
        let config = full_config();
        let provider = DnsProvider::google();

        let first = MockNetsh::new();
        apply_provider(&first, &config, &provider).await.unwrap();
        let second = MockNetsh::new();
        apply_provider(&second, &config, &provider).await.unwrap();

        assert_eq!(first.issued(), second.issued());
    }

    #[tokio::test]
    async fn test_dns_only_skips_static_stages() {
        let runner = MockNetsh::new();
        apply_provider(&runner, &dns_only_config(), &DnsProvider::google())
            .await
            .unwrap();

        let issued = runner.issued();
        assert!(!issued.iter().any(|c| c.contains("set address")));
        assert!(issued[0].contains("set dnsservers"));
    }

    #[tokio::test]
    async fn test_ipv6_dns_failure_rolls_back_before_doh() {
        let runner = MockNetsh::new().fail_matching("ipv6 set dnsservers");
        let err = apply_provider(&runner, &dns_only_config(), &DnsProvider::cloudflare())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "IPv6 DNS");

        let issued = runner.issued();
        assert!(!issued.iter().any(|c| c.contains("dns add encryption")));

        // Everything after the failing command is exactly the rollback set.
        let failed_at = issued
            .iter()
            .position(|c| c.contains("ipv6 set dnsservers name=\"Ethernet\" static"))
            .unwrap();
        assert_eq!(&issued[failed_at + 1..], rollback_commands("Ethernet").as_slice());
    }

    #[tokio::test]
    async fn test_static_ipv4_failure_rolls_back() {
        let runner = MockNetsh::new().fail_matching("ipv4 set address");
        let err = apply_provider(&runner, &full_config(), &DnsProvider::cloudflare())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "static IPv4");

        let issued = runner.issued();
        assert_eq!(&issued[1..], rollback_commands("Ethernet").as_slice());
    }

    #[tokio::test]
    async fn test_route_failure_does_not_abort() {
        let runner = MockNetsh::new().fail_matching("add route");
        let result = apply_provider(&runner, &full_config(), &DnsProvider::cloudflare()).await;
        assert!(result.is_ok());
        assert!(runner.issued().iter().any(|c| c.contains("dns add encryption")));
    }

    #[tokio::test]
    async fn test_doh_failure_rolls_back() {
        let runner = MockNetsh::new().fail_matching("dns add encryption");
        let err = apply_provider(&runner, &dns_only_config(), &DnsProvider::google())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "DoH");

        // First DoH add fails; no further adds are attempted.
        let adds = runner
            .issued()
            .iter()
            .filter(|c| c.contains("dns add encryption"))
            .count();
        assert_eq!(adds, 1);
    }

    #[tokio::test]
    async fn test_provider_without_ipv6_skips_family() {
        let provider = DnsProvider {
            name: "Custom".to_string(),
            ipv4_primary: "9.9.9.9".to_string(),
            ipv4_secondary: String::new(),
            ipv6_primary: String::new(),
            ipv6_secondary: String::new(),
            doh_template: "https://dns.quad9.net/dns-query".to_string(),
        };
        let runner = MockNetsh::new();
        apply_provider(&runner, &dns_only_config(), &provider)
            .await
            .unwrap();

        let issued = runner.issued();
        assert!(!issued.iter().any(|c| c.contains("ipv6")));
        assert!(!issued.iter().any(|c| c.contains("index=2")));
        assert_eq!(
            issued.iter().filter(|c| c.contains("dns add encryption")).count(),
            1
        );
    }
}
