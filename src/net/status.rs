//! Read-only DNS encryption inspection.
//!
//! Scrapes `netsh` show output for server addresses, then queries each
//! server's encryption settings. Launch failures and unrecognized text
//! degrade to fail-safe "insecure" records; the inspector never aborts.

use crate::net::process::NetshRunner;
use crate::net::types::{AddressFamily, DnsServerRecord, StatusReport};
use crate::net::validation::{find_ipv4, find_ipv6};

const MAX_SERVERS_PER_FAMILY: usize = 4;

/// Phrases netsh prints when an encryption entry exists for a server.
/// English-only, like the tool's output itself; on localized systems a
/// configured server can be misread as unencrypted.
const TEMPLATE_MARKERS: [&str; 3] = [
    "Encryption settings",
    "DNS-over-HTTPS template",
    "dohtemplate",
];

pub async fn inspect<R: NetshRunner>(runner: &R, interface: &str) -> StatusReport {
    let mut report = StatusReport::default();

    if let Ok(capture) = runner
        .run_captured(&format!(
            "interface ipv4 show dnsservers name=\"{interface}\""
        ))
        .await
    {
        for address in discover(&capture.text, AddressFamily::Ipv4) {
            report.ipv4.push(query_doh_info(runner, &address).await);
        }
    }

    if let Ok(capture) = runner
        .run_captured(&format!(
            "interface ipv6 show dnsservers name=\"{interface}\""
        ))
        .await
    {
        for address in discover(&capture.text, AddressFamily::Ipv6) {
            report.ipv6.push(query_doh_info(runner, &address).await);
        }
    }

    report
}

/// Pull server addresses out of `show dnsservers` output, one candidate
/// per line, capped at four per family.
fn discover(text: &str, family: AddressFamily) -> Vec<String> {
    let mut found = Vec::new();
    for line in text.lines() {
        if found.len() == MAX_SERVERS_PER_FAMILY {
            break;
        }
        let candidate = match family {
            AddressFamily::Ipv4 => find_ipv4(line).filter(|ip| ip.len() >= 7),
            AddressFamily::Ipv6 => find_ipv6(line).filter(|ip| ip.len() >= 3 && ip.contains(':')),
        };
        if let Some(ip) = candidate {
            found.push(ip.to_string());
        }
    }
    found
}

/// Query one server's DoH settings and classify them.
pub async fn query_doh_info<R: NetshRunner>(runner: &R, server: &str) -> DnsServerRecord {
    let mut record = DnsServerRecord::insecure(server);

    let Ok(capture) = runner
        .run_captured(&format!("dns show encryption server={server}"))
        .await
    else {
        return record;
    };
    let text = capture.text;
    if text.is_empty() {
        return record;
    }

    record.has_template = TEMPLATE_MARKERS.iter().any(|marker| text.contains(marker));

    if let Some(value) = label_value(&text, "Auto-upgrade") {
        record.autoupgrade = value.contains("yes");
    }
    if let Some(value) = label_value(&text, "UDP-fallback")
        && value.contains("no")
    {
        record.udp_fallback = false;
    }

    record
}

/// The rest of the line after the colon that follows `label`, if both are
/// present on the same line.
fn label_value<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    for line in text.lines() {
        if let Some(at) = line.find(label) {
            let after = &line[at + label.len()..];
            return after.find(':').map(|colon| &after[colon + 1..]);
        }
    }
    None
}
