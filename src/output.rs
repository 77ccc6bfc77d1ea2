//! Console output. Stdout is the user interface here; `tracing` carries
//! diagnostics separately on stderr.

use crate::net::interfaces::AdapterInfo;
use crate::net::types::{AddressFamily, DnsServerRecord, OverallVerdict, StatusReport};

pub fn info(msg: &str) {
    println!("[INFO] {msg}");
}

pub fn success(msg: &str) {
    println!("[OK] {msg}");
}

pub fn error(msg: &str) {
    eprintln!("[ERROR] {msg}");
}

pub fn apply_banner(provider: &str, interface: &str, dns_only: bool) {
    println!();
    println!("========================================");
    if dns_only {
        println!("  {provider} DNS + DoH (DNS only mode)");
    } else {
        println!("  Static IP + {provider} DNS + DoH");
    }
    println!("  Interface: {interface}");
    println!("========================================");
    println!();
}

pub fn status_report(interface: &str, report: &StatusReport) {
    println!();
    println!("Status for interface: {interface}");
    println!("========================================");
    println!();

    print_addresses(AddressFamily::Ipv4, &report.ipv4);
    print_addresses(AddressFamily::Ipv6, &report.ipv6);

    println!();
    println!("Encryption:");
    println!("----------------------------------------");
    for record in report.ipv4.iter().chain(&report.ipv6) {
        print_record(record);
    }

    println!();
    println!("Summary:");
    println!("----------------------------------------");
    for family in [AddressFamily::Ipv4, AddressFamily::Ipv6] {
        println!("  {}: {}", family.as_str(), report.summary(family));
    }
    println!(
        "  Fallback: {}",
        if report.any_fallback() {
            "ENABLED (insecure)"
        } else {
            "DISABLED"
        }
    );
    println!(
        "  Unencrypted DNS: {}",
        if report.any_unencrypted() {
            "YES (insecure)"
        } else {
            "NONE"
        }
    );
    println!();

    let overall = match report.overall() {
        OverallVerdict::NoDnsConfigured => "NO DNS CONFIGURED",
        OverallVerdict::FullyEncrypted => "OK (fully encrypted)",
        OverallVerdict::NotFullyEncrypted => "NOT FULLY ENCRYPTED",
    };
    println!("Overall result: {overall}");
}

fn print_addresses(family: AddressFamily, records: &[DnsServerRecord]) {
    if records.is_empty() {
        println!("{} DNS: (none configured)", family.as_str());
    } else {
        let list = records
            .iter()
            .map(|r| r.address.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{} DNS: {list}", family.as_str());
    }
}

fn print_record(record: &DnsServerRecord) {
    let verdict = if record.encrypted() {
        "ENCRYPTED"
    } else {
        "NOT ENCRYPTED"
    };
    let note = if record.has_template && record.udp_fallback {
        " (fallback enabled)"
    } else if !record.has_template {
        " (no DoH template)"
    } else {
        ""
    };
    println!("  {}: {verdict}{note}", record.address);
}

pub fn print_interfaces(adapters: &[AdapterInfo]) {
    println!();
    println!("Available network interfaces:");
    println!("========================================");
    println!();
    for (i, adapter) in adapters.iter().enumerate() {
        println!("  [{}] {}", i + 1, adapter.name);
        println!("      Type: {}", adapter.kind);
        println!("      Status: Up");
        for ip in &adapter.ipv4 {
            println!("      IPv4: {ip}");
        }
        for ip in &adapter.ipv6 {
            println!("      IPv6: {ip}");
        }
        println!();
    }
}
