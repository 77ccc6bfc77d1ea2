use std::net::{Ipv4Addr, Ipv6Addr};

const MAX_ALIAS_LEN: usize = 128;

/// Interface aliases end up inside a quoted netsh command line, so only
/// characters that cannot break out of the quotes are accepted.
pub fn validate_interface_alias(alias: &str) -> bool {
    if alias.is_empty() || alias.len() > MAX_ALIAS_LEN {
        return false;
    }
    alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '(' | ')' | '.'))
}

/// Empty means "not configured" and passes; anything else must parse.
pub fn validate_ipv4(addr: &str) -> bool {
    if addr.trim().is_empty() {
        return true;
    }
    addr.parse::<Ipv4Addr>().is_ok()
}

pub fn validate_ipv6(addr: &str) -> bool {
    if addr.trim().is_empty() {
        return true;
    }
    addr.parse::<Ipv6Addr>().is_ok()
}

pub fn validate_doh_template(template: &str) -> bool {
    if template.trim().is_empty() {
        return true;
    }
    template.starts_with("https://")
}

/// First run of digits and dots that starts at a digit and contains exactly
/// three dots. Shape only; netsh output is the source, not user input.
pub fn find_ipv4(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            let mut dots = 0;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                if bytes[i] == b'.' {
                    dots += 1;
                }
                i += 1;
            }
            if dots == 3 {
                return Some(&line[start..i]);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// First run of hex digits and colons containing at least two colons.
pub fn find_ipv6(line: &str) -> Option<&str> {
    let is_part = |b: u8| b.is_ascii_hexdigit() || b == b':';
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if is_part(bytes[i]) {
            let start = i;
            let mut colons = 0;
            while i < bytes.len() && is_part(bytes[i]) {
                if bytes[i] == b':' {
                    colons += 1;
                }
                i += 1;
            }
            if colons >= 2 {
                return Some(&line[start..i]);
            }
        } else {
            i += 1;
        }
    }
    None
}
