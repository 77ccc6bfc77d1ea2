//! Active adapter enumeration for the `interfaces` subcommand.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("Windows API error: {0}")]
    WindowsApi(String),
    #[error("no active network interfaces found")]
    NoInterfaces,
}

pub type Result<T> = std::result::Result<T, InterfaceError>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AdapterKind {
    Ethernet,
    WiFi,
    Other(u32),
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterKind::Ethernet => write!(f, "Ethernet"),
            AdapterKind::WiFi => write!(f, "Wi-Fi"),
            AdapterKind::Other(code) => write!(f, "Other ({code})"),
        }
    }
}

/// One up-and-running adapter, with its non-link-local addresses.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AdapterInfo {
    pub name: String,
    pub kind: AdapterKind,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

// IANA ifType values, as surfaced by GetAdaptersAddresses.
const IF_TYPE_ETHERNET_CSMACD: u32 = 6;
const IF_TYPE_IEEE80211: u32 = 71;

impl AdapterKind {
    #[allow(dead_code)]
    fn from_if_type(if_type: u32) -> Self {
        match if_type {
            IF_TYPE_ETHERNET_CSMACD => AdapterKind::Ethernet,
            IF_TYPE_IEEE80211 => AdapterKind::WiFi,
            other => AdapterKind::Other(other),
        }
    }
}

#[cfg(target_os = "windows")]
pub fn enumerate() -> Result<Vec<AdapterInfo>> {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use windows::Win32::NetworkManagement::IpHelper::{
        GAA_FLAG_SKIP_ANYCAST, GAA_FLAG_SKIP_DNS_SERVER, GAA_FLAG_SKIP_MULTICAST,
        GetAdaptersAddresses, IP_ADAPTER_ADDRESSES_LH,
    };
    use windows::Win32::Networking::WinSock::{AF_UNSPEC, SOCKADDR_IN, SOCKADDR_IN6};

    const AF_INET: u16 = 2;
    const AF_INET6: u16 = 23;
    const ERROR_BUFFER_OVERFLOW: u32 = 111;
    const IF_OPER_STATUS_UP: i32 = 1;
    const IF_TYPE_SOFTWARE_LOOPBACK: u32 = 24;
    const IF_TYPE_TUNNEL: u32 = 131;

    let flags = GAA_FLAG_SKIP_ANYCAST | GAA_FLAG_SKIP_MULTICAST | GAA_FLAG_SKIP_DNS_SERVER;
    let mut adapters = Vec::new();

    let mut buffer_size: u32 = 15000;
    let mut buffer: Vec<u8> = vec![0; buffer_size as usize];

    unsafe {
        let mut result = GetAdaptersAddresses(
            AF_UNSPEC.0 as u32,
            flags,
            None,
            Some(buffer.as_mut_ptr() as *mut IP_ADAPTER_ADDRESSES_LH),
            &mut buffer_size,
        );

        // One retry with the size the API asked for.
        if result == ERROR_BUFFER_OVERFLOW {
            buffer = vec![0; buffer_size as usize];
            result = GetAdaptersAddresses(
                AF_UNSPEC.0 as u32,
                flags,
                None,
                Some(buffer.as_mut_ptr() as *mut IP_ADAPTER_ADDRESSES_LH),
                &mut buffer_size,
            );
        }

        if result != 0 {
            return Err(InterfaceError::WindowsApi(format!(
                "GetAdaptersAddresses failed with code {result}"
            )));
        }

        let mut current = buffer.as_ptr() as *const IP_ADAPTER_ADDRESSES_LH;

        while !current.is_null() {
            let adapter = &*current;

            let listable = adapter.OperStatus.0 == IF_OPER_STATUS_UP
                && adapter.IfType != IF_TYPE_SOFTWARE_LOOPBACK
                && adapter.IfType != IF_TYPE_TUNNEL;

            if listable {
                let name = if !adapter.FriendlyName.is_null() {
                    let len = (0..)
                        .take_while(|&i| *adapter.FriendlyName.0.offset(i) != 0)
                        .count();
                    let slice = std::slice::from_raw_parts(adapter.FriendlyName.0, len);
                    String::from_utf16_lossy(slice)
                } else {
                    "Unknown".to_string()
                };

                let mut ipv4 = Vec::new();
                let mut ipv6 = Vec::new();

                let mut unicast = adapter.FirstUnicastAddress;
                while !unicast.is_null() {
                    let entry = &*unicast;
                    if !entry.Address.lpSockaddr.is_null() {
                        let sockaddr = &*entry.Address.lpSockaddr;
                        match sockaddr.sa_family.0 {
                            AF_INET => {
                                let sa = &*(entry.Address.lpSockaddr as *const SOCKADDR_IN);
                                let addr = Ipv4Addr::from(u32::from_be(sa.sin_addr.S_un.S_addr));
                                if !addr.is_unspecified() {
                                    ipv4.push(addr.to_string());
                                }
                            }
                            AF_INET6 => {
                                let sa = &*(entry.Address.lpSockaddr as *const SOCKADDR_IN6);
                                let addr = Ipv6Addr::from(sa.sin6_addr.u.Byte);
                                let link_local = (addr.segments()[0] & 0xffc0) == 0xfe80;
                                if !addr.is_unspecified() && !link_local {
                                    ipv6.push(addr.to_string());
                                }
                            }
                            _ => {}
                        }
                    }
                    unicast = entry.Next;
                }

                if !ipv4.is_empty() || !ipv6.is_empty() {
                    adapters.push(AdapterInfo {
                        name,
                        kind: AdapterKind::from_if_type(adapter.IfType),
                        ipv4,
                        ipv6,
                    });
                }
            }

            current = adapter.Next;
        }
    }

    if adapters.is_empty() {
        return Err(InterfaceError::NoInterfaces);
    }

    Ok(adapters)
}

#[cfg(not(target_os = "windows"))]
pub fn enumerate() -> Result<Vec<AdapterInfo>> {
    Err(InterfaceError::WindowsApi(
        "interface enumeration is only supported on Windows".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_kind_labels() {
        assert_eq!(AdapterKind::from_if_type(6), AdapterKind::Ethernet);
        assert_eq!(AdapterKind::from_if_type(71), AdapterKind::WiFi);
        assert_eq!(AdapterKind::from_if_type(131).to_string(), "Other (131)");
        assert_eq!(AdapterKind::Ethernet.to_string(), "Ethernet");
        assert_eq!(AdapterKind::WiFi.to_string(), "Wi-Fi");
    }

    #[test]
    #[cfg(target_os = "windows")]
    fn test_enumerate() {
        match enumerate() {
            Ok(adapters) => {
                for adapter in adapters {
                    assert!(!adapter.name.is_empty());
                    assert!(!adapter.ipv4.is_empty() || !adapter.ipv6.is_empty());
                }
            }
            Err(e) => println!("Warning: could not enumerate interfaces: {e}"),
        }
    }
}
