pub mod apply;
pub mod config;
pub mod interfaces;
pub mod process;
pub mod providers;
pub mod status;
pub mod types;
pub mod validation;

pub use apply::{ApplyError, apply_provider, rollback};
pub use process::{Capture, Netsh, NetshRunner};
pub use status::inspect;
pub use types::{
    AddressFamily, DnsProvider, DnsServerRecord, InterfaceConfig, OverallVerdict, StatusReport,
};
