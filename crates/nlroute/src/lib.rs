//! Synchronous rtnetlink client for interface addresses and routes.
//!
//! This crate talks NETLINK_ROUTE directly: it builds request frames, sends
//! them on a raw netlink socket, reassembles multi-part dump responses and
//! decodes the TLV attributes into owned records.
//!
//! # Features
//!
//! - `serde` - Derive `Serialize` on decoded records
//! - `integration` - Enable tests that talk to the running kernel
//!
//! # Example
//!
//! ```ignore
//! use nlroute::netlink::{RequestSession, RouteFilter};
//! use nlroute::util::ifname;
//!
//! fn main() -> nlroute::Result<()> {
//!     let mut session = RequestSession::open()?;
//!
//!     for addr in session.dump_addresses(libc::AF_INET as u8)? {
//!         println!("{:?}/{} {}", addr.local(), addr.prefix_len(), addr.scope());
//!     }
//!
//!     let gw = session.first_gateway(
//!         &RouteFilter::main(libc::AF_INET as u8),
//!         &|idx| ifname::index_to_name(idx).ok(),
//!     )?;
//!     println!("{:?}", gw.and_then(|r| r.gateway().copied()));
//!     Ok(())
//! }
//! ```

pub mod netlink;
pub mod util;

// Re-export common types at crate root for convenience
pub use netlink::{Error, RequestSession, Result};
