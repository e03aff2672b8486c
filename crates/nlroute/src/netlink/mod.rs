//! Netlink protocol implementation for NETLINK_ROUTE.
//!
//! Layers, leaves first:
//!
//! - [`message`]: message header, alignment and framing
//! - [`attr`] / [`MessageBuilder`]: TLV attribute encoding and decoding
//! - [`socket`] / [`session`]: the kernel socket and request/response exchanges
//! - [`request`]: request payloads (dumps, address creation)
//! - [`messages`]: decoded [`AddressRecord`] and [`RouteRecord`]
//!
//! # Quick Start
//!
//! ```ignore
//! use nlroute::netlink::RequestSession;
//!
//! let mut session = RequestSession::open()?;
//! let addresses = session.dump_addresses(libc::AF_INET6 as u8)?;
//! for addr in &addresses {
//!     println!("{}: {:?}", addr.ifindex(), addr.address());
//! }
//! ```

pub mod attr;
mod builder;
mod error;
#[cfg(test)]
mod fixtures;
pub mod message;
pub mod messages;
pub mod request;
pub mod session;
pub mod socket;
pub mod types;

pub use attr::{AttrIter, Attribute, NlAttr, append_attribute, iterate_attributes};
pub use builder::{MessageBuilder, NestToken};
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use messages::{AddressRecord, CacheInfo, Lifetime, MatchMode, RouteFilter, RouteRecord};
pub use session::{RequestSession, SessionOptions, SessionState};
pub use socket::{NetlinkSocket, Protocol, Transport};
