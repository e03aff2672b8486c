//! Decoded rtnetlink messages.
//!
//! Records own their data; nothing borrows the receive buffer once decoding
//! returns.
//!
//! # Example
//!
//! ```ignore
//! use nlroute::netlink::messages::AddressRecord;
//!
//! let addr = AddressRecord::decode(payload)?;
//! println!("{:?}/{} scope {}", addr.local(), addr.prefix_len(), addr.scope());
//! ```

mod address;
mod route;

pub use address::*;
pub use route::*;
