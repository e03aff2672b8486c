//! Collaborators for the netlink core: address strings and interface names.

pub mod addr;
pub mod ifname;

pub use addr::{InetPrefix, parse_address, parse_prefix};
pub use ifname::{default_interface, index_to_name, name_to_index};
