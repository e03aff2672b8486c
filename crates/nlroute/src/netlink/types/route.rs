//! Route message types.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::error::{Error, Result};

/// Routing message (struct rtmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtMsg {
    /// Address family.
    pub rtm_family: u8,
    /// Destination prefix length.
    pub rtm_dst_len: u8,
    /// Source prefix length.
    pub rtm_src_len: u8,
    /// Type of service.
    pub rtm_tos: u8,
    /// Routing table id (8-bit; RTA_TABLE carries the full value).
    pub rtm_table: u8,
    /// Routing protocol (RTPROT_*).
    pub rtm_protocol: u8,
    /// Route scope.
    pub rtm_scope: u8,
    /// Route type (RTN_*).
    pub rtm_type: u8,
    /// Route flags.
    pub rtm_flags: u32,
}

impl RtMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new route message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address family.
    pub fn with_family(mut self, family: u8) -> Self {
        self.rtm_family = family;
        self
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(m, _)| m)
            .map_err(|_| Error::Truncated {
                expected: Self::SIZE,
                actual: data.len(),
            })
    }
}

/// Route attributes (RTA_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtaAttr {
    Dst,
    Src,
    Iif,
    Oif,
    Gateway,
    Priority,
    Prefsrc,
    Table,
    Other(u16),
}

impl From<u16> for RtaAttr {
    fn from(val: u16) -> Self {
        match val {
            1 => Self::Dst,
            2 => Self::Src,
            3 => Self::Iif,
            4 => Self::Oif,
            5 => Self::Gateway,
            6 => Self::Priority,
            7 => Self::Prefsrc,
            15 => Self::Table,
            other => Self::Other(other),
        }
    }
}

/// Well-known routing table ids.
pub const RT_TABLE_MAIN: u32 = 254;
pub const RT_TABLE_LOCAL: u32 = 255;

/// Route types (RTN_*).
pub mod rtn {
    pub const UNICAST: u8 = 1;
    pub const LOCAL: u8 = 2;
    pub const BROADCAST: u8 = 3;
    pub const ANYCAST: u8 = 4;
    pub const MULTICAST: u8 = 5;
    pub const BLACKHOLE: u8 = 6;
    pub const UNREACHABLE: u8 = 7;
    pub const PROHIBIT: u8 = 8;
}

/// Route origins (RTPROT_*).
pub mod rtprot {
    pub const REDIRECT: u8 = 1;
    pub const KERNEL: u8 = 2;
    pub const BOOT: u8 = 3;
    pub const STATIC: u8 = 4;
    pub const DHCP: u8 = 16;
}

/// Get the name of a route type.
pub fn route_type_name(route_type: u8) -> &'static str {
    match route_type {
        rtn::UNICAST => "unicast",
        rtn::LOCAL => "local",
        rtn::BROADCAST => "broadcast",
        rtn::ANYCAST => "anycast",
        rtn::MULTICAST => "multicast",
        rtn::BLACKHOLE => "blackhole",
        rtn::UNREACHABLE => "unreachable",
        rtn::PROHIBIT => "prohibit",
        _ => "unknown",
    }
}

/// Get the name of a route protocol.
pub fn protocol_name(protocol: u8) -> &'static str {
    match protocol {
        rtprot::REDIRECT => "redirect",
        rtprot::KERNEL => "kernel",
        rtprot::BOOT => "boot",
        rtprot::STATIC => "static",
        rtprot::DHCP => "dhcp",
        _ => "unknown",
    }
}
