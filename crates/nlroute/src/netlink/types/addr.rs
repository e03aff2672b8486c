//! Address message types.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::error::{Error, Result};

/// Interface address message (struct ifaddrmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfAddrMsg {
    /// Address family (AF_INET, AF_INET6).
    pub ifa_family: u8,
    /// Prefix length.
    pub ifa_prefixlen: u8,
    /// Address flags (IFA_F_*), low 8 bits only.
    pub ifa_flags: u8,
    /// Address scope.
    pub ifa_scope: u8,
    /// Interface index.
    pub ifa_index: u32,
}

impl IfAddrMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new address message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address family.
    pub fn with_family(mut self, family: u8) -> Self {
        self.ifa_family = family;
        self
    }

    /// Set the prefix length.
    pub fn with_prefixlen(mut self, prefixlen: u8) -> Self {
        self.ifa_prefixlen = prefixlen;
        self
    }

    /// Set the interface index.
    pub fn with_index(mut self, index: u32) -> Self {
        self.ifa_index = index;
        self
    }

    /// Set the scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.ifa_scope = scope.into();
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

/// Interface address attributes (IFA_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfaAttr {
    Address,
    Local,
    Label,
    Broadcast,
    Anycast,
    Cacheinfo,
    Multicast,
    Flags,
    Other(u16),
}

impl From<u16> for IfaAttr {
    fn from(val: u16) -> Self {
        match val {
            1 => Self::Address,
            2 => Self::Local,
            3 => Self::Label,
            4 => Self::Broadcast,
            5 => Self::Anycast,
            6 => Self::Cacheinfo,
            7 => Self::Multicast,
            8 => Self::Flags,
            other => Self::Other(other),
        }
    }
}

impl From<IfaAttr> for u16 {
    fn from(attr: IfaAttr) -> Self {
        match attr {
            IfaAttr::Address => 1,
            IfaAttr::Local => 2,
            IfaAttr::Label => 3,
            IfaAttr::Broadcast => 4,
            IfaAttr::Anycast => 5,
            IfaAttr::Cacheinfo => 6,
            IfaAttr::Multicast => 7,
            IfaAttr::Flags => 8,
            IfaAttr::Other(v) => v,
        }
    }
}

/// Address flags (IFA_F_*).
pub mod ifa_flags {
    pub const SECONDARY: u32 = 0x01;
    pub const TEMPORARY: u32 = 0x01; // Alias for SECONDARY
    pub const NODAD: u32 = 0x02;
    pub const OPTIMISTIC: u32 = 0x04;
    pub const DADFAILED: u32 = 0x08;
    pub const HOMEADDRESS: u32 = 0x10;
    pub const DEPRECATED: u32 = 0x20;
    pub const TENTATIVE: u32 = 0x40;
    pub const PERMANENT: u32 = 0x80;
    pub const MANAGETEMPADDR: u32 = 0x100;
    pub const NOPREFIXROUTE: u32 = 0x200;
    pub const MCAUTOJOIN: u32 = 0x400;
    pub const STABLE_PRIVACY: u32 = 0x800;
}

/// Lifetime value meaning "never expires".
pub const INFINITY_LIFE_TIME: u32 = 0xFFFF_FFFF;

/// Address cache info (struct ifa_cacheinfo).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfaCacheinfo {
    pub ifa_prefered: u32,
    pub ifa_valid: u32,
    pub cstamp: u32,
    pub tstamp: u32,
}

impl IfaCacheinfo {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Address scope values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Scope {
    Global,
    Site,
    Link,
    Host,
    Nowhere,
    Unknown(u8),
}

impl From<u8> for Scope {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::Global,
            200 => Self::Site,
            253 => Self::Link,
            254 => Self::Host,
            255 => Self::Nowhere,
            other => Self::Unknown(other),
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Global => 0,
            Scope::Site => 200,
            Scope::Link => 253,
            Scope::Host => 254,
            Scope::Nowhere => 255,
            Scope::Unknown(v) => v,
        }
    }
}

impl Scope {
    /// Get the name of this scope, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Global => Some("global"),
            Self::Site => Some("site"),
            Self::Link => Some("link"),
            Self::Host => Some("host"),
            Self::Nowhere => Some("nowhere"),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", u8::from(*self)),
        }
    }
}
