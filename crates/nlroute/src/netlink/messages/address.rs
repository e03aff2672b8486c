//! Decoded address message.

use std::net::IpAddr;

use crate::netlink::attr::{get, iterate_attributes};
use crate::netlink::error::{Error, Result};
use crate::netlink::types::addr::{
    INFINITY_LIFE_TIME, IfAddrMsg, IfaAttr, IfaCacheinfo, Scope, ifa_flags,
};

/// Address lifetime from IFA_CACHEINFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Lifetime {
    /// The address never expires.
    Forever,
    /// Seconds left.
    Seconds(u32),
}

impl From<u32> for Lifetime {
    fn from(val: u32) -> Self {
        if val == INFINITY_LIFE_TIME {
            Self::Forever
        } else {
            Self::Seconds(val)
        }
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forever => f.write_str("forever"),
            Self::Seconds(s) => write!(f, "{}sec", s),
        }
    }
}

/// Address cache information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CacheInfo {
    /// Preferred lifetime.
    pub preferred: Lifetime,
    /// Valid lifetime.
    pub valid: Lifetime,
    /// Creation timestamp (hundredths of a second since boot).
    pub created: u32,
    /// Last update timestamp.
    pub updated: u32,
}

impl CacheInfo {
    /// Decode a 16-byte `ifa_cacheinfo` value.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != IfaCacheinfo::SIZE {
            return Err(Error::InvalidAttribute(format!(
                "cache info of {} bytes",
                data.len()
            )));
        }
        let (raw, _) = <IfaCacheinfo as zerocopy::FromBytes>::read_from_prefix(data)
            .map_err(|_| Error::InvalidAttribute("unreadable cache info".into()))?;
        Ok(Self {
            preferred: raw.ifa_prefered.into(),
            valid: raw.ifa_valid.into(),
            created: raw.cstamp,
            updated: raw.tstamp,
        })
    }
}

/// Duplicate address detection summary derived from the address flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DadState {
    /// DAD turned off for this address (IFA_F_NODAD).
    Disabled,
    /// DAD in progress.
    Tentative,
    /// DAD found a duplicate.
    Failed,
    /// DAD finished on a permanent address.
    Complete,
    /// None of the above.
    Idle,
}

/// One interface address from an RTM_NEWADDR message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AddressRecord {
    pub(crate) family: u8,
    pub(crate) prefix_len: u8,
    pub(crate) scope: Scope,
    pub(crate) flags: u32,
    pub(crate) ifindex: u32,
    pub(crate) address: Option<IpAddr>,
    pub(crate) local: Option<IpAddr>,
    pub(crate) broadcast: Option<IpAddr>,
    pub(crate) anycast: Option<IpAddr>,
    pub(crate) multicast: Option<IpAddr>,
    pub(crate) label: Option<String>,
    pub(crate) cache_info: Option<CacheInfo>,
}

impl AddressRecord {
    /// Decode the payload of an address message (ifaddrmsg plus attributes).
    ///
    /// Unknown attribute types are skipped. Address values of the wrong
    /// length for the family fail the whole record.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let header = IfAddrMsg::from_bytes(payload)?;
        let family = header.ifa_family;

        let mut record = Self {
            family,
            prefix_len: header.ifa_prefixlen,
            scope: Scope::from(header.ifa_scope),
            flags: header.ifa_flags as u32,
            ifindex: header.ifa_index,
            address: None,
            local: None,
            broadcast: None,
            anycast: None,
            multicast: None,
            label: None,
            cache_info: None,
        };

        for attr in iterate_attributes(&payload[IfAddrMsg::SIZE..]) {
            let attr = attr?;
            let data = attr.value();
            match IfaAttr::from(attr.kind()) {
                IfaAttr::Address => record.address = Some(get::ip_addr(data, family)?),
                IfaAttr::Local => record.local = Some(get::ip_addr(data, family)?),
                IfaAttr::Broadcast => record.broadcast = Some(get::ip_addr(data, family)?),
                IfaAttr::Anycast => record.anycast = Some(get::ip_addr(data, family)?),
                IfaAttr::Multicast => record.multicast = Some(get::ip_addr(data, family)?),
                IfaAttr::Label => record.label = Some(get::string(data)?.to_string()),
                IfaAttr::Cacheinfo => record.cache_info = Some(CacheInfo::parse(data)?),
                IfaAttr::Flags => record.flags = get::u32_ne(data)?,
                IfaAttr::Other(kind) => {
                    tracing::trace!(kind, len = data.len(), "skipping unknown address attribute");
                }
            }
        }

        Ok(record)
    }

    /// Get the address family.
    pub fn family(&self) -> u8 {
        self.family
    }

    /// Check if this is an IPv4 address.
    pub fn is_ipv4(&self) -> bool {
        self.family == libc::AF_INET as u8
    }

    /// Check if this is an IPv6 address.
    pub fn is_ipv6(&self) -> bool {
        self.family == libc::AF_INET6 as u8
    }

    /// Get the prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Get the scope.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Get the address flags (IFA_F_*), IFA_FLAGS included.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Get the interface index.
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Get the address (IFA_ADDRESS).
    pub fn address(&self) -> Option<&IpAddr> {
        self.address.as_ref()
    }

    /// Get the local address (IFA_LOCAL).
    pub fn local(&self) -> Option<&IpAddr> {
        self.local.as_ref()
    }

    /// Get the broadcast address.
    pub fn broadcast(&self) -> Option<&IpAddr> {
        self.broadcast.as_ref()
    }

    /// Get the anycast address.
    pub fn anycast(&self) -> Option<&IpAddr> {
        self.anycast.as_ref()
    }

    /// Get the multicast address.
    pub fn multicast(&self) -> Option<&IpAddr> {
        self.multicast.as_ref()
    }

    /// Get the interface label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the cache info.
    pub fn cache_info(&self) -> Option<&CacheInfo> {
        self.cache_info.as_ref()
    }

    /// Get the primary address (local or address).
    pub fn primary_address(&self) -> Option<&IpAddr> {
        self.local.as_ref().or(self.address.as_ref())
    }

    /// Peer address of a point-to-point link, when it differs from local.
    pub fn peer(&self) -> Option<&IpAddr> {
        match (&self.local, &self.address) {
            (Some(local), Some(address)) if local != address => Some(address),
            _ => None,
        }
    }

    fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Check if this is a secondary address (IPv4).
    pub fn is_secondary(&self) -> bool {
        self.is_ipv4() && self.has_flag(ifa_flags::SECONDARY)
    }

    /// Check if this is a temporary (privacy) address (IPv6).
    pub fn is_temporary(&self) -> bool {
        self.is_ipv6() && self.has_flag(ifa_flags::TEMPORARY)
    }

    /// Check if this is a permanent address.
    pub fn is_permanent(&self) -> bool {
        self.has_flag(ifa_flags::PERMANENT)
    }

    /// Check if this address is deprecated.
    pub fn is_deprecated(&self) -> bool {
        self.has_flag(ifa_flags::DEPRECATED)
    }

    /// Check if this address is tentative.
    pub fn is_tentative(&self) -> bool {
        self.has_flag(ifa_flags::TENTATIVE)
    }

    /// Check if DAD runs in optimistic mode (RFC 4429) for this address.
    pub fn is_optimistic(&self) -> bool {
        self.has_flag(ifa_flags::OPTIMISTIC)
    }

    /// Check if this is a home address (Mobile IPv6).
    pub fn is_home_address(&self) -> bool {
        self.has_flag(ifa_flags::HOMEADDRESS)
    }

    /// Summarize the duplicate address detection flags.
    ///
    /// A tentative address reports `Tentative` even if DADFAILED is also
    /// set. The optimistic flag does not change the state; see
    /// [`is_optimistic`](Self::is_optimistic).
    pub fn dad_state(&self) -> DadState {
        if self.has_flag(ifa_flags::NODAD) {
            DadState::Disabled
        } else if self.has_flag(ifa_flags::TENTATIVE) {
            DadState::Tentative
        } else if self.has_flag(ifa_flags::DADFAILED) {
            DadState::Failed
        } else if self.has_flag(ifa_flags::PERMANENT) {
            DadState::Complete
        } else {
            DadState::Idle
        }
    }
}
