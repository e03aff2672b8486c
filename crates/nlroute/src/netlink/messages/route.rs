//! Decoded route message and dump filtering.

use std::net::IpAddr;

use crate::netlink::attr::{get, iterate_attributes};
use crate::netlink::error::{Error, Result};
use crate::netlink::types::addr::Scope;
use crate::netlink::types::route::{RT_TABLE_MAIN, RtMsg, RtaAttr};

/// What a route dump does with messages outside the requested family/table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Fail the dump on the first foreign route.
    #[default]
    Strict,
    /// Skip foreign routes.
    Permissive,
}

/// Family and table a route dump is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteFilter {
    /// Address family.
    pub family: u8,
    /// Routing table id.
    pub table: u32,
    /// Handling of routes that do not match.
    pub mode: MatchMode,
}

impl RouteFilter {
    /// Routes of `family` in the main table, strict matching.
    pub fn main(family: u8) -> Self {
        Self {
            family,
            table: RT_TABLE_MAIN,
            mode: MatchMode::Strict,
        }
    }

    /// Set the table.
    pub fn table(mut self, table: u32) -> Self {
        self.table = table;
        self
    }

    /// Skip foreign routes instead of failing.
    pub fn permissive(mut self) -> Self {
        self.mode = MatchMode::Permissive;
        self
    }

    /// Check a decoded route against the filter.
    ///
    /// Returns `Ok(false)` for a foreign route in permissive mode.
    pub fn check(&self, route: &RouteRecord) -> Result<bool> {
        if route.family == self.family && route.table == self.table {
            return Ok(true);
        }
        match self.mode {
            MatchMode::Strict => Err(Error::UnexpectedRoute {
                family: route.family,
                table: route.table,
            }),
            MatchMode::Permissive => Ok(false),
        }
    }
}

/// One route from an RTM_NEWROUTE message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteRecord {
    pub(crate) family: u8,
    pub(crate) table: u32,
    pub(crate) dst_len: u8,
    pub(crate) destination: Option<IpAddr>,
    pub(crate) gateway: Option<IpAddr>,
    pub(crate) oif: Option<u32>,
    pub(crate) oif_name: Option<String>,
    pub(crate) prefsrc: Option<IpAddr>,
    pub(crate) priority: Option<u32>,
    pub(crate) scope: Scope,
    pub(crate) protocol: u8,
    pub(crate) route_type: u8,
}

impl RouteRecord {
    /// Decode the payload of a route message (rtmsg plus attributes).
    ///
    /// Every attribute is visited. The output interface index is turned
    /// into a name through `resolve_name`.
    pub fn decode(payload: &[u8], resolve_name: &dyn Fn(u32) -> Option<String>) -> Result<Self> {
        let header = RtMsg::from_bytes(payload)?;
        let family = header.rtm_family;

        let mut record = Self {
            family,
            table: header.rtm_table as u32,
            dst_len: header.rtm_dst_len,
            destination: None,
            gateway: None,
            oif: None,
            oif_name: None,
            prefsrc: None,
            priority: None,
            scope: Scope::from(header.rtm_scope),
            protocol: header.rtm_protocol,
            route_type: header.rtm_type,
        };

        for attr in iterate_attributes(&payload[RtMsg::SIZE..]) {
            let attr = attr?;
            let data = attr.value();
            match RtaAttr::from(attr.kind()) {
                RtaAttr::Dst => record.destination = Some(get::ip_addr(data, family)?),
                RtaAttr::Gateway => record.gateway = Some(get::ip_addr(data, family)?),
                RtaAttr::Prefsrc => record.prefsrc = Some(get::ip_addr(data, family)?),
                RtaAttr::Oif => {
                    let index = get::u32_ne(data)?;
                    record.oif = Some(index);
                    record.oif_name = resolve_name(index);
                }
                RtaAttr::Priority => record.priority = Some(get::u32_ne(data)?),
                RtaAttr::Table => record.table = get::u32_ne(data)?,
                RtaAttr::Src | RtaAttr::Iif | RtaAttr::Other(_) => {
                    tracing::trace!(kind = attr.kind(), "skipping route attribute");
                }
            }
        }

        Ok(record)
    }

    /// Get the address family.
    pub fn family(&self) -> u8 {
        self.family
    }

    /// Get the routing table id.
    pub fn table(&self) -> u32 {
        self.table
    }

    /// Get the destination prefix length.
    pub fn dst_len(&self) -> u8 {
        self.dst_len
    }

    /// Get the destination address.
    pub fn destination(&self) -> Option<&IpAddr> {
        self.destination.as_ref()
    }

    /// Get the gateway address.
    pub fn gateway(&self) -> Option<&IpAddr> {
        self.gateway.as_ref()
    }

    /// Get the output interface index.
    pub fn oif(&self) -> Option<u32> {
        self.oif
    }

    /// Get the output interface name, if it could be resolved.
    pub fn oif_name(&self) -> Option<&str> {
        self.oif_name.as_deref()
    }

    /// Get the preferred source address.
    pub fn prefsrc(&self) -> Option<&IpAddr> {
        self.prefsrc.as_ref()
    }

    /// Get the priority/metric.
    pub fn priority(&self) -> Option<u32> {
        self.priority
    }

    /// Get the route scope.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Get the route protocol (RTPROT_*).
    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    /// Get the route type (RTN_*).
    pub fn route_type(&self) -> u8 {
        self.route_type
    }

    /// Check if this is a default route.
    pub fn is_default(&self) -> bool {
        self.dst_len == 0
    }
}
