//! Address string parsing.
//!
//! IPv4 input follows the old iproute convention rather than `inet_aton`:
//! missing trailing components are zero, so `10.8` is `10.8.0.0`, and each
//! component may be written in hex (`0x0a`) or octal (`012`).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use winnow::ascii::{digit1, hex_digit1};
use winnow::combinator::{alt, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

const AF_INET: u8 = libc::AF_INET as u8;
const AF_INET6: u8 = libc::AF_INET6 as u8;

/// Error type for address parsing.
#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid prefix length: {0}")]
    InvalidPrefix(String),

    #[error("address {addr} does not belong to family {family}")]
    FamilyMismatch { addr: String, family: u8 },

    #[error("unsupported address family: {0}")]
    UnsupportedFamily(u8),
}

pub type Result<T> = std::result::Result<T, AddrError>;

type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// A parsed address or prefix in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InetPrefix {
    family: u8,
    data: [u8; 16],
    byte_len: usize,
    bit_len: u8,
}

impl InetPrefix {
    fn new(family: u8, bytes: &[u8], bit_len: u8) -> Self {
        let mut data = [0u8; 16];
        data[..bytes.len()].copy_from_slice(bytes);
        Self {
            family,
            data,
            byte_len: bytes.len(),
            bit_len,
        }
    }

    /// Address family (AF_INET or AF_INET6).
    pub fn family(&self) -> u8 {
        self.family
    }

    /// Address bytes in network order; empty for the `default` prefix.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.byte_len]
    }

    /// Prefix length in bits.
    pub fn bit_len(&self) -> u8 {
        self.bit_len
    }

    /// Check if this is the zero-length `default` prefix.
    pub fn is_default(&self) -> bool {
        self.byte_len == 0
    }

    /// The address as an [`IpAddr`], when bytes are present.
    pub fn ip_addr(&self) -> Option<IpAddr> {
        match (self.family, self.byte_len) {
            (AF_INET, 4) => {
                let octets: [u8; 4] = self.data[..4].try_into().ok()?;
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            (AF_INET6, 16) => Some(IpAddr::V6(Ipv6Addr::from(self.data))),
            _ => None,
        }
    }
}

fn is_any_token(s: &str) -> bool {
    matches!(s, "default" | "any" | "all")
}

fn full_bits(family: u8) -> u8 {
    if family == AF_INET6 { 128 } else { 32 }
}

/// One dotted component, read like `strtoul(.., 0)`.
fn number(input: &mut &str) -> PResult<u64> {
    alt((
        preceded(alt(("0x", "0X")), hex_digit1).try_map(|d: &str| u64::from_str_radix(d, 16)),
        preceded('0', take_while(0.., '0'..='7')).try_map(|d: &str| {
            if d.is_empty() {
                Ok(0)
            } else {
                u64::from_str_radix(d, 8)
            }
        }),
        digit1.try_map(|d: &str| d.parse::<u64>()),
    ))
    .parse_next(input)
}

fn component(input: &mut &str) -> PResult<u8> {
    let value = number(input)?;
    u8::try_from(value).map_err(|_| ErrMode::Cut(ContextError::new()))
}

fn dot(input: &mut &str) -> PResult<char> {
    '.'.parse_next(input)
}

/// Up to four components separated by dots; missing ones are zero.
fn ipv4_legacy(input: &mut &str) -> PResult<[u8; 4]> {
    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = component(input)?;
        if input.is_empty() {
            break;
        }
        if i == 3 {
            return Err(ErrMode::Cut(ContextError::new()));
        }
        dot(input)?;
    }
    Ok(octets)
}

/// Parse a legacy dotted IPv4 address.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr> {
    let mut input = s;
    match ipv4_legacy(&mut input) {
        Ok(octets) if input.is_empty() => Ok(Ipv4Addr::from(octets)),
        _ => Err(AddrError::InvalidAddress(s.to_string())),
    }
}

/// Parse a single address.
///
/// `default`, `any` and `all` give the zero address of `family`. Without a
/// family, input containing `:` is IPv6 and anything else IPv4 (the tokens
/// included). The bit length is always the full address width.
pub fn parse_address(s: &str, family: Option<u8>) -> Result<InetPrefix> {
    if let Some(f) = family
        && f != AF_INET
        && f != AF_INET6
    {
        return Err(AddrError::UnsupportedFamily(f));
    }

    if is_any_token(s) {
        let family = family.unwrap_or(AF_INET);
        let len = if family == AF_INET6 { 16 } else { 4 };
        return Ok(InetPrefix::new(family, &[0u8; 16][..len], full_bits(family)));
    }

    let parsed = if s.contains(':') {
        let addr: Ipv6Addr = s
            .parse()
            .map_err(|_| AddrError::InvalidAddress(s.to_string()))?;
        InetPrefix::new(AF_INET6, &addr.octets(), 128)
    } else {
        InetPrefix::new(AF_INET, &parse_ipv4(s)?.octets(), 32)
    };

    match family {
        Some(f) if f != parsed.family => Err(AddrError::FamilyMismatch {
            addr: s.to_string(),
            family: f,
        }),
        _ => Ok(parsed),
    }
}

/// Parse a prefix: an address with optional `/len`.
///
/// `default`, `any` and `all` give the zero-length prefix with no address
/// bytes. Without `/len` the prefix covers the full address.
pub fn parse_prefix(s: &str, family: Option<u8>) -> Result<InetPrefix> {
    if is_any_token(s) {
        if let Some(f) = family
            && f != AF_INET
            && f != AF_INET6
        {
            return Err(AddrError::UnsupportedFamily(f));
        }
        return Ok(InetPrefix::new(family.unwrap_or(AF_INET), &[], 0));
    }

    let Some((addr, len)) = s.split_once('/') else {
        return parse_address(s, family);
    };

    let mut prefix = parse_address(addr, family)?;
    let bits: u8 = len
        .parse()
        .map_err(|_| AddrError::InvalidPrefix(len.to_string()))?;
    let max = full_bits(prefix.family);
    if bits > max {
        return Err(AddrError::InvalidPrefix(format!(
            "{} exceeds maximum {} for address family",
            bits, max
        )));
    }
    prefix.bit_len = bits;
    Ok(prefix)
}
