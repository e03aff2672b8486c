//! Netlink attribute (rtattr/nlattr) handling.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    len.wrapping_add(NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    ///
    /// Fails when header plus value does not fit the 16-bit length field.
    pub fn new(attr_type: u16, data_len: usize) -> Result<Self> {
        let len = data_len
            .checked_add(NLA_HDRLEN)
            .filter(|&l| l <= u16::MAX as usize)
            .ok_or(Error::Overflow(data_len))?;
        Ok(Self {
            nla_len: len as u16,
            nla_type: attr_type,
        })
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Read an attribute header from the start of `data`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(a, _)| a)
    }
}

/// Append one attribute to the logical message in `buf[..len]`.
///
/// `buf.len()` is the capacity. The record starts at the aligned end of the
/// current content; alignment gaps are zeroed. Returns the new logical
/// length, aligned unless the padding would run past the capacity.
pub fn append_attribute(buf: &mut [u8], len: usize, attr_type: u16, value: &[u8]) -> Result<usize> {
    let capacity = buf.len();
    let header = NlAttr::new(attr_type, value.len())?;
    let record_len = header.nla_len as usize;

    let start = len
        .checked_add(NLA_ALIGNTO - 1)
        .map(|l| l & !(NLA_ALIGNTO - 1))
        .ok_or(Error::Overflow(len))?;
    let end = start
        .checked_add(record_len)
        .ok_or(Error::Overflow(record_len))?;
    if end > capacity {
        return Err(Error::BufferFull {
            needed: end,
            capacity,
        });
    }

    let padded = nla_align(end).min(capacity);
    buf[len.min(start)..start].fill(0);
    buf[start..start + NLA_HDRLEN].copy_from_slice(header.as_bytes());
    buf[start + NLA_HDRLEN..end].copy_from_slice(value);
    buf[end..padded].fill(0);
    Ok(padded)
}

/// Iterate the attribute records in `range`.
pub fn iterate_attributes(range: &[u8]) -> AttrIter<'_> {
    AttrIter::new(range)
}

/// One decoded attribute record, borrowing its value from the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    nla_type: u16,
    nla_len: u16,
    value: &'a [u8],
}

impl<'a> Attribute<'a> {
    /// Attribute type without the nested/byte-order flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Raw type field, flags included.
    pub fn raw_type(&self) -> u16 {
        self.nla_type
    }

    /// Declared length, header included.
    pub fn declared_len(&self) -> usize {
        self.nla_len as usize
    }

    /// The value bytes.
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Check if the kernel flagged this attribute as nested.
    pub fn is_nested(&self) -> bool {
        self.nla_type & NLA_F_NESTED != 0
    }

    /// Iterate the value as a nested attribute range.
    pub fn nested(&self) -> AttrIter<'a> {
        AttrIter::new(self.value)
    }
}

/// Iterator over netlink attributes in a buffer.
///
/// Cloning restarts from the same position. A record whose declared length
/// is below the header size or past the end of the range, or 1..3 bytes
/// left after the last record, yield [`Error::MalformedAttribute`] once;
/// nothing after it is produced.
#[derive(Debug, Clone)]
pub struct AttrIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Check if there are no more attributes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn malformed(&mut self, reason: String) -> Option<Result<Attribute<'a>>> {
        self.data = &[];
        Some(Err(Error::MalformedAttribute {
            offset: self.offset,
            reason,
        }))
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = Result<Attribute<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let attr = match NlAttr::parse(self.data) {
            Some(a) => a,
            None => {
                return self.malformed(format!("{} stray bytes", self.data.len()));
            }
        };

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN {
            return self.malformed(format!("declared length {} below header size", len));
        }
        if len > self.data.len() {
            return self.malformed(format!(
                "declared length {} exceeds remaining {} bytes",
                len,
                self.data.len()
            ));
        }

        let item = Attribute {
            nla_type: attr.nla_type,
            nla_len: attr.nla_len,
            value: &self.data[NLA_HDRLEN..len],
        };
        let aligned_len = nla_align(len);

        // Padding that runs off the range leaves the stray bytes for the
        // next call to reject.
        let advance = if aligned_len <= self.data.len() {
            aligned_len
        } else {
            len
        };
        self.data = &self.data[advance..];
        self.offset += advance;

        Some(Ok(item))
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        data.first()
            .copied()
            .ok_or_else(|| Error::InvalidAttribute("empty u8 attribute".into()))
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        let bytes: [u8; 4] = data
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::InvalidAttribute("truncated u32 attribute".into()))?;
        Ok(u32::from_ne_bytes(bytes))
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        // Find null terminator or use whole buffer
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }

    /// Extract an IP address of the given family.
    ///
    /// The value must be exactly 4 (AF_INET) or 16 (AF_INET6) bytes.
    pub fn ip_addr(data: &[u8], family: u8) -> Result<IpAddr> {
        match family as i32 {
            libc::AF_INET => <[u8; 4]>::try_from(data)
                .map(|b| IpAddr::V4(Ipv4Addr::from(b)))
                .map_err(|_| {
                    Error::InvalidAttribute(format!("IPv4 address of {} bytes", data.len()))
                }),
            libc::AF_INET6 => <[u8; 16]>::try_from(data)
                .map(|b| IpAddr::V6(Ipv6Addr::from(b)))
                .map_err(|_| {
                    Error::InvalidAttribute(format!("IPv6 address of {} bytes", data.len()))
                }),
            _ => Err(Error::InvalidAttribute(format!(
                "unknown address family: {}",
                family
            ))),
        }
    }
}
