//! Message builder for constructing netlink messages.
//!
//! The builder writes into a caller-owned scratch buffer and never grows it;
//! running out of room is reported as [`Error::BufferFull`].

use zerocopy::{Immutable, IntoBytes};

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NlAttr, append_attribute, nla_align};
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Token returned when starting a nested attribute.
/// Used to finalize the nested attribute length.
#[derive(Debug, Clone, Copy)]
pub struct NestToken {
    /// Offset of the nested attribute header in the buffer.
    offset: usize,
}

/// Builder for constructing netlink messages in a fixed buffer.
#[derive(Debug)]
pub struct MessageBuilder<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> MessageBuilder<'a> {
    /// Start a message with the given type and flags at the front of `buf`.
    pub fn new(buf: &'a mut [u8], msg_type: u16, flags: u16) -> Result<Self> {
        Self::with_header(buf, NlMsgHdr::new(msg_type, flags))
    }

    /// Start a message from an existing header.
    pub fn with_header(buf: &'a mut [u8], header: NlMsgHdr) -> Result<Self> {
        if buf.len() < NLMSG_HDRLEN {
            return Err(Error::BufferFull {
                needed: NLMSG_HDRLEN,
                capacity: buf.len(),
            });
        }
        buf[..NLMSG_HDRLEN].fill(0);
        buf[..std::mem::size_of::<NlMsgHdr>()].copy_from_slice(header.as_bytes());
        Ok(Self {
            buf,
            len: NLMSG_HDRLEN,
        })
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.len == NLMSG_HDRLEN
    }

    /// Size of the scratch buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Append raw bytes to the message (with alignment padding).
    pub fn append_bytes(&mut self, data: &[u8]) -> Result<()> {
        let end = self.len + data.len();
        let aligned = nlmsg_align(end);
        if aligned > self.buf.len() {
            return Err(Error::BufferFull {
                needed: aligned,
                capacity: self.buf.len(),
            });
        }
        self.buf[self.len..end].copy_from_slice(data);
        self.buf[end..aligned].fill(0);
        self.len = aligned;
        Ok(())
    }

    /// Append a fixed-size struct to the message.
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) -> Result<()> {
        self.append_bytes(data.as_bytes())
    }

    /// Append an attribute with the given type and data.
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) -> Result<()> {
        self.len = append_attribute(self.buf, self.len, attr_type, data)?;
        Ok(())
    }

    /// Append a u8 attribute.
    /// Append a u32 attribute (native endian).
    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) -> Result<()> {
        self.append_attr(attr_type, &value.to_ne_bytes())
    }

    /// Append a null-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) -> Result<()> {
        let header = NlAttr::new(attr_type, value.len() + 1)?;
        let start = nla_align(self.len);
        let end = start + header.nla_len as usize;
        if end > self.buf.len() {
            return Err(Error::BufferFull {
                needed: end,
                capacity: self.buf.len(),
            });
        }
        let padded = nla_align(end).min(self.buf.len());
        self.buf[self.len..start].fill(0);
        self.buf[start..start + NLA_HDRLEN].copy_from_slice(header.as_bytes());
        self.buf[start + NLA_HDRLEN..end - 1].copy_from_slice(value.as_bytes());
        self.buf[end - 1..padded].fill(0);
        self.len = padded;
        Ok(())
    }

    /// Start a nested attribute. Returns a token to finalize it.
    pub fn nest_start(&mut self, attr_type: u16) -> Result<NestToken> {
        let offset = nla_align(self.len);
        self.append_attr(attr_type | NLA_F_NESTED, &[])?;
        Ok(NestToken { offset })
    }

    /// End a nested attribute started with `nest_start`.
    pub fn nest_end(&mut self, token: NestToken) -> Result<()> {
        let len = self.len - token.offset;
        if len > u16::MAX as usize {
            return Err(Error::Overflow(len));
        }
        // Update the length in the nested attribute header
        self.buf[token.offset..token.offset + 2].copy_from_slice(&(len as u16).to_ne_bytes());
        Ok(())
    }

    /// Set the message flags.
    pub fn set_flags(&mut self, flags: u16) {
        self.buf[6..8].copy_from_slice(&flags.to_ne_bytes());
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        self.buf[8..12].copy_from_slice(&seq.to_ne_bytes());
    }

    /// Set the port ID.
    pub fn set_pid(&mut self, pid: u32) {
        self.buf[12..16].copy_from_slice(&pid.to_ne_bytes());
    }

    /// Finalize and return the message bytes.
    pub fn finish(self) -> &'a mut [u8] {
        // Update message length in header
        let len = self.len as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        let (msg, _) = self.buf.split_at_mut(self.len);
        msg
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}
