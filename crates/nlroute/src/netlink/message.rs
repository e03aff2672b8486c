//! Netlink message header, framing and parsing.

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
///
/// Wraps on overflow; use [`nlmsg_space`] when the length comes from
/// outside.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    len.wrapping_add(NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Length of a message carrying `payload_len` bytes (NLMSG_LENGTH).
pub fn nlmsg_length(payload_len: usize) -> Result<usize> {
    payload_len
        .checked_add(NLMSG_HDRLEN)
        .ok_or(Error::Overflow(payload_len))
}

/// Aligned frame size for `payload_len` bytes of payload (NLMSG_SPACE).
///
/// Fails instead of wrapping when the size does not fit `usize` or the
/// 32-bit length field of the header.
pub fn nlmsg_space(payload_len: usize) -> Result<usize> {
    let space = nlmsg_length(payload_len)?
        .checked_add(NLMSG_ALIGNTO - 1)
        .ok_or(Error::Overflow(payload_len))?
        & !(NLMSG_ALIGNTO - 1);
    if space > u32::MAX as usize {
        return Err(Error::Overflow(payload_len));
    }
    Ok(space)
}

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type.
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Get the payload length (total length minus header).
    pub fn payload_len(&self) -> usize {
        (self.nlmsg_len as usize).saturating_sub(NLMSG_HDRLEN)
    }

    /// Check if this is an error message.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    /// Check if this is a done message.
    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Check if this message has the multi flag.
    pub fn is_multi(&self) -> bool {
        self.nlmsg_flags & NLM_F_MULTI != 0
    }

    /// Convert header to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Read a header from the start of `data`.
    ///
    /// The header is copied out; nothing borrows `data` afterwards.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(h, _)| h)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Place `header` followed by `payload` at the start of `buf`.
///
/// `nlmsg_len` is set to the unpadded message length; the bytes between the
/// payload and the aligned frame end are zeroed. Returns the aligned frame
/// size.
pub fn write_frame(buf: &mut [u8], header: &NlMsgHdr, payload: &[u8]) -> Result<usize> {
    let space = nlmsg_space(payload.len())?;
    if space > buf.len() {
        return Err(Error::BufferFull {
            needed: space,
            capacity: buf.len(),
        });
    }

    let len = nlmsg_length(payload.len())?;
    let mut hdr = *header;
    hdr.nlmsg_len = len as u32;

    buf[..NLMSG_HDRLEN].fill(0);
    buf[..std::mem::size_of::<NlMsgHdr>()].copy_from_slice(hdr.as_bytes());
    buf[NLMSG_HDRLEN..len].copy_from_slice(payload);
    buf[len..space].fill(0);
    Ok(space)
}

/// Frame `header` and `payload` into a freshly sized buffer.
pub fn frame(header: &NlMsgHdr, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; nlmsg_space(payload.len())?];
    write_frame(&mut buf, header, payload)?;
    Ok(buf)
}

/// Standard netlink message types.
pub struct NlMsgType;

impl NlMsgType {
    /// No operation, message must be discarded.
    pub const NOOP: u16 = 1;
    /// Error message or ACK.
    pub const ERROR: u16 = 2;
    /// End of multipart message.
    pub const DONE: u16 = 3;
    /// Data lost, request resend.
    pub const OVERRUN: u16 = 4;

    // Link messages
    pub const RTM_NEWLINK: u16 = 16;
    pub const RTM_DELLINK: u16 = 17;
    pub const RTM_GETLINK: u16 = 18;

    // Address messages
    pub const RTM_NEWADDR: u16 = 20;
    pub const RTM_DELADDR: u16 = 21;
    pub const RTM_GETADDR: u16 = 22;

    // Route messages
    pub const RTM_NEWROUTE: u16 = 24;
    pub const RTM_DELROUTE: u16 = 25;
    pub const RTM_GETROUTE: u16 = 26;
}

/// Netlink message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_ACK: u16 = 0x04;
pub const NLM_F_ECHO: u16 = 0x08;
pub const NLM_F_DUMP_INTR: u16 = 0x10;

// Modifiers to GET request
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

// Modifiers to NEW request
pub const NLM_F_REPLACE: u16 = 0x100;
pub const NLM_F_EXCL: u16 = 0x200;
pub const NLM_F_CREATE: u16 = 0x400;

/// Iterator over netlink messages in a received chunk.
///
/// Every message must be complete: a header that does not fit, a length
/// smaller than the header or larger than what is left, and stray trailing
/// bytes all yield [`Error::Truncated`] once, after which iteration stops.
#[derive(Debug, Clone)]
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    /// Create a new message iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn fail(&mut self, expected: usize) -> Option<Result<(NlMsgHdr, &'a [u8])>> {
        let actual = self.data.len();
        self.data = &[];
        Some(Err(Error::Truncated { expected, actual }))
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let header = match NlMsgHdr::parse(self.data) {
            Ok(h) => h,
            Err(_) => return self.fail(NLMSG_HDRLEN),
        };

        let msg_len = header.nlmsg_len as usize;
        if msg_len < NLMSG_HDRLEN {
            return self.fail(NLMSG_HDRLEN);
        }
        if msg_len > self.data.len() {
            return self.fail(msg_len);
        }

        let payload = &self.data[NLMSG_HDRLEN..msg_len];
        let aligned_len = nlmsg_align(msg_len);

        // Padding that runs off the chunk leaves the stray bytes for the
        // next call to reject.
        let advance = if aligned_len <= self.data.len() {
            aligned_len
        } else {
            msg_len
        };
        self.data = &self.data[advance..];

        Some(Ok((header, payload)))
    }
}

/// Netlink error message payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Error code (negative errno or 0 for ACK).
    pub error: i32,
    /// Original message header that caused the error.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    /// Parse error message from payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(e, _)| e)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }

    /// Check if this is an ACK (no error).
    pub fn is_ack(&self) -> bool {
        self.error == 0
    }

}
