//! Blocking request/response sessions over a netlink transport.
//!
//! A [`RequestSession`] owns its transport, stamps every outbound request
//! with a fresh sequence number and the kernel-assigned port id, and
//! reassembles multi-part dump responses.
//!
//! # Example
//!
//! ```ignore
//! use nlroute::netlink::{RequestSession, RouteFilter};
//! use nlroute::util::ifname::index_to_name;
//!
//! let mut session = RequestSession::open()?;
//! let filter = RouteFilter::main(libc::AF_INET as u8).permissive();
//! if let Some(route) = session.first_gateway(&filter, &|i| index_to_name(i).ok())? {
//!     println!("gateway {:?} via {:?}", route.gateway(), route.oif_name());
//! }
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::BytesMut;

use super::error::{Error, Result};
use super::message::{MessageIter, NLM_F_ACK, NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType};
use super::messages::{AddressRecord, RouteFilter, RouteRecord};
use super::request::{REQUEST_BUFFER_SIZE, build_address_create, build_dump_request};
use super::socket::{NetlinkSocket, Protocol, Transport};

const AF_INET: u8 = libc::AF_INET as u8;
const AF_INET6: u8 = libc::AF_INET6 as u8;

/// Default receive buffer size.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 32768;

/// Lifecycle of a [`RequestSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport released.
    Closed,
    /// Transport created, not bound yet.
    Open,
    /// Bound, no request outstanding.
    Idle,
    /// A request was sent and its response has not been consumed.
    AwaitingResponse,
}

/// Tunables for a [`RequestSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    recv_buffer_size: usize,
    recv_timeout: Option<Duration>,
    initial_seq: Option<u32>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            recv_timeout: None,
            initial_seq: None,
        }
    }
}

impl SessionOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the receive buffer size.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size.max(NLMSG_HDRLEN);
        self
    }

    /// Bound each blocking receive on the kernel socket.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Sequence number of the first request.
    ///
    /// Defaults to the current wall-clock time in seconds.
    pub fn initial_seq(mut self, seq: u32) -> Self {
        self.initial_seq = Some(seq);
        self
    }
}

fn clock_seq() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(1)
}

/// One logical netlink session.
#[derive(Debug)]
pub struct RequestSession<T: Transport = NetlinkSocket> {
    transport: Option<T>,
    port_id: u32,
    next_seq: u32,
    pending: Option<u32>,
    state: SessionState,
    buf: BytesMut,
    recv_buffer_size: usize,
}

impl RequestSession<NetlinkSocket> {
    /// Open and bind a NETLINK_ROUTE session with default options.
    pub fn open() -> Result<Self> {
        Self::open_with(SessionOptions::default())
    }

    /// Open and bind a NETLINK_ROUTE session.
    pub fn open_with(options: SessionOptions) -> Result<Self> {
        let mut socket = NetlinkSocket::open(Protocol::Route)?;
        if let Some(timeout) = options.recv_timeout {
            socket.set_recv_timeout(timeout)?;
        }
        let mut session = Self::with_options(socket, options);
        session.bind()?;
        Ok(session)
    }
}

impl<T: Transport> RequestSession<T> {
    /// Wrap an unbound transport with default options.
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, SessionOptions::default())
    }

    /// Wrap an unbound transport.
    ///
    /// The receive timeout option only applies to sessions created with
    /// [`RequestSession::open_with`].
    pub fn with_options(transport: T, options: SessionOptions) -> Self {
        Self {
            transport: Some(transport),
            port_id: 0,
            next_seq: options.initial_seq.unwrap_or_else(clock_seq),
            pending: None,
            state: SessionState::Open,
            buf: BytesMut::with_capacity(options.recv_buffer_size),
            recv_buffer_size: options.recv_buffer_size,
        }
    }

    /// Bind the transport and record the kernel-assigned port id.
    pub fn bind(&mut self) -> Result<u32> {
        self.expect(SessionState::Open)?;
        let actual = self.state;
        let transport = self.transport.as_mut().ok_or(Error::InvalidState {
            expected: SessionState::Open,
            actual,
        })?;
        let port_id = transport.bind()?;
        self.port_id = port_id;
        self.state = SessionState::Idle;
        Ok(port_id)
    }

    /// Get the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the local port id (0 until bound).
    pub fn port_id(&self) -> u32 {
        self.port_id
    }

    /// Sequence number the next request will carry.
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Get the underlying transport, if the session is not closed.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Release the transport. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            tracing::debug!(port_id = self.port_id, "netlink session closed");
        }
        self.pending = None;
        self.state = SessionState::Closed;
    }

    fn wrong_state(&self, expected: SessionState) -> Error {
        Error::InvalidState {
            expected,
            actual: self.state,
        }
    }

    fn expect(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.wrong_state(expected))
        }
    }

    /// Stamp `msg` with the next sequence number and the port id, then send it.
    ///
    /// Returns the sequence number used. The session waits for a response
    /// afterwards; no retry happens on failure.
    pub fn send_request(&mut self, msg: &mut [u8]) -> Result<u32> {
        self.expect(SessionState::Idle)?;
        if msg.len() < NLMSG_HDRLEN {
            return Err(Error::InvalidMessage(format!(
                "request of {} bytes has no header",
                msg.len()
            )));
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        msg[8..12].copy_from_slice(&seq.to_ne_bytes());
        msg[12..16].copy_from_slice(&self.port_id.to_ne_bytes());

        let header = NlMsgHdr::parse(msg)?;
        tracing::debug!(
            msg_type = header.nlmsg_type,
            flags = header.nlmsg_flags,
            seq,
            len = msg.len(),
            "sending netlink request"
        );

        let actual = self.state;
        let transport = self.transport.as_mut().ok_or(Error::InvalidState {
            expected: SessionState::Idle,
            actual,
        })?;
        let written = transport.send(msg).map_err(Error::Send)?;
        if written != msg.len() {
            return Err(Error::ShortSend {
                written,
                expected: msg.len(),
            });
        }

        self.pending = Some(seq);
        self.state = SessionState::AwaitingResponse;
        Ok(seq)
    }

    /// Receive the response to the pending dump request.
    ///
    /// Each data message is handed to `on_message` until the done marker
    /// arrives. Returns the number of messages delivered. The session is
    /// idle again afterwards, whether or not the dump succeeded.
    pub fn receive_dump<F>(&mut self, mut on_message: F) -> Result<usize>
    where
        F: FnMut(&NlMsgHdr, &[u8]) -> Result<()>,
    {
        let mut delivered = 0;
        self.receive_until(|header, payload| match header.nlmsg_type {
            NlMsgType::NOOP => Ok(false),
            NlMsgType::ERROR => {
                let err = NlMsgError::parse(payload)?;
                if !err.is_ack() {
                    return Err(Error::from_errno(err.error));
                }
                Ok(false)
            }
            NlMsgType::DONE => Ok(true),
            NlMsgType::OVERRUN => Err(Error::InvalidMessage("dump overrun".into())),
            _ => {
                on_message(header, payload)?;
                delivered += 1;
                Ok(false)
            }
        })?;
        tracing::debug!(messages = delivered, "dump complete");
        Ok(delivered)
    }

    /// Send `msg` with NLM_F_ACK set and wait for the kernel's verdict.
    pub fn request_ack(&mut self, msg: &mut [u8]) -> Result<()> {
        if msg.len() >= NLMSG_HDRLEN {
            let flags = u16::from_ne_bytes([msg[6], msg[7]]) | NLM_F_ACK;
            msg[6..8].copy_from_slice(&flags.to_ne_bytes());
        }
        self.send_request(msg)?;
        self.receive_until(|header, payload| {
            if header.nlmsg_type != NlMsgType::ERROR {
                return Ok(false);
            }
            let err = NlMsgError::parse(payload)?;
            if err.is_ack() {
                Ok(true)
            } else {
                Err(Error::from_errno(err.error))
            }
        })
    }

    /// Feed messages answering the pending request to `step` until it
    /// reports completion.
    fn receive_until<F>(&mut self, step: F) -> Result<()>
    where
        F: FnMut(&NlMsgHdr, &[u8]) -> Result<bool>,
    {
        self.expect(SessionState::AwaitingResponse)?;
        let seq = match self.pending {
            Some(seq) => seq,
            None => return Err(self.wrong_state(SessionState::AwaitingResponse)),
        };

        let result = self.pump(seq, step);
        self.pending = None;
        if self.transport.is_some() {
            self.state = SessionState::Idle;
        }
        result
    }

    fn pump<F>(&mut self, seq: u32, mut step: F) -> Result<()>
    where
        F: FnMut(&NlMsgHdr, &[u8]) -> Result<bool>,
    {
        let size = self.recv_buffer_size;
        let transport = self.transport.as_mut().ok_or(Error::InvalidState {
            expected: SessionState::AwaitingResponse,
            actual: SessionState::Closed,
        })?;

        loop {
            self.buf.clear();
            self.buf.reserve(size);
            let n = transport.recv(&mut self.buf)?;
            tracing::trace!(bytes = n, "received chunk");
            if n < NLMSG_HDRLEN {
                return Err(Error::Truncated {
                    expected: NLMSG_HDRLEN,
                    actual: n,
                });
            }
            let chunk = self.buf.get(..n).ok_or(Error::Truncated {
                expected: n,
                actual: self.buf.len(),
            })?;

            for result in MessageIter::new(chunk) {
                let (header, payload) = result?;
                if header.nlmsg_seq != seq {
                    tracing::debug!(
                        seq = header.nlmsg_seq,
                        expected = seq,
                        msg_type = header.nlmsg_type,
                        "skipping message for another request"
                    );
                    continue;
                }
                if step(&header, payload)? {
                    return Ok(());
                }
            }
        }
    }

    // ========================================================================
    // Address and route operations
    // ========================================================================

    /// Dump the addresses of `family` (AF_UNSPEC for all).
    ///
    /// Records of families other than IPv4 and IPv6 are skipped.
    pub fn dump_addresses(&mut self, family: u8) -> Result<Vec<AddressRecord>> {
        let mut scratch = [0u8; REQUEST_BUFFER_SIZE];
        let msg = build_dump_request(&mut scratch, NlMsgType::RTM_GETADDR, family, 0)?;
        self.send_request(msg)?;

        let mut addresses = Vec::new();
        self.receive_dump(|header, payload| {
            if header.nlmsg_type != NlMsgType::RTM_NEWADDR {
                return Ok(());
            }
            // Only IPv4/IPv6 records decode into IP addresses.
            if let Some(&family) = payload.first()
                && family != AF_INET
                && family != AF_INET6
            {
                tracing::trace!(family, "skipping non-IP address record");
                return Ok(());
            }
            addresses.push(AddressRecord::decode(payload)?);
            Ok(())
        })?;
        Ok(addresses)
    }

    /// Dump the routes matching `filter`.
    ///
    /// Output interface indexes are named through `resolve_name`.
    pub fn dump_routes(
        &mut self,
        filter: &RouteFilter,
        resolve_name: &dyn Fn(u32) -> Option<String>,
    ) -> Result<Vec<RouteRecord>> {
        let mut scratch = [0u8; REQUEST_BUFFER_SIZE];
        let msg = build_dump_request(&mut scratch, NlMsgType::RTM_GETROUTE, filter.family, 0)?;
        self.send_request(msg)?;

        let mut routes = Vec::new();
        self.receive_dump(|header, payload| {
            if header.nlmsg_type != NlMsgType::RTM_NEWROUTE {
                return Ok(());
            }
            let route = RouteRecord::decode(payload, resolve_name)?;
            if filter.check(&route)? {
                routes.push(route);
            }
            Ok(())
        })?;
        Ok(routes)
    }

    /// Find the first route matching `filter` that has a gateway.
    ///
    /// Messages after the match are read off the socket but not decoded.
    pub fn first_gateway(
        &mut self,
        filter: &RouteFilter,
        resolve_name: &dyn Fn(u32) -> Option<String>,
    ) -> Result<Option<RouteRecord>> {
        let mut scratch = [0u8; REQUEST_BUFFER_SIZE];
        let msg = build_dump_request(&mut scratch, NlMsgType::RTM_GETROUTE, filter.family, 0)?;
        self.send_request(msg)?;

        let mut found = None;
        self.receive_dump(|header, payload| {
            if found.is_some() || header.nlmsg_type != NlMsgType::RTM_NEWROUTE {
                return Ok(());
            }
            let route = RouteRecord::decode(payload, resolve_name)?;
            if filter.check(&route)? && route.gateway().is_some() {
                found = Some(route);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// Add `local`/`prefix_len` to interface `ifindex` and wait for the ACK.
    pub fn add_address(&mut self, family: u8, prefix_len: u8, ifindex: u32, local: &[u8]) -> Result<()> {
        let mut scratch = [0u8; REQUEST_BUFFER_SIZE];
        let msg = build_address_create(&mut scratch, family, prefix_len, ifindex, local)?;
        self.request_ack(msg)
            .map_err(|e| e.with_context(format!("adding address on interface {}", ifindex)))
    }
}
