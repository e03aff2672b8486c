//! Low-level blocking netlink socket operations.

use std::io;
use std::mem;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};

use super::error::{Error, Result};

/// Netlink protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Routing/device hook (addresses, routes, links)
    Route,
}

impl Protocol {
    fn as_isize(self) -> isize {
        match self {
            Protocol::Route => protocols::NETLINK_ROUTE,
        }
    }
}

/// Validate what getsockname returned and extract the port id.
fn check_local(len: libc::socklen_t, addr: &libc::sockaddr_nl) -> Result<u32> {
    if len as usize != mem::size_of::<libc::sockaddr_nl>() {
        return Err(Error::Bind(format!("unexpected address length {}", len)));
    }
    if addr.nl_family as libc::c_int != libc::AF_NETLINK {
        return Err(Error::Bind(format!(
            "unexpected address family {}",
            addr.nl_family
        )));
    }
    Ok(addr.nl_pid)
}

/// Byte transport under a [`RequestSession`](super::RequestSession).
///
/// Implemented by [`NetlinkSocket`] for the kernel and by scripted
/// transports in tests.
pub trait Transport {
    /// Bind to a kernel-assigned local address and return the port id.
    fn bind(&mut self) -> Result<u32>;

    /// Send one datagram; returns the number of bytes accepted.
    fn send(&mut self, msg: &[u8]) -> io::Result<usize>;

    /// Receive one datagram into `buf`, which is cleared first.
    fn recv(&mut self, buf: &mut BytesMut) -> io::Result<usize>;
}

/// Blocking netlink socket.
pub struct NetlinkSocket {
    socket: Socket,
    protocol: Protocol,
}

impl NetlinkSocket {
    /// Create a new, unbound netlink socket for the given protocol.
    pub fn open(protocol: Protocol) -> Result<Self> {
        let socket = Socket::new(protocol.as_isize()).map_err(Error::Socket)?;
        Ok(Self { socket, protocol })
    }

    /// Get the protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Bound every blocking receive to `timeout`.
    ///
    /// A receive that times out fails with `WouldBlock`.
    pub fn set_recv_timeout(&mut self, timeout: Duration) -> Result<()> {
        let tv = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };
        // SAFETY: the fd is a live socket owned by self and tv points to a
        // timeval of the size passed.
        let ret = unsafe {
            libc::setsockopt(
                self.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &tv as *const libc::timeval as *const libc::c_void,
                mem::size_of::<libc::timeval>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Read back the local port id with getsockname.
    fn local_port_id(&self) -> Result<u32> {
        // SAFETY: sockaddr_nl is plain data; all-zero is a valid value.
        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        let mut len = mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;
        // SAFETY: addr and len are valid for writes and len holds the size
        // of addr.
        let ret = unsafe {
            libc::getsockname(
                self.as_raw_fd(),
                &mut addr as *mut libc::sockaddr_nl as *mut libc::sockaddr,
                &mut len,
            )
        };
        if ret < 0 {
            return Err(Error::Bind(format!(
                "getsockname: {}",
                io::Error::last_os_error()
            )));
        }
        check_local(len, &addr)
    }
}

impl Transport for NetlinkSocket {
    fn bind(&mut self) -> Result<u32> {
        let addr = SocketAddr::new(0, 0);
        self.socket
            .bind(&addr)
            .map_err(|e| Error::Bind(e.to_string()))?;
        let port_id = self.local_port_id()?;
        tracing::debug!(port_id, "netlink socket bound");
        Ok(port_id)
    }

    fn send(&mut self, msg: &[u8]) -> io::Result<usize> {
        self.socket.send(msg, 0)
    }

    fn recv(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        buf.clear();
        self.socket.recv(buf, 0)
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl std::fmt::Debug for NetlinkSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlinkSocket")
            .field("fd", &self.as_raw_fd())
            .field("protocol", &self.protocol)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn netlink_addr(family: libc::c_int, pid: u32) -> libc::sockaddr_nl {
        // SAFETY: sockaddr_nl is plain data; all-zero is a valid value.
        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = family as libc::sa_family_t;
        addr.nl_pid = pid;
        addr
    }

    const NL_LEN: libc::socklen_t = mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;

    #[test]
    fn test_protocol_numbers() {
        assert_eq!(Protocol::Route.as_isize(), 0);
    }

    #[test]
    fn test_check_local() {
        assert_eq!(check_local(NL_LEN, &netlink_addr(libc::AF_NETLINK, 4242)).unwrap(), 4242);
    }

    #[test]
    fn test_check_local_wrong_length() {
        let addr = netlink_addr(libc::AF_NETLINK, 1);
        let err = check_local(NL_LEN - 4, &addr).unwrap_err();
        assert!(matches!(err, Error::Bind(ref msg) if msg.contains("length")));
    }

    #[test]
    fn test_check_local_wrong_family() {
        let addr = netlink_addr(libc::AF_INET, 1);
        let err = check_local(NL_LEN, &addr).unwrap_err();
        assert!(matches!(err, Error::Bind(ref msg) if msg.contains("family")));
    }
}
