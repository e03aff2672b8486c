//! Request builders for dumps and address creation.
//!
//! Builders write into a caller-owned scratch buffer and return the framed
//! message as a sub-slice of it; the session stamps sequence number and port
//! id at send time.

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REQUEST, NlMsgType};
use super::types::addr::{IfAddrMsg, IfaAttr, Scope};
use super::types::route::RtMsg;

/// Size of struct ifinfomsg.
const IFINFOMSG_SIZE: usize = 16;

/// Size of struct rtgenmsg.
const RTGENMSG_SIZE: usize = 1;

/// Scratch size that fits every request built here.
pub const REQUEST_BUFFER_SIZE: usize = 64;

/// Fixed payload length a dump of `msg_type` carries.
fn dump_payload_len(msg_type: u16) -> usize {
    match msg_type {
        NlMsgType::RTM_GETADDR => IfAddrMsg::SIZE,
        NlMsgType::RTM_GETROUTE => RtMsg::SIZE,
        NlMsgType::RTM_GETLINK => IFINFOMSG_SIZE,
        _ => RTGENMSG_SIZE,
    }
}

/// Build a dump request for `msg_type` restricted to `family`.
///
/// The payload is the fixed header of the requested kind with only the
/// family byte set.
pub fn build_dump_request(buf: &mut [u8], msg_type: u16, family: u8, seq: u32) -> Result<&mut [u8]> {
    let mut fixed = [0u8; IFINFOMSG_SIZE];
    fixed[0] = family;

    let mut builder = MessageBuilder::new(buf, msg_type, NLM_F_REQUEST | NLM_F_DUMP)?;
    builder.append_bytes(&fixed[..dump_payload_len(msg_type)])?;
    builder.set_seq(seq);
    Ok(builder.finish())
}

/// Build an RTM_NEWADDR request adding `local`/`prefix_len` on `ifindex`.
///
/// The request refuses to replace an existing address. `local` must be 4
/// or 16 bytes to be accepted by the kernel; it is copied as given.
pub fn build_address_create<'a>(
    buf: &'a mut [u8],
    family: u8,
    prefix_len: u8,
    ifindex: u32,
    local: &[u8],
) -> Result<&'a mut [u8]> {
    let header = IfAddrMsg::new()
        .with_family(family)
        .with_prefixlen(prefix_len)
        .with_scope(Scope::Global)
        .with_index(ifindex);

    let mut builder = MessageBuilder::new(
        buf,
        NlMsgType::RTM_NEWADDR,
        NLM_F_REQUEST | NLM_F_CREATE | NLM_F_EXCL,
    )?;
    builder.append(&header)?;

    let attr_type = u16::from(IfaAttr::Local);
    builder
        .append_attr(attr_type, local)
        .map_err(|e| match e {
            Error::BufferFull { needed, capacity } => Error::AttributeOverflow {
                attr_type,
                needed,
                capacity,
            },
            other => other,
        })?;
    Ok(builder.finish())
}

/// Pick the interface index for a request.
///
/// An explicit index wins; otherwise `default` is asked for one.
pub fn resolve_ifindex(explicit: Option<u32>, default: impl FnOnce() -> Option<u32>) -> Result<u32> {
    match explicit {
        Some(index) => Ok(index),
        None => default().ok_or_else(|| {
            Error::NoDefaultInterface("no interface given and no default available".into())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::iterate_attributes;
    use crate::netlink::message::{NLMSG_HDRLEN, NlMsgHdr};

    #[test]
    fn test_dump_request_addr() {
        let mut buf = [0xFFu8; REQUEST_BUFFER_SIZE];
        let msg = build_dump_request(&mut buf, NlMsgType::RTM_GETADDR, libc::AF_INET6 as u8, 7)
            .unwrap();
        assert_eq!(msg.len(), NLMSG_HDRLEN + 8);

        let header = NlMsgHdr::parse(msg).unwrap();
        assert_eq!(header.nlmsg_len, 24);
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_GETADDR);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_DUMP);
        assert_eq!(header.nlmsg_seq, 7);
        assert_eq!(&msg[16..24], &[10, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_dump_request_route_and_link() {
        let mut buf = [0u8; REQUEST_BUFFER_SIZE];
        let msg = build_dump_request(&mut buf, NlMsgType::RTM_GETROUTE, 2, 1).unwrap();
        assert_eq!(msg.len(), NLMSG_HDRLEN + 12);
        assert_eq!(msg[16], 2);

        let msg = build_dump_request(&mut buf, NlMsgType::RTM_GETLINK, 0, 1).unwrap();
        assert_eq!(msg.len(), NLMSG_HDRLEN + 16);

        // rtgenmsg is padded to the alignment boundary.
        let msg = build_dump_request(&mut buf, 34, 2, 1).unwrap();
        assert_eq!(msg.len(), NLMSG_HDRLEN + 4);
    }

    #[test]
    fn test_dump_request_too_small() {
        let mut buf = [0u8; 20];
        assert!(matches!(
            build_dump_request(&mut buf, NlMsgType::RTM_GETROUTE, 2, 1),
            Err(Error::BufferFull { .. })
        ));
    }

    #[test]
    fn test_address_create() {
        let mut buf = [0u8; REQUEST_BUFFER_SIZE];
        let msg = build_address_create(&mut buf, 2, 32, 1, &[127, 0, 0, 2]).unwrap();
        assert_eq!(msg.len(), NLMSG_HDRLEN + 8 + 8);

        let header = NlMsgHdr::parse(msg).unwrap();
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_NEWADDR);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_CREATE | NLM_F_EXCL);

        let ifa = IfAddrMsg::from_bytes(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(ifa.ifa_prefixlen, 32);
        assert_eq!(ifa.ifa_scope, 0);
        assert_eq!(ifa.ifa_index, 1);

        let attr = iterate_attributes(&msg[NLMSG_HDRLEN + 8..])
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(attr.kind(), 2);
        assert_eq!(attr.value(), &[127, 0, 0, 2]);
    }

    #[test]
    fn test_address_create_overflow() {
        let mut buf = [0u8; 28];
        assert!(matches!(
            build_address_create(&mut buf, 10, 64, 2, &[0; 16]),
            Err(Error::AttributeOverflow {
                attr_type: 2,
                needed: 44,
                capacity: 28
            })
        ));
    }

    #[test]
    fn test_resolve_ifindex() {
        assert_eq!(resolve_ifindex(Some(3), || None).unwrap(), 3);
        assert_eq!(resolve_ifindex(None, || Some(2)).unwrap(), 2);
        let err = resolve_ifindex(None, || None).unwrap_err();
        assert!(matches!(err, Error::NoDefaultInterface(_)));
        assert!(err.is_not_found());
    }
}
