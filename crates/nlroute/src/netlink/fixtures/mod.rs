//! Netlink message fixtures for testing.
//!
//! Pre-captured rtnetlink payloads (little-endian host) for testing decoding
//! without network access. Payloads start at the fixed family header, after
//! the nlmsghdr.

use super::message::{NLM_F_MULTI, NlMsgHdr, NlMsgType, frame};

/// Address message for IPv4 loopback address 127.0.0.1/8.
pub fn addr_loopback_v4() -> Vec<u8> {
    vec![
        // ifaddrmsg: family=AF_INET, prefixlen=8, flags=0x80 (IFA_F_PERMANENT), scope=RT_SCOPE_HOST, index=1
        0x02, // family = AF_INET
        0x08, // prefixlen = 8
        0x80, // flags = IFA_F_PERMANENT
        0xfe, // scope = RT_SCOPE_HOST (254)
        0x01, 0x00, 0x00, 0x00, // index = 1
        // IFA_ADDRESS = 127.0.0.1
        0x08, 0x00, // len = 8
        0x01, 0x00, // type = IFA_ADDRESS (1)
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
        // IFA_LOCAL = 127.0.0.1
        0x08, 0x00, // len = 8
        0x02, 0x00, // type = IFA_LOCAL (2)
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
        // IFA_LABEL = "lo"
        0x07, 0x00, // len = 7
        0x03, 0x00, // type = IFA_LABEL (3)
        b'l', b'o', 0x00, 0x00, // "lo\0" + padding
        // IFA_FLAGS = 0x80
        0x08, 0x00, // len = 8
        0x08, 0x00, // type = IFA_FLAGS (8)
        0x80, 0x00, 0x00, 0x00, // IFA_F_PERMANENT
        // IFA_CACHEINFO: forever/forever, cstamp=414, tstamp=414
        0x14, 0x00, // len = 20
        0x06, 0x00, // type = IFA_CACHEINFO (6)
        0xff, 0xff, 0xff, 0xff, // ifa_prefered = INFINITY_LIFE_TIME
        0xff, 0xff, 0xff, 0xff, // ifa_valid = INFINITY_LIFE_TIME
        0x9e, 0x01, 0x00, 0x00, // cstamp = 414
        0x9e, 0x01, 0x00, 0x00, // tstamp = 414
    ]
}

/// Address message for IPv6 loopback address ::1/128.
pub fn addr_loopback_v6() -> Vec<u8> {
    vec![
        // ifaddrmsg: family=AF_INET6, prefixlen=128, flags=0x80 (IFA_F_PERMANENT), scope=RT_SCOPE_HOST, index=1
        0x0a, // family = AF_INET6
        0x80, // prefixlen = 128
        0x80, // flags = IFA_F_PERMANENT
        0xfe, // scope = RT_SCOPE_HOST (254)
        0x01, 0x00, 0x00, 0x00, // index = 1
        // IFA_ADDRESS = ::1
        0x14, 0x00, // len = 20
        0x01, 0x00, // type = IFA_ADDRESS (1)
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // ::1 (first 8 bytes)
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // ::1 (last 8 bytes)
    ]
}

/// Address message for a temporary IPv6 address with finite lifetimes.
pub fn addr_temporary_v6() -> Vec<u8> {
    vec![
        // ifaddrmsg: family=AF_INET6, prefixlen=64, flags=0x01 (IFA_F_TEMPORARY), scope=RT_SCOPE_UNIVERSE, index=2
        0x0a, // family = AF_INET6
        0x40, // prefixlen = 64
        0x01, // flags = IFA_F_TEMPORARY
        0x00, // scope = RT_SCOPE_UNIVERSE (0)
        0x02, 0x00, 0x00, 0x00, // index = 2
        // IFA_ADDRESS = 2001:db8::1234
        0x14, 0x00, // len = 20
        0x01, 0x00, // type = IFA_ADDRESS (1)
        0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x12, 0x34, //
        // IFA_CACHEINFO: preferred=3600, valid=86400
        0x14, 0x00, // len = 20
        0x06, 0x00, // type = IFA_CACHEINFO (6)
        0x10, 0x0e, 0x00, 0x00, // ifa_prefered = 3600
        0x80, 0x51, 0x01, 0x00, // ifa_valid = 86400
        0x10, 0x27, 0x00, 0x00, // cstamp = 10000
        0x20, 0x4e, 0x00, 0x00, // tstamp = 20000
        // attribute type 11 (IFA_PROTO), not decoded
        0x05, 0x00, // len = 5
        0x0b, 0x00, // type = 11
        0x02, 0x00, 0x00, 0x00, // value + padding
    ]
}

/// Address message for 192.168.1.10/24 on index 2, LOCAL attribute only.
pub fn addr_global_v4() -> Vec<u8> {
    vec![
        // ifaddrmsg: family=AF_INET, prefixlen=24, flags=0, scope=RT_SCOPE_UNIVERSE, index=2
        0x02, 0x18, 0x00, 0x00, //
        0x02, 0x00, 0x00, 0x00, // index = 2
        // IFA_LOCAL = 192.168.1.10
        0x08, 0x00, // len = 8
        0x02, 0x00, // type = IFA_LOCAL (2)
        0xc0, 0xa8, 0x01, 0x0a, // 192.168.1.10
    ]
}

/// Route message for default route via gateway.
pub fn route_default_v4() -> Vec<u8> {
    vec![
        // rtmsg: family=AF_INET, dst_len=0, src_len=0, tos=0, table=RT_TABLE_MAIN, protocol=RTPROT_STATIC, scope=RT_SCOPE_UNIVERSE, type=RTN_UNICAST
        0x02, // family = AF_INET
        0x00, // dst_len = 0 (default route)
        0x00, // src_len = 0
        0x00, // tos = 0
        0xfe, // table = RT_TABLE_MAIN (254)
        0x04, // protocol = RTPROT_STATIC (4)
        0x00, // scope = RT_SCOPE_UNIVERSE (0)
        0x01, // type = RTN_UNICAST (1)
        0x00, 0x00, 0x00, 0x00, // flags = 0
        // RTA_TABLE = 254
        0x08, 0x00, // len = 8
        0x0f, 0x00, // type = RTA_TABLE (15)
        0xfe, 0x00, 0x00, 0x00, // table = 254
        // RTA_GATEWAY = 192.168.1.1
        0x08, 0x00, // len = 8
        0x05, 0x00, // type = RTA_GATEWAY (5)
        0xc0, 0xa8, 0x01, 0x01, // 192.168.1.1
        // RTA_OIF = 2
        0x08, 0x00, // len = 8
        0x04, 0x00, // type = RTA_OIF (4)
        0x02, 0x00, 0x00, 0x00, // oif = 2
    ]
}

/// Route message for the connected 192.168.1.0/24 subnet (no gateway).
pub fn route_subnet_v4() -> Vec<u8> {
    vec![
        // rtmsg: family=AF_INET, dst_len=24, table=RT_TABLE_MAIN, protocol=RTPROT_KERNEL, scope=RT_SCOPE_LINK, type=RTN_UNICAST
        0x02, 0x18, 0x00, 0x00, //
        0xfe, 0x02, 0xfd, 0x01, //
        0x00, 0x00, 0x00, 0x00, // flags = 0
        // RTA_DST = 192.168.1.0
        0x08, 0x00, // len = 8
        0x01, 0x00, // type = RTA_DST (1)
        0xc0, 0xa8, 0x01, 0x00, // 192.168.1.0
        // RTA_PREFSRC = 192.168.1.10
        0x08, 0x00, // len = 8
        0x07, 0x00, // type = RTA_PREFSRC (7)
        0xc0, 0xa8, 0x01, 0x0a, // 192.168.1.10
        // RTA_OIF = 2
        0x08, 0x00, // len = 8
        0x04, 0x00, // type = RTA_OIF (4)
        0x02, 0x00, 0x00, 0x00, // oif = 2
    ]
}

/// Route message in the local table (255).
pub fn route_local_v4() -> Vec<u8> {
    vec![
        // rtmsg: family=AF_INET, dst_len=32, table=RT_TABLE_LOCAL, protocol=RTPROT_KERNEL, scope=RT_SCOPE_HOST, type=RTN_LOCAL
        0x02, 0x20, 0x00, 0x00, //
        0xff, 0x02, 0xfe, 0x02, //
        0x00, 0x00, 0x00, 0x00, // flags = 0
        // RTA_TABLE = 255
        0x08, 0x00, // len = 8
        0x0f, 0x00, // type = RTA_TABLE (15)
        0xff, 0x00, 0x00, 0x00, // table = 255
        // RTA_DST = 127.0.0.1
        0x08, 0x00, // len = 8
        0x01, 0x00, // type = RTA_DST (1)
        0x7f, 0x00, 0x00, 0x01, // 127.0.0.1
    ]
}

/// Frame `payloads` as one multi-part dump chunk answering `seq`,
/// terminated by NLMSG_DONE.
pub fn dump_chunk(msg_type: u16, seq: u32, payloads: &[Vec<u8>]) -> Vec<u8> {
    let mut chunk = Vec::new();
    let mut header = NlMsgHdr::new(msg_type, NLM_F_MULTI);
    header.nlmsg_seq = seq;
    for payload in payloads {
        chunk.extend(frame(&header, payload).unwrap());
    }
    header.nlmsg_type = NlMsgType::DONE;
    chunk.extend(frame(&header, &0i32.to_ne_bytes()).unwrap());
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::MessageIter;
    use crate::netlink::messages::{AddressRecord, DadState, Lifetime, RouteRecord};
    use crate::netlink::types::addr::Scope;

    fn names(index: u32) -> Option<String> {
        (index == 2).then(|| "eth0".to_string())
    }

    #[test]
    fn test_parse_addr_loopback_v4() {
        let addr = AddressRecord::decode(&addr_loopback_v4()).expect("failed to parse address message");

        assert_eq!(addr.ifindex(), 1);
        assert_eq!(addr.prefix_len(), 8);
        assert_eq!(addr.family(), 2); // AF_INET
        assert!(addr.is_ipv4());
        assert!(addr.is_permanent());
        assert_eq!(addr.scope(), Scope::Host);
        assert_eq!(addr.label(), Some("lo"));
        assert_eq!(addr.local().unwrap().to_string(), "127.0.0.1");

        let info = addr.cache_info().expect("expected cache info");
        assert_eq!(info.preferred, Lifetime::Forever);
        assert_eq!(info.valid, Lifetime::Forever);
        assert_eq!(info.created, 414);
    }

    #[test]
    fn test_parse_addr_loopback_v6() {
        let addr = AddressRecord::decode(&addr_loopback_v6()).expect("failed to parse address message");

        assert_eq!(addr.ifindex(), 1);
        assert_eq!(addr.prefix_len(), 128);
        assert_eq!(addr.family(), 10); // AF_INET6
        assert!(addr.is_ipv6());
        assert!(addr.is_permanent());
        assert_eq!(addr.address().unwrap().to_string(), "::1");
        assert_eq!(addr.dad_state(), DadState::Complete);
    }

    #[test]
    fn test_parse_addr_temporary_v6() {
        let addr = AddressRecord::decode(&addr_temporary_v6()).expect("failed to parse address message");

        assert!(addr.is_temporary());
        assert_eq!(addr.scope(), Scope::Global);
        assert_eq!(addr.address().unwrap().to_string(), "2001:db8::1234");
        let info = addr.cache_info().unwrap();
        assert_eq!(info.preferred, Lifetime::Seconds(3600));
        assert_eq!(info.valid, Lifetime::Seconds(86400));
        assert_eq!(info.valid.to_string(), "86400sec");
    }

    #[test]
    fn test_parse_addr_global_v4() {
        let addr = AddressRecord::decode(&addr_global_v4()).unwrap();
        assert_eq!(addr.local().unwrap().to_string(), "192.168.1.10");
        assert_eq!(addr.scope().to_string(), "global");
        assert_eq!(addr.prefix_len(), 24);
    }

    #[test]
    fn test_parse_route_default_v4() {
        let route = RouteRecord::decode(&route_default_v4(), &names).expect("failed to parse route message");

        assert!(route.is_default());
        assert_eq!(route.family(), 2); // AF_INET
        assert_eq!(route.table(), 254); // RT_TABLE_MAIN
        assert_eq!(route.gateway().unwrap().to_string(), "192.168.1.1");
        assert_eq!(route.oif(), Some(2));
        assert_eq!(route.oif_name(), Some("eth0"));
    }

    #[test]
    fn test_parse_route_subnet_v4() {
        let route = RouteRecord::decode(&route_subnet_v4(), &names).unwrap();
        assert_eq!(route.dst_len(), 24);
        assert_eq!(route.destination().unwrap().to_string(), "192.168.1.0");
        assert_eq!(route.prefsrc().unwrap().to_string(), "192.168.1.10");
        assert_eq!(route.scope(), Scope::Link);
        assert!(route.gateway().is_none());
    }

    #[test]
    fn test_dump_chunk_shape() {
        let chunk = dump_chunk(NlMsgType::RTM_NEWADDR, 5, &[addr_loopback_v4(), addr_loopback_v6()]);
        let msgs: Vec<_> = MessageIter::new(&chunk).map(|m| m.unwrap().0).collect();
        assert_eq!(msgs.len(), 3);
        assert!(msgs.iter().all(|h| h.nlmsg_seq == 5 && h.is_multi()));
        assert!(msgs[2].is_done());
    }
}
