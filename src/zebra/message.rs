// IPv4 route add/delete message

use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

use super::{
    Command, Header, ZAPI_MESSAGE_IFINDEX, ZAPI_MESSAGE_METRIC, ZAPI_MESSAGE_NEXTHOP,
    ZEBRA_NEXTHOP_IFINDEX, ZEBRA_NEXTHOP_IPV4, ZEBRA_ROUTE_STATIC, ZEBRA_SAFI_UNICAST,
};
use crate::routes::addr::InterfaceResolver;
use crate::routes::{Destination, Operation, RouteRequest};

/// One static route change, ready to be written to the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMessage {
    pub operation: Operation,
    pub route_type: u8,
    pub flags: u8,
    /// `ZAPI_MESSAGE_*` bits describing which optional fields follow
    pub message: u8,
    /// Written only for header versions that carry it
    pub safi: u16,
    pub prefix: Destination,
    pub nexthops: Vec<Ipv4Addr>,
    pub ifindexes: Vec<u32>,
    pub metric: u32,
}

impl RouteMessage {
    /// Build the message for a request, resolving its interface name now.
    pub fn from_request(request: &RouteRequest, interfaces: &impl InterfaceResolver) -> Self {
        let mut message = RouteMessage {
            operation: request.operation,
            route_type: ZEBRA_ROUTE_STATIC,
            flags: 0,
            // Zebra expects the nexthop bit for gateway and interface routes alike
            message: ZAPI_MESSAGE_NEXTHOP,
            safi: ZEBRA_SAFI_UNICAST,
            prefix: request.destination,
            nexthops: Vec::new(),
            ifindexes: Vec::new(),
            metric: request.metric,
        };

        // Only a single nexthop is supported
        if let Some(gateway) = request.gateway.filter(|gw| !gw.is_unspecified()) {
            tracing::debug!("Setting route via nexthop {}", gateway);
            message.nexthops.push(gateway);
        }

        if let Some(ifname) = &request.interface {
            let ifindex = interfaces.index_of(ifname);
            tracing::debug!("Setting route via ifname:{} => ifindex:{}", ifname, ifindex);
            message.message |= ZAPI_MESSAGE_IFINDEX;
            message.ifindexes.push(ifindex);
        }

        message.message |= ZAPI_MESSAGE_METRIC;
        message
    }

    pub fn command(&self) -> Command {
        match self.operation {
            Operation::Add => Command::Ipv4RouteAdd,
            Operation::Delete => Command::Ipv4RouteDelete,
        }
    }

    /// Serialize the message with the given header layout
    pub fn encode(&self, header: Header) -> BytesMut {
        let mut buf = header.begin(self.command());

        buf.put_u8(self.route_type);
        buf.put_u8(self.flags);
        buf.put_u8(self.message);
        if header.has_safi() {
            buf.put_u16(self.safi);
        }

        // Prefix is sent as its length followed by only the significant octets.
        // Lengths past 32 are clamped to a host route.
        let prefix_len = self.prefix.prefix_len.min(32);
        let psize = (prefix_len as usize).div_ceil(8);
        buf.put_u8(prefix_len);
        buf.put_slice(&self.prefix.address.octets()[..psize]);

        if self.message & ZAPI_MESSAGE_NEXTHOP != 0 {
            buf.put_u8((self.nexthops.len() + self.ifindexes.len()) as u8);
            for nexthop in &self.nexthops {
                buf.put_u8(ZEBRA_NEXTHOP_IPV4);
                buf.put_slice(&nexthop.octets());
            }
            for ifindex in &self.ifindexes {
                buf.put_u8(ZEBRA_NEXTHOP_IFINDEX);
                buf.put_u32(*ifindex);
            }
        }

        if self.message & ZAPI_MESSAGE_METRIC != 0 {
            buf.put_u32(self.metric);
        }

        Header::finish(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::addr::IFINDEX_NOT_FOUND;
    use std::collections::HashMap;

    struct FakeInterfaces(HashMap<&'static str, u32>);

    impl InterfaceResolver for FakeInterfaces {
        fn index_of(&self, name: &str) -> u32 {
            self.0.get(name).copied().unwrap_or(IFINDEX_NOT_FOUND)
        }
    }

    fn interfaces() -> FakeInterfaces {
        FakeInterfaces(HashMap::from([("eth0", 2), ("eth1", 3)]))
    }

    fn request(prefix_len: u8, gateway: Option<Ipv4Addr>, interface: Option<&str>) -> RouteRequest {
        RouteRequest {
            operation: Operation::Add,
            destination: Destination {
                address: Ipv4Addr::new(192, 168, 1, 0),
                prefix_len,
            },
            gateway,
            interface: interface.map(str::to_string),
            metric: 0,
        }
    }

    #[test]
    fn test_nexthop_bit_without_gateway_or_interface() {
        let message = RouteMessage::from_request(&request(24, None, None), &interfaces());
        assert_eq!(message.message, ZAPI_MESSAGE_NEXTHOP | ZAPI_MESSAGE_METRIC);
        assert!(message.nexthops.is_empty());
        assert!(message.ifindexes.is_empty());
    }

    #[test]
    fn test_unspecified_gateway_is_not_attached() {
        let message = RouteMessage::from_request(
            &request(24, Some(Ipv4Addr::UNSPECIFIED), None),
            &interfaces(),
        );
        assert!(message.nexthops.is_empty());
        assert_eq!(message.message & ZAPI_MESSAGE_NEXTHOP, ZAPI_MESSAGE_NEXTHOP);
    }

    #[test]
    fn test_interface_resolved_at_encode() {
        let message = RouteMessage::from_request(&request(24, None, Some("eth1")), &interfaces());
        assert_eq!(
            message.message,
            ZAPI_MESSAGE_NEXTHOP | ZAPI_MESSAGE_IFINDEX | ZAPI_MESSAGE_METRIC
        );
        assert_eq!(message.ifindexes, vec![3]);
    }

    #[test]
    fn test_unknown_interface_passed_through() {
        let message = RouteMessage::from_request(&request(24, None, Some("wg9")), &interfaces());
        assert_eq!(message.ifindexes, vec![IFINDEX_NOT_FOUND]);
    }

    #[test]
    fn test_encode_gateway_route() {
        let mut req = request(24, Some(Ipv4Addr::new(10, 0, 0, 1)), None);
        req.metric = 10;
        let buf = RouteMessage::from_request(&req, &interfaces()).encode(Header::new(2));

        let expected: &[u8] = &[
            0x00, 0x19, 0xff, 0x02, 0x00, 0x07, // header, ZEBRA_IPV4_ROUTE_ADD
            0x03, 0x00, 0x09, // static, flags, nexthop|metric
            0x00, 0x01, // SAFI unicast
            0x18, 192, 168, 1, // /24 prefix
            0x01, 0x03, 10, 0, 0, 1, // one IPv4 nexthop
            0x00, 0x00, 0x00, 0x0a, // metric
        ];
        assert_eq!(&buf[..], expected);
    }

    #[test]
    fn test_encode_default_delete_with_interface() {
        let mut req = request(0, Some(Ipv4Addr::new(10, 0, 0, 1)), Some("eth0"));
        req.operation = Operation::Delete;
        req.destination = Destination::DEFAULT;
        let buf = RouteMessage::from_request(&req, &interfaces()).encode(Header::new(3));

        let expected: &[u8] = &[
            0x00, 0x1d, 0xff, 0x03, 0x00, 0x00, 0x00, 0x08, // header, vrf 0, ZEBRA_IPV4_ROUTE_DELETE
            0x03, 0x00, 0x0b, // static, flags, nexthop|ifindex|metric
            0x00, 0x01, // SAFI unicast
            0x00, // /0 carries no prefix octets
            0x02, 0x03, 10, 0, 0, 1, 0x01, 0x00, 0x00, 0x00, 0x02, // nexthop + ifindex
            0x00, 0x00, 0x00, 0x00, // metric
        ];
        assert_eq!(&buf[..], expected);
    }

    #[test]
    fn test_encode_without_nexthops_has_zero_count() {
        let buf = RouteMessage::from_request(&request(32, None, None), &interfaces())
            .encode(Header::new(2));
        // header(6) + type/flags/message(3) + safi(2) + len(1) + prefix(4) + count(1) + metric(4)
        assert_eq!(buf.len(), 21);
        assert_eq!(buf[16], 0);
    }

    #[test]
    fn test_encode_v1_has_no_safi() {
        let mut req = request(24, Some(Ipv4Addr::new(10, 0, 0, 1)), None);
        req.metric = 10;
        let buf = RouteMessage::from_request(&req, &interfaces()).encode(Header::new(1));

        let expected: &[u8] = &[
            0x00, 0x17, 0xff, 0x01, 0x00, 0x07, // header, ZEBRA_IPV4_ROUTE_ADD
            0x03, 0x00, 0x09, // static, flags, nexthop|metric
            0x18, 192, 168, 1, // /24 prefix follows the message byte directly
            0x01, 0x03, 10, 0, 0, 1, // one IPv4 nexthop
            0x00, 0x00, 0x00, 0x0a, // metric
        ];
        assert_eq!(&buf[..], expected);
    }

    #[test]
    fn test_v3_safi_follows_message_byte() {
        let mut req = request(8, Some(Ipv4Addr::new(10, 0, 0, 1)), None);
        req.destination.address = Ipv4Addr::new(10, 0, 0, 0);
        let buf = RouteMessage::from_request(&req, &interfaces()).encode(Header::new(3));

        assert_eq!(buf[10], ZAPI_MESSAGE_NEXTHOP | ZAPI_MESSAGE_METRIC);
        assert_eq!(&buf[11..13], &[0x00, 0x01]);
        assert_eq!(&buf[13..15], &[8, 10]);
    }

    #[test]
    fn test_oversized_prefix_length_encodes_as_host() {
        let mut message = RouteMessage::from_request(&request(32, None, None), &interfaces());
        message.prefix.prefix_len = 40;
        let buf = message.encode(Header::new(2));

        assert_eq!(buf[11], 32);
        assert_eq!(&buf[12..16], &[192, 168, 1, 0]);
        assert_eq!(buf.len(), 21);
    }
}
