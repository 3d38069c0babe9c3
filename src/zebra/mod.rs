// Zebra zserv protocol - the subset a static route client needs

pub mod message;
pub mod session;
pub mod transport;

use bytes::{BufMut, BytesMut};

pub const ZEBRA_HEADER_MARKER: u8 = 0xff;

pub const ZEBRA_ROUTE_STATIC: u8 = 3;

pub const ZEBRA_SAFI_UNICAST: u16 = 1;

pub const ZAPI_MESSAGE_NEXTHOP: u8 = 0x01;
pub const ZAPI_MESSAGE_IFINDEX: u8 = 0x02;
pub const ZAPI_MESSAGE_METRIC: u8 = 0x08;

pub const ZEBRA_NEXTHOP_IFINDEX: u8 = 1;
pub const ZEBRA_NEXTHOP_IPV4: u8 = 3;

/// zserv commands sent by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Command {
    InterfaceAdd = 1,
    Ipv4RouteAdd = 7,
    Ipv4RouteDelete = 8,
    RouterIdAdd = 20,
}

impl Command {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Header layout for a zserv protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
}

impl Header {
    pub fn new(version: u8) -> Self {
        Header { version }
    }

    /// Route bodies carry a SAFI after the message flags from version 2 on
    pub fn has_safi(&self) -> bool {
        self.version >= 2
    }

    /// Version 3 carries a VRF id between the version and the command
    pub fn size(&self) -> usize {
        if self.version >= 3 { 8 } else { 6 }
    }

    /// Start a message; the length field is patched by [`Header::finish`]
    pub fn begin(&self, command: Command) -> BytesMut {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u16(self.size() as u16);
        buf.put_u8(ZEBRA_HEADER_MARKER);
        buf.put_u8(self.version);
        if self.version >= 3 {
            // Default VRF
            buf.put_u16(0);
        }
        buf.put_u16(command.code());
        buf
    }

    /// Write the total message length into the first two bytes
    pub fn finish(buf: &mut BytesMut) {
        let len = buf.len() as u16;
        buf[..2].copy_from_slice(&len.to_be_bytes());
    }

    /// A message consisting of the header alone
    pub fn encode_bare(&self, command: Command) -> BytesMut {
        let mut buf = self.begin(command);
        Header::finish(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_id_add_v2() {
        let buf = Header::new(2).encode_bare(Command::RouterIdAdd);
        assert_eq!(&buf[..], &[0x00, 0x06, 0xff, 0x02, 0x00, 0x14]);
    }

    #[test]
    fn test_interface_add_v1() {
        let buf = Header::new(1).encode_bare(Command::InterfaceAdd);
        assert_eq!(&buf[..], &[0x00, 0x06, 0xff, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn test_safi_from_version_two() {
        assert!(!Header::new(1).has_safi());
        assert!(Header::new(2).has_safi());
        assert!(Header::new(3).has_safi());
    }

    #[test]
    fn test_router_id_add_v3_has_vrf() {
        let buf = Header::new(3).encode_bare(Command::RouterIdAdd);
        assert_eq!(&buf[..], &[0x00, 0x08, 0xff, 0x03, 0x00, 0x00, 0x00, 0x14]);
    }
}
