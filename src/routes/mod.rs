// Routes module - the route change request and how it is read from the command line

pub mod addr;
pub mod parser;

use std::fmt;
use std::net::Ipv4Addr;

/// Whether the route is inserted into or removed from the daemon's table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Delete,
}

impl Operation {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "add" => Some(Operation::Add),
            "del" => Some(Operation::Delete),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Delete => "del",
        }
    }

    /// Verb used when reporting a failed request, e.g. "failed adding route"
    pub fn progressive(&self) -> &'static str {
        match self {
            Operation::Add => "adding",
            Operation::Delete => "deleting",
        }
    }
}

/// IPv4 destination prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
}

impl Destination {
    pub const DEFAULT: Destination = Destination {
        address: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

/// A fully validated static route change, built once per run by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub operation: Operation,
    pub destination: Destination,
    pub gateway: Option<Ipv4Addr>,
    /// Outbound interface name, resolved to an index only when the request is encoded
    pub interface: Option<String>,
    pub metric: u32,
}

impl fmt::Display for RouteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation.keyword(), self.destination)?;
        if let Some(gateway) = self.gateway {
            write!(f, " gw {gateway}")?;
        }
        if let Some(interface) = &self.interface {
            write!(f, " dev {interface}")?;
        }
        write!(f, " metric {}", self.metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_keywords() {
        assert_eq!(Operation::from_keyword("add"), Some(Operation::Add));
        assert_eq!(Operation::from_keyword("del"), Some(Operation::Delete));
        assert_eq!(Operation::from_keyword("delete"), None);
        assert_eq!(Operation::Delete.progressive(), "deleting");
    }

    #[test]
    fn test_request_display() {
        let request = RouteRequest {
            operation: Operation::Add,
            destination: Destination {
                address: Ipv4Addr::new(192, 168, 1, 0),
                prefix_len: 24,
            },
            gateway: Some(Ipv4Addr::new(10, 0, 0, 1)),
            interface: Some("eth0".to_string()),
            metric: 5,
        };
        assert_eq!(
            request.to_string(),
            "add 192.168.1.0/24 gw 10.0.0.1 dev eth0 metric 5"
        );
    }
}
