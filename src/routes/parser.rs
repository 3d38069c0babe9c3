// Keyword-driven parser for the route command tokens
//
//   {add|del} (default | [-net|-host] TARGET[/LEN] [netmask MASK]) [gw GATEWAY] [dev IFNAME] [metric METRIC]
//
// Bare tokens after the target are the legacy positional form: a token starting
// with a letter is an interface name, anything else a gateway address.

use super::addr::{is_contiguous_mask, netmask_to_len, parse_dotted};
use super::{Destination, Operation, RouteRequest};
use crate::config::Config;
use crate::error::{ZrouteError, ZrouteResult};
use std::net::Ipv4Addr;

/// Cursor over the command tokens
struct TokenStream<'a, S> {
    tokens: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> TokenStream<'a, S> {
    fn new(tokens: &'a [S]) -> Self {
        TokenStream { tokens, pos: 0 }
    }

    fn pop(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_ref())
    }

    /// Consume the value that must follow `keyword`
    fn value_for(&mut self, keyword: &str) -> ZrouteResult<&'a str> {
        self.pop()
            .ok_or_else(|| ZrouteError::MissingValue(keyword.to_string()))
    }
}

/// Request under construction; fields fill in as tokens are consumed
#[derive(Debug)]
struct PartialRequest {
    operation: Operation,
    address: Ipv4Addr,
    prefix_len: Option<u8>,
    gateway: Option<Ipv4Addr>,
    interface: Option<String>,
    metric: u32,
}

impl PartialRequest {
    fn new(operation: Operation, metric: u32) -> Self {
        PartialRequest {
            operation,
            address: Ipv4Addr::UNSPECIFIED,
            prefix_len: None,
            gateway: None,
            interface: None,
            metric,
        }
    }

    fn set_netmask(&mut self, mask: Ipv4Addr) {
        if let Some(len) = self.prefix_len {
            tracing::debug!("ignoring netmask {}, prefix length already {}", mask, len);
            return;
        }
        let len = netmask_to_len(mask);
        tracing::debug!("netmask {} => len {}", mask, len);
        self.prefix_len = Some(len);
    }

    fn set_bare(&mut self, token: &str) -> ZrouteResult<()> {
        let first = token.chars().next();

        if first.is_some_and(|c| c.is_ascii_alphabetic()) {
            if self.interface.is_some() {
                return Err(ZrouteError::UnexpectedToken(token.to_string()));
            }
            tracing::debug!("ifname:{}", token);
            self.interface = Some(token.to_string());
            return Ok(());
        }

        if first.is_none() || first == Some('-') {
            return Err(ZrouteError::UnexpectedToken(token.to_string()));
        }

        let value = parse_dotted(token);
        if self.prefix_len.is_none()
            && self.gateway.is_none()
            && token.parse::<Ipv4Addr>().is_ok()
            && is_contiguous_mask(value)
        {
            // TARGET NETMASK GATEWAY
            self.set_netmask(value);
            return Ok(());
        }

        if self.gateway.is_some() {
            return Err(ZrouteError::UnexpectedToken(token.to_string()));
        }
        tracing::debug!("gateway:{}", token);
        self.gateway = Some(value);
        Ok(())
    }

    fn finish(self) -> ZrouteResult<RouteRequest> {
        let prefix_len = self.prefix_len.ok_or(ZrouteError::MissingPrefixLength)?;
        if prefix_len > 32 {
            return Err(ZrouteError::InvalidPrefixLength(prefix_len.to_string()));
        }

        Ok(RouteRequest {
            operation: self.operation,
            destination: Destination {
                address: self.address,
                prefix_len,
            },
            gateway: self.gateway,
            interface: self.interface,
            metric: self.metric,
        })
    }
}

/// Parse the command tokens following the leading options into a route request
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S], config: &Config) -> ZrouteResult<RouteRequest> {
    let mut stream = TokenStream::new(tokens);

    let keyword = stream.pop().ok_or(ZrouteError::MissingOperation)?;
    let operation = Operation::from_keyword(keyword)
        .ok_or_else(|| ZrouteError::UnexpectedToken(keyword.to_string()))?;
    tracing::debug!("op:{}", operation.keyword());

    let mut request = PartialRequest::new(operation, config.default_metric);
    parse_target(&mut stream, &mut request)?;

    while let Some(token) = stream.pop() {
        match token {
            "netmask" => {
                let mask = stream.value_for(token)?;
                request.set_netmask(parse_dotted(mask));
            }
            "gw" => {
                let gateway = stream.value_for(token)?;
                tracing::debug!("gateway:{}", gateway);
                request.gateway = Some(parse_dotted(gateway));
            }
            "dev" => {
                let ifname = stream.value_for(token)?;
                tracing::debug!("ifname:{}", ifname);
                request.interface = Some(ifname.to_string());
            }
            "metric" => {
                let metric = stream.value_for(token)?;
                request.metric = metric
                    .parse()
                    .map_err(|_| ZrouteError::Usage(format!("invalid metric `{metric}`")))?;
            }
            bare => request.set_bare(bare)?,
        }
    }

    request.finish()
}

fn parse_target<S: AsRef<str>>(
    stream: &mut TokenStream<'_, S>,
    request: &mut PartialRequest,
) -> ZrouteResult<()> {
    let token = stream.value_for(request.operation.keyword())?;

    let (target, host) = match token {
        "default" => {
            request.address = Destination::DEFAULT.address;
            request.prefix_len = Some(Destination::DEFAULT.prefix_len);
            tracing::debug!("target:default");
            return Ok(());
        }
        "-net" => (stream.value_for(token)?, false),
        "-host" => (stream.value_for(token)?, true),
        bare => (bare, false),
    };

    let target = match target.split_once('/') {
        Some((address, len)) => {
            let len: u8 = len
                .parse()
                .map_err(|_| ZrouteError::InvalidPrefixLength(len.to_string()))?;
            if len > 32 {
                return Err(ZrouteError::InvalidPrefixLength(len.to_string()));
            }
            request.prefix_len = Some(len);
            address
        }
        None => target,
    };

    if host {
        request.prefix_len = Some(32);
    }
    request.address = parse_dotted(target);
    tracing::debug!("target:{} len:{:?}", target, request.prefix_len);

    Ok(())
}
