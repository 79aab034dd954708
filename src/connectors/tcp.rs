//! Implementation of [Connector] and [BlockingConnector] for TCP.
//!
//! These open a bare TCP stream to a server, which is useful to check
//! reachability or to layer a client protocol on top of.

use crate::backend::{self, BlockingConnector, Connector, Error, Params, DEFAULT_PORT};

use async_trait::async_trait;
use std::net::ToSocketAddrs;

pub struct TcpConnector {}

// Connections go to `host`, on `port` or the default port.
fn host_and_port(params: &Params) -> Result<(&str, u16), Error> {
    let host = params
        .host
        .as_deref()
        .ok_or_else(|| Error::InvalidParams("TCP connections require a host".to_string()))?;
    Ok((host, params.port.unwrap_or(DEFAULT_PORT)))
}

fn timed_out() -> Error {
    std::io::Error::from(std::io::ErrorKind::TimedOut).into()
}

#[async_trait]
impl Connector for TcpConnector {
    type Connection = tokio::net::TcpStream;

    async fn connect(&self, params: &Params) -> Result<Self::Connection, Error> {
        let addr = host_and_port(params)?;
        let connect = tokio::net::TcpStream::connect(addr);
        match params.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| e.into()),
            None => connect.await.map_err(|e| e.into()),
        }
    }
}

impl BlockingConnector for TcpConnector {
    type Connection = std::net::TcpStream;

    fn connect(&self, params: &Params) -> Result<Self::Connection, Error> {
        let addr = host_and_port(params)?;
        let Some(timeout) = params.connect_timeout else {
            return std::net::TcpStream::connect(addr).map_err(|e| e.into());
        };

        // "connect_timeout" only accepts a single address, so try each
        // resolved address in turn.
        let mut last_err = None;
        for addr in addr.to_socket_addrs()? {
            match std::net::TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.map(backend::Error::from).unwrap_or_else(|| {
            Error::InvalidParams(format!("{} resolved to no addresses", params.display_name()))
        }))
    }
}
