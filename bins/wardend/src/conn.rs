//! TCP connection plumbing: request-head framing and the gate's connection type.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use warden_auth::{ClientConn, ProxyRequest};

/// Request heads larger than this close the connection.
pub const MAX_HEAD_LEN: usize = 16 * 1024;

pub struct TcpConn {
    stream: TcpStream,
    remote: SocketAddr,
    local: SocketAddr,
    buf: BytesMut,
}

impl TcpConn {
    pub fn new(stream: TcpStream, remote: SocketAddr) -> io::Result<Self> {
        let local = stream.local_addr()?;
        Ok(Self {
            stream,
            remote,
            local,
            buf: BytesMut::with_capacity(4096),
        })
    }

    /// Reads up to and including the next blank line.
    ///
    /// Returns `Ok(None)` when the peer closes between requests.
    pub async fn read_head(&mut self) -> io::Result<Option<Bytes>> {
        loop {
            if let Some(head) = split_head(&mut self.buf) {
                return Ok(Some(head));
            }
            if self.buf.len() >= MAX_HEAD_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "request head too large",
                ));
            }
            if self.stream.read_buf(&mut self.buf).await? == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
        }
    }
}

#[async_trait]
impl ClientConn for TcpConn {
    fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    fn local_addr(&self) -> SocketAddr {
        self.local
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await
    }
}

/// Removes one complete head from the front of `buf`.
fn split_head(buf: &mut BytesMut) -> Option<Bytes> {
    let end = memchr::memmem::find(buf.as_ref(), b"\r\n\r\n")?;
    Some(buf.split_to(end + 4).freeze())
}

/// Request line and `Proxy-Authorization` of an HTTP/1.x head.
pub fn parse_head(head: &[u8]) -> Option<ProxyRequest> {
    let text = std::str::from_utf8(head).ok()?;
    let mut lines = text.split("\r\n");

    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next().filter(|m| !m.is_empty())?;
    let uri = request_line.next().filter(|u| !u.is_empty())?;
    let version = request_line.next()?;
    if !version.starts_with("HTTP/1.") || request_line.next().is_some() {
        return None;
    }

    let mut request = ProxyRequest::new(method, uri);
    for line in lines.take_while(|l| !l.is_empty()) {
        let (name, value) = line.split_once(':')?;
        let value = value.trim();
        // An empty header is treated as absent.
        if name.eq_ignore_ascii_case("proxy-authorization") && !value.is_empty() {
            request = request.with_proxy_authorization(value);
        }
    }
    Some(request)
}
