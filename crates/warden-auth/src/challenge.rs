// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pre-rendered 407 challenge and 400 error responses.

use bytes::{BufMut, Bytes, BytesMut};
use warden_core::QOP_AUTH;

const CHALLENGE_BODY: &str = "<!DOCTYPE html>
<html>
\t<head> <title>warden proxy</title> </head>
\t<body>
\t\t<h1>407 Proxy authentication required</h1>
\t\t<hr />
\t\tGenerated by <i>warden</i>
\t</body>
</html>
";

const BAD_REQUEST_BODY: &str = "<!DOCTYPE html>
<html>
\t<head> <title>warden proxy</title> </head>
\t<body>
\t\t<h1>400 Bad authorization request</h1>
\t\t<hr />
\t\tGenerated by <i>warden</i>
\t</body>
</html>
";

/// The fixed-shape 407 response, split around the nonce.
///
/// Everything except the nonce is rendered once at startup.
#[derive(Debug, Clone)]
pub struct ChallengeTemplate {
    head: Bytes,
    tail: Bytes,
}

impl ChallengeTemplate {
    pub fn new(realm: &str) -> Self {
        let head = format!(
            "HTTP/1.1 407 Proxy Authentication Required\r\n\
             Proxy-Authenticate: Digest realm=\"{}\", nonce=\"",
            realm
        );
        let tail = format!(
            "\", qop=\"{}\"\r\n\
             Content-Type: text/html\r\n\
             Cache-Control: no-cache\r\n\
             Content-Length: {}\r\n\
             \r\n\
             {}",
            QOP_AUTH,
            CHALLENGE_BODY.len(),
            CHALLENGE_BODY
        );
        Self {
            head: Bytes::from(head),
            tail: Bytes::from(tail),
        }
    }

    /// The complete response carrying `nonce`.
    pub fn render(&self, nonce: &str) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.head.len() + nonce.len() + self.tail.len());
        buf.put_slice(&self.head);
        buf.put_slice(nonce.as_bytes());
        buf.put_slice(&self.tail);
        buf.freeze()
    }
}

/// Generic 400 page sent on protocol errors. Carries no request detail.
pub fn bad_request_page() -> Bytes {
    Bytes::from(format!(
        "HTTP/1.1 400 Bad Request\r\n\
         Connection: close\r\n\
         Content-Type: text/html\r\n\
         Cache-Control: no-cache\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        BAD_REQUEST_BODY.len(),
        BAD_REQUEST_BODY
    ))
}
