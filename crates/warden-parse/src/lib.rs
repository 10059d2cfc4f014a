// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parsers for the gate's textual inputs.
//!
//! - [`parse_credential_entry`]: `username:password[:port]`
//! - [`parse_allowlist`]: comma-separated `ip[/maskbits]`
//! - [`parse_proxy_authorization`]: `Digest key=value, ...` header values
//!
//! # Example
//! ```
//! use warden_parse::{parse_allowlist, parse_credential_entry};
//!
//! let cred = parse_credential_entry("alice:secret:8080").unwrap().unwrap();
//! assert_eq!(cred.port(), 8080);
//!
//! let ranges = parse_allowlist("127.0.0.1, 10.0.0.0/8").unwrap();
//! assert_eq!(ranges.len(), 2);
//! ```

mod allowlist;
mod credential;
mod header;

pub use allowlist::{parse_allowlist, parse_allowlist_entry};
pub use credential::parse_credential_entry;
pub use header::parse_proxy_authorization;
