// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_main]
use libfuzzer_sys::fuzz_target;
use warden_parse::parse_proxy_authorization;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = std::str::from_utf8(data) {
        if let Ok(auth) = parse_proxy_authorization(value) {
            let _ = auth.param("nonce");
            let _ = auth.to_string();
        }
    }
});
