// warden - Proxy authentication gate
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_main]
use libfuzzer_sys::fuzz_target;
use warden_parse::{parse_allowlist, parse_credential_entry};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(ranges) = parse_allowlist(text) {
        for range in ranges {
            assert!(range.contains(&range.base()));
        }
    }
    let _ = parse_credential_entry(text);
});
