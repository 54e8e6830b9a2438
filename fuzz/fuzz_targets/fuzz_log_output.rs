// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use repofinder::metadata::parse_log_output;

fuzz_target!(|data: &[u8]| {
    // Parsing arbitrary tool output must never panic
    if let Ok(text) = std::str::from_utf8(data) {
        let info = parse_log_output(text);
        assert!(!info.author.contains('\n'));
    }
});
