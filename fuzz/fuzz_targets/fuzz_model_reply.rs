// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    reply: &'a str,
    upload: &'a str,
    mime: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    if let Some(value) = ceria::ai::extract_json(input.reply) {
        assert!(value.is_object());
    }

    let (mime, payload) = ceria::ai::split_data_url(input.upload);
    assert!(payload.len() <= input.upload.len());
    if let Some(mime) = mime {
        assert!(!mime.contains(','));
    }

    let _ = ceria::audio::sample_rate_from_mime(input.mime);
    assert!(!ceria::media::slugify(input.reply).is_empty());
});
