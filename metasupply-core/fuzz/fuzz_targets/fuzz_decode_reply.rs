#![no_main]

//! Fuzz target for the upload reply and lookup decoders
//!
//! Run with: cargo +nightly fuzz run fuzz_decode_reply

use libfuzzer_sys::fuzz_target;
use metasupply_core::wire::{decode_lookup, decode_reply, UploadArgs};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let _ = decode_reply(value.clone());
    let _ = decode_lookup(value.clone());
    if let Ok(args) = serde_json::from_value::<UploadArgs>(value) {
        let _ = args.decode();
    }
});
