#![no_main]

//! Fuzz target for wire::decode_listing()
//!
//! Arbitrary JSON must either decode or be reported as malformed; grouping
//! whatever decodes must not panic either.
//!
//! Run with: cargo +nightly fuzz run fuzz_decode_listing

use libfuzzer_sys::fuzz_target;
use metasupply_core::wire::decode_listing;
use metasupply_core::GroupingStrategy;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice(data) else {
        return;
    };
    if let Ok(listing) = decode_listing(value) {
        let _ = GroupingStrategy::ByOwnerAndName.histories(&listing.records);
        let _ = GroupingStrategy::ByVerifiedChain.histories(&listing.records);
    }
});
