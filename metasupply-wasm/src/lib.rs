//! WebAssembly bindings for the MetaSupply record model.
//!
//! The browser front end keeps talking to the registry itself; these exports
//! give it the same identifier derivation, wire encoding, grouping and search
//! as the native client. Every function takes and returns JSON text.

use metasupply_core::display::format_timestamp;
use metasupply_core::wire::{decode_listing, UploadArgs};
use metasupply_core::{
    filter, GroupingStrategy, History, Nonce, Principal, Record, RecordDraft, RecordId,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    web_sys::console::debug_1(&format!("metasupply-wasm {}", get_version()).into());
}

/// Envelope of every JSON reply: exactly one of `ok` and `error` is set.
#[derive(Serialize)]
struct Reply<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn respond<T: Serialize>(result: Result<T, String>) -> String {
    let reply = match result {
        Ok(value) => Reply {
            ok: Some(value),
            error: None,
        },
        Err(e) => Reply {
            ok: None,
            error: Some(e),
        },
    };
    serde_json::to_string(&reply)
        .unwrap_or_else(|e| format!(r#"{{"error":"Serialization error: {}"}}"#, e))
}

fn parse_records(records_json: &str) -> Result<Vec<Record>, String> {
    serde_json::from_str(records_json).map_err(|e| format!("Failed to parse records: {}", e))
}

/// Derive the id of a new record.
///
/// # Returns
/// `{"ok": "<64 hex chars>"}`, or `{"error": ...}` when a required field is
/// blank.
#[wasm_bindgen]
pub fn derive_id_wasm(
    filename: &str,
    model: &str,
    dataset: &str,
    prompt: &str,
    creator: &str,
    nonce: &str,
) -> String {
    respond(derive_id_internal(
        filename, model, dataset, prompt, creator, nonce,
    ))
}

fn derive_id_internal(
    filename: &str,
    model: &str,
    dataset: &str,
    prompt: &str,
    creator: &str,
    nonce: &str,
) -> Result<RecordId, String> {
    let draft = RecordDraft::new(filename, model, dataset, prompt).map_err(|e| e.to_string())?;
    let record = draft.prepare(&Principal::new(creator), &Nonce::new(nonce));
    Ok(record.id)
}

/// Nonce from the browser clock (milliseconds since the epoch).
#[wasm_bindgen]
pub fn new_nonce_wasm() -> String {
    format!("{}", js_sys::Date::now() as u64)
}

/// Positional upload arguments for the registry call.
///
/// An empty `previous_hash` means the record starts a new chain.
#[wasm_bindgen]
pub fn encode_upload_wasm(
    filename: &str,
    model: &str,
    dataset: &str,
    prompt: &str,
    previous_hash: &str,
    creator: &str,
    nonce: &str,
) -> String {
    respond(encode_upload_internal(
        filename,
        model,
        dataset,
        prompt,
        previous_hash,
        creator,
        nonce,
    ))
}

fn encode_upload_internal(
    filename: &str,
    model: &str,
    dataset: &str,
    prompt: &str,
    previous_hash: &str,
    creator: &str,
    nonce: &str,
) -> Result<UploadArgs, String> {
    let draft = RecordDraft::new(filename, model, dataset, prompt)
        .map_err(|e| e.to_string())?
        .with_previous(Some(RecordId::new(previous_hash)));
    let record = draft.prepare(&Principal::new(creator), &Nonce::new(nonce));
    Ok(UploadArgs::encode(&record))
}

/// Decode a raw `get_all_files` reply into records. Undecodable elements are
/// counted in `skipped`.
#[wasm_bindgen]
pub fn decode_listing_wasm(listing_json: &str) -> String {
    respond(decode_listing_internal(listing_json))
}

#[derive(Serialize)]
struct DecodedListing {
    records: Vec<Record>,
    skipped: usize,
}

fn decode_listing_internal(listing_json: &str) -> Result<DecodedListing, String> {
    let value =
        serde_json::from_str(listing_json).map_err(|e| format!("Failed to parse listing: {}", e))?;
    let listing = decode_listing(value).map_err(|e| e.to_string())?;
    Ok(DecodedListing {
        skipped: listing.skipped.len(),
        records: listing.records,
    })
}

/// Group decoded records into histories, most recently updated first.
#[wasm_bindgen]
pub fn group_records_wasm(records_json: &str, verified: bool) -> String {
    respond(group_records_internal(records_json, verified))
}

fn group_records_internal(records_json: &str, verified: bool) -> Result<Vec<History>, String> {
    let records = parse_records(records_json)?;
    let strategy = if verified {
        GroupingStrategy::ByVerifiedChain
    } else {
        GroupingStrategy::ByOwnerAndName
    };
    Ok(strategy.histories(&records))
}

/// Case-insensitive search over `filename`, `dataset` or `model`.
#[wasm_bindgen]
pub fn filter_records_wasm(records_json: &str, term: &str, field: &str) -> String {
    respond(filter_records_internal(records_json, term, field))
}

fn filter_records_internal(
    records_json: &str,
    term: &str,
    field: &str,
) -> Result<Vec<Record>, String> {
    let records = parse_records(records_json)?;
    Ok(filter(&records, term, field).into_iter().cloned().collect())
}

/// Format a registry timestamp (nanoseconds) for display.
#[wasm_bindgen]
pub fn format_timestamp_wasm(timestamp_ns: u64) -> String {
    format_timestamp(timestamp_ns)
}

/// Get the library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
