//! WASM bindings for schedule-guard.
//!
//! Exposes the double-booking check to the mobile/web client via
//! `wasm-bindgen`. Intervals cross the boundary as JSON strings shaped like the
//! stored schedule documents (`{id, startDate, endDate, startTime, endTime}`),
//! matching the JSON-in/JSON-out pattern of the other bindings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p schedule-guard-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/schedule-guard-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/schedule_guard_wasm.wasm
//! ```

use schedule_guard::Interval;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// JSON plumbing (plain Rust so it can be tested off-wasm)
// ---------------------------------------------------------------------------

fn parse_candidate(json: &str) -> Result<Interval, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid candidate JSON: {}", e))
}

fn parse_existing(json: &str) -> Result<Vec<Interval>, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid intervals JSON: {}", e))
}

fn has_overlap_json(
    candidate_json: &str,
    existing_json: &str,
    exclude_id: Option<&str>,
) -> Result<bool, String> {
    let candidate = parse_candidate(candidate_json)?;
    let existing = parse_existing(existing_json)?;
    Ok(schedule_guard::has_overlap(&candidate, &existing, exclude_id))
}

fn find_overlaps_json(
    candidate_json: &str,
    existing_json: &str,
    exclude_id: Option<&str>,
) -> Result<String, String> {
    let candidate = parse_candidate(candidate_json)?;
    let existing = parse_existing(existing_json)?;
    let overlaps = schedule_guard::find_overlaps(&candidate, &existing, exclude_id);

    serde_json::to_string(&overlaps).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Whether the candidate interval overlaps any of the existing intervals.
///
/// `existing_json` must already be restricted to active schedules. Dates and
/// times that fail to parse never produce a conflict; only malformed JSON throws.
///
/// # Arguments
/// - `candidate_json` -- one interval object
/// - `existing_json` -- array of interval objects
/// - `exclude_id` -- id of the schedule being edited, if any
#[wasm_bindgen(js_name = "hasOverlap")]
pub fn has_overlap(
    candidate_json: &str,
    existing_json: &str,
    exclude_id: Option<String>,
) -> Result<bool, JsValue> {
    has_overlap_json(candidate_json, existing_json, exclude_id.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Every existing interval the candidate overlaps.
///
/// Returns a JSON string containing an array of
/// `{existing_id, overlap_days, overlap_minutes}` objects.
#[wasm_bindgen(js_name = "findOverlaps")]
pub fn find_overlaps(
    candidate_json: &str,
    existing_json: &str,
    exclude_id: Option<String>,
) -> Result<String, JsValue> {
    find_overlaps_json(candidate_json, existing_json, exclude_id.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Parse "6:00 PM" or "18:00" into minutes since midnight.
#[wasm_bindgen(js_name = "parseTime")]
pub fn parse_time(time: &str) -> Result<u16, JsValue> {
    schedule_guard::parse_time(time).map_err(|e| JsValue::from_str(&e.to_string()))
}
