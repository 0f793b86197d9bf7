//! Detect double-booked schedules.
//!
//! A candidate conflicts with an existing interval when their date ranges
//! overlap (closed: sharing one date is enough) AND their time-of-day ranges
//! overlap (open: a class ending at 7:00 PM does not clash with one starting
//! at 7:00 PM).
//!
//! Neither function checks `active`. Callers pass only the records that should
//! block a write, normally the result of `DocumentStore::query_active`.

use serde::Serialize;
use tracing::debug;

use crate::interval::{Interval, ParsedInterval};

/// One existing interval the candidate collides with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub existing_id: String,
    /// Calendar dates both intervals are active on.
    pub overlap_days: i64,
    /// Shared time-of-day minutes on each of those dates.
    pub overlap_minutes: i64,
}

/// Report whether `candidate` conflicts with any interval in `existing`.
///
/// - An entry whose id equals `exclude_id` is ignored, so an update never
///   conflicts with its own previous version.
/// - If the candidate itself cannot be parsed, no conflict can be proven and
///   the result is `false`. Rejecting the malformed write is the caller's job.
/// - Existing entries that cannot be parsed are skipped.
///
/// Returns on the first conflict found.
pub fn has_overlap(candidate: &Interval, existing: &[Interval], exclude_id: Option<&str>) -> bool {
    let Some(parsed) = parse_candidate(candidate) else {
        return false;
    };

    comparable(existing, exclude_id).any(|(other, other_parsed)| {
        let hit = parsed.overlaps(&other_parsed);
        if hit {
            debug!(candidate = %candidate.id, existing = %other.id, "overlap detected");
        }
        hit
    })
}

/// Find every interval in `existing` that conflicts with `candidate`.
///
/// Applies exactly the same exclusion and parse policy as [`has_overlap`], so
/// `has_overlap(c, e, x) == !find_overlaps(c, e, x).is_empty()`. Results keep
/// the order of `existing`.
pub fn find_overlaps(
    candidate: &Interval,
    existing: &[Interval],
    exclude_id: Option<&str>,
) -> Vec<Overlap> {
    let Some(parsed) = parse_candidate(candidate) else {
        return Vec::new();
    };

    comparable(existing, exclude_id)
        .filter(|(_, other_parsed)| parsed.overlaps(other_parsed))
        .map(|(other, other_parsed)| Overlap {
            existing_id: other.id.clone(),
            overlap_days: parsed.overlap_days(&other_parsed),
            overlap_minutes: parsed.overlap_minutes(&other_parsed),
        })
        .collect()
}

fn parse_candidate(candidate: &Interval) -> Option<ParsedInterval> {
    match candidate.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(candidate = %candidate.id, error = %e, "candidate not comparable");
            None
        }
    }
}

/// Existing intervals left after exclusion, paired with their parsed form.
fn comparable<'a>(
    existing: &'a [Interval],
    exclude_id: Option<&'a str>,
) -> impl Iterator<Item = (&'a Interval, ParsedInterval)> + 'a {
    existing
        .iter()
        .filter(move |other| exclude_id != Some(other.id.as_str()))
        .filter_map(|other| match other.parse() {
            Ok(parsed) => Some((other, parsed)),
            Err(e) => {
                debug!(existing = %other.id, error = %e, "skipping malformed interval");
                None
            }
        })
}
