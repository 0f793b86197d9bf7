//! Tests for the interval overlap validator.

use schedule_guard::{find_overlaps, has_overlap, Interval};

/// Helper to create an Interval from raw stored fields.
fn interval(id: &str, dates: (&str, &str), times: (&str, &str)) -> Interval {
    Interval::new(id, dates.0, dates.1, times.0, times.1)
}

// ── Reference scenarios ─────────────────────────────────────────────────────

#[test]
fn touching_time_edge_is_not_a_conflict() {
    // 6:00-7:00 PM vs 7:00-8:00 PM on the same day: back-to-back classes
    let candidate = interval("new", ("01/03/2024", "01/03/2024"), ("6:00 PM", "7:00 PM"));
    let existing = vec![interval(
        "a",
        ("01/03/2024", "01/03/2024"),
        ("7:00 PM", "8:00 PM"),
    )];

    assert!(!has_overlap(&candidate, &existing, None));
}

#[test]
fn thirty_minute_overlap_is_a_conflict() {
    let candidate = interval("new", ("01/03/2024", "01/03/2024"), ("6:00 PM", "7:30 PM"));
    let existing = vec![interval(
        "a",
        ("01/03/2024", "01/03/2024"),
        ("7:00 PM", "8:00 PM"),
    )];

    assert!(has_overlap(&candidate, &existing, None));

    let overlaps = find_overlaps(&candidate, &existing, None);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].existing_id, "a");
    assert_eq!(overlaps[0].overlap_minutes, 30);
    assert_eq!(overlaps[0].overlap_days, 1);
}

#[test]
fn disjoint_date_ranges_never_conflict() {
    // Same time slot, but 1-5 March vs 6-10 March
    let candidate = interval("new", ("01/03/2024", "05/03/2024"), ("6:00 PM", "7:00 PM"));
    let existing = vec![interval(
        "a",
        ("06/03/2024", "10/03/2024"),
        ("6:00 PM", "7:00 PM"),
    )];

    assert!(!has_overlap(&candidate, &existing, None));
}

#[test]
fn excluded_id_cannot_conflict_with_itself() {
    let existing = vec![interval(
        "sched-1",
        ("01/03/2024", "31/03/2024"),
        ("6:00 PM", "7:00 PM"),
    )];
    let candidate = existing[0].clone();

    assert!(has_overlap(&candidate, &existing, None));
    assert!(!has_overlap(&candidate, &existing, Some("sched-1")));
}

#[test]
fn malformed_existing_entry_is_skipped_and_valid_conflict_still_found() {
    let candidate = interval("new", ("01/03/2024", "01/03/2024"), ("6:00 PM", "7:00 PM"));
    let existing = vec![
        interval("broken", ("01/03/2024", "01/03/2024"), ("not-a-time", "7:00 PM")),
        interval("real", ("01/03/2024", "01/03/2024"), ("6:30 PM", "7:30 PM")),
    ];

    assert!(has_overlap(&candidate, &existing, None));

    let overlaps = find_overlaps(&candidate, &existing, None);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].existing_id, "real");
}

#[test]
fn unparseable_candidate_end_date_never_conflicts() {
    let candidate = interval("new", ("01/03/2024", "31-03-2024"), ("6:00 PM", "7:00 PM"));
    let existing = vec![interval(
        "a",
        ("01/03/2024", "31/03/2024"),
        ("6:00 PM", "7:00 PM"),
    )];

    assert!(!has_overlap(&candidate, &existing, None));
    assert!(find_overlaps(&candidate, &existing, None).is_empty());
}

// ── Dimension independence ──────────────────────────────────────────────────

#[test]
fn weekday_and_weekend_blocks_do_not_conflict() {
    // Mon 4 - Fri 8 March vs Sat 9 - Sun 10 March, same evening slot
    let candidate = interval("new", ("09/03/2024", "10/03/2024"), ("6:00 PM", "7:00 PM"));
    let existing = vec![interval(
        "weekday",
        ("04/03/2024", "08/03/2024"),
        ("6:00 PM", "7:00 PM"),
    )];

    assert!(!has_overlap(&candidate, &existing, None));
}

#[test]
fn shared_boundary_date_is_a_date_overlap() {
    // Date ranges touch on 5 March; the closed date test counts that day.
    let candidate = interval("new", ("05/03/2024", "10/03/2024"), ("6:00 PM", "7:00 PM"));
    let existing = vec![interval(
        "a",
        ("01/03/2024", "05/03/2024"),
        ("6:30 PM", "8:00 PM"),
    )];

    let overlaps = find_overlaps(&candidate, &existing, None);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].overlap_days, 1);
    assert_eq!(overlaps[0].overlap_minutes, 30);
}

#[test]
fn overlapping_dates_with_disjoint_times_do_not_conflict() {
    let candidate = interval("new", ("01/03/2024", "31/03/2024"), ("7:00 AM", "8:00 AM"));
    let existing = vec![interval(
        "a",
        ("01/03/2024", "31/03/2024"),
        ("6:00 PM", "7:00 PM"),
    )];

    assert!(!has_overlap(&candidate, &existing, None));
}

#[test]
fn mixed_clock_formats_compare_on_minutes() {
    // Candidate in 24h, stored record in 12h.
    let candidate = interval("new", ("01/03/2024", "01/03/2024"), ("18:30", "19:30"));
    let existing = vec![interval(
        "a",
        ("01/03/2024", "01/03/2024"),
        ("6:00 PM", "7:00 PM"),
    )];

    assert!(has_overlap(&candidate, &existing, None));
}

#[test]
fn contained_slot_reports_shorter_duration() {
    let candidate = interval("new", ("10/03/2024", "12/03/2024"), ("6:15 PM", "6:45 PM"));
    let existing = vec![interval(
        "a",
        ("01/03/2024", "31/03/2024"),
        ("6:00 PM", "8:00 PM"),
    )];

    let overlaps = find_overlaps(&candidate, &existing, None);
    assert_eq!(overlaps[0].overlap_minutes, 30);
    assert_eq!(overlaps[0].overlap_days, 3);
}

// ── Malformed inputs ────────────────────────────────────────────────────────

#[test]
fn inverted_existing_ranges_are_non_blocking() {
    let candidate = interval("new", ("01/03/2024", "01/03/2024"), ("9:00 AM", "9:00 PM"));
    let existing = vec![
        // End time before start time
        interval("night", ("01/03/2024", "01/03/2024"), ("8:00 PM", "10:00 AM")),
        // End date before start date
        interval("backwards", ("05/03/2024", "01/03/2024"), ("6:00 PM", "7:00 PM")),
    ];

    assert!(!has_overlap(&candidate, &existing, None));
}

#[test]
fn empty_existing_list_never_conflicts() {
    let candidate = interval("new", ("01/03/2024", "01/03/2024"), ("6:00 PM", "7:00 PM"));
    assert!(!has_overlap(&candidate, &[], None));
    assert!(find_overlaps(&candidate, &[], None).is_empty());
}

#[test]
fn every_conflict_is_enumerated_in_input_order() {
    let candidate = interval("new", ("01/03/2024", "31/03/2024"), ("5:00 PM", "9:00 PM"));
    let existing = vec![
        interval("b", ("15/03/2024", "20/03/2024"), ("8:00 PM", "10:00 PM")),
        interval("skip", ("01/04/2024", "30/04/2024"), ("6:00 PM", "7:00 PM")),
        interval("a", ("01/02/2024", "02/03/2024"), ("4:00 PM", "6:00 PM")),
    ];

    let ids: Vec<String> = find_overlaps(&candidate, &existing, None)
        .into_iter()
        .map(|o| o.existing_id)
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn validator_ignores_active_flag() {
    // Filtering inactive records is the caller's job; anything passed in counts.
    let candidate = interval("new", ("01/03/2024", "01/03/2024"), ("6:00 PM", "7:00 PM"));
    let mut inactive = interval("old", ("01/03/2024", "01/03/2024"), ("6:00 PM", "7:00 PM"));
    inactive.active = false;

    assert!(has_overlap(&candidate, &[inactive], None));
}
