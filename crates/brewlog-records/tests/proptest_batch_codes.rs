// crates/brewlog-records/tests/proptest_batch_codes.rs
// ============================================================================
// Module: Batch Code Property Tests
// Description: Property checks for batch code generation and parsing.
// Purpose: Ensure every generated code parses back and sequences advance.
// Dependencies: brewlog-records, proptest, time
// ============================================================================

//! ## Overview
//! Generates codes for arbitrary dates, sequences, and kinds and checks that
//! parsing recovers them and that the next sequence exceeds every code seen.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use brewlog_records::BatchCodeKind;
use brewlog_records::batch_code::MAX_SEQUENCE;
use brewlog_records::batch_code::next_sequence;
use brewlog_records::generate_batch_code;
use brewlog_records::is_valid_batch_code;
use brewlog_records::parse_batch_code;
use proptest::prelude::*;
use time::Date;

fn date() -> impl Strategy<Value = Date> {
    (1_i32 .. 9_999, 1_u16 .. 366).prop_filter_map("day exists in year", |(year, ordinal)| {
        Date::from_ordinal_date(year, ordinal).ok()
    })
}

fn kind() -> impl Strategy<Value = BatchCodeKind> {
    prop::sample::select(BatchCodeKind::ALL.to_vec())
}

proptest! {
    /// Verifies generated codes parse back to their inputs.
    #[test]
    fn generated_codes_parse_back(
        date in date(),
        sequence in 1_u32 ..= MAX_SEQUENCE,
        kind in kind(),
    ) {
        let code = generate_batch_code(date, sequence, kind).unwrap();
        prop_assert!(is_valid_batch_code(&code));
        let parsed = parse_batch_code(&code).unwrap();
        prop_assert_eq!(parsed.date, date);
        prop_assert_eq!(parsed.sequence, sequence);
        prop_assert_eq!(parsed.kind, kind);
    }

    /// Verifies the next sequence is past every same-day code.
    #[test]
    fn next_sequence_exceeds_existing(
        date in date(),
        sequences in prop::collection::vec(1_u32 .. 500, 0 .. 8),
        kind in kind(),
    ) {
        let codes: Vec<String> = sequences
            .iter()
            .map(|sequence| generate_batch_code(date, *sequence, kind).unwrap())
            .collect();
        let next = next_sequence(codes.iter().map(String::as_str), date).unwrap();
        prop_assert_eq!(next, sequences.iter().max().map_or(1, |max| max + 1));
    }
}
