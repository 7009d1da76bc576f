// crates/brewlog-records/src/batch_code.rs
// ============================================================================
// Module: Batch Codes
// Description: Generation, parsing, and lineage of batch codes.
// Purpose: Give every batch a human-readable code that records its ancestry.
// Dependencies: brewlog-core, thiserror, time
// ============================================================================

//! ## Overview
//! Batch codes have the form `YYYYMMDD-NNNN-TTTT`: the UTC brew date, the
//! zero-padded daily sequence (`0001` to `9999`) and a four-character type
//! tag (`1F00`, `2F00`, `KEG0`, `BTL0`). A child batch inherits the lineage
//! of its parent followed by the parent code.

use brewlog_core::Timestamp;
use thiserror::Error;
use time::Date;
use time::Month;
use time::OffsetDateTime;

use crate::batch::BatchCode;
use crate::batch::BatchType;

/// Highest daily sequence number.
pub const MAX_SEQUENCE: u32 = 9_999;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Batch code errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchCodeError {
    /// Sequence outside `1 ..= 9999`.
    #[error("batch sequence {0} is outside 1..=9999")]
    SequenceOutOfRange(u32),
    /// Date cannot be expressed in the code format.
    #[error("batch code date is not representable: {0}")]
    InvalidDate(String),
    /// Text is not a batch code.
    #[error("malformed batch code: {0}")]
    Malformed(String),
}

/// Type tag carried in the last code segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchCodeKind {
    /// `1F00`.
    Primary,
    /// `2F00`.
    Secondary,
    /// `KEG0`.
    Keg,
    /// `BTL0`.
    Bottle,
}

impl BatchCodeKind {
    /// Every type tag.
    pub const ALL: [Self; 4] = [Self::Primary, Self::Secondary, Self::Keg, Self::Bottle];

    /// Returns the four-character tag.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Primary => "1F00",
            Self::Secondary => "2F00",
            Self::Keg => "KEG0",
            Self::Bottle => "BTL0",
        }
    }

    /// Parses a four-character tag.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.suffix() == suffix)
    }
}

impl From<BatchType> for BatchCodeKind {
    fn from(value: BatchType) -> Self {
        match value {
            BatchType::Primary => Self::Primary,
            BatchType::Secondary => Self::Secondary,
            BatchType::Keg => Self::Keg,
            BatchType::Bottle => Self::Bottle,
        }
    }
}

/// Components of a parsed batch code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedBatchCode {
    /// Brew date.
    pub date: Date,
    /// Daily sequence.
    pub sequence: u32,
    /// Type tag.
    pub kind: BatchCodeKind,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Returns the UTC calendar date of `timestamp`.
///
/// # Errors
///
/// Returns [`BatchCodeError::InvalidDate`] when the timestamp is out of range.
pub fn date_of(timestamp: Timestamp) -> Result<Date, BatchCodeError> {
    let nanos = i128::from(timestamp.as_unix_millis()) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map(OffsetDateTime::date)
        .map_err(|err| BatchCodeError::InvalidDate(err.to_string()))
}

/// Formats a batch code.
///
/// # Errors
///
/// Returns [`BatchCodeError::SequenceOutOfRange`] for a sequence outside
/// `1 ..= 9999` and [`BatchCodeError::InvalidDate`] for years that do not
/// have four digits.
pub fn generate_batch_code(
    date: Date,
    sequence: u32,
    kind: BatchCodeKind,
) -> Result<String, BatchCodeError> {
    if !(1 ..= MAX_SEQUENCE).contains(&sequence) {
        return Err(BatchCodeError::SequenceOutOfRange(sequence));
    }
    let year = date.year();
    if !(1_000 ..= 9_999).contains(&year) {
        return Err(BatchCodeError::InvalidDate(format!("year {year} is not four digits")));
    }
    Ok(format!(
        "{year:04}{month:02}{day:02}-{sequence:04}-{suffix}",
        month = u8::from(date.month()),
        day = date.day(),
        suffix = kind.suffix()
    ))
}

/// Builds a batch code with lineage.
///
/// A root batch has lineage `[code]`. A child batch has its parent's lineage
/// followed by the parent code; the parent code is not repeated when the
/// parent lineage already ends with it.
///
/// # Errors
///
/// Returns [`BatchCodeError`] as [`generate_batch_code`] does.
pub fn create_batch_code(
    date: Date,
    sequence: u32,
    kind: BatchCodeKind,
    parent: Option<&BatchCode>,
) -> Result<BatchCode, BatchCodeError> {
    let code = generate_batch_code(date, sequence, kind)?;
    let Some(parent) = parent else {
        return Ok(BatchCode {
            lineage: vec![code.clone()],
            code,
            parent_code: None,
            child_codes: Vec::new(),
        });
    };
    let mut lineage = parent.lineage.clone();
    if lineage.last() != Some(&parent.code) {
        lineage.push(parent.code.clone());
    }
    Ok(BatchCode {
        code,
        parent_code: Some(parent.code.clone()),
        child_codes: Vec::new(),
        lineage,
    })
}

/// Returns true when `code` parses as a batch code.
#[must_use]
pub fn is_valid_batch_code(code: &str) -> bool {
    parse_batch_code(code).is_ok()
}

/// Parses a batch code into its components.
///
/// # Errors
///
/// Returns [`BatchCodeError::Malformed`] when the text does not follow the
/// format, [`BatchCodeError::InvalidDate`] for impossible dates and
/// [`BatchCodeError::SequenceOutOfRange`] for sequence `0000`.
pub fn parse_batch_code(code: &str) -> Result<ParsedBatchCode, BatchCodeError> {
    let malformed = || BatchCodeError::Malformed(code.to_string());
    let mut parts = code.split('-');
    let (Some(date), Some(sequence), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    if date.len() != 8 || !is_digits(date) || sequence.len() != 4 || !is_digits(sequence) {
        return Err(malformed());
    }
    let kind = BatchCodeKind::from_suffix(suffix).ok_or_else(malformed)?;
    let sequence: u32 = sequence.parse().map_err(|_| malformed())?;
    if sequence == 0 {
        return Err(BatchCodeError::SequenceOutOfRange(sequence));
    }
    let year: i32 = date[.. 4].parse().map_err(|_| malformed())?;
    let month: u8 = date[4 .. 6].parse().map_err(|_| malformed())?;
    let day: u8 = date[6 ..].parse().map_err(|_| malformed())?;
    let month =
        Month::try_from(month).map_err(|err| BatchCodeError::InvalidDate(err.to_string()))?;
    let date = Date::from_calendar_date(year, month, day)
        .map_err(|err| BatchCodeError::InvalidDate(err.to_string()))?;
    Ok(ParsedBatchCode {
        date,
        sequence,
        kind,
    })
}

/// Returns the next free daily sequence for `date` given existing codes.
///
/// Codes that do not parse or belong to other dates are ignored.
///
/// # Errors
///
/// Returns [`BatchCodeError::SequenceOutOfRange`] when the day is full.
pub fn next_sequence<'a, I>(existing: I, date: Date) -> Result<u32, BatchCodeError>
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = existing
        .into_iter()
        .filter_map(|code| parse_batch_code(code).ok())
        .filter(|parsed| parsed.date == date)
        .map(|parsed| parsed.sequence)
        .max()
        .unwrap_or(0);
    let next = highest + 1;
    if next > MAX_SEQUENCE {
        return Err(BatchCodeError::SequenceOutOfRange(next));
    }
    Ok(next)
}

/// Returns true when `text` is all ASCII digits.
fn is_digits(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for clarity.")]

    use super::*;

    fn day(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    #[test]
    fn codes_are_zero_padded() {
        let code = generate_batch_code(day(2024, Month::March, 5), 7, BatchCodeKind::Keg).unwrap();
        assert_eq!(code, "20240305-0007-KEG0");
        assert!(is_valid_batch_code(&code));
    }

    #[test]
    fn out_of_range_sequences_are_rejected() {
        let date = day(2024, Month::March, 5);
        assert_eq!(
            generate_batch_code(date, 0, BatchCodeKind::Primary),
            Err(BatchCodeError::SequenceOutOfRange(0))
        );
        assert_eq!(
            generate_batch_code(date, 10_000, BatchCodeKind::Primary),
            Err(BatchCodeError::SequenceOutOfRange(10_000))
        );
    }

    #[test]
    fn parse_rejects_bad_shapes_and_dates() {
        assert!(!is_valid_batch_code("20240305-0007"));
        assert!(!is_valid_batch_code("20240305-0007-KEG0-x"));
        assert!(!is_valid_batch_code("2024030-00007-KEG0"));
        assert!(!is_valid_batch_code("20240305-0007-KEGX"));
        assert!(!is_valid_batch_code("20240305-0000-KEG0"));
        assert!(matches!(
            parse_batch_code("20240230-0001-1F00"),
            Err(BatchCodeError::InvalidDate(_))
        ));
    }

    #[test]
    fn parse_returns_components() {
        let parsed = parse_batch_code("20231231-0042-BTL0").unwrap();
        assert_eq!(parsed.date, day(2023, Month::December, 31));
        assert_eq!(parsed.sequence, 42);
        assert_eq!(parsed.kind, BatchCodeKind::Bottle);
    }

    #[test]
    fn lineage_extends_the_parent_chain() {
        let date = day(2024, Month::May, 1);
        let root = create_batch_code(date, 1, BatchCodeKind::Primary, None).unwrap();
        assert_eq!(root.lineage, vec![root.code.clone()]);
        assert_eq!(root.parent_code, None);
        let child = create_batch_code(date, 2, BatchCodeKind::Secondary, Some(&root)).unwrap();
        assert_eq!(child.parent_code.as_deref(), Some(root.code.as_str()));
        assert_eq!(child.lineage, vec![root.code.clone()]);
        let grandchild = create_batch_code(date, 3, BatchCodeKind::Keg, Some(&child)).unwrap();
        assert_eq!(grandchild.lineage, vec![root.code.clone(), child.code.clone()]);
    }

    #[test]
    fn next_sequence_counts_only_the_same_day() {
        let date = day(2024, Month::May, 1);
        let codes = ["20240501-0003-1F00", "20240502-0009-1F00", "garbage"];
        assert_eq!(next_sequence(codes, date).unwrap(), 4);
        assert_eq!(next_sequence([], date).unwrap(), 1);
        assert_eq!(
            next_sequence(["20240501-9999-1F00"], date),
            Err(BatchCodeError::SequenceOutOfRange(10_000))
        );
    }

    #[test]
    fn dates_come_from_utc_milliseconds() {
        let date = date_of(Timestamp::from_unix_millis(1_700_000_000_000)).unwrap();
        assert_eq!(date, day(2023, Month::November, 14));
    }
}
