use chrono::{Days, NaiveDate};

use super::DomainError;

/// Whole nights between check-in and check-out. A stay of zero or
/// negative length is malformed input, never a valid booking.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> Result<i64, DomainError> {
    let nights = (check_out - check_in).num_days();
    if nights <= 0 {
        return Err(DomainError::InvalidRange {
            check_in,
            check_out,
        });
    }
    Ok(nights)
}

/// Overlap test for two half-open `[start, end)` intervals.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Overlap between a half-open booking range and an inclusive
/// `[start, end]` block range. The block end is widened one day so both
/// sides use the same half-open semantics.
pub fn overlaps_inclusive_block(
    check_in: NaiveDate,
    check_out: NaiveDate,
    block_start: NaiveDate,
    block_end: NaiveDate,
) -> bool {
    let block_end_exclusive = block_end
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX);
    ranges_overlap(check_in, check_out, block_start, block_end_exclusive)
}

/// Restartable iterator over every calendar day in `[start, end)`.
#[derive(Debug, Clone)]
pub struct DaysIter {
    next: NaiveDate,
    end: NaiveDate,
}

impl Iterator for DaysIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current.succ_opt()?;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next).num_days().max(0) as usize;
        (remaining, Some(remaining))
    }
}

pub fn expand_days(start: NaiveDate, end: NaiveDate) -> DaysIter {
    DaysIter { next: start, end }
}
