//! Fixed non-leap calendar.
//!
//! The payments table stores day_of_year on a 365-day calendar.
//! Month boundaries are fixed and never leap-adjusted; every date
//! computation in the engine goes through this table.

use crate::{
    error::{DeskError, DeskResult},
    types::Month,
};

/// Last day_of_year of each month, January through December.
const MONTH_ENDS: [u16; 12] = [31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];

/// Map a 1-indexed day_of_year onto its month.
pub fn month_of_day(day_of_year: u16) -> DeskResult<Month> {
    if day_of_year == 0 || day_of_year > 365 {
        return Err(DeskError::InvalidDayOfYear(day_of_year));
    }
    for (i, end) in MONTH_ENDS.iter().enumerate() {
        if day_of_year <= *end {
            return Ok((i + 1) as Month);
        }
    }
    unreachable!("day_of_year bounds already checked")
}
