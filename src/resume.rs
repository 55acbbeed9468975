//! Decide where each exchange's sync should start.

use chrono::{Duration, NaiveDate};

use crate::models::Exchange;
use crate::utils::next_day;

/// Pick the candidate closest to `to`.
///
/// Distances are signed (`to - candidate`), so a candidate after `to` always
/// wins and yields a start date past the end of the range.
pub fn closest(to: NaiveDate, candidates: &[NaiveDate]) -> Option<NaiveDate> {
    candidates
        .iter()
        .map(|c| to.signed_duration_since(*c))
        .min()
        .map(|distance: Duration| to - distance)
}

/// Date range one exchange still needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPlan {
    pub exchange: Exchange,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyncPlan {
    /// Resolve the start date from the exchange's inception date, an optional
    /// user override and the last date already persisted.
    pub fn resolve(
        exchange: Exchange,
        end: NaiveDate,
        override_start: Option<NaiveDate>,
        last_synced: Option<NaiveDate>,
    ) -> Self {
        let mut candidates = vec![exchange.inception_date()];
        candidates.extend(override_start);
        candidates.extend(last_synced.map(next_day));

        let start = closest(end, &candidates).unwrap_or_else(|| exchange.inception_date());
        Self { exchange, start, end }
    }

    /// Nothing to fetch; the exchange's generator must not be started
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}
