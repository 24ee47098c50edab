//! History view: read-only queries over stored diagnostic records.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{recording_now, DiagnosticRecord};
use crate::repository::{DiagnosticRepository, Result};

/// Filter for the history view. Both dates are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub since: NaiveDate,
    pub until: NaiveDate,
    /// Exact vehicle name; `None` matches every vehicle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
}

impl HistoryFilter {
    pub fn new(since: NaiveDate, until: NaiveDate) -> Self {
        Self {
            since,
            until,
            vehicle: None,
        }
    }

    /// From the first day of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let (since, until) = default_range(today);
        Self::new(since, until)
    }

    /// Restrict to one vehicle. Blank names mean "all vehicles".
    pub fn with_vehicle(mut self, vehicle: Option<&str>) -> Self {
        self.vehicle = vehicle
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        self
    }
}

/// Today on the same clock records are stamped with.
///
/// Default ranges must end here, or records inserted a moment ago can fall
/// outside them when the local date differs from the UTC date.
pub fn today() -> NaiveDate {
    recording_now().date()
}

/// Default date range for fetches and history: first of the month through today.
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let since = today.with_day(1).unwrap_or(today);
    (since, today)
}

/// Records matching the filter, newest first. Always re-queries the store.
pub fn query_history(
    repository: &DiagnosticRepository,
    filter: &HistoryFilter,
) -> Result<Vec<DiagnosticRecord>> {
    repository.query(filter.since, filter.until, filter.vehicle.as_deref())
}
