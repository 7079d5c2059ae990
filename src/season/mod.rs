//! Season calendar.
//!
//! Maps a requested date span onto the dates that fall inside a playing
//! season, so the fetch stage never issues a request for a date on which no
//! games can exist.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::ConfigurationError;

/// Start and end of one regular season plus postseason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SeasonWindow {
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

const BUILTIN_SEASONS: &[(i32, (u32, u32), (u32, u32))] = &[
    (2008, (3, 25), (10, 27)),
    (2009, (4, 5), (11, 4)),
    (2010, (4, 4), (11, 1)),
    (2011, (3, 31), (10, 28)),
    (2012, (3, 28), (10, 28)),
    (2013, (3, 31), (10, 30)),
    (2014, (3, 22), (10, 29)),
    (2015, (4, 5), (11, 1)),
    (2016, (4, 3), (11, 2)),
    (2017, (4, 2), (11, 1)),
    (2018, (3, 29), (10, 28)),
    (2019, (3, 20), (10, 30)),
    (2020, (7, 23), (10, 27)),
    (2021, (4, 14), (11, 2)),
    (2022, (4, 7), (11, 15)),
    (2023, (3, 30), (11, 15)),
    (2024, (3, 20), (10, 30)),
    (2025, (3, 18), (11, 1)),
];

/// Immutable per-year lookup of season windows.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTable {
    windows: BTreeMap<i32, SeasonWindow>,
}

impl SeasonTable {
    /// Build a table from explicit windows, rejecting inverted ranges, windows
    /// that do not start in their own year, and duplicate years.
    pub fn from_windows(windows: Vec<SeasonWindow>) -> Result<Self, ConfigurationError> {
        let mut map = BTreeMap::new();
        for window in windows {
            if window.start > window.end {
                return Err(ConfigurationError::InvalidSeason {
                    year: window.year,
                    reason: format!("start {} is after end {}", window.start, window.end),
                });
            }
            if window.start.year() != window.year {
                return Err(ConfigurationError::InvalidSeason {
                    year: window.year,
                    reason: format!("start {} is outside the season year", window.start),
                });
            }
            if map.insert(window.year, window).is_some() {
                return Err(ConfigurationError::InvalidSeason {
                    year: window.year,
                    reason: "year listed more than once".to_string(),
                });
            }
        }
        Ok(Self { windows: map })
    }

    /// The reference table shipped with the crate.
    pub fn builtin() -> Self {
        let windows = BUILTIN_SEASONS
            .iter()
            .filter_map(|&(year, (sm, sd), (em, ed))| {
                Some(SeasonWindow {
                    year,
                    start: NaiveDate::from_ymd_opt(year, sm, sd)?,
                    end: NaiveDate::from_ymd_opt(year, em, ed)?,
                })
            })
            .map(|w| (w.year, w))
            .collect();
        Self { windows }
    }

    /// The built-in table with the given windows replacing or adding years.
    pub fn builtin_with(overrides: Vec<SeasonWindow>) -> Result<Self, ConfigurationError> {
        let overrides = Self::from_windows(overrides)?;
        let mut table = Self::builtin();
        table.windows.extend(overrides.windows);
        Ok(table)
    }

    pub fn window(&self, year: i32) -> Result<&SeasonWindow, ConfigurationError> {
        self.windows
            .get(&year)
            .ok_or(ConfigurationError::MissingSeason(year))
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.windows.keys().copied()
    }
}

impl Default for SeasonTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolves date spans against a [`SeasonTable`].
#[derive(Debug, Clone, Default)]
pub struct SeasonCalendar {
    table: SeasonTable,
}

impl SeasonCalendar {
    pub fn new(table: SeasonTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SeasonTable {
        &self.table
    }

    /// In-season dates between `start` and `min(end, max_date)`, ascending.
    ///
    /// Dates before a season start jump forward to that start; dates after a
    /// season end carry over to the next year's start. A year missing from the
    /// table is an error as soon as the walk needs it.
    pub fn resolve(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        max_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, ConfigurationError> {
        let limit = end.min(max_date);
        let mut dates = Vec::new();
        let mut current = start;

        while current <= limit {
            let window = self.table.window(current.year())?;

            if current < window.start {
                current = window.start;
            } else if current > window.end {
                let next_year = current.year() + 1;
                match NaiveDate::from_ymd_opt(next_year, 1, 1) {
                    // Nothing left to return, no need to consult next year's window.
                    Some(new_year) if new_year > limit => break,
                    None => break,
                    Some(_) => current = self.table.window(next_year)?.start,
                }
            }

            if current > limit {
                break;
            }

            dates.push(current);
            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        Ok(dates)
    }

    /// Like [`resolve`](Self::resolve), capped at yesterday in local time: the
    /// feed does not reliably serve same-day data.
    pub fn resolve_until_yesterday(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, ConfigurationError> {
        self.resolve(start, end, yesterday())
    }
}

pub fn yesterday() -> NaiveDate {
    Local::now().date_naive() - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn far_future() -> NaiveDate {
        d(2100, 1, 1)
    }

    #[test]
    fn test_builtin_table_covers_2008_through_2025() {
        let table = SeasonTable::builtin();
        let years: Vec<i32> = table.years().collect();
        assert_eq!(years.first(), Some(&2008));
        assert_eq!(years.last(), Some(&2025));
        assert_eq!(years.len(), 18);
        assert_eq!(table.window(2020).unwrap().start, d(2020, 7, 23));
    }

    #[test]
    fn test_resolve_inside_season() {
        let calendar = SeasonCalendar::default();
        let dates = calendar
            .resolve(d(2023, 5, 1), d(2023, 5, 3), far_future())
            .unwrap();
        assert_eq!(dates, vec![d(2023, 5, 1), d(2023, 5, 2), d(2023, 5, 3)]);
    }

    #[test]
    fn test_resolve_jumps_to_season_start() {
        let calendar = SeasonCalendar::default();
        let dates = calendar
            .resolve(d(2023, 1, 10), d(2023, 4, 1), far_future())
            .unwrap();
        assert_eq!(dates, vec![d(2023, 3, 30), d(2023, 3, 31), d(2023, 4, 1)]);
    }

    #[test]
    fn test_resolve_carries_over_to_next_season() {
        let calendar = SeasonCalendar::default();
        let dates = calendar
            .resolve(d(2022, 11, 14), d(2023, 3, 31), far_future())
            .unwrap();
        assert_eq!(
            dates,
            vec![d(2022, 11, 14), d(2022, 11, 15), d(2023, 3, 30), d(2023, 3, 31)]
        );
    }

    #[test]
    fn test_resolve_offseason_only_span_is_empty() {
        let calendar = SeasonCalendar::default();
        let dates = calendar
            .resolve(d(2022, 12, 1), d(2023, 2, 1), far_future())
            .unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn test_resolve_stops_at_max_date() {
        let calendar = SeasonCalendar::default();
        let dates = calendar
            .resolve(d(2023, 6, 1), d(2023, 6, 30), d(2023, 6, 2))
            .unwrap();
        assert_eq!(dates, vec![d(2023, 6, 1), d(2023, 6, 2)]);
    }

    #[test]
    fn test_resolve_after_last_season_end_without_next_year_lookup() {
        let calendar = SeasonCalendar::default();
        // 2026 is not in the table, but the span ends before it is needed.
        let dates = calendar
            .resolve(d(2025, 10, 31), d(2025, 12, 31), far_future())
            .unwrap();
        assert_eq!(dates, vec![d(2025, 10, 31), d(2025, 11, 1)]);
    }

    #[test]
    fn test_resolve_missing_year_is_configuration_error() {
        let calendar = SeasonCalendar::default();
        let err = calendar
            .resolve(d(2007, 5, 1), d(2007, 5, 2), far_future())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingSeason(2007));

        let err = calendar
            .resolve(d(2025, 10, 1), d(2026, 6, 1), far_future())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingSeason(2026));
    }

    #[test]
    fn test_every_resolved_date_is_in_its_season() {
        let calendar = SeasonCalendar::default();
        let dates = calendar
            .resolve(d(2008, 1, 1), d(2025, 12, 31), far_future())
            .unwrap();
        assert!(!dates.is_empty());
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for date in dates {
            let window = calendar.table().window(date.year()).unwrap();
            assert!(window.contains(date), "{} outside its season", date);
        }
    }

    #[test]
    fn test_from_windows_rejects_inverted_range() {
        let err = SeasonTable::from_windows(vec![SeasonWindow {
            year: 2030,
            start: d(2030, 10, 1),
            end: d(2030, 4, 1),
        }])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSeason { year: 2030, .. }));
    }

    #[test]
    fn test_from_windows_rejects_duplicates() {
        let window = SeasonWindow {
            year: 2030,
            start: d(2030, 4, 1),
            end: d(2030, 10, 1),
        };
        assert!(SeasonTable::from_windows(vec![window, window]).is_err());
    }

    #[test]
    fn test_custom_table_drives_calendar() {
        let table = SeasonTable::from_windows(vec![SeasonWindow {
            year: 2030,
            start: d(2030, 4, 1),
            end: d(2030, 4, 2),
        }])
        .unwrap();
        let calendar = SeasonCalendar::new(table);
        let dates = calendar
            .resolve(d(2030, 3, 1), d(2030, 12, 31), far_future())
            .unwrap();
        assert_eq!(dates, vec![d(2030, 4, 1), d(2030, 4, 2)]);
    }

    #[test]
    fn test_builtin_with_overrides_one_year() {
        let table = SeasonTable::builtin_with(vec![
            SeasonWindow {
                year: 2023,
                start: d(2023, 3, 15),
                end: d(2023, 11, 1),
            },
            SeasonWindow {
                year: 2026,
                start: d(2026, 3, 26),
                end: d(2026, 11, 1),
            },
        ])
        .unwrap();
        assert_eq!(table.window(2023).unwrap().start, d(2023, 3, 15));
        assert_eq!(table.window(2026).unwrap().end, d(2026, 11, 1));
        assert_eq!(table.window(2008).unwrap().start, d(2008, 3, 25));
    }
}
