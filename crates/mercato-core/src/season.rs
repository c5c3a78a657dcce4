// Football season labels ("YY/YY"), start-year derivation, and the canonical
// chronological season calendar used to order every per-season table.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Start-year derivation
// ---------------------------------------------------------------------------

/// Derive the calendar start year from a `"YY/YY"` season label.
///
/// Takes the first two characters, parses them as an integer and adds 2000.
/// Anything that does not parse (short strings, non-digits, multi-byte
/// characters straddling the cut) yields `None` instead of an error, so a
/// partially malformed season column never aborts an aggregation.
pub fn derive_start_year(season: &str) -> Option<i32> {
    let prefix = season.get(0..2)?;
    prefix.parse::<i32>().ok().map(|yy| yy + 2000)
}

/// Format the `"YY/YY"` label for a season starting in `start_year`.
pub fn season_label(start_year: i32) -> String {
    format!(
        "{:02}/{:02}",
        start_year.rem_euclid(100),
        (start_year + 1).rem_euclid(100)
    )
}

// ---------------------------------------------------------------------------
// Year range
// ---------------------------------------------------------------------------

/// Inclusive range of season start years kept in aggregation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        YearRange { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// True if the season label parses to a start year inside the range.
    /// Labels whose year cannot be derived are always out of scope.
    pub fn contains_season(&self, season: &str) -> bool {
        derive_start_year(season).is_some_and(|y| self.contains(y))
    }
}

impl From<[i32; 2]> for YearRange {
    fn from(pair: [i32; 2]) -> Self {
        YearRange::new(pair[0], pair[1])
    }
}

impl From<YearRange> for [i32; 2] {
    fn from(range: YearRange) -> Self {
        [range.start, range.end]
    }
}

// ---------------------------------------------------------------------------
// Season calendar
// ---------------------------------------------------------------------------

/// Explicit chronological ordering of season labels.
///
/// Aggregated tables are always re-sorted against this list rather than
/// relying on group-by insertion order or on lexical string order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonCalendar {
    labels: Vec<String>,
}

impl SeasonCalendar {
    /// Every season from `first` to `last` inclusive, e.g. `10/11 .. 23/24`.
    /// Returns `None` if either label has no derivable start year or the
    /// range is reversed.
    pub fn between(first: &str, last: &str) -> Option<Self> {
        let start = derive_start_year(first)?;
        let end = derive_start_year(last)?;
        if end < start {
            return None;
        }
        Some(SeasonCalendar {
            labels: (start..=end).map(season_label).collect(),
        })
    }

    /// Calendar from an explicit label list, kept in the given order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SeasonCalendar {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Index of the label in chronological order.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Sort key for a label: calendar position first, then labels unknown to
    /// the calendar after every known one, by start year and then text.
    pub fn sort_key(&self, label: &str) -> (usize, i32, String) {
        match self.position(label) {
            Some(idx) => (idx, 0, String::new()),
            None => (
                self.labels.len(),
                derive_start_year(label).unwrap_or(i32::MAX),
                label.to_string(),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_year_from_valid_labels() {
        assert_eq!(derive_start_year("10/11"), Some(2010));
        assert_eq!(derive_start_year("23/24"), Some(2023));
        assert_eq!(derive_start_year("00/01"), Some(2000));
        for yy in 0..100 {
            let label = format!("{:02}/{:02}", yy, (yy + 1) % 100);
            assert_eq!(derive_start_year(&label), Some(2000 + yy));
        }
    }

    #[test]
    fn start_year_from_malformed_labels_is_none() {
        assert_eq!(derive_start_year(""), None);
        assert_eq!(derive_start_year("9"), None);
        assert_eq!(derive_start_year("ab/cd"), None);
        assert_eq!(derive_start_year("1/"), None);
        assert_eq!(derive_start_year("é1/12"), None);
    }

    #[test]
    fn season_label_formats_two_digits() {
        assert_eq!(season_label(2010), "10/11");
        assert_eq!(season_label(2009), "09/10");
        assert_eq!(season_label(2099), "99/00");
    }

    #[test]
    fn year_range_is_inclusive() {
        let range = YearRange::new(2010, 2023);
        assert!(range.contains(2010));
        assert!(range.contains(2023));
        assert!(!range.contains(2009));
        assert!(!range.contains(2024));
        assert!(range.contains_season("15/16"));
        assert!(!range.contains_season("24/25"));
        assert!(!range.contains_season("xx/yy"));
    }

    #[test]
    fn calendar_between_is_chronological() {
        let cal = SeasonCalendar::between("10/11", "23/24").unwrap();
        assert_eq!(cal.len(), 14);
        assert_eq!(cal.labels()[0], "10/11");
        assert_eq!(cal.labels()[13], "23/24");
        assert_eq!(cal.position("12/13"), Some(2));
        assert!(!cal.contains("24/25"));
    }

    #[test]
    fn calendar_between_rejects_reversed_or_malformed() {
        assert!(SeasonCalendar::between("23/24", "10/11").is_none());
        assert!(SeasonCalendar::between("bad", "10/11").is_none());
    }

    #[test]
    fn sort_key_places_unknown_labels_last() {
        let cal = SeasonCalendar::from_labels(["21/22", "20/21"]);
        let mut labels = vec!["19/20", "20/21", "21/22"];
        labels.sort_by_key(|l| cal.sort_key(l));
        assert_eq!(labels, vec!["21/22", "20/21", "19/20"]);
    }
}
