//! Trip-relative date labels.
//!
//! A trip spans `number_nights + 1` calendar days starting at `start_date`.
//! Every location on a trip is pinned to one of the generated labels
//! ("Day 2 - 2024-06-02", "Night 1 - 2024-06-01") or left `Unassigned`.
//! Labels are generated fresh on every call; nothing here is cached, so a
//! changed trip immediately changes which labels are valid.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::models::location::{LocationKind, TripLocation};

/// Sentinel accepted for any location regardless of trip state.
pub const UNASSIGNED: &str = "Unassigned";

/// Whether a label names a day (trailheads, endpoints, objectives) or a
/// night (camps).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMode {
    Day,
    Night,
}

impl DateMode {
    pub fn prefix(self) -> &'static str {
        match self {
            DateMode::Day => "Day",
            DateMode::Night => "Night",
        }
    }
}

/// The canonical value of a location's date field.
///
/// The rendered string ("Day 2 - 2024-06-02") is derived presentation;
/// `ordinal` is 1-based to match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabel {
    Unassigned,
    Assigned {
        mode: DateMode,
        ordinal: u32,
        date: NaiveDate,
    },
}

impl DateLabel {
    pub fn is_unassigned(self) -> bool {
        matches!(self, DateLabel::Unassigned)
    }

    pub fn date(self) -> Option<NaiveDate> {
        match self {
            DateLabel::Unassigned => None,
            DateLabel::Assigned { date, .. } => Some(date),
        }
    }

    pub fn mode(self) -> Option<DateMode> {
        match self {
            DateLabel::Unassigned => None,
            DateLabel::Assigned { mode, .. } => Some(mode),
        }
    }
}

impl fmt::Display for DateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateLabel::Unassigned => f.write_str(UNASSIGNED),
            DateLabel::Assigned {
                mode,
                ordinal,
                date,
            } => write!(f, "{} {} - {}", mode.prefix(), ordinal, date),
        }
    }
}

/// A stored label that is neither `Unassigned` nor of the generated shape.
/// Hitting this means validation was bypassed; callers treat it as a defect
/// and let it propagate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLabelError {
    #[error("date label `{0}` is missing the ` - ` separator")]
    MissingSeparator(String),
    #[error("date label prefix `{0}` is neither `Day` nor `Night`")]
    UnknownPrefix(String),
    #[error("date label ordinal `{0}` is not a positive number")]
    BadOrdinal(String),
    #[error("date label date `{0}` is not an ISO calendar date")]
    BadDate(String),
}

impl FromStr for DateLabel {
    type Err = ParseLabelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == UNASSIGNED {
            return Ok(DateLabel::Unassigned);
        }
        let (head, tail) = raw
            .split_once(" - ")
            .ok_or_else(|| ParseLabelError::MissingSeparator(raw.to_owned()))?;
        let (prefix, number) = head
            .split_once(' ')
            .ok_or_else(|| ParseLabelError::MissingSeparator(raw.to_owned()))?;
        let mode = match prefix {
            "Day" => DateMode::Day,
            "Night" => DateMode::Night,
            other => return Err(ParseLabelError::UnknownPrefix(other.to_owned())),
        };
        let ordinal: u32 = number
            .parse()
            .map_err(|_| ParseLabelError::BadOrdinal(number.to_owned()))?;
        if ordinal == 0 {
            return Err(ParseLabelError::BadOrdinal(number.to_owned()));
        }
        let date = NaiveDate::parse_from_str(tail, "%Y-%m-%d")
            .map_err(|_| ParseLabelError::BadDate(tail.to_owned()))?;
        Ok(DateLabel::Assigned {
            mode,
            ordinal,
            date,
        })
    }
}

/// The ordered list of labels a trip currently offers for `mode`.
///
/// Day mode yields `number_nights + 1` labels, night mode `number_nights`
/// (none at all for a zero-night trip). Label *i* carries
/// `start_date + i` days.
pub fn date_choices(start_date: NaiveDate, number_nights: u32, mode: DateMode) -> Vec<DateLabel> {
    let count = match mode {
        DateMode::Day => number_nights + 1,
        DateMode::Night => number_nights,
    };
    (0..count)
        .map(|offset| DateLabel::Assigned {
            mode,
            ordinal: offset + 1,
            date: start_date + Days::new(u64::from(offset)),
        })
        .collect()
}

/// One bucket of the per-kind location grouping.
#[derive(Debug, Clone)]
pub struct DateGroup {
    pub label: DateLabel,
    pub locations: Vec<TripLocation>,
}

/// Group a trip's locations of `kind` under every label the trip currently
/// generates for that kind's mode, in generation order.
///
/// Labels without a matching location still get a (empty) bucket, so views
/// can render "nothing planned for Day 3" rows without probing for gaps.
/// Unassigned locations are never part of the grouping.
pub fn location_context(
    start_date: NaiveDate,
    number_nights: u32,
    kind: LocationKind,
    locations: &[TripLocation],
) -> Vec<DateGroup> {
    date_choices(start_date, number_nights, kind.date_mode())
        .into_iter()
        .map(|label| DateGroup {
            locations: locations
                .iter()
                .filter(|location| location.kind == kind && location.date == label)
                .cloned()
                .collect(),
            label,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date")
    }

    #[test]
    fn day_choices_cover_start_through_last_day() {
        let choices = date_choices(date("2024-06-01"), 2, DateMode::Day);
        let rendered: Vec<String> = choices.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "Day 1 - 2024-06-01",
                "Day 2 - 2024-06-02",
                "Day 3 - 2024-06-03",
            ]
        );
    }

    #[test]
    fn night_choices_stop_one_short_of_days() {
        let choices = date_choices(date("2024-06-01"), 2, DateMode::Night);
        let rendered: Vec<String> = choices.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["Night 1 - 2024-06-01", "Night 2 - 2024-06-02"]);
    }

    #[test]
    fn zero_night_trip_has_one_day_and_no_nights() {
        assert_eq!(date_choices(date("2024-06-01"), 0, DateMode::Day).len(), 1);
        assert!(date_choices(date("2024-06-01"), 0, DateMode::Night).is_empty());
    }

    #[test]
    fn choices_are_idempotent_for_unchanged_inputs() {
        let first = date_choices(date("2024-06-01"), 3, DateMode::Day);
        let second = date_choices(date("2024-06-01"), 3, DateMode::Day);
        assert_eq!(first, second);
    }

    #[test]
    fn labels_round_trip_through_their_string_form() {
        for label in date_choices(date("2024-02-28"), 2, DateMode::Night) {
            let parsed: DateLabel = label.to_string().parse().expect("round trip");
            assert_eq!(parsed, label);
        }
        let parsed: DateLabel = UNASSIGNED.parse().expect("sentinel");
        assert!(parsed.is_unassigned());
    }

    #[test]
    fn label_spans_month_boundaries() {
        let choices = date_choices(date("2024-06-30"), 1, DateMode::Day);
        assert_eq!(choices[1].to_string(), "Day 2 - 2024-07-01");
    }

    #[test]
    fn malformed_labels_are_rejected() {
        assert_eq!(
            "Day 1".parse::<DateLabel>(),
            Err(ParseLabelError::MissingSeparator("Day 1".into()))
        );
        assert_eq!(
            "Noon 1 - 2024-06-01".parse::<DateLabel>(),
            Err(ParseLabelError::UnknownPrefix("Noon".into()))
        );
        assert_eq!(
            "Day 0 - 2024-06-01".parse::<DateLabel>(),
            Err(ParseLabelError::BadOrdinal("0".into()))
        );
        assert_eq!(
            "Day 1 - June first".parse::<DateLabel>(),
            Err(ParseLabelError::BadDate("June first".into()))
        );
    }
}
