use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::schedule::{DateLabel, DateMode};
use crate::models::trip::Trip;

/// The four location kinds a trip knows about. Stored as two-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Trailhead,
    Endpoint,
    Objective,
    Camp,
}

impl LocationKind {
    pub const ALL: [LocationKind; 4] = [
        LocationKind::Trailhead,
        LocationKind::Endpoint,
        LocationKind::Objective,
        LocationKind::Camp,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LocationKind::Trailhead => "ST",
            LocationKind::Endpoint => "EN",
            LocationKind::Objective => "OB",
            LocationKind::Camp => "CM",
        }
    }

    /// URL segment used by the location routes.
    pub fn slug(self) -> &'static str {
        match self {
            LocationKind::Trailhead => "trailhead",
            LocationKind::Endpoint => "endpoint",
            LocationKind::Objective => "objective",
            LocationKind::Camp => "camp",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Lowercase human word for display.
    pub fn verbose(self) -> &'static str {
        self.slug()
    }

    /// Camps pin to nights, everything else to days. The single place the
    /// kind-to-mode rule lives.
    pub fn date_mode(self) -> DateMode {
        match self {
            LocationKind::Camp => DateMode::Night,
            _ => DateMode::Day,
        }
    }

    pub fn page_title_new(self) -> &'static str {
        match self {
            LocationKind::Trailhead => "Enter a new trailhead location",
            LocationKind::Endpoint => "Enter a new endpoint location",
            LocationKind::Objective => "Enter a new objective",
            LocationKind::Camp => "Enter a new camp location",
        }
    }

    pub fn page_title_edit(self) -> &'static str {
        match self {
            LocationKind::Trailhead => "Edit trailhead location",
            LocationKind::Endpoint => "Edit endpoint location",
            LocationKind::Objective => "Edit objective",
            LocationKind::Camp => "Edit camp location",
        }
    }

    pub fn submit_title(self) -> &'static str {
        match self {
            LocationKind::Trailhead => "Save Trailhead",
            LocationKind::Endpoint => "Save Endpoint",
            LocationKind::Objective => "Save Objective",
            LocationKind::Camp => "Save Camp",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verbose())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown location type code `{0}`")]
pub struct ParseKindError(pub String);

impl FromStr for LocationKind {
    type Err = ParseKindError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| ParseKindError(code.to_owned()))
    }
}

/// A recoverable, user-facing rejection of a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A point of interest pinned to a trip.
#[derive(Debug, Clone)]
pub struct TripLocation {
    pub id: i64,
    pub trip_id: i64,
    pub kind: LocationKind,
    pub title: String,
    pub date: DateLabel,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TripLocation {
    /// The currently valid labels for this location, picked by its own kind.
    /// Callers never choose the mode themselves.
    pub fn date_choices(&self, trip: &Trip) -> Vec<DateLabel> {
        trip.date_choices(self.kind.date_mode())
    }

    pub fn validate(&self, trip: &Trip) -> Result<(), ValidationError> {
        validate_date_label(self.kind, self.date, trip)
    }
}

/// Check a date label against the freshly recomputed choices of `trip`.
///
/// `Unassigned` always passes. An assigned label must be a member of the
/// current choice list for the kind's own mode, so a camp holding a day
/// label fails just like a label outside the trip's span. Recomputing here
/// (rather than trusting whatever list a form was rendered from) is what
/// keeps a location honest after its trip was edited.
pub fn validate_date_label(
    kind: LocationKind,
    date: DateLabel,
    trip: &Trip,
) -> Result<(), ValidationError> {
    match date {
        DateLabel::Unassigned => Ok(()),
        assigned => {
            let choices = trip.date_choices(kind.date_mode());
            if choices.contains(&assigned) {
                Ok(())
            } else {
                Err(ValidationError::new(
                    "date",
                    format!(
                        "{} is not an available {} of this trip",
                        assigned,
                        match kind.date_mode() {
                            DateMode::Day => "day",
                            DateMode::Night => "night",
                        }
                    ),
                ))
            }
        }
    }
}

/// Fields for a location that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub trip_id: i64,
    pub kind: LocationKind,
    pub title: String,
    pub date: DateLabel,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewLocation {
    pub fn validate(&self, trip: &Trip) -> Result<(), ValidationError> {
        validate_date_label(self.kind, self.date, trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trip(nights: u32) -> Trip {
        Trip {
            id: 1,
            title: "title".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("test date"),
            number_nights: nights,
            created_at: chrono::Utc::now(),
        }
    }

    fn label(raw: &str) -> DateLabel {
        raw.parse().expect("test label")
    }

    #[test]
    fn kind_codes_round_trip() {
        for kind in LocationKind::ALL {
            assert_eq!(kind.code().parse::<LocationKind>(), Ok(kind));
        }
        assert!("XX".parse::<LocationKind>().is_err());
    }

    #[test]
    fn a_location_picks_its_choice_mode_from_its_own_kind() {
        let trip = trip(1);
        let camp = TripLocation {
            id: 1,
            trip_id: trip.id,
            kind: LocationKind::Camp,
            title: String::new(),
            date: DateLabel::Unassigned,
            latitude: None,
            longitude: None,
        };
        let rendered: Vec<String> = camp
            .date_choices(&trip)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, ["Night 1 - 2024-06-01"]);
    }

    #[test]
    fn camp_is_the_only_night_kind() {
        assert_eq!(LocationKind::Camp.date_mode(), DateMode::Night);
        assert_eq!(LocationKind::Trailhead.date_mode(), DateMode::Day);
        assert_eq!(LocationKind::Endpoint.date_mode(), DateMode::Day);
        assert_eq!(LocationKind::Objective.date_mode(), DateMode::Day);
    }

    #[test]
    fn verbose_names_are_lowercase_words() {
        assert_eq!(LocationKind::Trailhead.verbose(), "trailhead");
        assert_eq!(LocationKind::Endpoint.verbose(), "endpoint");
        assert_eq!(LocationKind::Objective.verbose(), "objective");
        assert_eq!(LocationKind::Camp.verbose(), "camp");
    }

    #[test]
    fn in_range_label_of_matching_mode_passes() {
        let trip = trip(2);
        assert!(
            validate_date_label(LocationKind::Objective, label("Day 2 - 2024-06-02"), &trip)
                .is_ok()
        );
        assert!(
            validate_date_label(LocationKind::Camp, label("Night 2 - 2024-06-02"), &trip).is_ok()
        );
    }

    #[test]
    fn camp_rejects_day_labels() {
        let trip = trip(2);
        let err = validate_date_label(LocationKind::Camp, label("Day 1 - 2024-06-01"), &trip)
            .expect_err("day label on a camp");
        assert_eq!(err.field, "date");
    }

    #[test]
    fn labels_outside_the_trip_span_fail() {
        let trip = trip(2);
        assert!(
            validate_date_label(LocationKind::Objective, label("Day 4 - 2024-06-04"), &trip)
                .is_err()
        );
        // Right date, wrong ordinal: still not a generated label.
        assert!(
            validate_date_label(LocationKind::Objective, label("Day 1 - 2024-06-02"), &trip)
                .is_err()
        );
    }

    #[test]
    fn camp_on_zero_night_trip_only_accepts_unassigned() {
        let trip = trip(0);
        assert!(
            validate_date_label(LocationKind::Camp, label("Night 1 - 2024-06-01"), &trip).is_err()
        );
        assert!(validate_date_label(LocationKind::Camp, DateLabel::Unassigned, &trip).is_ok());
    }

    #[test]
    fn unassigned_passes_for_every_kind() {
        let trip = trip(1);
        for kind in LocationKind::ALL {
            assert!(validate_date_label(kind, DateLabel::Unassigned, &trip).is_ok());
        }
    }
}
