use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::models::location::{LocationKind, TripLocation, ValidationError};
use crate::models::schedule::{self, DateGroup, DateLabel, DateMode};

pub const TITLE_MAX_CHARS: usize = 255;

/// The top-level planning entity: a start date plus a duration in nights.
#[derive(Debug, Clone)]
pub struct Trip {
    pub id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub number_nights: u32,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Labels currently offered for `mode`, recomputed from the live fields
    /// on every call. Editing `start_date` or `number_nights` changes the
    /// result immediately; stored locations are only re-checked when they
    /// are next validated.
    pub fn date_choices(&self, mode: DateMode) -> Vec<DateLabel> {
        schedule::date_choices(self.start_date, self.number_nights, mode)
    }

    /// First trailhead of the trip, if any. Duplicates are tolerated; only
    /// the first by insertion order is reported.
    pub fn trailhead<'a>(&self, locations: &'a [TripLocation]) -> Option<&'a TripLocation> {
        self.first_of(LocationKind::Trailhead, locations)
    }

    /// First endpoint of the trip, if any.
    pub fn endpoint<'a>(&self, locations: &'a [TripLocation]) -> Option<&'a TripLocation> {
        self.first_of(LocationKind::Endpoint, locations)
    }

    fn first_of<'a>(
        &self,
        kind: LocationKind,
        locations: &'a [TripLocation],
    ) -> Option<&'a TripLocation> {
        locations
            .iter()
            .find(|location| location.trip_id == self.id && location.kind == kind)
    }

    pub fn is_in_the_past(&self) -> bool {
        self.start_date < Local::now().date_naive()
    }

    /// One bucket per generated label for `kind`, empty buckets included.
    pub fn location_context(
        &self,
        kind: LocationKind,
        locations: &[TripLocation],
    ) -> Vec<DateGroup> {
        schedule::location_context(self.start_date, self.number_nights, kind, locations)
    }

    /// Locations of `kind` still waiting for a date. These never appear in
    /// the context buckets.
    pub fn unassigned_locations(
        &self,
        kind: LocationKind,
        locations: &[TripLocation],
    ) -> Vec<TripLocation> {
        locations
            .iter()
            .filter(|location| location.kind == kind && location.date.is_unassigned())
            .cloned()
            .collect()
    }
}

/// User-supplied trip fields, shared by the create and edit forms.
#[derive(Debug, Clone)]
pub struct TripDraft {
    pub title: String,
    pub start_date: NaiveDate,
    pub number_nights: u32,
}

impl TripDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "A trip title is required"));
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(ValidationError::new(
                "title",
                format!("Trip titles are limited to {TITLE_MAX_CHARS} characters"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date")
    }

    fn trip(nights: u32) -> Trip {
        Trip {
            id: 7,
            title: "North Cascades loop".into(),
            start_date: date("2024-06-01"),
            number_nights: nights,
            created_at: Utc::now(),
        }
    }

    fn location(id: i64, kind: LocationKind, raw_label: &str) -> TripLocation {
        TripLocation {
            id,
            trip_id: 7,
            kind,
            title: String::new(),
            date: raw_label.parse().expect("test label"),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn choice_lengths_follow_the_night_count() {
        for nights in 0..5 {
            let trip = trip(nights);
            assert_eq!(trip.date_choices(DateMode::Day).len(), nights as usize + 1);
            assert_eq!(trip.date_choices(DateMode::Night).len(), nights as usize);
        }
    }

    #[test]
    fn trailhead_and_endpoint_pick_the_first_match() {
        let trip = trip(1);
        let locations = vec![
            location(1, LocationKind::Objective, "Unassigned"),
            location(2, LocationKind::Trailhead, "Day 1 - 2024-06-01"),
            location(3, LocationKind::Trailhead, "Day 2 - 2024-06-02"),
        ];
        assert_eq!(trip.trailhead(&locations).map(|l| l.id), Some(2));
        assert!(trip.endpoint(&locations).is_none());
    }

    #[test]
    fn past_check_compares_against_today() {
        let today = Local::now().date_naive();
        let mut t = trip(0);
        t.start_date = today;
        assert!(!t.is_in_the_past());
        t.start_date = today - Days::new(1);
        assert!(t.is_in_the_past());
    }

    #[test]
    fn context_keys_match_choices_and_keep_empty_buckets() {
        let trip = trip(1);
        let locations = vec![
            location(1, LocationKind::Objective, "Day 1 - 2024-06-01"),
            location(2, LocationKind::Objective, "Day 1 - 2024-06-01"),
            location(3, LocationKind::Camp, "Night 1 - 2024-06-01"),
            location(4, LocationKind::Objective, "Unassigned"),
        ];
        let context = trip.location_context(LocationKind::Objective, &locations);
        let labels: Vec<DateLabel> = context.iter().map(|group| group.label).collect();
        assert_eq!(labels, trip.date_choices(DateMode::Day));
        assert_eq!(context[0].locations.len(), 2);
        assert!(context[1].locations.is_empty());

        let unassigned = trip.unassigned_locations(LocationKind::Objective, &locations);
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, 4);
    }

    #[test]
    fn draft_titles_are_bounded() {
        let mut draft = TripDraft {
            title: "x".repeat(255),
            start_date: date("2024-06-01"),
            number_nights: 0,
        };
        assert!(draft.validate().is_ok());
        draft.title.push('x');
        assert_eq!(draft.validate().expect_err("256 chars").field, "title");
        draft.title = "   ".into();
        assert!(draft.validate().is_err());
    }
}
