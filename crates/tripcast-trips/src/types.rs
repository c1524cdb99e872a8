use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tripcast_core::TripError;
use tripcast_weather::{Coordinates, Location};

/// Generated document id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub String);

impl TripId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TripId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A stored trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub owner_id: String,
    /// Display name at creation time, "Anonymous" when the account has none
    pub owner_name: String,
    pub city: String,
    pub country: String,
    pub coords: Coordinates,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn location(&self) -> Location {
        Location {
            coords: self.coords,
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }
}

/// Departure/arrival selection. Either end may still be unset, and the
/// order of the two dates is not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn both(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.from?, self.to?))
    }
}

/// The account saving a trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripOwner {
    pub id: String,
    pub display_name: Option<String>,
}

/// Unvalidated trip fields as collected from the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripDraft {
    pub city: String,
    pub country: String,
    pub coords: Option<Coordinates>,
    pub dates: DateRange,
}

impl TripDraft {
    pub fn from_location(location: &Location, dates: DateRange) -> Self {
        Self {
            city: location.city.clone(),
            country: location.country.clone(),
            coords: Some(location.coords),
            dates,
        }
    }

    /// Checks for a new trip: dates, then location, then the account.
    pub fn validate_new(self, owner: Option<&TripOwner>) -> Result<NewTrip, TripError> {
        let (departure_date, arrival_date) = self.dates.both().ok_or(TripError::MissingDates)?;

        let coords = match self.coords {
            Some(coords) if !self.city.trim().is_empty() => coords,
            _ => return Err(TripError::MissingLocation),
        };

        let owner = owner.ok_or(TripError::NotAuthenticated)?;

        Ok(NewTrip {
            owner_id: owner.id.clone(),
            owner_name: owner
                .display_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            fields: TripFields {
                city: self.city,
                country: self.country,
                coords,
                departure_date,
                arrival_date,
            },
        })
    }

    /// Checks for an edit: every text field and date, then coordinates.
    pub fn validate_update(self) -> Result<TripFields, TripError> {
        let mut missing = Vec::new();
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        if self.country.trim().is_empty() {
            missing.push("country");
        }
        if self.dates.from.is_none() {
            missing.push("departure date");
        }
        if self.dates.to.is_none() {
            missing.push("arrival date");
        }
        if !missing.is_empty() {
            return Err(TripError::Incomplete(missing.join(", ")));
        }

        let coords = self.coords.ok_or(TripError::MissingCoordinates)?;
        let (departure_date, arrival_date) = self.dates.both().ok_or(TripError::MissingDates)?;

        Ok(TripFields {
            city: self.city,
            country: self.country,
            coords,
            departure_date,
            arrival_date,
        })
    }
}

/// Validated, editable trip fields
#[derive(Debug, Clone, PartialEq)]
pub struct TripFields {
    pub city: String,
    pub country: String,
    pub coords: Coordinates,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
}

/// A validated trip ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub owner_id: String,
    pub owner_name: String,
    pub fields: TripFields,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn paris_draft() -> TripDraft {
        TripDraft {
            city: "Paris".into(),
            country: "FR".into(),
            coords: Some(Coordinates::new(48.8566, 2.3522)),
            dates: DateRange::new(date(1), date(7)),
        }
    }

    fn owner() -> TripOwner {
        TripOwner {
            id: "uid-1".into(),
            display_name: None,
        }
    }

    #[test]
    fn test_validate_new_ok() {
        let trip = paris_draft().validate_new(Some(&owner())).unwrap();
        assert_eq!(trip.owner_id, "uid-1");
        assert_eq!(trip.owner_name, "Anonymous");
        assert_eq!(trip.fields.departure_date, date(1));
    }

    #[test]
    fn test_validate_new_requires_owner() {
        let err = paris_draft().validate_new(None).unwrap_err();
        assert!(matches!(err, TripError::NotAuthenticated));
    }

    #[test]
    fn test_validate_new_requires_both_dates() {
        let mut draft = paris_draft();
        draft.dates.to = None;
        assert!(matches!(
            draft.validate_new(Some(&owner())),
            Err(TripError::MissingDates)
        ));
    }

    #[test]
    fn test_validate_new_requires_location() {
        let mut draft = paris_draft();
        draft.coords = None;
        assert!(matches!(
            draft.validate_new(Some(&owner())),
            Err(TripError::MissingLocation)
        ));

        let mut draft = paris_draft();
        draft.city = "  ".into();
        assert!(matches!(
            draft.validate_new(Some(&owner())),
            Err(TripError::MissingLocation)
        ));
    }

    #[test]
    fn test_reversed_dates_are_accepted() {
        let mut draft = paris_draft();
        draft.dates = DateRange::new(date(9), date(2));
        let trip = draft.validate_new(Some(&owner())).unwrap();
        assert!(trip.fields.arrival_date < trip.fields.departure_date);
    }

    #[test]
    fn test_validate_update_lists_missing_fields() {
        let draft = TripDraft {
            city: String::new(),
            country: String::new(),
            coords: None,
            dates: DateRange::default(),
        };
        match draft.validate_update() {
            Err(TripError::Incomplete(fields)) => {
                assert_eq!(fields, "city, country, departure date, arrival date")
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut draft = paris_draft();
        draft.coords = None;
        assert!(matches!(
            draft.validate_update(),
            Err(TripError::MissingCoordinates)
        ));
    }
}
