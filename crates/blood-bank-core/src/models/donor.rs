//! Donor models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::blood_type::BloodType;
use super::request::Coordinates;
use super::validation::{self, ValidationError, ValidationResult};
use crate::eligibility;

/// Smallest alert radius a donor may choose, in km.
pub const MIN_MAX_DISTANCE_KM: u32 = 10;

/// Largest alert radius a donor may choose, in km.
pub const MAX_MAX_DISTANCE_KM: u32 = 200;

/// Alert radius applied when a donor does not choose one.
pub const DEFAULT_MAX_DISTANCE_KM: u32 = 50;

/// A registered blood donor, linked 1:1 to an external user identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Donor {
    /// Unique donor ID (UUID)
    pub id: String,
    /// External identity this donor belongs to
    pub user_id: String,
    pub blood_type: BloodType,
    /// Free-text location
    pub city: String,
    /// Position, if the donor shared one
    pub coordinates: Option<Coordinates>,
    /// Self-declared willingness to donate right now
    pub is_available: bool,
    /// Opt-in to alerts for matching requests
    pub receive_alerts: bool,
    /// Alert radius in km, 10..=200
    pub max_distance_km: u32,
    /// Date of the most recent donation
    pub last_donation: Option<NaiveDate>,
    /// First date a new donation is allowed; derived from `last_donation`
    pub can_donate_after: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donor {
    /// Set the last donation date and recompute `can_donate_after`.
    pub fn set_last_donation(&mut self, date: Option<NaiveDate>) {
        self.last_donation = date;
        self.can_donate_after = date.map(eligibility::can_donate_after);
    }

    /// Record a donation on `date`. An older date than the one on file is a
    /// historical entry and leaves the cooldown where it is.
    pub fn record_donation(&mut self, date: NaiveDate) {
        let latest = self.last_donation.map_or(date, |last| last.max(date));
        self.set_last_donation(Some(latest));
    }

    /// Apply availability preferences after validating them.
    pub fn apply_preferences(&mut self, preferences: &DonorPreferences) -> ValidationResult<()> {
        if let Some(max_distance_km) = preferences.max_distance_km {
            self.max_distance_km = validate_max_distance(max_distance_km)?;
        }
        if let Some(is_available) = preferences.is_available {
            self.is_available = is_available;
        }
        if let Some(receive_alerts) = preferences.receive_alerts {
            self.receive_alerts = receive_alerts;
        }
        Ok(())
    }

    /// Apply profile edits after validating them.
    pub fn apply_profile(&mut self, profile: &DonorProfileUpdate) -> ValidationResult<()> {
        if let Some(city) = &profile.city {
            self.city = validation::required_text("city", city)?;
        }
        if let Some(blood_type) = profile.blood_type {
            self.blood_type = blood_type;
        }
        if let Some(coordinates) = profile.coordinates {
            self.coordinates = coordinates;
        }
        Ok(())
    }
}

/// Input fields for registering a donor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDonor {
    pub user_id: String,
    pub blood_type: BloodType,
    pub city: String,
    pub coordinates: Option<Coordinates>,
    pub is_available: bool,
    pub receive_alerts: bool,
    pub max_distance_km: Option<u32>,
    pub last_donation: Option<NaiveDate>,
}

impl NewDonor {
    /// Minimal input: available, opted in to alerts, default radius.
    pub fn new(user_id: impl Into<String>, blood_type: BloodType, city: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            blood_type,
            city: city.into(),
            coordinates: None,
            is_available: true,
            receive_alerts: true,
            max_distance_km: None,
            last_donation: None,
        }
    }

    /// Validate the input and build a donor registered at `now`.
    pub fn validate(self, now: DateTime<Utc>) -> ValidationResult<Donor> {
        let user_id = validation::required_text("userId", &self.user_id)?;
        let city = validation::required_text("city", &self.city)?;
        let max_distance_km =
            validate_max_distance(self.max_distance_km.unwrap_or(DEFAULT_MAX_DISTANCE_KM))?;

        if let Some(date) = self.last_donation {
            if date > now.date_naive() {
                return Err(ValidationError::new("lastDonation", "cannot be in the future"));
            }
        }

        let mut donor = Donor {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            blood_type: self.blood_type,
            city,
            coordinates: self.coordinates,
            is_available: self.is_available,
            receive_alerts: self.receive_alerts,
            max_distance_km,
            last_donation: None,
            can_donate_after: None,
            created_at: now,
            updated_at: now,
        };
        donor.set_last_donation(self.last_donation);
        Ok(donor)
    }
}

/// Donor-controlled availability settings; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DonorPreferences {
    pub is_available: Option<bool>,
    pub receive_alerts: Option<bool>,
    pub max_distance_km: Option<u32>,
}

/// Donor profile edits; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DonorProfileUpdate {
    pub blood_type: Option<BloodType>,
    pub city: Option<String>,
    /// `Some(None)` clears the stored position
    pub coordinates: Option<Option<Coordinates>>,
}

fn validate_max_distance(km: u32) -> ValidationResult<u32> {
    if !(MIN_MAX_DISTANCE_KM..=MAX_MAX_DISTANCE_KM).contains(&km) {
        return Err(ValidationError::new(
            "maxDistance",
            format!(
                "must be between {} and {} km",
                MIN_MAX_DISTANCE_KM, MAX_MAX_DISTANCE_KM
            ),
        ));
    }
    Ok(km)
}
