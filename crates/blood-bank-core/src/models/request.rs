//! Blood request models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blood_type::BloodType;
use super::validation::{self, ValidationError, ValidationResult};

/// Maximum number of units a single request may ask for.
pub const MAX_UNITS: u32 = 10;

/// Maximum length of request notes, in characters.
pub const MAX_NOTES_CHARS: usize = 500;

/// Requester-declared severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }

    /// High and critical requests rank same-city donors ahead of radius matches.
    pub fn prefers_local_donors(&self) -> bool {
        matches!(self, Urgency::High | Urgency::Critical)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "normal" => Ok(Urgency::Normal),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            other => Err(ValidationError::new(
                "urgency",
                format!("unknown urgency {:?}", other),
            )),
        }
    }
}

/// Lifecycle status of a blood request.
///
/// `Open` is the only non-terminal state; see [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Open,
    Fulfilled,
    Cancelled,
    Expired,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Open,
        RequestStatus::Fulfilled,
        RequestStatus::Cancelled,
        RequestStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Open)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(RequestStatus::Open),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            "cancelled" => Ok(RequestStatus::Cancelled),
            "expired" => Ok(RequestStatus::Expired),
            other => Err(ValidationError::new(
                "status",
                format!("unknown status {:?}", other),
            )),
        }
    }
}

/// Optional geographic position, used by coordinate-aware proximity strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> ValidationResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::new("latitude", "must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::new("longitude", "must be within [-180, 180]"));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// A request for blood units at a facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BloodRequest {
    /// Unique request ID (UUID)
    pub id: String,
    /// Required blood type
    pub blood_type: BloodType,
    /// Units needed, 1..=10
    pub units: u32,
    pub urgency: Urgency,
    /// Free-text location
    pub city: String,
    /// Facility name
    pub hospital: String,
    pub contact_phone: String,
    /// Optional notes, at most 500 characters
    pub notes: Option<String>,
    pub status: RequestStatus,
    /// Owning identity, if known
    pub requester_id: Option<String>,
    /// Facility position, if known
    pub coordinates: Option<Coordinates>,
    /// Creation time (immutable)
    pub created_at: DateTime<Utc>,
    /// Natural expiry; `None` means only manual transitions apply
    pub expires_at: Option<DateTime<Utc>>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl BloodRequest {
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }

    /// Whether `actor_id` created this request.
    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.requester_id.as_deref() == Some(actor_id)
    }

    /// Compact view sent to donors with alerts.
    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            request_id: self.id.clone(),
            blood_type: self.blood_type,
            units: self.units,
            urgency: self.urgency,
            city: self.city.clone(),
            hospital: self.hospital.clone(),
            contact_phone: self.contact_phone.clone(),
        }
    }
}

/// Input fields for creating a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBloodRequest {
    pub blood_type: BloodType,
    pub units: u32,
    pub urgency: Urgency,
    pub city: String,
    pub hospital: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub requester_id: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewBloodRequest {
    /// Minimal input with required fields; urgency defaults to normal.
    pub fn new(
        blood_type: BloodType,
        units: u32,
        city: impl Into<String>,
        hospital: impl Into<String>,
        contact_phone: impl Into<String>,
    ) -> Self {
        Self {
            blood_type,
            units,
            urgency: Urgency::Normal,
            city: city.into(),
            hospital: hospital.into(),
            contact_phone: contact_phone.into(),
            notes: None,
            requester_id: None,
            coordinates: None,
            expires_at: None,
        }
    }

    /// Validate the input and build an open request created at `now`.
    pub fn validate(self, now: DateTime<Utc>) -> ValidationResult<BloodRequest> {
        if !(1..=MAX_UNITS).contains(&self.units) {
            return Err(ValidationError::new(
                "units",
                format!("must be between 1 and {}", MAX_UNITS),
            ));
        }

        let city = validation::required_text("city", &self.city)?;
        let hospital = validation::required_text("hospital", &self.hospital)?;
        let contact_phone = validation::phone_number("contactPhone", &self.contact_phone)?;
        let notes = validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_CHARS)?;
        let requester_id = self
            .requester_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(ValidationError::new(
                    "expiresAt",
                    "must be after the creation time",
                ));
            }
        }

        Ok(BloodRequest {
            id: uuid::Uuid::new_v4().to_string(),
            blood_type: self.blood_type,
            units: self.units,
            urgency: self.urgency,
            city,
            hospital,
            contact_phone,
            notes,
            status: RequestStatus::Open,
            requester_id,
            coordinates: self.coordinates,
            created_at: now,
            expires_at: self.expires_at,
            updated_at: now,
        })
    }
}

/// What a donor is told about a matching request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestSummary {
    pub request_id: String,
    pub blood_type: BloodType,
    pub units: u32,
    pub urgency: Urgency,
    pub city: String,
    pub hospital: String,
    pub contact_phone: String,
}
