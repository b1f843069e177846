//! Blood Bank Core Library
//!
//! Blood request lifecycle and donor matching engine, exposed to mobile and
//! server hosts through UniFFI.
//!
//! # Architecture
//!
//! ```text
//!   createRequest ──► [blood_requests: open] ──► matchDonors(notify | browse)
//!                           │                          │
//!          ┌────────────────┼────────────────┐         ├─ compatibility
//!          ▼                ▼                ▼         ├─ availability + eligibility
//!      fulfilled        cancelled         expired      ├─ proximity
//!   (owner | admin)  (owner | admin)  (sweeper | admin)└─ alert opt-in → notify
//! ```
//!
//! # Core Principle
//!
//! **Status changes are conditional updates.** A transition only applies if the
//! request still has the status it was read with; a lost race is reported as
//! an invalid transition, never silently overwritten.
//!
//! # Modules
//!
//! - [`models`]: Domain types (BloodRequest, Donor, BloodType, etc.)
//! - [`compatibility`]: Donor/recipient blood type tables
//! - [`eligibility`]: Donation cooldown rule
//! - [`lifecycle`]: Request state machine and actor authorization
//! - [`matching`]: Donor filter pipeline and ranking
//! - [`sweeper`]: Expiration sweeps, one-shot and periodic
//! - [`notify`]: Donor alert transport
//! - [`db`]: SQLite storage
//! - [`service`]: [`BloodBank`], the operation surface
//! - [`config`]: Engine configuration

pub mod compatibility;
pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod lifecycle;
pub mod matching;
pub mod models;
pub mod notify;
pub mod service;
pub mod sweeper;

// Re-export commonly used types
pub use config::EngineConfig;
pub use db::Database;
pub use error::{BloodBankError, BloodBankResult};
pub use matching::{DonorMatch, MatchMode, Proximity, ProximityStrategy};
pub use models::{
    Actor, BloodRequest, BloodType, Donor, NewBloodRequest, NewDonor, RequestStatus, Role,
    Urgency, ValidationError,
};
pub use notify::Notifier;
pub use service::BloodBank;
pub use sweeper::PeriodicSweeper;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use models::{
    Coordinates, DonorFilter, DonorPreferences, DonorProfileUpdate, InvalidBloodType, Page,
    RequestFilter, SortBy, SortOrder,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum BloodBankFfiError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid blood type: {token}")]
    InvalidBloodType { token: String },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<BloodBankError> for BloodBankFfiError {
    fn from(e: BloodBankError) -> Self {
        match e {
            BloodBankError::Validation(e) => e.into(),
            BloodBankError::InvalidBloodType(e) => e.into(),
            BloodBankError::InvalidTransition { from, to } => BloodBankFfiError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            BloodBankError::NotFound(what) => BloodBankFfiError::NotFound(what),
            BloodBankError::Forbidden(reason) => BloodBankFfiError::Forbidden(reason),
            BloodBankError::Storage(e) => BloodBankFfiError::Storage(e.to_string()),
            BloodBankError::Config(reason) => BloodBankFfiError::Config(reason),
        }
    }
}

impl From<ValidationError> for BloodBankFfiError {
    fn from(e: ValidationError) -> Self {
        BloodBankFfiError::Validation {
            field: e.field,
            reason: e.reason,
        }
    }
}

impl From<InvalidBloodType> for BloodBankFfiError {
    fn from(e: InvalidBloodType) -> Self {
        BloodBankFfiError::InvalidBloodType { token: e.0 }
    }
}

impl<T> From<std::sync::PoisonError<T>> for BloodBankFfiError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        BloodBankFfiError::Storage(format!("Lock poisoned: {}", e))
    }
}

pub type FfiResult<T> = Result<T, BloodBankFfiError>;

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> FfiResult<Arc<BloodBankCore>> {
    let config = EngineConfig {
        database_path: path.into(),
        ..EngineConfig::default()
    };
    BloodBankCore::wrap(BloodBank::open(config)?)
}

/// Open the database named in a TOML configuration file.
#[uniffi::export]
pub fn open_database_with_config(config_path: String) -> FfiResult<Arc<BloodBankCore>> {
    let config = EngineConfig::load(&config_path)?;
    BloodBankCore::wrap(BloodBank::open(config)?)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> FfiResult<Arc<BloodBankCore>> {
    BloodBankCore::wrap(BloodBank::open_in_memory()?)
}

/// Donor types that can give to `recipient`.
#[uniffi::export]
pub fn compatible_donors_for(recipient: String) -> FfiResult<Vec<String>> {
    let types = compatibility::compatible_donors_for_token(&recipient)?;
    Ok(types.iter().map(|t| t.to_string()).collect())
}

/// Recipient types that `donor` can give to.
#[uniffi::export]
pub fn can_donate_to(donor: String) -> FfiResult<Vec<String>> {
    let types = compatibility::can_donate_to_token(&donor)?;
    Ok(types.iter().map(|t| t.to_string()).collect())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine handle for FFI.
#[derive(uniffi::Object)]
pub struct BloodBankCore {
    bank: Arc<BloodBank>,
    sweeper: Mutex<Option<PeriodicSweeper>>,
}

impl BloodBankCore {
    fn wrap(bank: BloodBank) -> FfiResult<Arc<Self>> {
        Ok(Arc::new(Self {
            bank: Arc::new(bank),
            sweeper: Mutex::new(None),
        }))
    }
}

#[uniffi::export]
impl BloodBankCore {
    // =========================================================================
    // Request Operations
    // =========================================================================

    /// Create a new open request.
    pub fn create_request(&self, input: FfiNewBloodRequest) -> FfiResult<FfiBloodRequest> {
        let request = self.bank.create_request(input.try_into()?, Utc::now())?;
        Ok(request.into())
    }

    /// Get a request by ID.
    pub fn get_request(&self, id: String) -> FfiResult<FfiBloodRequest> {
        Ok(self.bank.get_request(&id)?.into())
    }

    /// List requests, one page at a time.
    pub fn list_requests(
        &self,
        filter: FfiRequestFilter,
        page: u32,
        limit: Option<u32>,
    ) -> FfiResult<FfiRequestPage> {
        let page = self.bank.list_requests(&filter.try_into()?, page, limit)?;
        Ok(page.into())
    }

    /// Move a request to `status` ("fulfilled", "cancelled" or "expired").
    pub fn transition_request(
        &self,
        id: String,
        status: String,
        actor: FfiActor,
    ) -> FfiResult<FfiBloodRequest> {
        let to = RequestStatus::from_str(&status)?;
        let actor = Actor::try_from(actor)?;
        let request = self.bank.transition_request(&id, to, &actor, Utc::now())?;
        Ok(request.into())
    }

    /// Hard-delete a request (administrators only).
    pub fn delete_request(&self, id: String, actor: FfiActor) -> FfiResult<()> {
        let actor = Actor::try_from(actor)?;
        Ok(self.bank.delete_request(&id, &actor)?)
    }

    /// Request counts per status and open requests per urgency.
    pub fn request_stats(&self) -> FfiResult<FfiRequestStats> {
        let stats = self.bank.request_stats()?;
        Ok(FfiRequestStats {
            open: stats.count(RequestStatus::Open),
            fulfilled: stats.count(RequestStatus::Fulfilled),
            cancelled: stats.count(RequestStatus::Cancelled),
            expired: stats.count(RequestStatus::Expired),
            open_critical: stats.open_with_urgency(Urgency::Critical),
            open_high: stats.open_with_urgency(Urgency::High),
            open_normal: stats.open_with_urgency(Urgency::Normal),
            open_low: stats.open_with_urgency(Urgency::Low),
        })
    }

    // =========================================================================
    // Matching Operations
    // =========================================================================

    /// Ranked donors for a request; `mode` is "notify" or "browse".
    pub fn match_donors(&self, request_id: String, mode: String) -> FfiResult<Vec<FfiDonorMatch>> {
        let mode = MatchMode::from_str(&mode)?;
        let matches = self.bank.match_donors(&request_id, mode, Utc::now())?;
        Ok(matches.into_iter().map(|m| m.into()).collect())
    }

    /// Ranked donors for an ad-hoc blood type and city.
    pub fn find_donors(
        &self,
        blood_type: String,
        city: String,
        urgency: Option<String>,
    ) -> FfiResult<Vec<FfiDonorMatch>> {
        let urgency = parse_optional::<Urgency>(urgency)?.unwrap_or(Urgency::Normal);
        let matches = self.bank.find_donors(
            &blood_type,
            &city,
            urgency,
            None,
            MatchMode::Browse,
            Utc::now(),
        )?;
        Ok(matches.into_iter().map(|m| m.into()).collect())
    }

    // =========================================================================
    // Donor Operations
    // =========================================================================

    /// Register a donor for a user.
    pub fn register_donor(&self, input: FfiNewDonor) -> FfiResult<FfiDonor> {
        let donor = self.bank.register_donor(input.try_into()?, Utc::now())?;
        Ok(donor.into())
    }

    /// Get a donor by ID.
    pub fn get_donor(&self, id: String) -> FfiResult<FfiDonor> {
        Ok(self.bank.get_donor(&id)?.into())
    }

    /// Get the donor linked to a user.
    pub fn get_donor_by_user(&self, user_id: String) -> FfiResult<FfiDonor> {
        Ok(self.bank.get_donor_by_user(&user_id)?.into())
    }

    /// Browse donors.
    pub fn list_donors(
        &self,
        filter: FfiDonorFilter,
        page: u32,
        limit: Option<u32>,
    ) -> FfiResult<FfiDonorPage> {
        let page = self.bank.list_donors(&filter.try_into()?, page, limit)?;
        Ok(page.into())
    }

    /// Update availability, alert opt-in and alert radius.
    pub fn update_donor_availability(
        &self,
        donor_id: String,
        preferences: FfiDonorPreferences,
    ) -> FfiResult<FfiDonor> {
        let preferences = DonorPreferences {
            is_available: preferences.is_available,
            receive_alerts: preferences.receive_alerts,
            max_distance_km: preferences.max_distance_km,
        };
        let donor = self
            .bank
            .update_donor_availability(&donor_id, &preferences, Utc::now())?;
        Ok(donor.into())
    }

    /// Update blood type, city and position.
    pub fn update_donor_profile(
        &self,
        donor_id: String,
        profile: FfiDonorProfileUpdate,
    ) -> FfiResult<FfiDonor> {
        let profile = DonorProfileUpdate::try_from(profile)?;
        let donor = self.bank.update_donor_profile(&donor_id, &profile, Utc::now())?;
        Ok(donor.into())
    }

    /// Record a donation on `date` (YYYY-MM-DD).
    pub fn record_donation(&self, donor_id: String, date: String) -> FfiResult<FfiDonor> {
        let date = parse_date("date", &date)?;
        let donor = self.bank.record_donation(&donor_id, date, Utc::now())?;
        Ok(donor.into())
    }

    // =========================================================================
    // Sweeper Operations
    // =========================================================================

    /// Expire overdue open requests now. Returns how many changed.
    pub fn sweep_expired(&self) -> FfiResult<u64> {
        Ok(self.bank.sweep_expired(Utc::now())? as u64)
    }

    /// Start background sweeps; `interval_secs` of `None` uses the configured interval.
    pub fn start_sweeper(&self, interval_secs: Option<u64>) -> FfiResult<()> {
        let interval = match interval_secs {
            Some(0) => {
                return Err(ValidationError::new("intervalSecs", "must be positive").into())
            }
            Some(secs) => Duration::from_secs(secs),
            None => self.bank.config().sweep_interval(),
        };

        let mut sweeper = self.sweeper.lock()?;
        if let Some(previous) = sweeper.take() {
            previous.stop();
        }
        *sweeper = Some(PeriodicSweeper::spawn(Arc::clone(&self.bank), interval));
        Ok(())
    }

    /// Stop background sweeps, if running.
    pub fn stop_sweeper(&self) -> FfiResult<()> {
        if let Some(sweeper) = self.sweeper.lock()?.take() {
            sweeper.stop();
        }
        Ok(())
    }
}

// =========================================================================
// Conversion Helpers
// =========================================================================

fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_time(field: &str, text: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ValidationError::new(field, format!("not an RFC 3339 timestamp: {}", e)))
}

fn parse_date(field: &str, text: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| ValidationError::new(field, format!("not a YYYY-MM-DD date: {}", e)))
}

fn parse_optional<T>(value: Option<String>) -> Result<Option<T>, BloodBankFfiError>
where
    T: FromStr,
    T::Err: Into<BloodBankFfiError>,
{
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse::<T>().map_err(Into::into))
        .transpose()
}

fn coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Coordinates>, ValidationError> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude).map(Some),
        (None, None) => Ok(None),
        _ => Err(ValidationError::new(
            "coordinates",
            "latitude and longitude must be given together",
        )),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe caller identity; `role` is "requester" or "administrator".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActor {
    pub id: String,
    pub role: String,
}

impl TryFrom<FfiActor> for Actor {
    type Error = BloodBankFfiError;

    fn try_from(actor: FfiActor) -> FfiResult<Self> {
        match actor.role.trim().to_lowercase().as_str() {
            "requester" => Ok(Actor::requester(actor.id)),
            "administrator" | "admin" => Ok(Actor::administrator(actor.id)),
            other => Err(ValidationError::new("role", format!("unknown role {:?}", other)).into()),
        }
    }
}

/// FFI-safe blood request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBloodRequest {
    pub id: String,
    pub blood_type: String,
    pub units: u32,
    pub urgency: String,
    pub city: String,
    pub hospital: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub status: String,
    pub requester_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub updated_at: String,
}

impl From<BloodRequest> for FfiBloodRequest {
    fn from(request: BloodRequest) -> Self {
        Self {
            id: request.id,
            blood_type: request.blood_type.to_string(),
            units: request.units,
            urgency: request.urgency.to_string(),
            city: request.city,
            hospital: request.hospital,
            contact_phone: request.contact_phone,
            notes: request.notes,
            status: request.status.to_string(),
            requester_id: request.requester_id,
            latitude: request.coordinates.map(|c| c.latitude),
            longitude: request.coordinates.map(|c| c.longitude),
            created_at: encode_time(request.created_at),
            expires_at: request.expires_at.map(encode_time),
            updated_at: encode_time(request.updated_at),
        }
    }
}

/// FFI-safe request input. `urgency` defaults to "normal".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewBloodRequest {
    pub blood_type: String,
    pub units: u32,
    pub urgency: Option<String>,
    pub city: String,
    pub hospital: String,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub requester_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub expires_at: Option<String>,
}

impl TryFrom<FfiNewBloodRequest> for NewBloodRequest {
    type Error = BloodBankFfiError;

    fn try_from(input: FfiNewBloodRequest) -> FfiResult<Self> {
        let mut request = NewBloodRequest::new(
            input.blood_type.parse()?,
            input.units,
            input.city,
            input.hospital,
            input.contact_phone,
        );
        request.urgency = parse_optional::<Urgency>(input.urgency)?.unwrap_or(Urgency::Normal);
        request.notes = input.notes;
        request.requester_id = input.requester_id;
        request.coordinates = coordinates(input.latitude, input.longitude)?;
        request.expires_at = input
            .expires_at
            .map(|t| parse_time("expiresAt", &t))
            .transpose()?;
        Ok(request)
    }
}

/// FFI-safe request listing filter. Empty strings do not filter.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiRequestFilter {
    pub status: Option<String>,
    pub blood_type: Option<String>,
    pub city: Option<String>,
    pub urgency: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl TryFrom<FfiRequestFilter> for RequestFilter {
    type Error = BloodBankFfiError;

    fn try_from(filter: FfiRequestFilter) -> FfiResult<Self> {
        Ok(RequestFilter {
            status: parse_optional::<RequestStatus>(filter.status)?,
            blood_type: parse_optional::<BloodType>(filter.blood_type)?,
            city: filter.city.filter(|c| !c.trim().is_empty()),
            urgency: parse_optional::<Urgency>(filter.urgency)?,
            search: filter.search.filter(|s| !s.trim().is_empty()),
            sort_by: parse_optional::<SortBy>(filter.sort_by)?.unwrap_or_default(),
            sort_order: parse_optional::<SortOrder>(filter.sort_order)?.unwrap_or_default(),
        })
    }
}

/// FFI-safe page of requests.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRequestPage {
    pub items: Vec<FfiBloodRequest>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<Page<BloodRequest>> for FfiRequestPage {
    fn from(page: Page<BloodRequest>) -> Self {
        Self {
            total_pages: page.total_pages(),
            total: page.total,
            page: page.page,
            limit: page.limit,
            items: page.items.into_iter().map(|r| r.into()).collect(),
        }
    }
}

/// FFI-safe request statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRequestStats {
    pub open: u64,
    pub fulfilled: u64,
    pub cancelled: u64,
    pub expired: u64,
    pub open_critical: u64,
    pub open_high: u64,
    pub open_normal: u64,
    pub open_low: u64,
}

/// FFI-safe donor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDonor {
    pub id: String,
    pub user_id: String,
    pub blood_type: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_available: bool,
    pub receive_alerts: bool,
    pub max_distance_km: u32,
    pub last_donation: Option<String>,
    pub can_donate_after: Option<String>,
}

impl From<Donor> for FfiDonor {
    fn from(donor: Donor) -> Self {
        Self {
            id: donor.id,
            user_id: donor.user_id,
            blood_type: donor.blood_type.to_string(),
            city: donor.city,
            latitude: donor.coordinates.map(|c| c.latitude),
            longitude: donor.coordinates.map(|c| c.longitude),
            is_available: donor.is_available,
            receive_alerts: donor.receive_alerts,
            max_distance_km: donor.max_distance_km,
            last_donation: donor.last_donation.map(|d| d.to_string()),
            can_donate_after: donor.can_donate_after.map(|d| d.to_string()),
        }
    }
}

/// FFI-safe donor registration input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewDonor {
    pub user_id: String,
    pub blood_type: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_available: bool,
    pub receive_alerts: bool,
    pub max_distance_km: Option<u32>,
    pub last_donation: Option<String>,
}

impl TryFrom<FfiNewDonor> for NewDonor {
    type Error = BloodBankFfiError;

    fn try_from(input: FfiNewDonor) -> FfiResult<Self> {
        let mut donor = NewDonor::new(input.user_id, input.blood_type.parse()?, input.city);
        donor.coordinates = coordinates(input.latitude, input.longitude)?;
        donor.is_available = input.is_available;
        donor.receive_alerts = input.receive_alerts;
        donor.max_distance_km = input.max_distance_km;
        donor.last_donation = input
            .last_donation
            .map(|d| parse_date("lastDonation", &d))
            .transpose()?;
        Ok(donor)
    }
}

/// FFI-safe donor preferences; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiDonorPreferences {
    pub is_available: Option<bool>,
    pub receive_alerts: Option<bool>,
    pub max_distance_km: Option<u32>,
}

/// FFI-safe donor profile edits; `None` leaves a field unchanged.
///
/// Latitude and longitude are given together. `clear_coordinates` removes the
/// stored position and cannot be combined with a new one.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiDonorProfileUpdate {
    pub blood_type: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub clear_coordinates: bool,
}

impl TryFrom<FfiDonorProfileUpdate> for DonorProfileUpdate {
    type Error = BloodBankFfiError;

    fn try_from(update: FfiDonorProfileUpdate) -> FfiResult<Self> {
        let position = coordinates(update.latitude, update.longitude)?;
        let coordinates = match (update.clear_coordinates, position) {
            (true, Some(_)) => {
                return Err(ValidationError::new(
                    "coordinates",
                    "cannot set and clear the position at once",
                )
                .into())
            }
            (true, None) => Some(None),
            (false, position) => position.map(Some),
        };

        Ok(DonorProfileUpdate {
            blood_type: parse_optional::<BloodType>(update.blood_type)?,
            city: update.city,
            coordinates,
        })
    }
}

/// FFI-safe donor listing filter.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiDonorFilter {
    pub blood_type: Option<String>,
    pub city: Option<String>,
    pub available_only: bool,
}

impl TryFrom<FfiDonorFilter> for DonorFilter {
    type Error = BloodBankFfiError;

    fn try_from(filter: FfiDonorFilter) -> FfiResult<Self> {
        Ok(DonorFilter {
            blood_type: parse_optional::<BloodType>(filter.blood_type)?,
            city: filter.city.filter(|c| !c.trim().is_empty()),
            available_only: filter.available_only,
        })
    }
}

/// FFI-safe page of donors.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDonorPage {
    pub items: Vec<FfiDonor>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<Page<Donor>> for FfiDonorPage {
    fn from(page: Page<Donor>) -> Self {
        Self {
            total_pages: page.total_pages(),
            total: page.total,
            page: page.page,
            limit: page.limit,
            items: page.items.into_iter().map(|d| d.into()).collect(),
        }
    }
}

/// FFI-safe donor match.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDonorMatch {
    pub donor: FfiDonor,
    pub same_city: bool,
    pub distance_km: f64,
}

impl From<DonorMatch> for FfiDonorMatch {
    fn from(m: DonorMatch) -> Self {
        Self {
            same_city: m.proximity.is_same_city(),
            distance_km: m.proximity.distance_km(),
            donor: m.donor.into(),
        }
    }
}
