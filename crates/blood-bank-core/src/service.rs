//! Blood bank operations.
//!
//! [`BloodBank`] ties storage, the lifecycle rules, matching and notification
//! together behind one thread-safe handle. Every time-dependent operation takes
//! its reference time explicitly.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::db::{Database, DbError, RequestStats};
use crate::error::{BloodBankError, BloodBankResult};
use crate::lifecycle::{self, Initiator};
use crate::matching::{
    CityProximity, DonorMatch, MatchMode, MatchTarget, MatchingEngine, ProximityStrategy,
};
use crate::models::{
    Actor, BloodRequest, BloodType, Coordinates, Donor, DonorFilter, DonorPreferences,
    DonorProfileUpdate, NewBloodRequest, NewDonor, Page, PageRequest, RequestFilter,
    RequestStatus, Urgency, ValidationError,
};
use crate::notify::{self, LogNotifier, Notifier};
use crate::sweeper::ExpirationSweeper;

/// Thread-safe entry point to the engine.
pub struct BloodBank {
    db: Mutex<Database>,
    config: EngineConfig,
    notifier: Box<dyn Notifier>,
    proximity: Box<dyn ProximityStrategy>,
}

impl std::fmt::Debug for BloodBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloodBank")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BloodBank {
    /// Wrap an open database. Alerts go to the log and proximity is city-only
    /// until replaced with [`with_notifier`](Self::with_notifier) and
    /// [`with_proximity`](Self::with_proximity).
    pub fn new(db: Database, config: EngineConfig) -> BloodBankResult<Self> {
        config.validate()?;
        Ok(Self {
            db: Mutex::new(db),
            config,
            notifier: Box::new(LogNotifier),
            proximity: Box::new(CityProximity),
        })
    }

    /// Open the database named in `config`.
    pub fn open(config: EngineConfig) -> BloodBankResult<Self> {
        let db = Database::open(&config.database_path)?;
        info!(path = %config.database_path.display(), "blood bank opened");
        Self::new(db, config)
    }

    /// In-memory engine with default configuration.
    pub fn open_in_memory() -> BloodBankResult<Self> {
        Self::new(Database::open_in_memory()?, EngineConfig::default())
    }

    pub fn with_notifier<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_proximity<P: ProximityStrategy + 'static>(mut self, proximity: P) -> Self {
        self.proximity = Box::new(proximity);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn db(&self) -> BloodBankResult<MutexGuard<'_, Database>> {
        Ok(self.db.lock()?)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Validate and store a new open request.
    pub fn create_request(
        &self,
        input: NewBloodRequest,
        now: DateTime<Utc>,
    ) -> BloodBankResult<BloodRequest> {
        let request = input.validate(now)?;
        self.db()?.insert_request(&request)?;

        info!(
            request_id = %request.id,
            blood_type = %request.blood_type,
            urgency = %request.urgency,
            city = %request.city,
            "blood request created"
        );
        Ok(request)
    }

    pub fn get_request(&self, id: &str) -> BloodBankResult<BloodRequest> {
        let db = self.db()?;
        find_request(&db, id)
    }

    /// One page of requests. `page` is 1-based; `limit` falls back to the
    /// configured default and is clamped to the configured maximum.
    pub fn list_requests(
        &self,
        filter: &RequestFilter,
        page: u32,
        limit: Option<u32>,
    ) -> BloodBankResult<Page<BloodRequest>> {
        let page = self.page_request(page, limit)?;
        Ok(self.db()?.list_requests(filter, page)?)
    }

    /// Move a request to `to` on behalf of `actor`.
    ///
    /// Fails with `InvalidTransition` when the request is already closed,
    /// including when another caller closed it between our read and write.
    pub fn transition_request(
        &self,
        id: &str,
        to: RequestStatus,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> BloodBankResult<BloodRequest> {
        let db = self.db()?;
        let request = find_request(&db, id)?;
        let transition = lifecycle::plan(&request, to, Initiator::Actor(actor))?;

        if !db.update_request_status(id, transition.from, transition.to, now)? {
            let current = find_request(&db, id)?;
            warn!(
                request_id = %id,
                from = %transition.from,
                to = %to,
                current = %current.status,
                "lost status race"
            );
            return Err(BloodBankError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        info!(
            request_id = %id,
            from = %transition.from,
            to = %transition.to,
            actor = %actor.id,
            "request status changed"
        );
        find_request(&db, id)
    }

    /// Hard-delete a request. Administrators only.
    pub fn delete_request(&self, id: &str, actor: &Actor) -> BloodBankResult<()> {
        let db = self.db()?;
        let request = find_request(&db, id)?;
        lifecycle::authorize_delete(actor, &request)?;

        if !db.delete_request(id)? {
            return Err(BloodBankError::NotFound(format!("request {}", id)));
        }
        info!(request_id = %id, actor = %actor.id, "request deleted");
        Ok(())
    }

    pub fn request_stats(&self) -> BloodBankResult<RequestStats> {
        Ok(self.db()?.request_stats()?)
    }

    /// Expire open requests whose expiry is before `as_of`. Returns how many
    /// changed; a second call with no new data returns zero.
    pub fn sweep_expired(&self, as_of: DateTime<Utc>) -> BloodBankResult<usize> {
        let report = {
            let db = self.db()?;
            ExpirationSweeper::new(&db).sweep(as_of)?
        };

        if report.expired() > 0 || report.skipped > 0 {
            info!(expired = report.expired(), skipped = report.skipped, "expiration sweep");
        } else {
            debug!("expiration sweep found nothing");
        }
        Ok(report.expired())
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Ranked donors for a stored request.
    ///
    /// A closed request has no candidates. In notify mode every match is
    /// alerted; delivery failures are logged and do not fail the call.
    pub fn match_donors(
        &self,
        request_id: &str,
        mode: MatchMode,
        as_of: DateTime<Utc>,
    ) -> BloodBankResult<Vec<DonorMatch>> {
        let (request, matches) = {
            let db = self.db()?;
            let request = find_request(&db, request_id)?;
            if !request.is_open() {
                debug!(request_id, status = %request.status, "match skipped for closed request");
                return Ok(Vec::new());
            }
            let matches = MatchingEngine::new(&db, self.proximity.as_ref())
                .match_request(&request, mode, as_of)?;
            (request, matches)
        };

        info!(request_id, %mode, matches = matches.len(), "donors matched");

        if mode == MatchMode::Notify && !matches.is_empty() {
            let report = notify::dispatch(
                self.notifier.as_ref(),
                matches.iter().map(|m| m.donor.id.as_str()),
                &request.summary(),
            );
            info!(
                request_id,
                sent = report.sent,
                failed = report.failed,
                "donor alerts dispatched"
            );
        }

        Ok(matches)
    }

    /// Ranked donors for an ad-hoc search by blood-type token and city.
    pub fn find_donors(
        &self,
        blood_type: &str,
        city: &str,
        urgency: Urgency,
        coordinates: Option<Coordinates>,
        mode: MatchMode,
        as_of: DateTime<Utc>,
    ) -> BloodBankResult<Vec<DonorMatch>> {
        let target = MatchTarget {
            blood_type: blood_type.parse::<BloodType>()?,
            urgency,
            city: city.trim().to_string(),
            coordinates,
        };
        let db = self.db()?;
        Ok(MatchingEngine::new(&db, self.proximity.as_ref()).match_target(&target, mode, as_of)?)
    }

    // =========================================================================
    // Donors
    // =========================================================================

    /// Register a donor. Each user may register once.
    pub fn register_donor(&self, input: NewDonor, now: DateTime<Utc>) -> BloodBankResult<Donor> {
        let donor = input.validate(now)?;
        let db = self.db()?;

        if db.get_donor_by_user(&donor.user_id)?.is_some() {
            return Err(already_registered().into());
        }
        match db.insert_donor(&donor) {
            Ok(()) => {}
            Err(DbError::Constraint(_)) => return Err(already_registered().into()),
            Err(e) => return Err(e.into()),
        }

        info!(
            donor_id = %donor.id,
            blood_type = %donor.blood_type,
            city = %donor.city,
            "donor registered"
        );
        Ok(donor)
    }

    pub fn get_donor(&self, id: &str) -> BloodBankResult<Donor> {
        let db = self.db()?;
        find_donor(&db, id)
    }

    pub fn get_donor_by_user(&self, user_id: &str) -> BloodBankResult<Donor> {
        self.db()?
            .get_donor_by_user(user_id)?
            .ok_or_else(|| BloodBankError::NotFound(format!("donor for user {}", user_id)))
    }

    pub fn list_donors(
        &self,
        filter: &DonorFilter,
        page: u32,
        limit: Option<u32>,
    ) -> BloodBankResult<Page<Donor>> {
        let page = self.page_request(page, limit)?;
        Ok(self.db()?.list_donors(filter, page)?)
    }

    /// Change availability, alert opt-in or alert radius.
    pub fn update_donor_availability(
        &self,
        donor_id: &str,
        preferences: &DonorPreferences,
        now: DateTime<Utc>,
    ) -> BloodBankResult<Donor> {
        self.modify_donor(donor_id, now, |donor| donor.apply_preferences(preferences))
    }

    /// Change blood type, city or stored position.
    pub fn update_donor_profile(
        &self,
        donor_id: &str,
        profile: &DonorProfileUpdate,
        now: DateTime<Utc>,
    ) -> BloodBankResult<Donor> {
        self.modify_donor(donor_id, now, |donor| donor.apply_profile(profile))
    }

    /// Record a donation on `date` and restart the cooldown.
    ///
    /// Not idempotent with respect to `updated_at`; callers retrying after a
    /// storage error should re-read the donor first.
    pub fn record_donation(
        &self,
        donor_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> BloodBankResult<Donor> {
        if date > now.date_naive() {
            return Err(ValidationError::new("date", "cannot be in the future").into());
        }

        let mark_unavailable = self.config.mark_unavailable_after_donation;
        let donor = self.modify_donor(donor_id, now, |donor| {
            donor.record_donation(date);
            if mark_unavailable {
                donor.is_available = false;
            }
            Ok(())
        })?;

        info!(donor_id, %date, can_donate_after = ?donor.can_donate_after, "donation recorded");
        Ok(donor)
    }

    fn modify_donor<F>(&self, donor_id: &str, now: DateTime<Utc>, edit: F) -> BloodBankResult<Donor>
    where
        F: FnOnce(&mut Donor) -> Result<(), ValidationError>,
    {
        let db = self.db()?;
        let mut donor = find_donor(&db, donor_id)?;
        edit(&mut donor)?;
        donor.updated_at = now;

        if !db.update_donor(&donor)? {
            return Err(BloodBankError::NotFound(format!("donor {}", donor_id)));
        }
        debug!(donor_id, "donor updated");
        Ok(donor)
    }

    fn page_request(&self, page: u32, limit: Option<u32>) -> BloodBankResult<PageRequest> {
        if page == 0 {
            return Err(ValidationError::new("page", "must be at least 1").into());
        }
        Ok(PageRequest::new(page, self.config.page_size(limit)))
    }
}

fn find_request(db: &Database, id: &str) -> BloodBankResult<BloodRequest> {
    db.get_request(id)?
        .ok_or_else(|| BloodBankError::NotFound(format!("request {}", id)))
}

fn find_donor(db: &Database, id: &str) -> BloodBankResult<Donor> {
    db.get_donor(id)?
        .ok_or_else(|| BloodBankError::NotFound(format!("donor {}", id)))
}

fn already_registered() -> ValidationError {
    ValidationError::new("userId", "already registered as a donor")
}
