//! Donor matching for blood requests.
//!
//! Pipeline: Blood Type → Availability → Eligibility → Proximity → Alert Opt-in → Ranking
//!
//! The blood-type step runs in SQL; the remaining steps run here so that the
//! same rules apply whether donors come from the database or a caller-supplied
//! list.

mod proximity;

pub use proximity::*;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compatibility;
use crate::db::{Database, DbResult};
use crate::eligibility;
use crate::models::{BloodRequest, BloodType, Coordinates, Donor, Urgency, ValidationError};

/// Why donors are being matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Proactive alerts; only donors who opted in to alerts
    Notify,
    /// Requester browsing candidates; alert opt-in is ignored
    Browse,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Notify => "notify",
            MatchMode::Browse => "browse",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "notify" => Ok(MatchMode::Notify),
            "browse" => Ok(MatchMode::Browse),
            other => Err(ValidationError::new(
                "mode",
                format!("unknown match mode {:?}", other),
            )),
        }
    }
}

/// What donors are matched against: a stored request or an ad-hoc search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTarget {
    pub blood_type: BloodType,
    pub urgency: Urgency,
    pub city: String,
    pub coordinates: Option<Coordinates>,
}

impl From<&BloodRequest> for MatchTarget {
    fn from(request: &BloodRequest) -> Self {
        Self {
            blood_type: request.blood_type,
            urgency: request.urgency,
            city: request.city.clone(),
            coordinates: request.coordinates,
        }
    }
}

/// A donor that passed every filter, with what the ranking used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorMatch {
    pub donor: Donor,
    pub proximity: Proximity,
}

/// Filter and rank `donors` against `target`.
///
/// Ordering: for high and critical urgency, same-city donors come before
/// radius-only donors. Within that (and for every other urgency), donors who
/// have waited longest since their last donation come first, never-donated
/// donors leading; remaining ties go to the nearer donor, then donor ID.
pub fn rank_donors<I>(
    target: &MatchTarget,
    donors: I,
    mode: MatchMode,
    as_of: DateTime<Utc>,
    strategy: &dyn ProximityStrategy,
) -> Vec<DonorMatch>
where
    I: IntoIterator<Item = Donor>,
{
    let accepted = compatibility::compatible_donors_for(target.blood_type);

    let mut matches: Vec<DonorMatch> = donors
        .into_iter()
        .filter(|donor| accepted.contains(&donor.blood_type))
        .filter(|donor| donor.is_available)
        .filter(|donor| eligibility::is_eligible(donor, as_of))
        .filter_map(|donor| {
            let proximity = strategy.proximity(&donor, target)?;
            Some(DonorMatch { donor, proximity })
        })
        .filter(|m| mode == MatchMode::Browse || m.donor.receive_alerts)
        .collect();

    let local_first = target.urgency.prefers_local_donors();
    matches.sort_by(|a, b| compare_matches(a, b, local_first));
    matches
}

fn compare_matches(a: &DonorMatch, b: &DonorMatch, local_first: bool) -> Ordering {
    let locality = if local_first {
        b.proximity.is_same_city().cmp(&a.proximity.is_same_city())
    } else {
        Ordering::Equal
    };

    locality
        // None (never donated) sorts before any date; older dates first
        .then_with(|| a.donor.last_donation.cmp(&b.donor.last_donation))
        .then_with(|| a.proximity.distance_km().total_cmp(&b.proximity.distance_km()))
        .then_with(|| a.donor.id.cmp(&b.donor.id))
}

/// Matches donors stored in the database.
pub struct MatchingEngine<'a> {
    db: &'a Database,
    proximity: &'a dyn ProximityStrategy,
}

impl<'a> MatchingEngine<'a> {
    /// Create a new matching engine.
    pub fn new(db: &'a Database, proximity: &'a dyn ProximityStrategy) -> Self {
        Self { db, proximity }
    }

    /// Ranked donors for a stored request. An empty result is not an error.
    pub fn match_request(
        &self,
        request: &BloodRequest,
        mode: MatchMode,
        as_of: DateTime<Utc>,
    ) -> DbResult<Vec<DonorMatch>> {
        self.match_target(&MatchTarget::from(request), mode, as_of)
    }

    /// Ranked donors for an ad-hoc target.
    pub fn match_target(
        &self,
        target: &MatchTarget,
        mode: MatchMode,
        as_of: DateTime<Utc>,
    ) -> DbResult<Vec<DonorMatch>> {
        let compatible = compatibility::compatible_donors_for(target.blood_type);
        let candidates = self.db.list_donors_by_blood_types(compatible, true)?;

        Ok(rank_donors(target, candidates, mode, as_of, self.proximity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBloodRequest, NewDonor};
    use chrono::Duration;

    fn target(blood_type: BloodType, urgency: Urgency, city: &str) -> MatchTarget {
        MatchTarget {
            blood_type,
            urgency,
            city: city.into(),
            coordinates: None,
        }
    }

    fn donor(id: &str, blood_type: BloodType, city: &str) -> Donor {
        let mut donor = NewDonor::new(format!("user-{}", id), blood_type, city)
            .validate(Utc::now())
            .unwrap();
        donor.id = id.into();
        donor
    }

    fn ids(matches: &[DonorMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.donor.id.as_str()).collect()
    }

    #[test]
    fn test_incompatible_types_excluded() {
        let target = target(BloodType::AbNegative, Urgency::Normal, "Taiz");
        let donors = vec![
            donor("o-neg", BloodType::ONegative, "Taiz"),
            donor("a-pos", BloodType::APositive, "Taiz"),
        ];

        let matches = rank_donors(&target, donors, MatchMode::Browse, Utc::now(), &CityProximity);
        assert_eq!(ids(&matches), ["o-neg"]);
    }

    #[test]
    fn test_unavailable_and_cooling_down_excluded() {
        let now = Utc::now();
        let target = target(BloodType::OPositive, Urgency::Normal, "Aden");

        let mut unavailable = donor("unavailable", BloodType::OPositive, "Aden");
        unavailable.is_available = false;

        let mut cooling = donor("cooling", BloodType::OPositive, "Aden");
        cooling.set_last_donation(Some(now.date_naive() - Duration::days(30)));

        let ready = donor("ready", BloodType::OPositive, "Aden");

        let matches = rank_donors(
            &target,
            vec![unavailable, cooling, ready],
            MatchMode::Browse,
            now,
            &CityProximity,
        );
        assert_eq!(ids(&matches), ["ready"]);
    }

    #[test]
    fn test_notify_requires_opt_in() {
        let now = Utc::now();
        let target = target(BloodType::BPositive, Urgency::High, "Ibb");

        let mut quiet = donor("quiet", BloodType::BPositive, "Ibb");
        quiet.receive_alerts = false;
        let loud = donor("loud", BloodType::BNegative, "Ibb");

        let donors = vec![quiet.clone(), loud.clone()];
        let notify = rank_donors(&target, donors, MatchMode::Notify, now, &CityProximity);
        assert_eq!(ids(&notify), ["loud"]);

        let browse =
            rank_donors(&target, vec![quiet, loud], MatchMode::Browse, now, &CityProximity);
        assert_eq!(browse.len(), 2);
    }

    #[test]
    fn test_other_city_excluded_without_coordinates() {
        let target = target(BloodType::APositive, Urgency::Normal, "Taiz");
        let matches = rank_donors(
            &target,
            vec![donor("far", BloodType::APositive, "Sanaa")],
            MatchMode::Browse,
            Utc::now(),
            &CityProximity,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_longest_wait_first() {
        let now = Utc::now();
        let today = now.date_naive();
        let target = target(BloodType::APositive, Urgency::Normal, "Taiz");

        let mut recent = donor("recent", BloodType::APositive, "Taiz");
        recent.set_last_donation(Some(today - Duration::days(100)));
        let mut older = donor("older", BloodType::APositive, "Taiz");
        older.set_last_donation(Some(today - Duration::days(400)));
        let never = donor("never", BloodType::APositive, "Taiz");

        let donors = vec![recent, older, never];
        let matches = rank_donors(&target, donors, MatchMode::Browse, now, &CityProximity);
        assert_eq!(ids(&matches), ["never", "older", "recent"]);
    }

    #[test]
    fn test_critical_ranks_same_city_before_radius() {
        let now = Utc::now();
        let today = now.date_naive();
        let strategy = CoordinateProximity::new(|a: Coordinates, b: Coordinates| {
            (a.latitude - b.latitude).abs() * 100.0
        });

        let mut target = target(BloodType::ONegative, Urgency::Critical, "Taiz");
        target.coordinates = Some(Coordinates::new(13.0, 44.0).unwrap());

        // Radius donor has waited longer, but is not in the city
        let mut remote = donor("remote", BloodType::ONegative, "Ibb");
        remote.coordinates = Some(Coordinates::new(13.3, 44.0).unwrap());
        remote.set_last_donation(Some(today - Duration::days(300)));

        let mut local = donor("local", BloodType::ONegative, "Taiz");
        local.set_last_donation(Some(today - Duration::days(120)));

        let donors = vec![remote, local];
        let critical = rank_donors(&target, donors.clone(), MatchMode::Browse, now, &strategy);
        assert_eq!(ids(&critical), ["local", "remote"]);
        assert!(matches!(critical[1].proximity, Proximity::WithinRadius { .. }));

        // Normal urgency falls back to wait time
        target.urgency = Urgency::Normal;
        let normal = rank_donors(&target, donors, MatchMode::Browse, now, &strategy);
        assert_eq!(ids(&normal), ["remote", "local"]);
    }

    #[test]
    fn test_engine_reads_database() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();

        db.insert_donor(&donor("o-neg", BloodType::ONegative, "Taiz")).unwrap();
        db.insert_donor(&donor("a-pos", BloodType::APositive, "Taiz")).unwrap();

        let request = NewBloodRequest::new(BloodType::AbNegative, 1, "Taiz", "H", "1234567")
            .validate(now)
            .unwrap();

        let engine = MatchingEngine::new(&db, &CityProximity);
        let matches = engine.match_request(&request, MatchMode::Browse, now).unwrap();
        assert_eq!(ids(&matches), ["o-neg"]);
    }

    #[test]
    fn test_no_candidates_is_empty() {
        let db = Database::open_in_memory().unwrap();
        let engine = MatchingEngine::new(&db, &CityProximity);
        let critical = target(BloodType::ONegative, Urgency::Critical, "Taiz");
        let matches = engine.match_target(&critical, MatchMode::Notify, Utc::now()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_match_mode_parsing() {
        assert_eq!("Notify".parse::<MatchMode>().unwrap(), MatchMode::Notify);
        assert!("push".parse::<MatchMode>().is_err());
    }
}
