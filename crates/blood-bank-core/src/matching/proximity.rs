//! Geographic filter for donor matching.
//!
//! The default strategy only compares city names. A coordinate-aware strategy
//! accepts a caller-supplied distance function, so a real geo backend can be
//! plugged in without touching the matching pipeline.

use serde::{Deserialize, Serialize};

use super::MatchTarget;
use crate::models::{fold_case, Coordinates, Donor};

/// How a donor relates geographically to a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Proximity {
    /// Donor is in the request's city
    SameCity,
    /// Donor is elsewhere but within their own alert radius
    WithinRadius { distance_km: f64 },
}

impl Proximity {
    /// Distance used for ordering; same-city counts as zero.
    pub fn distance_km(&self) -> f64 {
        match self {
            Proximity::SameCity => 0.0,
            Proximity::WithinRadius { distance_km } => *distance_km,
        }
    }

    pub fn is_same_city(&self) -> bool {
        matches!(self, Proximity::SameCity)
    }
}

/// Decides whether a donor is close enough to a request.
pub trait ProximityStrategy: Send + Sync {
    /// `None` means the donor is out of range.
    fn proximity(&self, donor: &Donor, target: &MatchTarget) -> Option<Proximity>;
}

/// Case-insensitive, whitespace-trimmed city comparison.
pub fn same_city(a: &str, b: &str) -> bool {
    fold_case(a) == fold_case(b)
}

/// City-name equality only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CityProximity;

impl ProximityStrategy for CityProximity {
    fn proximity(&self, donor: &Donor, target: &MatchTarget) -> Option<Proximity> {
        same_city(&donor.city, &target.city).then_some(Proximity::SameCity)
    }
}

/// City equality first; otherwise, when both sides have coordinates, a
/// distance check against the donor's `max_distance_km`.
pub struct CoordinateProximity<F> {
    distance_km: F,
}

impl<F> CoordinateProximity<F>
where
    F: Fn(Coordinates, Coordinates) -> f64 + Send + Sync,
{
    pub fn new(distance_km: F) -> Self {
        Self { distance_km }
    }
}

impl<F> std::fmt::Debug for CoordinateProximity<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateProximity").finish_non_exhaustive()
    }
}

impl<F> ProximityStrategy for CoordinateProximity<F>
where
    F: Fn(Coordinates, Coordinates) -> f64 + Send + Sync,
{
    fn proximity(&self, donor: &Donor, target: &MatchTarget) -> Option<Proximity> {
        if same_city(&donor.city, &target.city) {
            return Some(Proximity::SameCity);
        }

        let (Some(from), Some(to)) = (donor.coordinates, target.coordinates) else {
            return None;
        };

        let distance_km = (self.distance_km)(from, to);
        (distance_km.is_finite() && distance_km <= f64::from(donor.max_distance_km))
            .then_some(Proximity::WithinRadius { distance_km })
    }
}
