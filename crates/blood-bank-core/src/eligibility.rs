//! Donation cooldown.
//!
//! A donor may give again once [`COOLDOWN_DAYS`] have passed since the last
//! donation. Availability is a separate, donor-controlled switch and is not
//! consulted here.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::Donor;

/// Minimum days between two donations.
pub const COOLDOWN_DAYS: i64 = 90;

/// First date a donor may give again after donating on `last_donation`.
pub fn can_donate_after(last_donation: NaiveDate) -> NaiveDate {
    last_donation + Duration::days(COOLDOWN_DAYS)
}

/// Whether a donor whose last donation was `last_donation` may donate on `today`.
pub fn is_eligible_on(last_donation: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_donation {
        None => true,
        Some(date) => today >= can_donate_after(date),
    }
}

/// Whether `donor` may donate as of `as_of`.
pub fn is_eligible(donor: &Donor, as_of: DateTime<Utc>) -> bool {
    is_eligible_on(donor.last_donation, as_of.date_naive())
}

/// Days left until `donor` may donate again; zero when already eligible.
pub fn days_until_eligible(donor: &Donor, as_of: DateTime<Utc>) -> i64 {
    donor
        .last_donation
        .map(|date| (can_donate_after(date) - as_of.date_naive()).num_days().max(0))
        .unwrap_or(0)
}
