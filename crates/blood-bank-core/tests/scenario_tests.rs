//! End-to-end scenarios through the `BloodBank` operation surface.

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};

use blood_bank_core::compatibility;
use blood_bank_core::eligibility;
use blood_bank_core::matching::MatchMode;
use blood_bank_core::models::{
    Actor, BloodType, NewBloodRequest, NewDonor, RequestFilter, RequestStatus, SortBy, SortOrder,
    Urgency,
};
use blood_bank_core::{BloodBank, BloodBankError};

fn request_in(blood_type: BloodType, city: &str) -> NewBloodRequest {
    NewBloodRequest::new(blood_type, 1, city, "General Hospital", "+967 4 123 456")
}

#[test]
fn test_ab_negative_request_matches_only_o_negative() -> Result<()> {
    let bank = BloodBank::open_in_memory()?;
    let now = Utc::now();

    let o_neg = bank.register_donor(NewDonor::new("user-o", BloodType::ONegative, "Taiz"), now)?;
    bank.register_donor(NewDonor::new("user-a", BloodType::APositive, "Taiz"), now)?;

    let request = bank.create_request(request_in(BloodType::AbNegative, "Taiz"), now)?;
    let matches = bank.match_donors(&request.id, MatchMode::Browse, now)?;

    let ids: Vec<_> = matches.iter().map(|m| m.donor.id.as_str()).collect();
    assert_eq!(ids, [o_neg.id.as_str()]);
    Ok(())
}

#[test]
fn test_cooldown_boundary_through_matching() -> Result<()> {
    let bank = BloodBank::open_in_memory()?;
    let now = Utc::now();
    let today = now.date_naive();

    let mut day_89 = NewDonor::new("user-89", BloodType::OPositive, "Aden");
    day_89.last_donation = Some(today - Duration::days(89));
    let day_89 = bank.register_donor(day_89, now)?;

    let mut day_90 = NewDonor::new("user-90", BloodType::OPositive, "Aden");
    day_90.last_donation = Some(today - Duration::days(90));
    let day_90 = bank.register_donor(day_90, now)?;

    assert!(!eligibility::is_eligible(&day_89, now));
    assert!(eligibility::is_eligible(&day_90, now));

    let request = bank.create_request(request_in(BloodType::OPositive, "Aden"), now)?;
    let matches = bank.match_donors(&request.id, MatchMode::Browse, now)?;
    let ids: Vec<_> = matches.iter().map(|m| m.donor.id.clone()).collect();
    assert_eq!(ids, vec![day_90.id]);
    Ok(())
}

#[test]
fn test_recorded_donation_starts_cooldown() -> Result<()> {
    let bank = BloodBank::open_in_memory()?;
    let now = Utc::now();

    let donor = bank.register_donor(NewDonor::new("user-1", BloodType::BNegative, "Ibb"), now)?;
    let request = bank.create_request(request_in(BloodType::BPositive, "Ibb"), now)?;
    assert_eq!(bank.match_donors(&request.id, MatchMode::Browse, now)?.len(), 1);

    let donor = bank.record_donation(&donor.id, now.date_naive(), now)?;
    assert_eq!(
        donor.can_donate_after,
        Some(now.date_naive() + Duration::days(eligibility::COOLDOWN_DAYS))
    );
    assert!(donor.is_available);
    assert!(bank.match_donors(&request.id, MatchMode::Browse, now)?.is_empty());

    // Eligible again once the cooldown has passed
    let later = now + Duration::days(eligibility::COOLDOWN_DAYS);
    assert_eq!(bank.match_donors(&request.id, MatchMode::Browse, later)?.len(), 1);
    Ok(())
}

#[test]
fn test_past_expiry_swept_once() -> Result<()> {
    let bank = BloodBank::open_in_memory()?;
    let created = Utc::now() - Duration::days(2);

    let mut input = request_in(BloodType::APositive, "Taiz");
    input.expires_at = Some(created + Duration::days(1));
    let request = bank.create_request(input, created)?;
    assert_eq!(request.status, RequestStatus::Open);

    let now = Utc::now();
    assert_eq!(bank.sweep_expired(now)?, 1);
    assert_eq!(bank.get_request(&request.id)?.status, RequestStatus::Expired);

    assert_eq!(bank.sweep_expired(now)?, 0);
    assert_eq!(bank.get_request(&request.id)?.status, RequestStatus::Expired);
    Ok(())
}

#[test]
fn test_terminal_states_are_final() -> Result<()> {
    let bank = BloodBank::open_in_memory()?;
    let now = Utc::now();
    let admin = Actor::administrator("admin-1");

    for terminal in [RequestStatus::Fulfilled, RequestStatus::Cancelled, RequestStatus::Expired] {
        let request = bank.create_request(request_in(BloodType::ONegative, "Taiz"), now)?;
        bank.transition_request(&request.id, terminal, &admin, now)?;

        for target in RequestStatus::ALL {
            let result = bank.transition_request(&request.id, target, &admin, now);
            assert!(
                matches!(
                    result,
                    Err(BloodBankError::InvalidTransition { from, .. }) if from == terminal
                ),
                "{} -> {} should be rejected",
                terminal,
                target
            );
        }
        assert_eq!(bank.get_request(&request.id)?.status, terminal);
    }
    Ok(())
}

#[test]
fn test_requester_cannot_expire_manually() -> Result<()> {
    let bank = BloodBank::open_in_memory()?;
    let now = Utc::now();

    let mut input = request_in(BloodType::ONegative, "Taiz");
    input.requester_id = Some("alice".into());
    let request = bank.create_request(input, now)?;

    let alice = Actor::requester("alice");
    let result = bank.transition_request(&request.id, RequestStatus::Expired, &alice, now);
    assert!(matches!(result, Err(BloodBankError::Forbidden(_))));
    assert_eq!(bank.get_request(&request.id)?.status, RequestStatus::Open);
    Ok(())
}

#[test]
fn test_listing_filters_and_sorting() -> Result<()> {
    let bank = BloodBank::open_in_memory()?;
    let now = Utc::now();

    let mut critical = request_in(BloodType::ONegative, "Taiz");
    critical.urgency = Urgency::Critical;
    critical.notes = Some("Road accident, theatre 3".into());
    let critical = bank.create_request(critical, now)?;

    let mut low = request_in(BloodType::ONegative, "Taiz");
    low.urgency = Urgency::Low;
    bank.create_request(low, now + Duration::seconds(1))?;

    bank.create_request(request_in(BloodType::APositive, "Aden"), now + Duration::seconds(2))?;

    let filter = RequestFilter {
        city: Some("TAIZ".into()),
        sort_by: SortBy::Urgency,
        sort_order: SortOrder::Desc,
        ..Default::default()
    };
    let page = bank.list_requests(&filter, 1, None)?;
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, critical.id);
    assert_eq!(page.items[1].urgency, Urgency::Low);

    let search = RequestFilter {
        search: Some("theatre".into()),
        ..Default::default()
    };
    let found = bank.list_requests(&search, 1, None)?;
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].id, critical.id);

    let by_type = RequestFilter {
        blood_type: Some(BloodType::APositive),
        ..Default::default()
    };
    assert_eq!(bank.list_requests(&by_type, 1, None)?.items[0].city, "Aden");
    Ok(())
}

#[test]
fn test_compatibility_tables_round_trip() {
    for recipient in BloodType::ALL {
        let donors = compatibility::compatible_donors_for(recipient);
        assert!(!donors.is_empty());
        for donor in BloodType::ALL {
            assert_eq!(
                donors.contains(&donor),
                compatibility::can_donate_to(donor).contains(&recipient),
                "{} -> {}",
                donor,
                recipient
            );
        }
    }
}

#[test]
fn test_eligibility_example_date() {
    let last = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(
        eligibility::can_donate_after(last),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    );
}
