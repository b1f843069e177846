//! ABO/Rh transfusion compatibility.
//!
//! Two static tables: donor → recipients it may give to, and
//! recipient → donors it may receive from. Both are derived from the
//! standard red-cell rules and never change at runtime.

use crate::models::{BloodType, InvalidBloodType};

use crate::models::BloodType::{
    ANegative as AN, APositive as AP, AbNegative as ABN, AbPositive as ABP, BNegative as BN,
    BPositive as BP, ONegative as ON, OPositive as OP,
};

/// Recipient types a donor of `donor` type may give to.
pub fn can_donate_to(donor: BloodType) -> &'static [BloodType] {
    match donor {
        AP => &[AP, ABP],
        AN => &[AP, AN, ABP, ABN],
        BP => &[BP, ABP],
        BN => &[BP, BN, ABP, ABN],
        OP => &[AP, BP, OP, ABP],
        ON => &[AP, AN, BP, BN, OP, ON, ABP, ABN],
        ABP => &[ABP],
        ABN => &[ABP, ABN],
    }
}

/// Donor types a recipient of `recipient` type may receive from.
pub fn compatible_donors_for(recipient: BloodType) -> &'static [BloodType] {
    match recipient {
        AP => &[AP, AN, OP, ON],
        AN => &[AN, ON],
        BP => &[BP, BN, OP, ON],
        BN => &[BN, ON],
        OP => &[OP, ON],
        ON => &[ON],
        ABP => &[AP, AN, BP, BN, ABP, ABN, OP, ON],
        ABN => &[AN, BN, ABN, ON],
    }
}

/// Whether blood from `donor` may be given to `recipient`.
pub fn is_compatible(donor: BloodType, recipient: BloodType) -> bool {
    compatible_donors_for(recipient).contains(&donor)
}

/// [`compatible_donors_for`] for an unparsed token.
pub fn compatible_donors_for_token(token: &str) -> Result<&'static [BloodType], InvalidBloodType> {
    Ok(compatible_donors_for(token.parse()?))
}

/// [`can_donate_to`] for an unparsed token.
pub fn can_donate_to_token(token: &str) -> Result<&'static [BloodType], InvalidBloodType> {
    Ok(can_donate_to(token.parse()?))
}
