//! Canonical field names and per-record-type alias tables
//!
//! The backend has used several key naming conventions for the same concept
//! over its lifetime (a client id may arrive as `c_id`, `id` or `client_id`).
//! Each record type registers one [`AliasTable`] listing, per canonical field,
//! the raw keys that may carry it. Order encodes precedence: first match wins.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Application-level name for a data attribute, independent of backend key naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalField {
    RecordId,
    UserId,
    DisplayName,
    Email,
    Phone,
    Address,
    AddDate,
    PolicyNumber,
    Amount,
    VehicleNumber,
    Status,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::RecordId,
        CanonicalField::UserId,
        CanonicalField::DisplayName,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Address,
        CanonicalField::AddDate,
        CanonicalField::PolicyNumber,
        CanonicalField::Amount,
        CanonicalField::VehicleNumber,
        CanonicalField::Status,
    ];

    /// Canonical (camelCase) name
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::RecordId => "recordId",
            CanonicalField::UserId => "userId",
            CanonicalField::DisplayName => "displayName",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Address => "address",
            CanonicalField::AddDate => "addDate",
            CanonicalField::PolicyNumber => "policyNumber",
            CanonicalField::Amount => "amount",
            CanonicalField::VehicleNumber => "vehicleNumber",
            CanonicalField::Status => "status",
        }
    }

    /// Suffix used to build the prefix-qualified submit field name
    /// (`<prefix>_<suffix>`, e.g. `c_name`)
    pub fn wire_suffix(&self) -> &'static str {
        match self {
            CanonicalField::RecordId => "id",
            CanonicalField::UserId => "user_id",
            CanonicalField::DisplayName => "name",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Address => "address",
            CanonicalField::AddDate => "add_date",
            CanonicalField::PolicyNumber => "policy_no",
            CanonicalField::Amount => "amount",
            CanonicalField::VehicleNumber => "vehicle_no",
            CanonicalField::Status => "status",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown canonical field '{}'", s))
    }
}

/// Static mapping from canonical field to its ordered list of source keys
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    entries: &'static [(CanonicalField, &'static [&'static str])],
}

impl AliasTable {
    /// Build a table, rejecting empty alias lists
    ///
    /// Tables are declared as constants, so an empty list fails the build.
    pub const fn new(entries: &'static [(CanonicalField, &'static [&'static str])]) -> Self {
        let mut i = 0;
        while i < entries.len() {
            if entries[i].1.is_empty() {
                panic!("alias list must not be empty");
            }
            i += 1;
        }
        Self { entries }
    }

    /// Ordered aliases registered for `field`
    pub fn aliases(&self, field: CanonicalField) -> Option<&'static [&'static str]> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, aliases)| *aliases)
    }

    /// Canonical fields registered in this table, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.entries.iter().map(|(field, _)| *field)
    }

    /// Every raw key any alias list in this table accepts
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .flat_map(|(_, aliases)| aliases.iter().copied())
    }
}

// ============================================================================
// Registered tables
// ============================================================================

pub static CLIENT_ALIASES: AliasTable = AliasTable::new(&[
    (CanonicalField::RecordId, &["c_id", "id", "client_id"]),
    (CanonicalField::UserId, &["c_user_id", "user_id", "uid"]),
    (CanonicalField::DisplayName, &["c_name", "client_name", "name", "full_name"]),
    (CanonicalField::Email, &["c_email", "client_email", "email"]),
    (CanonicalField::Phone, &["c_phone", "c_mobile", "phone", "mobile", "contact"]),
    (CanonicalField::Address, &["c_address", "address"]),
    (CanonicalField::AddDate, &["c_add_date", "add_date", "created_at"]),
]);

pub static LIFE_INSURANCE_ALIASES: AliasTable = AliasTable::new(&[
    (CanonicalField::RecordId, &["li_id", "id", "policy_id"]),
    (CanonicalField::UserId, &["li_user_id", "user_id", "uid"]),
    (CanonicalField::DisplayName, &["li_name", "li_holder_name", "holder_name", "name"]),
    (CanonicalField::Email, &["li_email", "email"]),
    (CanonicalField::Phone, &["li_phone", "li_mobile", "phone", "mobile"]),
    (CanonicalField::PolicyNumber, &["li_policy_no", "policy_no", "policy_number"]),
    (CanonicalField::Amount, &["li_amount", "li_sum_assured", "sum_assured", "premium", "amount"]),
    (CanonicalField::Status, &["li_status", "policy_status"]),
    (CanonicalField::AddDate, &["li_add_date", "add_date", "created_at"]),
]);

pub static CAR_INSURANCE_ALIASES: AliasTable = AliasTable::new(&[
    (CanonicalField::RecordId, &["ci_id", "id", "policy_id"]),
    (CanonicalField::UserId, &["ci_user_id", "user_id", "uid"]),
    (CanonicalField::DisplayName, &["ci_name", "ci_owner_name", "owner_name", "name"]),
    (CanonicalField::Phone, &["ci_phone", "ci_mobile", "phone", "mobile"]),
    (CanonicalField::VehicleNumber, &["ci_vehicle_no", "vehicle_no", "vehicle_number", "registration_no"]),
    (CanonicalField::PolicyNumber, &["ci_policy_no", "policy_no", "policy_number"]),
    (CanonicalField::Amount, &["ci_amount", "ci_premium", "premium", "amount"]),
    (CanonicalField::AddDate, &["ci_add_date", "add_date", "created_at"]),
]);

pub static HEALTH_INSURANCE_ALIASES: AliasTable = AliasTable::new(&[
    (CanonicalField::RecordId, &["hi_id", "id", "policy_id"]),
    (CanonicalField::UserId, &["hi_user_id", "user_id", "uid"]),
    (CanonicalField::DisplayName, &["hi_name", "hi_insured_name", "insured_name", "name"]),
    (CanonicalField::Email, &["hi_email", "email"]),
    (CanonicalField::Phone, &["hi_phone", "hi_mobile", "phone", "mobile"]),
    (CanonicalField::PolicyNumber, &["hi_policy_no", "policy_no", "policy_number"]),
    (CanonicalField::Amount, &["hi_amount", "hi_cover_amount", "cover_amount", "premium", "amount"]),
    (CanonicalField::AddDate, &["hi_add_date", "add_date", "created_at"]),
]);

pub static LOAN_ALIASES: AliasTable = AliasTable::new(&[
    (CanonicalField::RecordId, &["ln_id", "id", "loan_id"]),
    (CanonicalField::UserId, &["ln_user_id", "user_id", "uid"]),
    (CanonicalField::DisplayName, &["ln_name", "ln_applicant_name", "applicant_name", "name"]),
    (CanonicalField::Phone, &["ln_phone", "ln_mobile", "phone", "mobile"]),
    (CanonicalField::Amount, &["ln_amount", "loan_amount", "amount"]),
    (CanonicalField::Status, &["ln_status", "loan_status"]),
    (CanonicalField::AddDate, &["ln_add_date", "add_date", "created_at"]),
]);

/// Every registered table
pub fn all_tables() -> [&'static AliasTable; 5] {
    [
        &CLIENT_ALIASES,
        &LIFE_INSURANCE_ALIASES,
        &CAR_INSURANCE_ALIASES,
        &HEALTH_INSURANCE_ALIASES,
        &LOAN_ALIASES,
    ]
}

/// Union of raw keys accepted by any registered alias list
pub fn candidate_keys() -> BTreeSet<&'static str> {
    all_tables().iter().flat_map(|table| table.keys()).collect()
}
