//! Record type registry
//!
//! Each record family registers exactly one alias table, one endpoint set and
//! one essential-field set.

use crate::alias::{
    AliasTable, CanonicalField, CAR_INSURANCE_ALIASES, CLIENT_ALIASES, HEALTH_INSURANCE_ALIASES,
    LIFE_INSURANCE_ALIASES, LOAN_ALIASES,
};
use std::fmt;
use std::str::FromStr;

/// Backend paths for one record type, relative to the configured base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// Primary fetch path (POST, then GET)
    pub fetch: &'static str,
    /// Alternate fetch path tried last
    pub alternate_fetch: &'static str,
    /// Identifier parameter name the alternate path expects
    pub alternate_param: &'static str,
    /// Submit path
    pub submit: &'static str,
}

/// Record families served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordType {
    Clients,
    LifeInsurance,
    CarInsurance,
    HealthInsurance,
    Loans,
}

impl RecordType {
    pub const ALL: [RecordType; 5] = [
        RecordType::Clients,
        RecordType::LifeInsurance,
        RecordType::CarInsurance,
        RecordType::HealthInsurance,
        RecordType::Loans,
    ];

    /// Kebab-case name used on the command line and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Clients => "clients",
            RecordType::LifeInsurance => "life-insurance",
            RecordType::CarInsurance => "car-insurance",
            RecordType::HealthInsurance => "health-insurance",
            RecordType::Loans => "loans",
        }
    }

    /// Field-name prefix used by the backend (`c_name`, `li_policy_no`, ...)
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordType::Clients => "c",
            RecordType::LifeInsurance => "li",
            RecordType::CarInsurance => "ci",
            RecordType::HealthInsurance => "hi",
            RecordType::Loans => "ln",
        }
    }

    pub fn alias_table(&self) -> &'static AliasTable {
        match self {
            RecordType::Clients => &CLIENT_ALIASES,
            RecordType::LifeInsurance => &LIFE_INSURANCE_ALIASES,
            RecordType::CarInsurance => &CAR_INSURANCE_ALIASES,
            RecordType::HealthInsurance => &HEALTH_INSURANCE_ALIASES,
            RecordType::Loans => &LOAN_ALIASES,
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        match self {
            RecordType::Clients => Endpoints {
                fetch: "get_clients.php",
                alternate_fetch: "fetch_clients.php",
                alternate_param: "uid",
                submit: "add_client.php",
            },
            RecordType::LifeInsurance => Endpoints {
                fetch: "get_life_insurance.php",
                alternate_fetch: "fetch_life_insurance.php",
                alternate_param: "uid",
                submit: "add_life_insurance.php",
            },
            RecordType::CarInsurance => Endpoints {
                fetch: "get_car_insurance.php",
                alternate_fetch: "fetch_car_insurance.php",
                alternate_param: "uid",
                submit: "add_car_insurance.php",
            },
            RecordType::HealthInsurance => Endpoints {
                fetch: "get_health_insurance.php",
                alternate_fetch: "fetch_health_insurance.php",
                alternate_param: "uid",
                submit: "add_health_insurance.php",
            },
            RecordType::Loans => Endpoints {
                fetch: "get_loans.php",
                alternate_fetch: "fetch_loans.php",
                alternate_param: "id",
                submit: "add_loan.php",
            },
        }
    }

    /// Canonical fields kept in a fallback submission
    pub fn essential_fields(&self) -> &'static [CanonicalField] {
        match self {
            RecordType::Clients => &[CanonicalField::DisplayName, CanonicalField::Phone],
            RecordType::LifeInsurance | RecordType::HealthInsurance => &[
                CanonicalField::DisplayName,
                CanonicalField::PolicyNumber,
                CanonicalField::Amount,
            ],
            RecordType::CarInsurance => &[
                CanonicalField::DisplayName,
                CanonicalField::VehicleNumber,
                CanonicalField::PolicyNumber,
            ],
            RecordType::Loans => &[CanonicalField::DisplayName, CanonicalField::Amount],
        }
    }

    /// Prefix-qualified submit field name (`<prefix>_<suffix>`)
    pub fn wire_name(&self, field: CanonicalField) -> String {
        format!("{}_{}", self.prefix(), field.wire_suffix())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        RecordType::ALL
            .into_iter()
            .find(|record_type| record_type.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown record type '{}' (expected one of: {})",
                    s,
                    RecordType::ALL
                        .iter()
                        .map(RecordType::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_record_types() {
        assert_eq!("clients".parse::<RecordType>(), Ok(RecordType::Clients));
        assert_eq!("Life_Insurance".parse::<RecordType>(), Ok(RecordType::LifeInsurance));
        assert_eq!(" loans ".parse::<RecordType>(), Ok(RecordType::Loans));
        assert!("pets".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for record_type in RecordType::ALL {
            assert_eq!(record_type.to_string().parse::<RecordType>(), Ok(record_type));
        }
    }

    #[test]
    fn test_prefixes_are_unique() {
        let prefixes: HashSet<_> = RecordType::ALL.iter().map(RecordType::prefix).collect();
        assert_eq!(prefixes.len(), RecordType::ALL.len());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(RecordType::Clients.wire_name(CanonicalField::DisplayName), "c_name");
        assert_eq!(RecordType::LifeInsurance.wire_name(CanonicalField::PolicyNumber), "li_policy_no");
        assert_eq!(RecordType::CarInsurance.wire_name(CanonicalField::VehicleNumber), "ci_vehicle_no");
        assert_eq!(RecordType::Loans.wire_name(CanonicalField::AddDate), "ln_add_date");
    }

    #[test]
    fn test_essential_fields_are_registered_in_alias_table() {
        for record_type in RecordType::ALL {
            for field in record_type.essential_fields() {
                assert!(
                    record_type.alias_table().aliases(*field).is_some(),
                    "{} essential field {} has no aliases",
                    record_type,
                    field
                );
            }
        }
    }

    #[test]
    fn test_wire_name_is_a_registered_alias() {
        // Records we submit must be readable back through the same table
        for record_type in RecordType::ALL {
            let table = record_type.alias_table();
            for field in table.fields() {
                if field == CanonicalField::RecordId {
                    continue;
                }
                let aliases = table.aliases(field).unwrap();
                assert!(
                    aliases.contains(&record_type.wire_name(field).as_str()),
                    "{} {} aliases miss {}",
                    record_type,
                    field,
                    record_type.wire_name(field)
                );
            }
        }
    }
}
