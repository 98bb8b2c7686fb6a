//! Package booking inquiry
//!
//! Travelers carry no adult/child flag. The first `adults` entries are adults
//! and the rest are children, so the role is always derived from position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{MISSING_FIELDS, optional, required, required_email};
use crate::{AppError, Result, packages::PackageRef};

pub const MIN_ADULTS: u32 = 1;
pub const MAX_ADULTS: u32 = 10;
pub const MIN_CHILDREN: u32 = 0;
pub const MAX_CHILDREN: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelerRole {
    Adult,
    Child,
}

impl TravelerRole {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TravelerRole::Adult => "Adult",
            TravelerRole::Child => "Child",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Nationalities offered by the booking form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nationality {
    Pakistani,
    Indian,
    Bangladeshi,
    Indonesian,
    Malaysian,
    British,
    American,
    Canadian,
    Saudi,
    Emirati,
    Other,
}

impl Nationality {
    pub const ALL: [Nationality; 11] = [
        Nationality::Pakistani,
        Nationality::Indian,
        Nationality::Bangladeshi,
        Nationality::Indonesian,
        Nationality::Malaysian,
        Nationality::British,
        Nationality::American,
        Nationality::Canadian,
        Nationality::Saudi,
        Nationality::Emirati,
        Nationality::Other,
    ];

    /// Value submitted by the form
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Nationality::Pakistani => "Pakistani",
            Nationality::Indian => "Indian",
            Nationality::Bangladeshi => "Bangladeshi",
            Nationality::Indonesian => "Indonesian",
            Nationality::Malaysian => "Malaysian",
            Nationality::British => "British",
            Nationality::American => "American",
            Nationality::Canadian => "Canadian",
            Nationality::Saudi => "Saudi",
            Nationality::Emirati => "Emirati",
            Nationality::Other => "Other",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Nationality::Saudi => "Saudi Arabian",
            other => other.code(),
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartySize {
    pub adults: u32,
    pub children: u32,
}

impl PartySize {
    #[must_use]
    pub fn total(self) -> usize {
        self.adults as usize + self.children as usize
    }

    #[must_use]
    pub fn role_of(self, index: usize) -> TravelerRole {
        if index < self.adults as usize {
            TravelerRole::Adult
        } else {
            TravelerRole::Child
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One traveler as received. Blank or unparsable fields stay absent and are
/// shown as placeholders in the email.
#[derive(Debug, Clone, PartialEq)]
pub struct Traveler {
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub passport_expiry: Option<NaiveDate>,
}

/// A validated package inquiry, ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInquiry {
    pub contact: ContactDetails,
    pub party: PartySize,
    pub travelers: Vec<Traveler>,
    pub package: PackageRef,
    /// Year-month the party would like to depart, e.g. `2025-03`
    pub departure: Option<String>,
    pub message: Option<String>,
}

impl PackageInquiry {
    /// Travelers paired with their positional role
    pub fn travelers_with_roles(&self) -> impl Iterator<Item = (TravelerRole, &Traveler)> {
        self.travelers
            .iter()
            .enumerate()
            .map(|(i, t)| (self.party.role_of(i), t))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TravelerPayload {
    #[serde(rename = "name", alias = "fullName")]
    pub full_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub nationality: String,
    pub passport_number: String,
    pub passport_expiry: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInquiryPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub departure_date: Option<String>,
    pub message: Option<String>,
    pub travelers: Option<Vec<TravelerPayload>>,
    pub package_name: Option<String>,
    pub package_price: Option<String>,
    pub package_days: Option<String>,
}

impl PackageInquiryPayload {
    pub fn validate(self) -> Result<PackageInquiry> {
        let contact = ContactDetails {
            name: required("name", self.name)?,
            email: required_email(self.email, MISSING_FIELDS)?,
            phone: required("phone", self.phone)?,
        };
        let package_name = required("packageName", self.package_name)?;

        let travelers = self
            .travelers
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::validation("travelers", MISSING_FIELDS))?;

        let party = PartySize {
            adults: self.adults.unwrap_or(1),
            children: self.children.unwrap_or(0),
        };
        if !(MIN_ADULTS..=MAX_ADULTS).contains(&party.adults) {
            return Err(AppError::validation(
                "adults",
                format!("Adults must be between {MIN_ADULTS} and {MAX_ADULTS}"),
            ));
        }
        if !(MIN_CHILDREN..=MAX_CHILDREN).contains(&party.children) {
            return Err(AppError::validation(
                "children",
                format!("Children must be between {MIN_CHILDREN} and {MAX_CHILDREN}"),
            ));
        }
        if party.total() != travelers.len() {
            return Err(AppError::validation(
                "travelers",
                format!(
                    "Expected {} travelers for {} adults and {} children, got {}",
                    party.total(),
                    party.adults,
                    party.children,
                    travelers.len()
                ),
            ));
        }

        Ok(PackageInquiry {
            contact,
            party,
            travelers: travelers.into_iter().map(Traveler::from).collect(),
            package: PackageRef {
                name: package_name,
                price: optional(self.package_price).unwrap_or_default(),
                duration_label: optional(self.package_days).unwrap_or_default(),
            },
            departure: optional(self.departure_date),
            message: optional(self.message),
        })
    }
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

impl From<TravelerPayload> for Traveler {
    fn from(payload: TravelerPayload) -> Self {
        Self {
            full_name: optional(Some(payload.full_name)),
            date_of_birth: parse_iso_date(&payload.date_of_birth),
            gender: Gender::from_code(&payload.gender),
            nationality: optional(Some(payload.nationality)),
            passport_number: optional(Some(payload.passport_number)).map(|p| p.to_uppercase()),
            passport_expiry: parse_iso_date(&payload.passport_expiry),
        }
    }
}
