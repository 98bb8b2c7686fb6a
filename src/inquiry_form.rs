//! Two-step package inquiry form
//!
//! Step one collects contact details and the party size, step two one entry
//! per traveler. The traveler list always has exactly `adults + children`
//! entries. Growing the party appends blank entries and shrinking it
//! truncates from the end, so entries that keep their index keep their data.
//!
//! Shrinking discards data without asking, as the site always has. A UI that
//! wants a confirmation can call [`InquiryForm::travelers_discarded_by`] first.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use crate::models::{MAX_ADULTS, MAX_CHILDREN, MIN_ADULTS, MIN_CHILDREN};
use crate::{
    models::{
        Gender, Nationality, PackageInquiryPayload, PartySize, TravelerPayload, TravelerRole,
    },
    packages::PackageRef,
};

/// How long the success confirmation stays up before the form closes
pub const SUCCESS_DISMISS_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    ContactAndParty,
    TravelerDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Editing,
    /// Request in flight; all inputs are locked
    Submitting,
    Succeeded { at: DateTime<Utc> },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Email,
    Phone,
    DeparturePreference,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelerField {
    FullName,
    DateOfBirth,
    Gender,
    Nationality,
    PassportNumber,
    PassportExpiry,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Please fill in {0}")]
    MissingContactField(&'static str),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Traveler {number}: please fill in {field}")]
    IncompleteTraveler { number: usize, field: &'static str },

    #[error("Traveler {0} does not exist")]
    NoSuchTraveler(usize),

    #[error("Finish the contact step first")]
    WrongStep,

    #[error("The form is locked while the inquiry is being sent")]
    Locked,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// `YYYY-MM` from a month picker
    pub departure_preference: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelerDraft {
    pub full_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub nationality: String,
    pub passport_number: String,
    pub passport_expiry: String,
}

impl TravelerDraft {
    fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// First required field that is empty or not one of the offered choices
    fn first_missing(&self) -> Option<&'static str> {
        if self.full_name.trim().is_empty() {
            Some("full name")
        } else if self.date_of_birth.trim().is_empty() {
            Some("date of birth")
        } else if Gender::from_code(&self.gender).is_none() {
            Some("gender")
        } else if Nationality::from_code(&self.nationality).is_none() {
            Some("nationality")
        } else if self.passport_number.trim().is_empty() {
            Some("passport number")
        } else if self.passport_expiry.trim().is_empty() {
            Some("passport expiry")
        } else {
            None
        }
    }

    fn to_payload(&self) -> TravelerPayload {
        TravelerPayload {
            full_name: self.full_name.trim().to_string(),
            date_of_birth: self.date_of_birth.clone(),
            gender: self.gender.clone(),
            nationality: self.nationality.clone(),
            passport_number: self.passport_number.trim().to_string(),
            passport_expiry: self.passport_expiry.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InquiryForm {
    package: PackageRef,
    step: FormStep,
    state: SubmissionState,
    contact: ContactDraft,
    adults: u32,
    children: u32,
    travelers: Vec<TravelerDraft>,
}

impl InquiryForm {
    pub fn new(package: PackageRef) -> Self {
        Self {
            package,
            step: FormStep::ContactAndParty,
            state: SubmissionState::Editing,
            contact: ContactDraft::default(),
            adults: MIN_ADULTS,
            children: MIN_CHILDREN,
            travelers: vec![TravelerDraft::default()],
        }
    }

    pub fn package(&self) -> &PackageRef {
        &self.package
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn contact(&self) -> &ContactDraft {
        &self.contact
    }

    pub fn adults(&self) -> u32 {
        self.adults
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn travelers(&self) -> &[TravelerDraft] {
        &self.travelers
    }

    /// Inputs are disabled while a submission is in flight
    pub fn is_locked(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    fn ensure_editable(&self) -> Result<(), FormError> {
        if self.is_locked() {
            Err(FormError::Locked)
        } else {
            Ok(())
        }
    }

    fn party(&self) -> PartySize {
        PartySize {
            adults: self.adults,
            children: self.children,
        }
    }

    pub fn traveler_role(&self, index: usize) -> TravelerRole {
        self.party().role_of(index)
    }

    pub fn set_contact_field(&mut self, field: ContactField, value: &str) -> Result<(), FormError> {
        self.ensure_editable()?;
        let slot = match field {
            ContactField::Name => &mut self.contact.name,
            ContactField::Email => &mut self.contact.email,
            ContactField::Phone => &mut self.contact.phone,
            ContactField::DeparturePreference => &mut self.contact.departure_preference,
            ContactField::Message => &mut self.contact.message,
        };
        *slot = value.to_string();
        Ok(())
    }

    /// Clamped to `MIN_ADULTS..=MAX_ADULTS`; resizes the traveler list
    pub fn set_adults(&mut self, adults: u32) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.adults = adults.clamp(MIN_ADULTS, MAX_ADULTS);
        self.sync_travelers();
        Ok(())
    }

    /// Clamped to `MIN_CHILDREN..=MAX_CHILDREN`; resizes the traveler list
    pub fn set_children(&mut self, children: u32) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.children = children.clamp(MIN_CHILDREN, MAX_CHILDREN);
        self.sync_travelers();
        Ok(())
    }

    /// Number of travelers with entered data that a resize to the given
    /// counts would drop
    pub fn travelers_discarded_by(&self, adults: u32, children: u32) -> usize {
        let keep = PartySize {
            adults: adults.clamp(MIN_ADULTS, MAX_ADULTS),
            children: children.clamp(MIN_CHILDREN, MAX_CHILDREN),
        }
        .total();
        self.travelers
            .iter()
            .skip(keep)
            .filter(|t| !t.is_blank())
            .count()
    }

    fn sync_travelers(&mut self) {
        let total = self.party().total();
        self.travelers.resize_with(total, TravelerDraft::default);
    }

    pub fn set_traveler_field(
        &mut self,
        index: usize,
        field: TravelerField,
        value: &str,
    ) -> Result<(), FormError> {
        self.ensure_editable()?;
        let traveler = self
            .travelers
            .get_mut(index)
            .ok_or(FormError::NoSuchTraveler(index + 1))?;
        match field {
            TravelerField::FullName => traveler.full_name = value.to_string(),
            TravelerField::DateOfBirth => traveler.date_of_birth = value.to_string(),
            TravelerField::Gender => traveler.gender = value.to_string(),
            TravelerField::Nationality => traveler.nationality = value.to_string(),
            TravelerField::PassportNumber => traveler.passport_number = value.to_uppercase(),
            TravelerField::PassportExpiry => traveler.passport_expiry = value.to_string(),
        }
        Ok(())
    }

    fn check_contact(&self) -> Result<(), FormError> {
        let required = [
            ("your name", &self.contact.name),
            ("your email", &self.contact.email),
            ("your phone number", &self.contact.phone),
        ];
        if let Some((label, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(FormError::MissingContactField(*label));
        }
        if !self.contact.email.contains('@') {
            return Err(FormError::InvalidEmail);
        }
        Ok(())
    }

    /// Step one → step two
    pub fn next_step(&mut self) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.check_contact()?;
        self.step = FormStep::TravelerDetails;
        Ok(())
    }

    /// Step two → step one, keeping everything entered
    pub fn previous_step(&mut self) -> Result<(), FormError> {
        self.ensure_editable()?;
        self.step = FormStep::ContactAndParty;
        Ok(())
    }

    /// Validates the travelers, locks the form and returns the request body
    pub fn begin_submission(&mut self) -> Result<PackageInquiryPayload, FormError> {
        self.ensure_editable()?;
        if self.step != FormStep::TravelerDetails {
            return Err(FormError::WrongStep);
        }
        self.check_contact()?;
        for (i, traveler) in self.travelers.iter().enumerate() {
            if let Some(field) = traveler.first_missing() {
                return Err(FormError::IncompleteTraveler {
                    number: i + 1,
                    field,
                });
            }
        }

        self.state = SubmissionState::Submitting;
        Ok(self.payload())
    }

    fn payload(&self) -> PackageInquiryPayload {
        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        PackageInquiryPayload {
            name: non_empty(&self.contact.name),
            email: non_empty(&self.contact.email),
            phone: non_empty(&self.contact.phone),
            adults: Some(self.adults),
            children: Some(self.children),
            departure_date: non_empty(&self.contact.departure_preference),
            message: non_empty(&self.contact.message),
            travelers: Some(self.travelers.iter().map(TravelerDraft::to_payload).collect()),
            package_name: Some(self.package.name.clone()),
            package_price: Some(self.package.price.clone()),
            package_days: Some(self.package.duration_label.clone()),
        }
    }

    /// Records a confirmed delivery. Entered data is cleared only here.
    pub fn submission_succeeded(&mut self, at: DateTime<Utc>) {
        let package = self.package.clone();
        *self = Self::new(package);
        self.state = SubmissionState::Succeeded { at };
    }

    /// Unlocks the form on the traveler step with everything kept for a retry
    pub fn submission_failed(&mut self, message: impl Into<String>) {
        self.state = SubmissionState::Failed {
            message: message.into(),
        };
    }

    /// Whether the success confirmation has been shown long enough
    pub fn should_close(&self, now: DateTime<Utc>) -> bool {
        match self.state {
            SubmissionState::Succeeded { at } => now
                .signed_duration_since(at)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= SUCCESS_DISMISS_DELAY),
            _ => false,
        }
    }

    /// Clears a success or failure notice
    pub fn dismiss(&mut self) {
        if !self.is_locked() {
            self.state = SubmissionState::Editing;
        }
    }
}
