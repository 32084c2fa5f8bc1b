//! Create/edit contact form state.
//!
//! Emails and phones are repeatable entries; the form always keeps at least
//! one of each so there is somewhere to type. Validation differs by mode:
//! creating needs a first name and at least one contact method, editing also
//! needs a title and both an email and a phone.

use tracing::{info, warn};

use super::model::{Contact, ContactEmail, ContactPayload, ContactPhone, EmailPayload, PhonePayload};
use crate::api::{ApiError, ContactApi};
use crate::validation::{is_valid_email, is_valid_phone};

/// Label sent for a created entry whose label was left blank
pub const DEFAULT_LABEL: &str = "N/A";

pub const FIRST_NAME_REQUIRED: &str = "First Name is required.";
pub const CONTACT_METHOD_REQUIRED: &str =
    "You must provide at least one email or one phone number.";
pub const INVALID_EMAILS: &str = "One or more email addresses are invalid.";
pub const INVALID_PHONES: &str = "One or more phone numbers are invalid.";
pub const EDIT_REQUIRED: &str =
    "First Name, Title, at least one valid Email, and at least one valid Phone are required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Email,
    Phone,
}

impl EntryKind {
    fn noun(&self) -> &'static str {
        match self {
            EntryKind::Email => "email",
            EntryKind::Phone => "phone number",
        }
    }
}

/// An editable input of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FirstName,
    LastName,
    Title,
    EmailLabel(usize),
    Email(usize),
    PhoneLabel(usize),
    PhoneNumber(usize),
}

/// Why a submit did not produce a saved contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Local validation failed; nothing was sent
    Invalid(String),
    /// A request is already in flight
    Busy,
    /// There is no create/edit form to submit
    NotOpen,
    /// The server refused or could not be reached
    Rejected { message: String, unauthorized: bool },
}

impl SubmitError {
    pub fn message(&self) -> &str {
        match self {
            SubmitError::Invalid(m) => m,
            SubmitError::Busy => "A save is already in progress.",
            SubmitError::NotOpen => "No contact form is open.",
            SubmitError::Rejected { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactForm {
    mode: FormMode,
    first_name: String,
    last_name: String,
    title: String,
    emails: Vec<ContactEmail>,
    phones: Vec<ContactPhone>,
    error: Option<String>,
    processing: bool,
}

impl ContactForm {
    /// Blank form with one empty email and phone entry
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            first_name: String::new(),
            last_name: String::new(),
            title: String::new(),
            emails: vec![ContactEmail::default()],
            phones: vec![ContactPhone::default()],
            error: None,
            processing: false,
        }
    }

    /// Form seeded from an existing contact; empty arrays get one blank entry
    pub fn edit(contact: &Contact) -> Self {
        let emails = if contact.emails.is_empty() {
            vec![ContactEmail::default()]
        } else {
            contact.emails.clone()
        };
        let phones = if contact.phones.is_empty() {
            vec![ContactPhone::default()]
        } else {
            contact.phones.clone()
        };

        Self {
            mode: FormMode::Edit { id: contact.id },
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            title: contact.title.clone(),
            emails,
            phones,
            error: None,
            processing: false,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn emails(&self) -> &[ContactEmail] {
        &self.emails
    }

    pub fn phones(&self) -> &[ContactPhone] {
        &self.phones
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Update one input. Ignored while a request is in flight or when the
    /// entry index does not exist.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        if self.processing {
            return;
        }
        let value = value.into();
        let slot = match field {
            Field::FirstName => Some(&mut self.first_name),
            Field::LastName => Some(&mut self.last_name),
            Field::Title => Some(&mut self.title),
            Field::EmailLabel(i) => self.emails.get_mut(i).map(|e| &mut e.label),
            Field::Email(i) => self.emails.get_mut(i).map(|e| &mut e.email),
            Field::PhoneLabel(i) => self.phones.get_mut(i).map(|p| &mut p.label),
            Field::PhoneNumber(i) => self.phones.get_mut(i).map(|p| &mut p.phone_number),
        };
        if let Some(slot) = slot {
            *slot = value;
        }
    }

    /// Append a blank entry
    pub fn add(&mut self, kind: EntryKind) {
        if self.processing {
            return;
        }
        self.error = None;
        match kind {
            EntryKind::Email => self.emails.push(ContactEmail::default()),
            EntryKind::Phone => self.phones.push(ContactPhone::default()),
        }
    }

    /// Remove an entry. The last remaining entry of a kind is kept and an
    /// error is shown instead.
    pub fn remove(&mut self, kind: EntryKind, index: usize) {
        if self.processing {
            return;
        }
        let len = match kind {
            EntryKind::Email => self.emails.len(),
            EntryKind::Phone => self.phones.len(),
        };

        if len <= 1 {
            self.error = Some(format!("At least one {} is required.", kind.noun()));
            return;
        }
        if index >= len {
            return;
        }

        self.error = None;
        match kind {
            EntryKind::Email => {
                self.emails.remove(index);
            }
            EntryKind::Phone => {
                self.phones.remove(index);
            }
        }
    }

    fn filled_emails(&self) -> impl Iterator<Item = &ContactEmail> {
        self.emails.iter().filter(|e| !e.email.trim().is_empty())
    }

    fn filled_phones(&self) -> impl Iterator<Item = &ContactPhone> {
        self.phones.iter().filter(|p| !p.phone_number.trim().is_empty())
    }

    /// Check the form for the current mode; the first failure wins
    pub fn validate(&self) -> Result<(), String> {
        match self.mode {
            FormMode::Create => self.validate_create(),
            FormMode::Edit { .. } => self.validate_edit(),
        }
    }

    fn validate_create(&self) -> Result<(), String> {
        if self.first_name.is_empty() {
            return Err(FIRST_NAME_REQUIRED.to_string());
        }
        if self.filled_emails().next().is_none() && self.filled_phones().next().is_none() {
            return Err(CONTACT_METHOD_REQUIRED.to_string());
        }
        if self.filled_emails().any(|e| !is_valid_email(&e.email)) {
            return Err(INVALID_EMAILS.to_string());
        }
        if self.filled_phones().any(|p| !is_valid_phone(&p.phone_number)) {
            return Err(INVALID_PHONES.to_string());
        }
        Ok(())
    }

    fn validate_edit(&self) -> Result<(), String> {
        let emails_ok = self.filled_emails().any(|e| is_valid_email(&e.email));
        let phones_ok = self.filled_phones().any(|p| is_valid_phone(&p.phone_number));

        if self.first_name.is_empty() || self.title.is_empty() || !emails_ok || !phones_ok {
            return Err(EDIT_REQUIRED.to_string());
        }
        Ok(())
    }

    /// Request body: blank entries dropped, blank labels defaulted
    pub fn payload(&self) -> ContactPayload {
        let default_label = match self.mode {
            FormMode::Create => DEFAULT_LABEL,
            FormMode::Edit { .. } => "",
        };
        let label = |l: &str| {
            if l.is_empty() {
                default_label.to_string()
            } else {
                l.to_string()
            }
        };

        ContactPayload {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            title: self.title.clone(),
            emails: self
                .filled_emails()
                .map(|e| EmailPayload {
                    label: label(&e.label),
                    email: e.email.clone(),
                })
                .collect(),
            phones: self
                .filled_phones()
                .map(|p| PhonePayload {
                    label: label(&p.label),
                    phone_number: p.phone_number.clone(),
                })
                .collect(),
        }
    }

    /// Validate and send. The form keeps the error to show; the caller gets
    /// the saved contact as the server returned it.
    pub async fn submit(&mut self, api: &dyn ContactApi, token: &str) -> Result<Contact, SubmitError> {
        if self.processing {
            return Err(SubmitError::Busy);
        }
        self.error = None;

        if let Err(message) = self.validate() {
            self.error = Some(message.clone());
            return Err(SubmitError::Invalid(message));
        }

        let payload = self.payload();
        self.processing = true;
        let result = match self.mode {
            FormMode::Create => api.create_contact(token, &payload).await,
            FormMode::Edit { id } => api.update_contact(token, id, &payload).await,
        };
        self.processing = false;

        match result {
            Ok(contact) => {
                info!(id = contact.id, mode = ?self.mode, "Contact saved");
                Ok(contact)
            }
            Err(e) => {
                warn!(error = %e, mode = ?self.mode, "Contact save failed");
                let message = self.describe_failure(&e);
                self.error = Some(message.clone());
                Err(SubmitError::Rejected {
                    message,
                    unauthorized: e.is_unauthorized(),
                })
            }
        }
    }

    fn describe_failure(&self, e: &ApiError) -> String {
        match self.mode {
            FormMode::Create => e.describe(
                "Failed to create contact",
                "An error occurred while creating the contact.",
            ),
            FormMode::Edit { .. } => {
                e.describe("Failed to update contact", "Could not save changes.")
            }
        }
    }
}
