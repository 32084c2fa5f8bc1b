use super::form::ContactForm;
use super::model::Contact;
use crate::auth::ChangePasswordForm;
use crate::formatting::format_display_name;

/// Whichever dialog is open over the contact list
#[derive(Debug, Clone)]
pub enum Modal {
    Create(ContactForm),
    Edit(ContactForm),
    Delete(DeleteConfirmation),
    Profile(ProfileModal),
    ChangePassword(ChangePasswordForm),
}

/// Confirm/cancel dialog for deleting one contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    contact_id: i64,
    contact_name: String,
    processing: bool,
}

impl DeleteConfirmation {
    pub fn new(contact: &Contact) -> Self {
        Self {
            contact_id: contact.id,
            contact_name: contact.full_name(),
            processing: false,
        }
    }

    pub fn contact_id(&self) -> i64 {
        self.contact_id
    }

    pub fn prompt(&self) -> String {
        let name = if self.contact_name.is_empty() {
            "this contact"
        } else {
            &self.contact_name
        };
        format!(
            "Are you sure you want to delete the contact for {}? This action cannot be undone.",
            name
        )
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub(crate) fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    /// Both buttons are disabled while the delete is in flight
    pub fn buttons_enabled(&self) -> bool {
        !self.processing
    }

    pub fn confirm_label(&self) -> &'static str {
        if self.processing {
            "Deleting..."
        } else {
            "Confirm Delete"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAction {
    ChangePassword,
    Logout,
    Close,
}

/// Identity card with change-password and logout actions. Holds no
/// asynchronous state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileModal {
    identifier: String,
}

impl ProfileModal {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> String {
        format_display_name(Some(&self.identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::contact;

    #[test]
    fn test_delete_prompt_uses_full_name() {
        let mut c = contact(1, "Ada");
        c.last_name = "Lovelace".into();
        let dialog = DeleteConfirmation::new(&c);
        assert_eq!(
            dialog.prompt(),
            "Are you sure you want to delete the contact for Ada Lovelace? This action cannot be undone."
        );
    }

    #[test]
    fn test_delete_prompt_fallback() {
        let c = contact(1, "");
        let dialog = DeleteConfirmation::new(&c);
        assert!(dialog.prompt().contains("for this contact?"));
    }

    #[test]
    fn test_delete_processing_disables_buttons() {
        let mut dialog = DeleteConfirmation::new(&contact(1, "Ada"));
        assert!(dialog.buttons_enabled());
        assert_eq!(dialog.confirm_label(), "Confirm Delete");

        dialog.set_processing(true);
        assert!(!dialog.buttons_enabled());
        assert_eq!(dialog.confirm_label(), "Deleting...");
    }

    #[test]
    fn test_profile_display_name() {
        let profile = ProfileModal::new("jane_doe@x.com");
        assert_eq!(profile.display_name(), "Jane Doe");
        assert_eq!(profile.identifier(), "jane_doe@x.com");
    }
}
