//! Paginated, searchable contact list and the actions launched from it.
//!
//! The list refetches whenever the page or the settled search text changes.
//! There is no page count from the server: a page shorter than the page size
//! is the only end-of-data signal, so a final page that happens to be exactly
//! full still offers "Next" (and the following page comes back empty).

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::debounce::SearchDebouncer;
use super::form::{ContactForm, SubmitError};
use super::modals::{DeleteConfirmation, Modal, ProfileAction, ProfileModal};
use super::model::Contact;
use crate::api::{ContactApi, PageQuery, SESSION_EXPIRED};
use crate::auth::ChangePasswordForm;
use crate::session::SessionContext;

pub const NO_CONTACTS: &str = "You have no contacts yet.";
pub const NO_MATCHES: &str = "No contacts found matching your search.";

pub struct ContactListCoordinator {
    api: Arc<dyn ContactApi>,
    session: Arc<SessionContext>,
    page_size: u32,
    page: u32,
    raw_search: String,
    search: String,
    debouncer: SearchDebouncer,
    contacts: Vec<Contact>,
    is_last_page: bool,
    loading: bool,
    list_error: Option<String>,
    action_error: Option<String>,
    notice: Option<String>,
    modal: Option<Modal>,
}

impl ContactListCoordinator {
    pub fn new(
        api: Arc<dyn ContactApi>,
        session: Arc<SessionContext>,
        page_size: u32,
        debounce_ms: u64,
    ) -> Self {
        Self {
            api,
            session,
            page_size: page_size.max(1),
            page: 0,
            raw_search: String::new(),
            search: String::new(),
            debouncer: SearchDebouncer::new(Duration::from_millis(debounce_ms)),
            contacts: Vec::new(),
            is_last_page: false,
            loading: false,
            list_error: None,
            action_error: None,
            notice: None,
            modal: None,
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_last_page(&self) -> bool {
        self.is_last_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Text as typed, before the debounce settles
    pub fn search_input(&self) -> &str {
        &self.raw_search
    }

    /// Text the current page was fetched with
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Row actions are disabled while a delete is in flight
    pub fn is_processing_action(&self) -> bool {
        matches!(&self.modal, Some(Modal::Delete(d)) if d.is_processing())
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        if self.loading || self.list_error.is_some() || !self.contacts.is_empty() {
            return None;
        }
        Some(if self.search.is_empty() {
            NO_CONTACTS
        } else {
            NO_MATCHES
        })
    }

    /// Pagination is hidden on an empty first page
    pub fn shows_pagination(&self) -> bool {
        !self.loading && self.list_error.is_none() && (!self.contacts.is_empty() || self.page > 0)
    }

    // ------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------

    /// Initial load once the list is shown
    pub async fn mount(&mut self) {
        self.fetch().await;
    }

    /// Load the current page with the settled search text
    pub async fn fetch(&mut self) {
        let Some(token) = self.session.token() else {
            return;
        };

        self.loading = true;
        self.list_error = None;
        let query = PageQuery::new(self.page, self.page_size, &self.search);
        debug!(page = query.page, search = ?query.search, "Fetching contacts");

        let result = self.api.list_contacts(&token, &query).await;
        self.loading = false;

        match result {
            Ok(contacts) => {
                self.is_last_page = contacts.len() < self.page_size as usize;
                self.contacts = contacts;
            }
            Err(e) if e.is_unauthorized() => {
                self.list_error = Some(SESSION_EXPIRED.to_string());
                self.end_session();
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch contacts");
                self.list_error =
                    Some(e.describe("Failed to fetch contacts", "Could not load contacts."));
            }
        }
    }

    /// Jump straight to a page with the given search text, skipping the
    /// debounce
    pub async fn load(&mut self, page: u32, search: &str) {
        self.debouncer.cancel();
        self.raw_search = search.trim().to_string();
        self.search = self.raw_search.clone();
        self.page = page;
        self.fetch().await;
    }

    async fn go_to_page(&mut self, page: u32) {
        if page != self.page {
            self.page = page;
            self.fetch().await;
        }
    }

    pub async fn next_page(&mut self) {
        if !self.is_last_page {
            self.go_to_page(self.page + 1).await;
        }
    }

    pub async fn prev_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1)).await;
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Record a keystroke and restart the debounce timer
    pub fn on_search_input(&mut self, text: impl Into<String>) {
        self.raw_search = text.into();
        self.debouncer.input(self.raw_search.clone());
    }

    /// Resolves with the text once typing has paused; pending forever when
    /// there is nothing to settle
    pub async fn search_settled(&mut self) -> String {
        self.debouncer.settled().await
    }

    /// Adopt settled search text and go back to the first page. Refetches
    /// only if that changes what is shown.
    pub async fn apply_search(&mut self, text: String) {
        if text == self.search && self.page == 0 {
            return;
        }
        self.search = text;
        self.page = 0;
        self.fetch().await;
    }

    /// Wait for the debounce and apply the result
    pub async fn settle_search(&mut self) {
        let text = self.search_settled().await;
        self.apply_search(text).await;
    }

    // ------------------------------------------------------------------
    // Modals
    // ------------------------------------------------------------------

    fn open(&mut self, modal: Modal) {
        self.action_error = None;
        self.notice = None;
        self.modal = Some(modal);
    }

    pub fn open_create(&mut self) {
        self.open(Modal::Create(ContactForm::create()));
    }

    pub fn open_edit(&mut self, contact: &Contact) {
        self.open(Modal::Edit(ContactForm::edit(contact)));
    }

    pub fn open_delete(&mut self, contact: &Contact) {
        self.open(Modal::Delete(DeleteConfirmation::new(contact)));
    }

    pub fn open_profile(&mut self) {
        if let Some(session) = self.session.current() {
            self.open(Modal::Profile(ProfileModal::new(session.identifier)));
        }
    }

    /// Cancel whatever is open. A delete in flight cannot be cancelled.
    pub fn close_modal(&mut self) {
        if self.is_processing_action() {
            return;
        }
        self.modal = None;
        self.action_error = None;
    }

    /// The open create/edit form, for field edits
    pub fn form_mut(&mut self) -> Option<&mut ContactForm> {
        match self.modal.as_mut() {
            Some(Modal::Create(form)) | Some(Modal::Edit(form)) => Some(form),
            _ => None,
        }
    }

    pub fn password_form_mut(&mut self) -> Option<&mut ChangePasswordForm> {
        match self.modal.as_mut() {
            Some(Modal::ChangePassword(form)) => Some(form),
            _ => None,
        }
    }

    /// Submit the open create/edit form. On success the form closes and the
    /// current page is refetched; a new contact may land on another page.
    pub async fn submit_form(&mut self) -> Result<Contact, SubmitError> {
        let Some(token) = self.session.token() else {
            self.end_session();
            return Err(SubmitError::Rejected {
                message: SESSION_EXPIRED.to_string(),
                unauthorized: true,
            });
        };

        let api = self.api.clone();
        let Some(form) = self.form_mut() else {
            return Err(SubmitError::NotOpen);
        };
        let result = form.submit(api.as_ref(), &token).await;

        match result {
            Ok(contact) => {
                self.modal = None;
                self.action_error = None;
                self.fetch().await;
                Ok(contact)
            }
            Err(err @ SubmitError::Rejected {
                unauthorized: true, ..
            }) => {
                self.action_error = Some(SESSION_EXPIRED.to_string());
                self.end_session();
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Delete the contact in the open confirmation dialog. The dialog closes
    /// whatever the outcome; failures land in the action error.
    pub async fn confirm_delete(&mut self) {
        let id = match self.modal.as_mut() {
            Some(Modal::Delete(dialog)) if !dialog.is_processing() => {
                dialog.set_processing(true);
                dialog.contact_id()
            }
            _ => return,
        };
        self.action_error = None;

        let Some(token) = self.session.token() else {
            self.modal = None;
            self.end_session();
            return;
        };

        info!(id, "Deleting contact");
        let result = self.api.delete_contact(&token, id).await;
        self.modal = None;

        match result {
            Ok(()) => {
                // Step back rather than land on a page that is now empty
                if self.contacts.len() == 1 && self.page > 0 {
                    self.go_to_page(self.page - 1).await;
                } else {
                    self.fetch().await;
                }
            }
            Err(e) if e.is_unauthorized() => {
                self.action_error = Some(SESSION_EXPIRED.to_string());
                self.end_session();
            }
            Err(e) => {
                warn!(error = %e, id, "Failed to delete contact");
                self.action_error =
                    Some(e.describe("Failed to delete contact", "Could not delete contact."));
            }
        }
    }

    pub fn profile_action(&mut self, action: ProfileAction) {
        if !matches!(self.modal, Some(Modal::Profile(_))) {
            return;
        }
        match action {
            ProfileAction::ChangePassword => {
                self.modal = Some(Modal::ChangePassword(ChangePasswordForm::new()));
            }
            ProfileAction::Logout => self.logout(),
            ProfileAction::Close => self.modal = None,
        }
    }

    /// Submit the open change-password form; success closes it and leaves a
    /// notice on the list
    pub async fn submit_change_password(&mut self) -> Result<(), String> {
        let api = self.api.clone();
        let session = self.session.clone();
        let Some(form) = self.password_form_mut() else {
            return Err("No password form is open.".to_string());
        };

        let notice = form.submit(api.as_ref(), &session).await?;
        self.modal = None;
        self.notice = Some(notice.to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    pub fn logout(&mut self) {
        self.session.clear();
        self.teardown();
    }

    /// Cancel the debounce timer and close any dialog
    pub fn teardown(&mut self) {
        self.debouncer.cancel();
        self.modal = None;
    }

    fn end_session(&mut self) {
        self.session.expire(SESSION_EXPIRED);
        self.teardown();
    }
}
