//! Contact list, forms and dialogs.

mod coordinator;
mod debounce;
mod form;
mod modals;
mod model;

pub use coordinator::{ContactListCoordinator, NO_CONTACTS, NO_MATCHES};
pub use debounce::SearchDebouncer;
pub use form::{ContactForm, EntryKind, Field, FormMode, SubmitError, DEFAULT_LABEL};
pub use modals::{DeleteConfirmation, Modal, ProfileAction, ProfileModal};
pub use model::{Contact, ContactEmail, ContactPayload, ContactPhone, EmailPayload, PhonePayload};
