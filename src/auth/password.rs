use tracing::{info, warn};

use crate::api::{ChangePasswordRequest, ContactApi};
use crate::session::SessionContext;
use crate::validation::validate_password_change;

pub const SESSION_UNAUTHORIZED: &str = "Session expired or unauthorized. Logging out.";
pub const PASSWORD_UPDATED: &str = "Password updated successfully!";

/// Change-password modal state.
#[derive(Debug, Clone, Default)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
    pub show_old: bool,
    pub show_new: bool,
    pub show_confirm: bool,
    error: Option<String>,
    processing: bool,
}

impl ChangePasswordForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Masked unless the matching visibility toggle is on
    pub fn render_field(value: &str, visible: bool) -> String {
        if visible {
            value.to_string()
        } else {
            "*".repeat(value.chars().count())
        }
    }

    /// Validate locally, then send. A 401/403 ends the session and the same
    /// message is kept as the form error. Returns the success notice.
    pub async fn submit(
        &mut self,
        api: &dyn ContactApi,
        session: &SessionContext,
    ) -> Result<&'static str, String> {
        self.error = None;

        if let Err(message) =
            validate_password_change(&self.old_password, &self.new_password, &self.confirm_password)
        {
            self.error = Some(message.clone());
            return Err(message);
        }

        let Some(token) = session.token() else {
            session.expire(SESSION_UNAUTHORIZED);
            self.error = Some(SESSION_UNAUTHORIZED.to_string());
            return Err(SESSION_UNAUTHORIZED.to_string());
        };

        self.processing = true;
        let result = api
            .change_password(
                &token,
                &ChangePasswordRequest {
                    old_password: self.old_password.clone(),
                    new_password: self.new_password.clone(),
                },
            )
            .await;
        self.processing = false;

        match result {
            Ok(()) => {
                info!("Password changed");
                Ok(PASSWORD_UPDATED)
            }
            Err(e) if e.is_unauthorized() => {
                session.expire(SESSION_UNAUTHORIZED);
                self.error = Some(SESSION_UNAUTHORIZED.to_string());
                Err(SESSION_UNAUTHORIZED.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Password change failed");
                let message = e
                    .server_message()
                    .unwrap_or("Password change failed.")
                    .to_string();
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }
}
