//! Login, registration and logout.
//!
//! [`AuthFlow`] owns which top-level view is showing and the single message
//! slot under the login/register forms. It is the only writer of the session.

mod password;

pub use password::{ChangePasswordForm, PASSWORD_UPDATED, SESSION_UNAUTHORIZED};

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{ApiError, ContactApi, Credentials};
use crate::session::{Session, SessionContext};
use crate::validation::{validate_credentials, validate_registration};

pub const REGISTERED: &str = "Registration successful! Please log in.";
pub const INVALID_LOGIN_RESPONSE: &str = "Invalid response from server during login.";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Contacts,
}

pub struct AuthFlow {
    api: Arc<dyn ContactApi>,
    session: Arc<SessionContext>,
    view: View,
    message: Option<String>,
    loading: bool,
}

impl AuthFlow {
    /// Start on the contact list when a persisted session exists
    pub fn new(api: Arc<dyn ContactApi>, session: Arc<SessionContext>) -> Self {
        let view = if session.is_authenticated() {
            View::Contacts
        } else {
            View::Login
        };

        Self {
            api,
            session,
            view,
            message: None,
            loading: false,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    /// Submit stays disabled while a request is in flight or a field is empty
    pub fn can_submit(&self, identifier: &str, password: &str) -> bool {
        !self.loading && !identifier.is_empty() && !password.is_empty()
    }

    pub fn switch_to_register(&mut self) {
        if self.view != View::Contacts {
            self.view = View::Register;
            self.message = None;
        }
    }

    pub fn switch_to_login(&mut self) {
        if self.view != View::Contacts {
            self.view = View::Login;
            self.message = None;
        }
    }

    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<Session, String> {
        self.message = None;

        let result = self.try_login(identifier, password).await;
        if let Err(message) = &result {
            self.message = Some(message.clone());
        }
        result
    }

    async fn try_login(&mut self, identifier: &str, password: &str) -> Result<Session, String> {
        validate_credentials(identifier, password)?;

        info!(identifier, "Attempting login");
        self.loading = true;
        let response = self
            .api
            .login(&Credentials {
                identifier: identifier.to_string(),
                password: password.to_string(),
            })
            .await;
        self.loading = false;

        let response = match response {
            Ok(response) => response,
            Err(ApiError::Decode(e)) => {
                warn!(error = %e, "Undecodable login response");
                return Err(INVALID_LOGIN_RESPONSE.to_string());
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e.describe("Login failed", "An error occurred during login."));
            }
        };

        let (token, username) = match (response.token, response.username) {
            (Some(t), Some(u)) if !t.is_empty() && !u.is_empty() => (t, u),
            _ => return Err(INVALID_LOGIN_RESPONSE.to_string()),
        };

        let session = self
            .session
            .establish(&token, &username)
            .map_err(|e| format!("Could not save session: {}", e))?;
        self.view = View::Contacts;
        Ok(session)
    }

    /// Register an account. Success does not log in: the flow returns to the
    /// login view with an informational message.
    pub async fn register(&mut self, identifier: &str, password: &str) -> Result<(), String> {
        self.message = None;

        if let Err(message) = validate_registration(identifier, password) {
            self.message = Some(message.clone());
            return Err(message);
        }

        info!(identifier, "Attempting registration");
        self.loading = true;
        let result = self
            .api
            .register(&Credentials {
                identifier: identifier.to_string(),
                password: password.to_string(),
            })
            .await;
        self.loading = false;

        match result {
            Ok(()) => {
                info!(identifier, "Registration successful");
                self.view = View::Login;
                self.message = Some(REGISTERED.to_string());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                let message = e.describe(
                    "Registration failed",
                    "An error occurred during registration.",
                );
                self.message = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Clear the session unconditionally
    pub fn logout(&mut self) {
        info!("Logging out");
        self.session.clear();
        self.view = View::Login;
        self.message = None;
    }

    /// Follow a logout forced elsewhere (a 401/403 on an authenticated call).
    /// Returns true when the view changed.
    pub fn sync(&mut self) -> bool {
        if self.view == View::Contacts && !self.session.is_authenticated() {
            self.view = View::Login;
            self.message = self.session.take_logout_reason();
            return true;
        }
        false
    }
}

/// Register view input: identifier plus a confirmed password.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub identifier: String,
    pub password: String,
    pub confirm_password: String,
    pub show_password: bool,
    pub show_confirm_password: bool,
}

impl RegisterForm {
    /// Mismatch is only reported once something has been typed in the
    /// confirmation field
    pub fn match_error(&self) -> Option<&'static str> {
        if !self.confirm_password.is_empty() && self.password != self.confirm_password {
            Some(PASSWORDS_DIFFER)
        } else {
            None
        }
    }

    pub fn can_submit(&self, flow: &AuthFlow) -> bool {
        !flow.is_loading()
            && self.match_error().is_none()
            && !self.password.is_empty()
            && !self.confirm_password.is_empty()
    }

    pub async fn submit(&self, flow: &mut AuthFlow) -> Result<(), String> {
        if let Some(message) = self.match_error() {
            return Err(message.to_string());
        }
        flow.register(&self.identifier, &self.password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeApi};
    use crate::api::LoginResponse;
    use crate::contacts::ContactListCoordinator;

    fn setup() -> (Arc<FakeApi>, Arc<SessionContext>, AuthFlow) {
        let api = Arc::new(FakeApi::new());
        let session = Arc::new(SessionContext::in_memory());
        let flow = AuthFlow::new(api.clone(), session.clone());
        (api, session, flow)
    }

    #[tokio::test]
    async fn test_login_empty_password_sends_nothing() {
        let (api, session, mut flow) = setup();

        let err = flow.login("a@b.com", "").await.unwrap_err();
        assert_eq!(err, "Identifier and password are required.");
        assert_eq!(flow.message(), Some("Identifier and password are required."));
        assert!(api.calls().is_empty());
        assert!(!session.is_authenticated());
        assert_eq!(flow.view(), View::Login);
    }

    #[tokio::test]
    async fn test_login_establishes_session_and_lists_first_page() {
        let (api, session, mut flow) = setup();
        api.logins.lock().push_back(Ok(LoginResponse {
            token: Some("tok".into()),
            username: Some("john.doe@x.com".into()),
        }));

        let established = flow.login("john.doe@x.com", "secret").await.unwrap();
        assert_eq!(established.token, "tok");
        assert_eq!(flow.view(), View::Contacts);
        assert_eq!(session.token().as_deref(), Some("tok"));

        let mut list = ContactListCoordinator::new(api.clone(), session.clone(), 10, 500);
        list.mount().await;

        let lists = api.list_calls();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].page, 0);
        assert_eq!(lists[0].size, 10);
        assert_eq!(lists[0].search, None);
    }

    #[tokio::test]
    async fn test_login_missing_token_is_invalid_response() {
        let (api, session, mut flow) = setup();
        api.logins.lock().push_back(Ok(LoginResponse {
            token: None,
            username: Some("a@b.com".into()),
        }));

        let err = flow.login("a@b.com", "secret").await.unwrap_err();
        assert_eq!(err, INVALID_LOGIN_RESPONSE);
        assert!(!session.is_authenticated());

        api.logins
            .lock()
            .push_back(Err(ApiError::Decode("expected value".into())));
        let err = flow.login("a@b.com", "secret").await.unwrap_err();
        assert_eq!(err, INVALID_LOGIN_RESPONSE);
    }

    #[tokio::test]
    async fn test_login_server_error_messages() {
        let (api, _session, mut flow) = setup();
        api.logins.lock().push_back(Err(ApiError::from_response(
            401,
            Some("Unauthorized"),
            r#"{"error":"Bad credentials"}"#,
        )));
        api.logins
            .lock()
            .push_back(Err(ApiError::from_response(502, Some("Bad Gateway"), "")));
        api.logins
            .lock()
            .push_back(Err(ApiError::Transport("connection refused".into())));

        assert_eq!(flow.login("a@b.com", "x").await.unwrap_err(), "Bad credentials");
        assert_eq!(
            flow.login("a@b.com", "x").await.unwrap_err(),
            "Login failed: Bad Gateway"
        );
        assert_eq!(
            flow.login("a@b.com", "x").await.unwrap_err(),
            "An error occurred during login."
        );
        assert_eq!(flow.view(), View::Login);
    }

    #[tokio::test]
    async fn test_register_validates_identifier_locally() {
        let (api, _session, mut flow) = setup();
        flow.switch_to_register();

        let err = flow.register("nobody", "secret").await.unwrap_err();
        assert_eq!(err, "Identifier must be a valid email or phone number.");
        assert!(api.calls().is_empty());
        assert_eq!(flow.view(), View::Register);
    }

    #[tokio::test]
    async fn test_register_success_returns_to_login() {
        let (api, session, mut flow) = setup();
        flow.switch_to_register();

        flow.register("03001234567", "secret").await.unwrap();
        assert_eq!(flow.view(), View::Login);
        assert_eq!(flow.message(), Some(REGISTERED));
        assert!(!session.is_authenticated());
        assert!(matches!(api.calls()[0], Call::Register(_)));
    }

    #[tokio::test]
    async fn test_register_conflict_surfaces_server_message() {
        let (api, _session, mut flow) = setup();
        api.registers.lock().push_back(Err(ApiError::from_response(
            409,
            Some("Conflict"),
            r#"{"error":"Identifier already registered"}"#,
        )));
        flow.switch_to_register();

        let err = flow.register("a@b.com", "secret").await.unwrap_err();
        assert_eq!(err, "Identifier already registered");
        assert_eq!(flow.view(), View::Register);
    }

    #[tokio::test]
    async fn test_register_form_blocks_mismatch() {
        let (api, _session, mut flow) = setup();
        let form = RegisterForm {
            identifier: "a@b.com".into(),
            password: "secret".into(),
            confirm_password: "secreT".into(),
            ..Default::default()
        };

        assert_eq!(form.match_error(), Some(PASSWORDS_DIFFER));
        assert!(!form.can_submit(&flow));
        assert_eq!(form.submit(&mut flow).await.unwrap_err(), PASSWORDS_DIFFER);
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_switching_views_clears_message() {
        let (_api, _session, mut flow) = setup();
        flow.message = Some("old".into());
        flow.switch_to_register();
        assert_eq!(flow.view(), View::Register);
        assert_eq!(flow.message(), None);
    }

    #[test]
    fn test_logout_is_idempotent_and_sync_follows_expiry() {
        let (_api, session, mut flow) = setup();
        session.establish("tok", "a@b.com").unwrap();
        let mut flow_logged_in = AuthFlow::new(flow.api.clone(), session.clone());
        assert_eq!(flow_logged_in.view(), View::Contacts);

        session.expire("Session expired or invalid. Please log in again.");
        assert!(flow_logged_in.sync());
        assert_eq!(flow_logged_in.view(), View::Login);
        assert_eq!(
            flow_logged_in.message(),
            Some("Session expired or invalid. Please log in again.")
        );
        assert!(!flow_logged_in.sync());

        flow.logout();
        flow.logout();
        assert_eq!(flow.view(), View::Login);
        assert!(!session.is_authenticated());
    }
}
