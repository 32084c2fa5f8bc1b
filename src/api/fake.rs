//! Scripted in-memory [`ContactApi`] for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::{ApiError, ChangePasswordRequest, ContactApi, Credentials, LoginResponse, PageQuery};
use crate::contacts::{Contact, ContactEmail, ContactPayload, ContactPhone};

/// A request the fake received, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login(Credentials),
    Register(Credentials),
    ChangePassword(String, ChangePasswordRequest),
    List(String, PageQuery),
    Create(ContactPayload),
    Update(i64, ContactPayload),
    Delete(i64),
}

/// Each queue is consumed front to back; an empty queue answers with a
/// plausible success.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    pub logins: Mutex<VecDeque<Result<LoginResponse, ApiError>>>,
    pub registers: Mutex<VecDeque<Result<(), ApiError>>>,
    pub password_changes: Mutex<VecDeque<Result<(), ApiError>>>,
    pub lists: Mutex<VecDeque<Result<Vec<Contact>, ApiError>>>,
    pub saves: Mutex<VecDeque<Result<Contact, ApiError>>>,
    pub deletes: Mutex<VecDeque<Result<(), ApiError>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn list_calls(&self) -> Vec<PageQuery> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::List(_, q) => Some(q.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn push_list(&self, result: Result<Vec<Contact>, ApiError>) {
        self.lists.lock().push_back(result);
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

pub fn status(code: u16) -> ApiError {
    ApiError::from_response(code, None, "")
}

pub fn contact(id: i64, first: &str) -> Contact {
    Contact {
        id,
        first_name: first.to_string(),
        last_name: String::new(),
        title: String::new(),
        emails: vec![ContactEmail {
            id: Some(id * 10),
            label: "Work".into(),
            email: format!("{}@example.com", first.to_lowercase()),
        }],
        phones: vec![ContactPhone::default()],
    }
}

pub fn contacts(n: usize) -> Vec<Contact> {
    (1..=n as i64).map(|i| contact(i, &format!("C{}", i))).collect()
}

fn saved(id: i64, payload: &ContactPayload) -> Contact {
    Contact {
        id,
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        title: payload.title.clone(),
        emails: payload
            .emails
            .iter()
            .map(|e| ContactEmail {
                id: None,
                label: e.label.clone(),
                email: e.email.clone(),
            })
            .collect(),
        phones: payload
            .phones
            .iter()
            .map(|p| ContactPhone {
                id: None,
                label: p.label.clone(),
                phone_number: p.phone_number.clone(),
            })
            .collect(),
    }
}

#[async_trait]
impl ContactApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record(Call::Login(credentials.clone()));
        self.logins.lock().pop_front().unwrap_or_else(|| {
            Ok(LoginResponse {
                token: Some("test-token".into()),
                username: Some(credentials.identifier.clone()),
            })
        })
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.record(Call::Register(credentials.clone()));
        self.registers.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn change_password(
        &self,
        token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        self.record(Call::ChangePassword(token.to_string(), request.clone()));
        self.password_changes.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn list_contacts(&self, token: &str, query: &PageQuery) -> Result<Vec<Contact>, ApiError> {
        self.record(Call::List(token.to_string(), query.clone()));
        self.lists.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_contact(
        &self,
        _token: &str,
        payload: &ContactPayload,
    ) -> Result<Contact, ApiError> {
        self.record(Call::Create(payload.clone()));
        self.saves
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(saved(100, payload)))
    }

    async fn update_contact(
        &self,
        _token: &str,
        id: i64,
        payload: &ContactPayload,
    ) -> Result<Contact, ApiError> {
        self.record(Call::Update(id, payload.clone()));
        self.saves
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(saved(id, payload)))
    }

    async fn delete_contact(&self, _token: &str, id: i64) -> Result<(), ApiError> {
        self.record(Call::Delete(id));
        self.deletes.lock().pop_front().unwrap_or(Ok(()))
    }
}
