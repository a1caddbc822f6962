#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use futures::executor::block_on;
use serde_json::Value;
use tether_core::auth::{AuthEvents, AuthListener, AuthProvider, AuthSubscription};
use tether_core::directory::{MembershipRow, OrganizationDirectory, OrganizationRow};
use tether_core::kv::{KvStore, MemoryStore};
use tether_core::session::{AuthEvent, Credentials, SignUpOutcome};
use tether_core::{
    Action, AuthError, FetchError, Organization, PopupState, Services, Session, StorageError,
    User, reduce,
};

pub fn session(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: format!("refresh-{user_id}"),
        expires_at: None,
        user: User {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
        },
    }
}

pub fn org(id: &str, configured: bool) -> Organization {
    Organization {
        id: id.to_string(),
        name: format!("Org {id}"),
        chat_api_key: configured.then(|| format!("key-{id}")),
        chat_project_id: configured.then(|| format!("project-{id}")),
        chat_config: None,
    }
}

pub fn row(organization: &Organization) -> MembershipRow {
    MembershipRow {
        is_active: Some(true),
        organizations: Some(OrganizationRow {
            id: organization.id.clone(),
            name: organization.name.clone(),
            chat_api_key: organization.chat_api_key.clone(),
            chat_project_id: organization.chat_project_id.clone(),
            chat_config: organization.chat_config.clone(),
            is_active: Some(true),
        }),
    }
}

#[derive(Default)]
pub struct FakeAuth {
    pub session: RefCell<Option<Session>>,
    pub reject_stored_session: Cell<bool>,
    pub lookup_error: RefCell<Option<AuthError>>,
    pub sign_out_calls: Cell<usize>,
    pub events: AuthEvents,
}

impl FakeAuth {
    pub fn signed_in(session: Session) -> Self {
        let auth = Self::default();
        *auth.session.borrow_mut() = Some(session);
        auth
    }
}

#[async_trait(?Send)]
impl AuthProvider for FakeAuth {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        if self.reject_stored_session.get() {
            return Err(AuthError::StaleSession);
        }
        if let Some(error) = self.lookup_error.borrow().clone() {
            return Err(error);
        }
        Ok(self.session.borrow().clone())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.password != "correct horse" {
            return Err(AuthError::InvalidCredentials);
        }
        let user_id = credentials
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        let session = session(&user_id);
        *self.session.borrow_mut() = Some(session.clone());
        self.events.emit(AuthEvent::SignedIn, Some(&session));
        Ok(session)
    }

    async fn sign_up(&self, _credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        Ok(SignUpOutcome::PendingVerification)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.set(self.sign_out_calls.get() + 1);
        self.reject_stored_session.set(false);
        *self.session.borrow_mut() = None;
        self.events.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn reset_password_for_email(&self, _email: &str) -> Result<(), AuthError> {
        Ok(())
    }

    fn on_auth_state_change(&self, listener: AuthListener) -> AuthSubscription {
        self.events.subscribe(listener)
    }
}

pub struct FakeDirectory {
    pub response: RefCell<Result<Vec<MembershipRow>, FetchError>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeDirectory {
    pub fn with(organizations: &[Organization]) -> Self {
        Self {
            response: RefCell::new(Ok(organizations.iter().map(row).collect())),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: RefCell::new(Err(FetchError::Transport("connection refused".to_string()))),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set(&self, organizations: &[Organization]) {
        *self.response.borrow_mut() = Ok(organizations.iter().map(row).collect());
    }
}

#[async_trait(?Send)]
impl OrganizationDirectory for FakeDirectory {
    async fn memberships(&self, user_id: &str) -> Result<Vec<MembershipRow>, FetchError> {
        self.calls.borrow_mut().push(user_id.to_string());
        self.response.borrow().clone()
    }
}

/// Store whose backend is always down.
pub struct BrokenStore;

#[async_trait(?Send)]
impl KvStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), StorageError> {
        Err(StorageError::Backend("quota exceeded".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("quota exceeded".to_string()))
    }
}

pub fn services_with_store(
    auth: FakeAuth,
    directory: FakeDirectory,
    kv: Rc<dyn KvStore>,
) -> Services {
    Services::new(Rc::new(auth), Rc::new(directory), kv, "organization")
}

/// Runs the reducer and performs every effect to completion, like the
/// popup runtime does, but sequentially.
pub struct Harness {
    pub state: PopupState,
    pub services: Services,
    pub auth: Rc<FakeAuth>,
    pub directory: Rc<FakeDirectory>,
    pub kv: Rc<MemoryStore>,
}

impl Harness {
    pub fn new(auth: FakeAuth, directory: FakeDirectory) -> Self {
        let auth = Rc::new(auth);
        let directory = Rc::new(directory);
        let kv = Rc::new(MemoryStore::new());
        let services = Services::new(auth.clone(), directory.clone(), kv.clone(), "organization");
        Self {
            state: PopupState::new(),
            services,
            auth,
            directory,
            kv,
        }
    }

    pub fn store_selection(&self, organization: &Organization) {
        let value = serde_json::to_value(organization).expect("serialize organization");
        block_on(self.kv.set("organization", value)).expect("seed selection");
    }

    pub fn stored_selection(&self) -> Option<Organization> {
        block_on(self.kv.get("organization"))
            .expect("read selection")
            .map(|value| serde_json::from_value(value).expect("decode selection"))
    }

    pub fn dispatch(&mut self, action: Action) {
        let mut queue = VecDeque::from([action]);
        block_on(async {
            while let Some(action) = queue.pop_front() {
                let (next, effects) = reduce(&self.state, action);
                self.state = next;
                for effect in effects {
                    if let Some(follow_up) = self.services.perform(effect).await {
                        queue.push_back(follow_up);
                    }
                }
            }
        });
    }
}
