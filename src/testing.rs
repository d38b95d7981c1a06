//! Shared fixtures for handler and workflow tests.

use crate::config::SessionCookie;
use crate::handlers::auth::{Claims, TokenCodec};
use crate::handlers::password::hash_password;
use crate::handlers::whatsapp::{MessagingError, Messenger};
use crate::middleware::auth_middleware::AuthResolver;
use crate::models::all_models::{Member, NewMember, NewPartnership, Partnership, PlanType, Role};
use crate::routes::configure_app;
use crate::store::memory::MemoryStore;
use crate::store::Store;
use actix_web::{
    body::MessageBody,
    cookie::SameSite,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "correct-horse";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub phone_number: String,
    pub code: String,
    pub context_name: String,
}

/// Records every dispatch; optionally fails the n-th call (1-based).
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentCode>>,
    attempts: Mutex<usize>,
    fail_on: Option<usize>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(call: usize) -> Self {
        RecordingMessenger {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentCode> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_code(
        &self,
        phone_number: &str,
        code: &str,
        context_name: &str,
    ) -> Result<(), MessagingError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if self.fail_on == Some(attempt) {
            return Err(MessagingError::Rejected {
                status: 503,
                body: "provider unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentCode {
            phone_number: phone_number.to_string(),
            code: code.to_string(),
            context_name: context_name.to_string(),
        });
        Ok(())
    }
}

/// Seeds a member whose phone ends with the last three digits of the
/// matricula, e.g. "2024001" gets "5585999990001".
pub async fn seed_member(store: &MemoryStore, matricula: &str, username: &str, role: Role) -> Member {
    let suffix = &matricula[matricula.len().saturating_sub(3)..];
    let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    store
        .insert_member(NewMember {
            matricula: matricula.to_string(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            phone_number: format!("558599999{:0>4}", suffix),
            role,
            plan_type: PlanType::Monthly,
            start_date: start,
            end_date: PlanType::Monthly.end_date(start).unwrap(),
        })
        .await
        .unwrap()
}

pub async fn seed_partnership(
    store: &MemoryStore,
    company_name: &str,
    phone_number: Option<&str>,
) -> Partnership {
    store
        .insert_partnership(NewPartnership {
            company_name: company_name.to_string(),
            company_email: "contato@example.com".to_string(),
            phone_number: phone_number.map(str::to_string),
            discount: 10.0,
            description: Some("Desconto para membros".to_string()),
        })
        .await
        .unwrap()
}

pub fn codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET, Duration::hours(1))
}

pub fn session_cookie() -> SessionCookie {
    SessionCookie {
        name: "accessToken".to_string(),
        secure: true,
        same_site: SameSite::None,
    }
}

pub fn token_for(member: &Member) -> String {
    codec().issue(&Claims::from(member)).unwrap()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub messenger: Arc<RecordingMessenger>,
}

impl TestContext {
    pub fn new() -> Self {
        TestContext {
            store: Arc::new(MemoryStore::new()),
            messenger: Arc::new(RecordingMessenger::new()),
        }
    }

    pub fn with_messenger(messenger: RecordingMessenger) -> Self {
        TestContext {
            store: Arc::new(MemoryStore::new()),
            messenger: Arc::new(messenger),
        }
    }

    /// Full application: auth resolver in front of every route, same as production.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let store: Arc<dyn Store> = self.store.clone();
        let messenger: Arc<dyn Messenger> = self.messenger.clone();
        App::new()
            .app_data(web::Data::from(store))
            .app_data(web::Data::from(messenger))
            .app_data(web::Data::new(codec()))
            .app_data(web::Data::new(session_cookie()))
            .wrap(AuthResolver::new(codec(), session_cookie().name))
            .configure(configure_app)
    }
}
