//! In-memory [`Store`] for tests.
//!
//! `begin` snapshots the shared state, repository calls on the handle mutate
//! the snapshot, `commit` publishes it and `rollback` drops it. Concurrent
//! handles are not isolated from each other: the last commit wins.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use uuid::Uuid;

use crate::{
    dtos::{
        customer::{CustomerCreateRequest, VerificationSentUpdate},
        email_recipient::{EmailRecipientCreateRequest, EmailRecipientUpdate},
        tracked_company::{TrackedCompanyCreateRequest, TrackedCompanyUpdate},
        user::UserCreateRequest,
    },
    models::{
        company_update::CompanyUpdate, customer::Customer, department::Department,
        email_recipient::EmailRecipient, tracked_company::TrackedCompany, user::User,
    },
    store::{
        CompanyUpdateRepository, CustomerRepository, DepartmentRepository,
        EmailRecipientRepository, Store, TrackedCompanyRepository, UnitOfWork, UserRepository,
    },
};

const DEPARTMENTS: [&str; 6] = [
    "Leadership",
    "Sales",
    "Marketing",
    "Product",
    "Engineering",
    "Operations",
];

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    pub departments: Vec<Department>,
    pub email_recipients: Vec<EmailRecipient>,
    pub tracked_companies: Vec<TrackedCompany>,
    pub company_updates: Vec<CompanyUpdate>,
    next_id: i32,
    fail_on: Option<&'static str>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, operation: &'static str) -> Res<()> {
        if self.fail_on == Some(operation) {
            return Err(AppError::Internal(format!("injected failure in {}", operation)));
        }
        Ok(())
    }

    fn customer_mut(&mut self, customer_uid: Uuid) -> Res<&mut Customer> {
        self.customers
            .iter_mut()
            .find(|c| c.customer_uid == customer_uid)
            .ok_or_else(|| AppError::NotFound(format!("customer {}", customer_uid)))
    }

    fn create_user(&mut self, data: UserCreateRequest) -> Res<User> {
        self.check("create_user")?;
        let now = Utc::now();
        let user = User {
            id: self.next_id(),
            user_uid: Uuid::new_v4(),
            email: data.email,
            name: None,
            role: None,
            is_verified: data.is_verified,
            customer_uid: data.customer_uid,
            clerk_id: data.clerk_id,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn update_user_customer(&mut self, id: i32, customer_uid: Uuid) -> Res<User> {
        self.check("update_user_customer")?;
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;
        user.customer_uid = Some(customer_uid);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn update_user_profile(&mut self, user_uid: Uuid, name: &str, role: &str) -> Res<User> {
        self.check("update_user_profile")?;
        let user = self
            .users
            .iter_mut()
            .find(|u| u.user_uid == user_uid)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_uid)))?;
        user.name = Some(name.to_string());
        user.role = Some(role.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn create_customer(&mut self, data: CustomerCreateRequest) -> Res<Customer> {
        self.check("create_customer")?;
        let now = Utc::now();
        let customer = Customer {
            id: self.next_id(),
            customer_uid: Uuid::new_v4(),
            email: data.email,
            domain: None,
            is_verified: data.is_verified,
            owner_id: None,
            verification_token: None,
            verification_token_sent_at: None,
            created_at: now,
            updated_at: now,
        };
        self.customers.push(customer.clone());
        Ok(customer)
    }

    fn update_customer_owner(&mut self, id: i32, owner_id: i32) -> Res<Customer> {
        self.check("update_customer_owner")?;
        let customer = self
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("customer {}", id)))?;
        customer.owner_id = Some(owner_id);
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    fn update_customer_verification_token(&mut self, customer_uid: Uuid, token: &str) -> Res<()> {
        self.check("update_customer_verification_token")?;
        let customer = self.customer_mut(customer_uid)?;
        customer.verification_token = Some(token.to_string());
        customer.updated_at = Utc::now();
        Ok(())
    }

    fn mark_verification_sent(
        &mut self,
        customer_uid: Uuid,
        data: VerificationSentUpdate,
    ) -> Res<Customer> {
        self.check("mark_verification_sent")?;
        let customer = self.customer_mut(customer_uid)?;
        customer.domain = Some(data.domain);
        customer.verification_token_sent_at = Some(data.sent_at);
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    fn update_customer_domain(&mut self, customer_uid: Uuid, domain: &str) -> Res<Customer> {
        self.check("update_customer_domain")?;
        let customer = self.customer_mut(customer_uid)?;
        customer.domain = Some(domain.to_string());
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    fn set_customer_verified(&mut self, customer_uid: Uuid) -> Res<Customer> {
        self.check("set_customer_verified")?;
        let customer = self.customer_mut(customer_uid)?;
        customer.is_verified = true;
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    fn create_email_recipient(&mut self, data: EmailRecipientCreateRequest) -> Res<EmailRecipient> {
        self.check("create_email_recipient")?;
        if self.email_recipients.iter().any(|r| r.email == data.email) {
            return Err(AppError::Conflict(format!(
                "email recipient {} already exists",
                data.email
            )));
        }
        let recipient = EmailRecipient {
            id: self.next_id(),
            email_recipient_uid: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            is_active: true,
            department_uid: data.department_uid,
            customer_uid: data.customer_uid,
            created_at: Utc::now(),
        };
        self.email_recipients.push(recipient.clone());
        Ok(recipient)
    }

    fn update_email_recipient(
        &mut self,
        email_recipient_uid: Uuid,
        customer_uid: Uuid,
        data: EmailRecipientUpdate,
    ) -> Res<Option<EmailRecipient>> {
        self.check("update_email_recipient")?;
        let taken = self
            .email_recipients
            .iter()
            .any(|r| r.email == data.email && r.email_recipient_uid != email_recipient_uid);
        if taken {
            return Err(AppError::Conflict(format!(
                "email recipient {} already exists",
                data.email
            )));
        }
        let Some(recipient) = self.email_recipients.iter_mut().find(|r| {
            r.email_recipient_uid == email_recipient_uid && r.customer_uid == customer_uid
        }) else {
            return Ok(None);
        };
        recipient.name = data.name;
        recipient.email = data.email;
        recipient.is_active = data.is_active;
        recipient.department_uid = data.department_uid;
        Ok(Some(recipient.clone()))
    }

    fn create_tracked_company(&mut self, data: TrackedCompanyCreateRequest) -> Res<TrackedCompany> {
        self.check("create_tracked_company")?;
        let company = TrackedCompany {
            id: self.next_id(),
            tracked_company_uid: Uuid::new_v4(),
            name: data.name,
            domain: data.domain,
            company_type: data.company_type,
            interests: data.interests,
            is_active: true,
            customer_uid: data.customer_uid,
            created_at: Utc::now(),
        };
        self.tracked_companies.push(company.clone());
        Ok(company)
    }

    fn update_tracked_company(
        &mut self,
        tracked_company_uid: Uuid,
        customer_uid: Uuid,
        data: TrackedCompanyUpdate,
    ) -> Res<Option<TrackedCompany>> {
        self.check("update_tracked_company")?;
        let Some(company) = self.tracked_companies.iter_mut().find(|c| {
            c.tracked_company_uid == tracked_company_uid && c.customer_uid == customer_uid
        }) else {
            return Ok(None);
        };
        if let Some(company_type) = data.company_type {
            company.company_type = company_type;
        }
        if let Some(interests) = data.interests {
            company.interests = interests;
        }
        if let Some(is_active) = data.is_active {
            company.is_active = is_active;
        }
        Ok(Some(company.clone()))
    }

    fn list_company_updates_by_customer(&self, customer_uid: Uuid) -> Vec<CompanyUpdate> {
        let mut updates: Vec<CompanyUpdate> = self
            .company_updates
            .iter()
            .filter_map(|update| {
                let company = self.tracked_companies.iter().find(|c| {
                    c.tracked_company_uid == update.tracked_company_uid
                        && c.customer_uid == customer_uid
                })?;
                Some(CompanyUpdate {
                    domain: company.domain.clone(),
                    ..update.clone()
                })
            })
            .collect();
        updates.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        updates
    }
}

/// Shared in-memory tables seeded with the standard departments.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        for name in DEPARTMENTS {
            let id = state.next_id();
            state.departments.push(Department {
                id,
                department_uid: Uuid::new_v4(),
                name: name.to_string(),
            });
        }
        MemoryStore {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Makes every later call of the named repository operation fail.
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_on = Some(operation);
        }
    }

    /// Records an update for a tracked company, the way the ingestion job
    /// would.
    pub fn record_company_update(
        &self,
        tracked_company_uid: Uuid,
        title: &str,
        posted_at: DateTime<Utc>,
    ) -> Res<CompanyUpdate> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::Internal("memory store poisoned".to_string()))?;
        let domain = state
            .tracked_companies
            .iter()
            .find(|c| c.tracked_company_uid == tracked_company_uid)
            .map(|c| c.domain.clone())
            .ok_or_else(|| AppError::NotFound(format!("tracked company {}", tracked_company_uid)))?;
        let update = CompanyUpdate {
            id: state.next_id(),
            company_update_uid: Uuid::new_v4(),
            tracked_company_uid,
            title: title.to_string(),
            description: format!("{} in detail", title),
            update_category: "product".to_string(),
            update_type: "launch".to_string(),
            source_type: "news".to_string(),
            source_url: format!("https://{}/news", domain),
            action_point: None,
            posted_at,
            created_at: Utc::now(),
            domain,
        };
        state.company_updates.push(update.clone());
        Ok(update)
    }

    fn with_state<R>(&mut self, f: impl FnOnce(&mut MemoryState) -> Res<R>) -> Res<R> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::Internal("memory store poisoned".to_string()))?;
        f(&mut state)
    }
}

/// Unit-of-Work over a private copy of the store's state.
pub struct MemoryTx {
    store: MemoryStore,
    working: Option<MemoryState>,
}

impl MemoryTx {
    fn with_state<R>(&mut self, f: impl FnOnce(&mut MemoryState) -> Res<R>) -> Res<R> {
        let state = self
            .working
            .as_mut()
            .ok_or_else(|| AppError::Internal("transaction already resolved".to_string()))?;
        f(state)
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Res<MemoryTx> {
        let working = self
            .state
            .lock()
            .map_err(|_| AppError::Internal("memory store poisoned".to_string()))?
            .clone();
        Ok(MemoryTx {
            store: self.clone(),
            working: Some(working),
        })
    }
}

#[async_trait]
impl UnitOfWork for MemoryTx {
    async fn commit(&mut self) -> Res<()> {
        let working = self
            .working
            .take()
            .ok_or_else(|| AppError::Internal("transaction already resolved".to_string()))?;
        working.check("commit")?;
        self.store.with_state(|state| {
            *state = working;
            Ok(())
        })
    }

    async fn rollback(&mut self) -> Res<()> {
        match self.working.take() {
            Some(working) => working.check("rollback"),
            None => Ok(()),
        }
    }
}

macro_rules! memory_repositories {
    ($handle:ty) => {
        #[async_trait]
        impl UserRepository for $handle {
            async fn create_user(&mut self, data: UserCreateRequest) -> Res<User> {
                self.with_state(|s| s.create_user(data))
            }

            async fn get_user_by_id(&mut self, id: i32) -> Res<Option<User>> {
                self.with_state(|s| Ok(s.users.iter().find(|u| u.id == id).cloned()))
            }

            async fn get_user_by_uid(&mut self, user_uid: Uuid) -> Res<Option<User>> {
                self.with_state(|s| Ok(s.users.iter().find(|u| u.user_uid == user_uid).cloned()))
            }

            async fn update_user_customer(&mut self, id: i32, customer_uid: Uuid) -> Res<User> {
                self.with_state(|s| s.update_user_customer(id, customer_uid))
            }

            async fn update_user_profile(
                &mut self,
                user_uid: Uuid,
                name: &str,
                role: &str,
            ) -> Res<User> {
                self.with_state(|s| s.update_user_profile(user_uid, name, role))
            }

            async fn list_users_by_customer(&mut self, customer_uid: Uuid) -> Res<Vec<User>> {
                self.with_state(|s| {
                    Ok(s.users
                        .iter()
                        .filter(|u| u.customer_uid == Some(customer_uid))
                        .cloned()
                        .collect())
                })
            }
        }

        #[async_trait]
        impl CustomerRepository for $handle {
            async fn create_customer(&mut self, data: CustomerCreateRequest) -> Res<Customer> {
                self.with_state(|s| s.create_customer(data))
            }

            async fn get_customer_by_uid(&mut self, customer_uid: Uuid) -> Res<Option<Customer>> {
                self.with_state(|s| {
                    Ok(s.customers
                        .iter()
                        .find(|c| c.customer_uid == customer_uid)
                        .cloned())
                })
            }

            async fn update_customer_owner(&mut self, id: i32, owner_id: i32) -> Res<Customer> {
                self.with_state(|s| s.update_customer_owner(id, owner_id))
            }

            async fn update_customer_verification_token(
                &mut self,
                customer_uid: Uuid,
                token: &str,
            ) -> Res<()> {
                self.with_state(|s| s.update_customer_verification_token(customer_uid, token))
            }

            async fn mark_verification_sent(
                &mut self,
                customer_uid: Uuid,
                data: VerificationSentUpdate,
            ) -> Res<Customer> {
                self.with_state(|s| s.mark_verification_sent(customer_uid, data))
            }

            async fn update_customer_domain(
                &mut self,
                customer_uid: Uuid,
                domain: &str,
            ) -> Res<Customer> {
                self.with_state(|s| s.update_customer_domain(customer_uid, domain))
            }

            async fn set_customer_verified(&mut self, customer_uid: Uuid) -> Res<Customer> {
                self.with_state(|s| s.set_customer_verified(customer_uid))
            }
        }

        #[async_trait]
        impl DepartmentRepository for $handle {
            async fn list_departments(&mut self) -> Res<Vec<Department>> {
                self.with_state(|s| Ok(s.departments.clone()))
            }

            async fn get_department_by_uid(
                &mut self,
                department_uid: Uuid,
            ) -> Res<Option<Department>> {
                self.with_state(|s| {
                    Ok(s.departments
                        .iter()
                        .find(|d| d.department_uid == department_uid)
                        .cloned())
                })
            }
        }

        #[async_trait]
        impl EmailRecipientRepository for $handle {
            async fn create_email_recipient(
                &mut self,
                data: EmailRecipientCreateRequest,
            ) -> Res<EmailRecipient> {
                self.with_state(|s| s.create_email_recipient(data))
            }

            async fn get_email_recipient_by_email(
                &mut self,
                email: &str,
            ) -> Res<Option<EmailRecipient>> {
                self.with_state(|s| {
                    Ok(s.email_recipients.iter().find(|r| r.email == email).cloned())
                })
            }

            async fn get_email_recipient_by_uid(
                &mut self,
                email_recipient_uid: Uuid,
            ) -> Res<Option<EmailRecipient>> {
                self.with_state(|s| {
                    Ok(s.email_recipients
                        .iter()
                        .find(|r| r.email_recipient_uid == email_recipient_uid)
                        .cloned())
                })
            }

            async fn list_email_recipients_by_customer(
                &mut self,
                customer_uid: Uuid,
            ) -> Res<Vec<EmailRecipient>> {
                self.with_state(|s| {
                    Ok(s.email_recipients
                        .iter()
                        .filter(|r| r.customer_uid == customer_uid)
                        .cloned()
                        .collect())
                })
            }

            async fn list_email_recipients_by_department(
                &mut self,
                department_uid: Uuid,
                customer_uid: Uuid,
            ) -> Res<Vec<EmailRecipient>> {
                self.with_state(|s| {
                    Ok(s.email_recipients
                        .iter()
                        .filter(|r| {
                            r.department_uid == department_uid && r.customer_uid == customer_uid
                        })
                        .cloned()
                        .collect())
                })
            }

            async fn update_email_recipient(
                &mut self,
                email_recipient_uid: Uuid,
                customer_uid: Uuid,
                data: EmailRecipientUpdate,
            ) -> Res<Option<EmailRecipient>> {
                self.with_state(|s| s.update_email_recipient(email_recipient_uid, customer_uid, data))
            }

            async fn delete_email_recipient(
                &mut self,
                email_recipient_uid: Uuid,
                customer_uid: Uuid,
            ) -> Res<bool> {
                self.with_state(|s| {
                    let before = s.email_recipients.len();
                    s.email_recipients.retain(|r| {
                        !(r.email_recipient_uid == email_recipient_uid
                            && r.customer_uid == customer_uid)
                    });
                    Ok(s.email_recipients.len() < before)
                })
            }
        }

        #[async_trait]
        impl TrackedCompanyRepository for $handle {
            async fn create_tracked_company(
                &mut self,
                data: TrackedCompanyCreateRequest,
            ) -> Res<TrackedCompany> {
                self.with_state(|s| s.create_tracked_company(data))
            }

            async fn list_tracked_companies_by_customer(
                &mut self,
                customer_uid: Uuid,
            ) -> Res<Vec<TrackedCompany>> {
                self.with_state(|s| {
                    Ok(s.tracked_companies
                        .iter()
                        .filter(|c| c.customer_uid == customer_uid)
                        .cloned()
                        .collect())
                })
            }

            async fn update_tracked_company(
                &mut self,
                tracked_company_uid: Uuid,
                customer_uid: Uuid,
                data: TrackedCompanyUpdate,
            ) -> Res<Option<TrackedCompany>> {
                self.with_state(|s| s.update_tracked_company(tracked_company_uid, customer_uid, data))
            }

            async fn delete_tracked_company(
                &mut self,
                tracked_company_uid: Uuid,
                customer_uid: Uuid,
            ) -> Res<bool> {
                self.with_state(|s| {
                    let before = s.tracked_companies.len();
                    s.tracked_companies.retain(|c| {
                        !(c.tracked_company_uid == tracked_company_uid
                            && c.customer_uid == customer_uid)
                    });
                    Ok(s.tracked_companies.len() < before)
                })
            }
        }

        #[async_trait]
        impl CompanyUpdateRepository for $handle {
            async fn list_company_updates_by_customer(
                &mut self,
                customer_uid: Uuid,
            ) -> Res<Vec<CompanyUpdate>> {
                self.with_state(|s| Ok(s.list_company_updates_by_customer(customer_uid)))
            }
        }
    };
}

memory_repositories!(MemoryStore);
memory_repositories!(MemoryTx);
