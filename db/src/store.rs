//! Repository traits and the Postgres Unit-of-Work.
//!
//! Every repository trait is implemented twice: by [`PgStore`], which runs
//! each call straight on the pool, and by [`PgTx`], which binds every call to
//! one open transaction. Calling code only sees the traits, so the same
//! business logic runs inside or outside a transaction.

use std::sync::Arc;

use async_trait::async_trait;
use common::error::{AppError, Res};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    company_update, customer, department,
    dtos::{
        customer::{CustomerCreateRequest, VerificationSentUpdate},
        email_recipient::{EmailRecipientCreateRequest, EmailRecipientUpdate},
        tracked_company::{TrackedCompanyCreateRequest, TrackedCompanyUpdate},
        user::UserCreateRequest,
    },
    email_recipient,
    models::{
        company_update::CompanyUpdate, customer::Customer, department::Department,
        email_recipient::EmailRecipient, tracked_company::TrackedCompany, user::User,
    },
    tracked_company, user,
};

#[async_trait]
pub trait UserRepository: Send {
    async fn create_user(&mut self, data: UserCreateRequest) -> Res<User>;
    async fn get_user_by_id(&mut self, id: i32) -> Res<Option<User>>;
    async fn get_user_by_uid(&mut self, user_uid: Uuid) -> Res<Option<User>>;
    async fn update_user_customer(&mut self, id: i32, customer_uid: Uuid) -> Res<User>;
    async fn update_user_profile(&mut self, user_uid: Uuid, name: &str, role: &str) -> Res<User>;
    async fn list_users_by_customer(&mut self, customer_uid: Uuid) -> Res<Vec<User>>;
}

#[async_trait]
pub trait CustomerRepository: Send {
    async fn create_customer(&mut self, data: CustomerCreateRequest) -> Res<Customer>;
    async fn get_customer_by_uid(&mut self, customer_uid: Uuid) -> Res<Option<Customer>>;
    async fn update_customer_owner(&mut self, id: i32, owner_id: i32) -> Res<Customer>;
    async fn update_customer_verification_token(
        &mut self,
        customer_uid: Uuid,
        token: &str,
    ) -> Res<()>;
    async fn mark_verification_sent(
        &mut self,
        customer_uid: Uuid,
        data: VerificationSentUpdate,
    ) -> Res<Customer>;
    async fn update_customer_domain(&mut self, customer_uid: Uuid, domain: &str) -> Res<Customer>;
    async fn set_customer_verified(&mut self, customer_uid: Uuid) -> Res<Customer>;
}

#[async_trait]
pub trait DepartmentRepository: Send {
    async fn list_departments(&mut self) -> Res<Vec<Department>>;
    async fn get_department_by_uid(&mut self, department_uid: Uuid) -> Res<Option<Department>>;
}

#[async_trait]
pub trait EmailRecipientRepository: Send {
    async fn create_email_recipient(
        &mut self,
        data: EmailRecipientCreateRequest,
    ) -> Res<EmailRecipient>;
    async fn get_email_recipient_by_email(&mut self, email: &str) -> Res<Option<EmailRecipient>>;
    async fn get_email_recipient_by_uid(
        &mut self,
        email_recipient_uid: Uuid,
    ) -> Res<Option<EmailRecipient>>;
    async fn list_email_recipients_by_customer(
        &mut self,
        customer_uid: Uuid,
    ) -> Res<Vec<EmailRecipient>>;
    async fn list_email_recipients_by_department(
        &mut self,
        department_uid: Uuid,
        customer_uid: Uuid,
    ) -> Res<Vec<EmailRecipient>>;
    async fn update_email_recipient(
        &mut self,
        email_recipient_uid: Uuid,
        customer_uid: Uuid,
        data: EmailRecipientUpdate,
    ) -> Res<Option<EmailRecipient>>;
    async fn delete_email_recipient(
        &mut self,
        email_recipient_uid: Uuid,
        customer_uid: Uuid,
    ) -> Res<bool>;
}

#[async_trait]
pub trait TrackedCompanyRepository: Send {
    async fn create_tracked_company(
        &mut self,
        data: TrackedCompanyCreateRequest,
    ) -> Res<TrackedCompany>;
    async fn list_tracked_companies_by_customer(
        &mut self,
        customer_uid: Uuid,
    ) -> Res<Vec<TrackedCompany>>;
    async fn update_tracked_company(
        &mut self,
        tracked_company_uid: Uuid,
        customer_uid: Uuid,
        data: TrackedCompanyUpdate,
    ) -> Res<Option<TrackedCompany>>;
    async fn delete_tracked_company(
        &mut self,
        tracked_company_uid: Uuid,
        customer_uid: Uuid,
    ) -> Res<bool>;
}

#[async_trait]
pub trait CompanyUpdateRepository: Send {
    async fn list_company_updates_by_customer(
        &mut self,
        customer_uid: Uuid,
    ) -> Res<Vec<CompanyUpdate>>;
}

/// The full set of entity repositories.
pub trait Repositories:
    UserRepository
    + CustomerRepository
    + DepartmentRepository
    + EmailRecipientRepository
    + TrackedCompanyRepository
    + CompanyUpdateRepository
{
}

impl<T> Repositories for T where
    T: UserRepository
        + CustomerRepository
        + DepartmentRepository
        + EmailRecipientRepository
        + TrackedCompanyRepository
    + CompanyUpdateRepository
{
}

/// Repositories bound to one open transaction.
///
/// Exactly one of `commit` or `rollback` has an effect. `rollback` on a
/// handle that is already resolved is a no-op; `commit` on one is an error.
#[async_trait]
pub trait UnitOfWork: Repositories {
    async fn commit(&mut self) -> Res<()>;
    async fn rollback(&mut self) -> Res<()>;
}

/// Non-transactional repositories plus the ability to open a Unit-of-Work.
#[async_trait]
pub trait Store: Repositories + Clone + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> Res<Self::Tx>;
}

// Both Postgres handles expose `executor()`; the query bodies are shared.
macro_rules! pg_repositories {
    ($handle:ty) => {
        #[async_trait]
        impl UserRepository for $handle {
            async fn create_user(&mut self, data: UserCreateRequest) -> Res<User> {
                user::insert_user(self.executor()?, data).await
            }

            async fn get_user_by_id(&mut self, id: i32) -> Res<Option<User>> {
                user::get_user_by_id(self.executor()?, id).await
            }

            async fn get_user_by_uid(&mut self, user_uid: Uuid) -> Res<Option<User>> {
                user::get_user_by_uid(self.executor()?, user_uid).await
            }

            async fn update_user_customer(&mut self, id: i32, customer_uid: Uuid) -> Res<User> {
                user::update_user_customer(self.executor()?, id, customer_uid).await
            }

            async fn update_user_profile(
                &mut self,
                user_uid: Uuid,
                name: &str,
                role: &str,
            ) -> Res<User> {
                user::update_user_profile(self.executor()?, user_uid, name, role).await
            }

            async fn list_users_by_customer(&mut self, customer_uid: Uuid) -> Res<Vec<User>> {
                user::list_users_by_customer(self.executor()?, customer_uid).await
            }
        }

        #[async_trait]
        impl CustomerRepository for $handle {
            async fn create_customer(&mut self, data: CustomerCreateRequest) -> Res<Customer> {
                customer::insert_customer(self.executor()?, data).await
            }

            async fn get_customer_by_uid(&mut self, customer_uid: Uuid) -> Res<Option<Customer>> {
                customer::get_customer_by_uid(self.executor()?, customer_uid).await
            }

            async fn update_customer_owner(&mut self, id: i32, owner_id: i32) -> Res<Customer> {
                customer::update_customer_owner(self.executor()?, id, owner_id).await
            }

            async fn update_customer_verification_token(
                &mut self,
                customer_uid: Uuid,
                token: &str,
            ) -> Res<()> {
                customer::update_customer_verification_token(self.executor()?, customer_uid, token)
                    .await
            }

            async fn mark_verification_sent(
                &mut self,
                customer_uid: Uuid,
                data: VerificationSentUpdate,
            ) -> Res<Customer> {
                customer::mark_verification_sent(self.executor()?, customer_uid, data).await
            }

            async fn update_customer_domain(
                &mut self,
                customer_uid: Uuid,
                domain: &str,
            ) -> Res<Customer> {
                customer::update_customer_domain(self.executor()?, customer_uid, domain).await
            }

            async fn set_customer_verified(&mut self, customer_uid: Uuid) -> Res<Customer> {
                customer::set_customer_verified(self.executor()?, customer_uid).await
            }
        }

        #[async_trait]
        impl DepartmentRepository for $handle {
            async fn list_departments(&mut self) -> Res<Vec<Department>> {
                department::list_departments(self.executor()?).await
            }

            async fn get_department_by_uid(
                &mut self,
                department_uid: Uuid,
            ) -> Res<Option<Department>> {
                department::get_department_by_uid(self.executor()?, department_uid).await
            }
        }

        #[async_trait]
        impl EmailRecipientRepository for $handle {
            async fn create_email_recipient(
                &mut self,
                data: EmailRecipientCreateRequest,
            ) -> Res<EmailRecipient> {
                email_recipient::insert_email_recipient(self.executor()?, data).await
            }

            async fn get_email_recipient_by_email(
                &mut self,
                email: &str,
            ) -> Res<Option<EmailRecipient>> {
                email_recipient::get_email_recipient_by_email(self.executor()?, email).await
            }

            async fn get_email_recipient_by_uid(
                &mut self,
                email_recipient_uid: Uuid,
            ) -> Res<Option<EmailRecipient>> {
                email_recipient::get_email_recipient_by_uid(self.executor()?, email_recipient_uid)
                    .await
            }

            async fn list_email_recipients_by_customer(
                &mut self,
                customer_uid: Uuid,
            ) -> Res<Vec<EmailRecipient>> {
                email_recipient::list_email_recipients_by_customer(self.executor()?, customer_uid)
                    .await
            }

            async fn list_email_recipients_by_department(
                &mut self,
                department_uid: Uuid,
                customer_uid: Uuid,
            ) -> Res<Vec<EmailRecipient>> {
                email_recipient::list_email_recipients_by_department(
                    self.executor()?,
                    department_uid,
                    customer_uid,
                )
                .await
            }

            async fn update_email_recipient(
                &mut self,
                email_recipient_uid: Uuid,
                customer_uid: Uuid,
                data: EmailRecipientUpdate,
            ) -> Res<Option<EmailRecipient>> {
                email_recipient::update_email_recipient(
                    self.executor()?,
                    email_recipient_uid,
                    customer_uid,
                    data,
                )
                .await
            }

            async fn delete_email_recipient(
                &mut self,
                email_recipient_uid: Uuid,
                customer_uid: Uuid,
            ) -> Res<bool> {
                email_recipient::delete_email_recipient(
                    self.executor()?,
                    email_recipient_uid,
                    customer_uid,
                )
                .await
            }
        }

        #[async_trait]
        impl TrackedCompanyRepository for $handle {
            async fn create_tracked_company(
                &mut self,
                data: TrackedCompanyCreateRequest,
            ) -> Res<TrackedCompany> {
                tracked_company::insert_tracked_company(self.executor()?, data).await
            }

            async fn list_tracked_companies_by_customer(
                &mut self,
                customer_uid: Uuid,
            ) -> Res<Vec<TrackedCompany>> {
                tracked_company::list_tracked_companies_by_customer(self.executor()?, customer_uid)
                    .await
            }

            async fn update_tracked_company(
                &mut self,
                tracked_company_uid: Uuid,
                customer_uid: Uuid,
                data: TrackedCompanyUpdate,
            ) -> Res<Option<TrackedCompany>> {
                tracked_company::update_tracked_company(
                    self.executor()?,
                    tracked_company_uid,
                    customer_uid,
                    data,
                )
                .await
            }

            async fn delete_tracked_company(
                &mut self,
                tracked_company_uid: Uuid,
                customer_uid: Uuid,
            ) -> Res<bool> {
                tracked_company::delete_tracked_company(
                    self.executor()?,
                    tracked_company_uid,
                    customer_uid,
                )
                .await
            }
        }

        #[async_trait]
        impl CompanyUpdateRepository for $handle {
            async fn list_company_updates_by_customer(
                &mut self,
                customer_uid: Uuid,
            ) -> Res<Vec<CompanyUpdate>> {
                company_update::list_company_updates_by_customer(self.executor()?, customer_uid)
                    .await
            }
        }
    };
}

/// Pool-backed repositories. Each call is its own implicit transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }

    fn executor(&mut self) -> Res<&PgPool> {
        Ok(&self.pool)
    }
}

pg_repositories!(PgStore);

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Res<PgTx> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx: Some(tx) })
    }
}

/// Repositories bound to a live Postgres transaction.
///
/// Dropping an unresolved handle rolls the transaction back.
pub struct PgTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgTx {
    fn executor(&mut self) -> Res<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("transaction already resolved".to_string()))
    }
}

pg_repositories!(PgTx);

#[async_trait]
impl UnitOfWork for PgTx {
    async fn commit(&mut self) -> Res<()> {
        match self.tx.take() {
            Some(tx) => tx.commit().await.map_err(AppError::from),
            None => Err(AppError::Internal("transaction already resolved".to_string())),
        }
    }

    async fn rollback(&mut self) -> Res<()> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(AppError::from),
            None => Ok(()),
        }
    }
}
