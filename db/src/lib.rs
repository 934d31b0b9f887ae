use common::error::AppError;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use std::{str::FromStr, sync::Arc};

pub mod company_update;
pub mod customer;
pub mod department;
pub mod email_recipient;
pub mod store;
pub mod tracked_company;
pub mod user;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub mod models {
    pub mod company_update;
    pub mod customer;
    pub mod department;
    pub mod email_recipient;
    pub mod tracked_company;
    pub mod user;
}

pub mod dtos {
    pub mod customer;
    pub mod email_recipient;
    pub mod tracked_company;
    pub mod user;
}

/// Maps a unique-constraint violation to `Conflict`; any other failure stays
/// a database error.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: impl FnOnce() -> String) -> AppError {
    let is_unique = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());
    if is_unique {
        AppError::Conflict(format!("{} already exists", what()))
    } else {
        AppError::Database(err)
    }
}

fn connect_options(url: &str, require_ssl: bool) -> Result<PgConnectOptions, sqlx::Error> {
    let options = PgConnectOptions::from_str(url)?;
    Ok(if require_ssl {
        options.ssl_mode(PgSslMode::Require)
    } else {
        options
    })
}

/// Connects to Postgres, creating the target database on first run, and
/// applies the embedded migrations.
pub async fn setup(
    database_url: &str,
    require_ssl: bool,
    max_connections: u32,
) -> Result<Arc<PgPool>, Box<dyn std::error::Error>> {
    let url = url::Url::parse(database_url)?;
    let db_name = url.path().trim_start_matches('/').to_string();

    let mut maintenance_url = url.clone();
    maintenance_url.set_path("/postgres");

    let maintenance =
        PgPool::connect_with(connect_options(maintenance_url.as_str(), require_ssl)?).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&maintenance)
            .await?;

    if !exists {
        log::info!("Creating database {}", db_name);
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name))
            .execute(&maintenance)
            .await?;
    }
    maintenance.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options(database_url, require_ssl)?)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database {} ready", db_name);

    Ok(Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, error::Error, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct ConstraintError {
        unique: bool,
        code: &'static str,
    }

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint violated ({})", self.code)
        }
    }

    impl Error for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }
    }

    fn database_error(unique: bool, code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError { unique, code }))
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = database_error(true, "23505");

        match conflict_on_unique(err, || "email recipient a@acme.io".to_string()) {
            AppError::Conflict(message) => {
                assert_eq!(message, "email recipient a@acme.io already exists")
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn other_database_errors_stay_database_errors() {
        let err = database_error(false, "23503");
        assert!(matches!(
            conflict_on_unique(err, || "email recipient".to_string()),
            AppError::Database(_)
        ));

        assert!(matches!(
            conflict_on_unique(sqlx::Error::RowNotFound, || "email recipient".to_string()),
            AppError::Database(_)
        ));
    }
}
