use std::{env, sync::Arc};

/// Deployment flag. Anything other than `local` is treated as hosted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Hosted,
}

impl Environment {
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("local") {
            Environment::Local
        } else {
            Environment::Hosted
        }
    }

    pub fn is_local(&self) -> bool {
        *self == Environment::Local
    }
}

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything the server needs at startup: database connection,
/// invitation token signing, identity provider and mail API credentials,
/// public web application URLs, server host and port, worker count,
/// CORS settings and logging preferences.
pub struct Config {
    /// Deployment flag (`ENVIRONMENT`).
    pub environment: Environment,
    /// The URL of the database to connect to.
    pub database_url: String,
    /// Configuration for invitation tokens.
    pub invite_config: InviteConfig,
    /// Configuration for the external identity provider.
    pub clerk_config: ClerkConfig,
    /// Configuration for the mail API.
    pub mail_config: MailConfig,
    /// Web application URLs used in emailed links.
    pub app_urls: AppUrls,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
}

#[derive(Clone, Debug)]
/// Configuration for signed invitation tokens.
pub struct InviteConfig {
    /// The secret key used to sign and verify invitation tokens.
    pub secret: String,
    /// Lifetime of an invitation in hours.
    pub expiration_hours: i64,
}

impl InviteConfig {
    /// Reads `INVITE_TOKEN_SECRET` (required) and
    /// `INVITE_TOKEN_EXPIRATION_HOURS` (default 24).
    ///
    /// # Panics
    ///
    /// Panics if the secret is missing or the expiration is not a number.
    pub fn from_env() -> Self {
        InviteConfig {
            secret: env::var("INVITE_TOKEN_SECRET").expect("INVITE_TOKEN_SECRET must be set"),
            expiration_hours: env::var("INVITE_TOKEN_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("INVITE_TOKEN_EXPIRATION_HOURS must be a valid number"),
        }
    }
}

#[derive(Clone, Debug)]
/// Credentials for the identity provider's backend API and session tokens.
pub struct ClerkConfig {
    /// Backend API secret key.
    pub secret_key: String,
    /// PEM encoded RSA public key that signs session tokens.
    pub jwt_public_key: String,
    /// Base URL of the backend API.
    pub api_url: String,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender: String,
    /// Product name shown in subjects and greetings.
    pub sender_name: String,
}

#[derive(Clone, Debug)]
pub struct AppUrls {
    pub environment: Environment,
    pub local_url: String,
    pub hosted_url: String,
}

impl AppUrls {
    /// Base URL of the web application for the current deployment.
    pub fn base_url(&self) -> &str {
        match self.environment {
            Environment::Local => &self.local_url,
            Environment::Hosted => &self.hosted_url,
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `DATABASE_URL`: Connection string for the database
    /// - `INVITE_TOKEN_SECRET`: Invitation signing key (via `InviteConfig::from_env()`)
    /// - `CLERK_SECRET_KEY`, `CLERK_JWT_PUBLIC_KEY`: Identity provider credentials
    ///
    /// Optional (with defaults):
    /// - `ENVIRONMENT`: `local` or anything else for hosted (default: "local")
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOCAL_APP_URL` / `HOSTED_APP_URL`: Web application base URLs
    /// - `CLERK_API_URL`, `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_SENDER`, `MAIL_SENDER_NAME`
    ///
    /// # Panics
    ///
    /// Panics if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let environment =
            Environment::from_flag(&env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string()));

        Arc::new(Config {
            environment,
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            invite_config: InviteConfig::from_env(),
            clerk_config: ClerkConfig {
                secret_key: env::var("CLERK_SECRET_KEY").expect("CLERK_SECRET_KEY must be set"),
                jwt_public_key: env::var("CLERK_JWT_PUBLIC_KEY")
                    .expect("CLERK_JWT_PUBLIC_KEY must be set"),
                api_url: env::var("CLERK_API_URL")
                    .unwrap_or_else(|_| "https://api.clerk.com/v1".to_string()),
            },
            mail_config: MailConfig {
                api_url: env::var("MAIL_API_URL")
                    .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
                api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
                sender: env::var("MAIL_SENDER").unwrap_or_default(),
                sender_name: env::var("MAIL_SENDER_NAME").unwrap_or_else(|_| "Rively".to_string()),
            },
            app_urls: AppUrls {
                environment,
                local_url: env::var("LOCAL_APP_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                hosted_url: env::var("HOSTED_APP_URL")
                    .unwrap_or_else(|_| "https://app.rively.io".to_string()),
            },
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_flag_selects_local() {
        assert_eq!(Environment::from_flag("local"), Environment::Local);
        assert_eq!(Environment::from_flag(" LOCAL "), Environment::Local);
        assert_eq!(Environment::from_flag("prod"), Environment::Hosted);
        assert_eq!(Environment::from_flag("staging"), Environment::Hosted);
        assert_eq!(Environment::from_flag(""), Environment::Hosted);
    }

    #[test]
    fn base_url_follows_environment() {
        let mut urls = AppUrls {
            environment: Environment::Local,
            local_url: "http://localhost:3000".to_string(),
            hosted_url: "https://app.example.com".to_string(),
        };
        assert_eq!(urls.base_url(), "http://localhost:3000");
        urls.environment = Environment::Hosted;
        assert_eq!(urls.base_url(), "https://app.example.com");
    }
}
