use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

pub const DEFAULT_SYNC_BASE_URL: &str = "https://jsonblob.com/api/jsonBlob";
pub const DEFAULT_REPORT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MONTHLY_FEE: u64 = 50000;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub sync_base_url: String,
    pub report: ReportConfig,
    pub admin: AdminAccount,
    /// Standard syahriah amount, used when a payment request omits one.
    pub monthly_fee: u64,
}

#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// The built-in staff login that exists independently of the roster.
#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

impl Default for AdminAccount {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            display_name: "Ustadz Ahmad".to_string(),
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://tpq.db?mode=rwc".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::BadRequest(format!("BIND_ADDR is invalid: {}", e)))?;

        let sync_base_url =
            env::var("SYNC_BASE_URL").unwrap_or_else(|_| DEFAULT_SYNC_BASE_URL.to_string());

        let monthly_fee = match env::var("MONTHLY_FEE") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| AppError::BadRequest(format!("MONTHLY_FEE is invalid: {}", e)))?,
            Err(_) => DEFAULT_MONTHLY_FEE,
        };

        let report = ReportConfig {
            api_key: env::var("REPORT_API_KEY").ok().filter(|k| !k.is_empty()),
            model: env::var("REPORT_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            base_url: env::var("REPORT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_REPORT_BASE_URL.to_string()),
        };

        let defaults = AdminAccount::default();
        let admin = AdminAccount {
            username: env::var("ADMIN_USERNAME").unwrap_or(defaults.username),
            password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.password),
            display_name: env::var("ADMIN_NAME").unwrap_or(defaults.display_name),
        };

        Ok(Self {
            database_url,
            bind_addr,
            sync_base_url,
            report,
            admin,
            monthly_fee,
        })
    }
}
