use std::env;
use std::path::PathBuf;

use super::BoxError;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub maintenance_db_path: PathBuf,
    /// Shared secret for mutating routes; requests carry it in the
    /// `x-admin-key` header. Unset means every admin route is refused.
    pub admin_key: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, BoxError> {
        dotenvy::dotenv().ok();

        let host = env::var("MAINTENANCE_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("MAINTENANCE_SERVICE_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(9010);
        let maintenance_db_path = PathBuf::from(
            env::var("MAINTENANCE_DB_PATH")
                .unwrap_or_else(|_| "state/maintenance.db".to_string()),
        );
        let admin_key = env::var("ADMIN_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            host,
            port,
            maintenance_db_path,
            admin_key,
        })
    }
}
