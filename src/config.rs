use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Operator hidden from the list and bootstrapped at startup
    pub super_admin_username: String,
    /// Bootstrap password; no super admin is created when unset
    pub super_admin_password: Option<String>,
    /// HS256 secret for session cookies (random per process when unset)
    pub session_secret: Option<String>,
    pub session_ttl_hours: u64,
    /// Require a logged-in admin for the operator pages
    pub auth_required: bool,
    pub secure_cookies: bool,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let auth_required = env::var("AUTH_REQUIRED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let secure_cookies = env::var("SECURE_COOKIES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let session_ttl_hours: u64 = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        let bcrypt_cost: u32 = env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|c| (4..=31).contains(c))
            .unwrap_or(bcrypt::DEFAULT_COST);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "operators.db".to_string()),
            super_admin_username: env::var("SUPER_ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            super_admin_password: env::var("SUPER_ADMIN_PASSWORD").ok(),
            session_secret: env::var("SESSION_SECRET").ok().filter(|s| !s.is_empty()),
            session_ttl_hours,
            auth_required,
            secure_cookies,
            bcrypt_cost,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
