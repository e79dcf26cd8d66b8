mod from_row;
pub mod queries;

pub use from_row::*;

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::Config;
use crate::error::Result;
use crate::services::{DisplayService, OperatorService};
use crate::session::SessionKeys;
use crate::views::Views;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub operators: OperatorService,
    pub display: DisplayService,
    pub views: Views,
    pub sessions: SessionKeys,
    /// When false the operator pages are reachable without logging in.
    pub auth_required: bool,
}

impl AppState {
    pub fn new(db: DbPool, config: &Config) -> Result<Self> {
        Ok(Self {
            operators: OperatorService::new(db.clone(), config.bcrypt_cost),
            display: DisplayService::new(&config.super_admin_username),
            views: Views::new()?,
            sessions: SessionKeys::from_config(config),
            auth_required: config.auth_required,
            db,
        })
    }
}

pub fn create_pool(database_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")
    });
    Ok(Pool::builder().max_size(8).build(manager)?)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS operators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_name TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'standard' CHECK (role IN ('standard', 'admin')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )?;
    Ok(())
}
