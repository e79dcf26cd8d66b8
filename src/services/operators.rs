//! Operator persistence and role operations.
//!
//! Every method checks out its own pooled connection and returns it before
//! returning, so handlers can chain calls without holding a connection.

use rusqlite::ErrorCode;

use crate::db::{DbPool, queries};
use crate::error::{AppError, Result};
use crate::models::{CreateOperator, Operator, OperatorRole, UpdateOperator};

#[derive(Clone)]
pub struct OperatorService {
    pool: DbPool,
    bcrypt_cost: u32,
}

impl OperatorService {
    pub fn new(pool: DbPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    pub fn find_all(&self) -> Result<Vec<Operator>> {
        let conn = self.pool.get()?;
        queries::list_operators(&conn)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Operator>> {
        let conn = self.pool.get()?;
        queries::get_operator_by_id(&conn, id)
    }

    pub fn find_by_user_name(&self, user_name: &str) -> Result<Option<Operator>> {
        let conn = self.pool.get()?;
        queries::get_operator_by_user_name(&conn, user_name)
    }

    pub fn user_name_taken(&self, user_name: &str, except_id: Option<i64>) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::user_name_taken(&conn, user_name, except_id)
    }

    /// Register a new operator from the registration form. New operators
    /// start without the admin role.
    pub async fn save(&self, input: &CreateOperator) -> Result<Operator> {
        self.create(&input.user_name, &input.password, OperatorRole::Standard)
            .await
    }

    pub async fn create(
        &self,
        user_name: &str,
        password: &str,
        role: OperatorRole,
    ) -> Result<Operator> {
        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let conn = self.pool.get()?;
        queries::create_operator(&conn, user_name, &password_hash, role).map_err(unique_violation)
    }

    /// Returns false if no operator has this id.
    pub async fn update(&self, id: i64, input: &UpdateOperator) -> Result<bool> {
        let password_hash = match input.new_password() {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };
        let conn = self.pool.get()?;
        queries::update_operator(&conn, id, &input.user_name, password_hash.as_deref())
            .map_err(unique_violation)
    }

    pub fn delete_by_id(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::delete_operator(&conn, id)
    }

    pub fn check_role(&self, operator: &Operator, role: OperatorRole) -> bool {
        match role {
            OperatorRole::Admin => operator.has_admin_role(),
            OperatorRole::Standard => !operator.has_admin_role(),
        }
    }

    /// Grant the admin role. Idempotent.
    pub fn upgrade(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::set_operator_role(&conn, id, OperatorRole::Admin)
    }

    /// Revoke the admin role. Idempotent.
    pub fn demote(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::set_operator_role(&conn, id, OperatorRole::Standard)
    }

    /// Look up by name and check the password. `None` on any mismatch.
    pub async fn authenticate(&self, user_name: &str, password: &str) -> Result<Option<Operator>> {
        let Some(operator) = self.find_by_user_name(user_name)? else {
            return Ok(None);
        };
        if verify_password(password, &operator.password_hash).await? {
            Ok(Some(operator))
        } else {
            Ok(None)
        }
    }

    /// Create the super admin if no operator with that name exists yet.
    /// Returns true when a row was created. An existing row under that name
    /// without the admin role is an error, since it can never be managed.
    pub async fn ensure_super_admin(&self, user_name: &str, password: &str) -> Result<bool> {
        match self.find_by_user_name(user_name)? {
            Some(existing) if existing.has_admin_role() => Ok(false),
            Some(existing) => Err(AppError::Internal(format!(
                "operator {} ({}) holds the super admin name without the admin role",
                existing.user_name, existing.id
            ))),
            None => {
                self.create(user_name, password, OperatorRole::Admin).await?;
                Ok(true)
            }
        }
    }
}

// bcrypt is CPU-bound, keep it off the async workers.
async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
        .map_err(AppError::from)
}

async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
        .map_err(AppError::from)
}

/// The unique index on `user_name` can still fire if two requests race past
/// the form-level check.
fn unique_violation(err: AppError) -> AppError {
    match err {
        AppError::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            AppError::BadRequest("User name already taken".into())
        }
        other => other,
    }
}
