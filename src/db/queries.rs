use chrono::Utc;
use rusqlite::{Connection, params, types::Value};

use crate::error::Result;
use crate::models::*;

use super::from_row::{OPERATOR_COLS, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: i64,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: i64) -> Self {
        Self {
            table,
            id,
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Always stamps `updated_at`. Returns false when no row matched.
    fn execute(mut self, conn: &Connection) -> Result<bool> {
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Operators ============

/// Insert an operator. The password must already be hashed.
pub fn create_operator(
    conn: &Connection,
    user_name: &str,
    password_hash: &str,
    role: OperatorRole,
) -> Result<Operator> {
    let now = now();

    conn.execute(
        "INSERT INTO operators (user_name, password_hash, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_name, password_hash, role.as_ref(), now, now],
    )?;

    Ok(Operator {
        id: conn.last_insert_rowid(),
        user_name: user_name.to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_operator_by_id(conn: &Connection, id: i64) -> Result<Option<Operator>> {
    query_one(
        conn,
        &format!("SELECT {} FROM operators WHERE id = ?1", OPERATOR_COLS),
        params![id],
    )
}

pub fn get_operator_by_user_name(conn: &Connection, user_name: &str) -> Result<Option<Operator>> {
    query_one(
        conn,
        &format!("SELECT {} FROM operators WHERE user_name = ?1", OPERATOR_COLS),
        params![user_name],
    )
}

/// All operators in insertion order.
pub fn list_operators(conn: &Connection) -> Result<Vec<Operator>> {
    query_all(
        conn,
        &format!("SELECT {} FROM operators ORDER BY id ASC", OPERATOR_COLS),
        params![],
    )
}

/// True if another operator (other than `except_id`) already uses `user_name`.
pub fn user_name_taken(conn: &Connection, user_name: &str, except_id: Option<i64>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM operators WHERE user_name = ?1 AND (?2 IS NULL OR id != ?2)",
        params![user_name, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Update name and, when given, the password hash. The role is left alone.
pub fn update_operator(
    conn: &Connection,
    id: i64,
    user_name: &str,
    password_hash: Option<&str>,
) -> Result<bool> {
    UpdateBuilder::new("operators", id)
        .set("user_name", user_name.to_string())
        .set_opt("password_hash", password_hash.map(str::to_string))
        .execute(conn)
}

pub fn set_operator_role(conn: &Connection, id: i64, role: OperatorRole) -> Result<bool> {
    UpdateBuilder::new("operators", id)
        .set("role", role.as_ref().to_string())
        .execute(conn)
}

pub fn delete_operator(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM operators WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

