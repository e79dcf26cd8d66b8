//! Row mapping for the `operators` table.

use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension, Params, Row};

use crate::error::Result;
use crate::models::{Operator, OperatorRole};

pub const OPERATOR_COLS: &str = "id, user_name, password_hash, role, created_at, updated_at";

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

impl FromRow for Operator {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let role: String = row.get(3)?;
        Ok(Operator {
            id: row.get(0)?,
            user_name: row.get(1)?,
            password_hash: row.get(2)?,
            role: OperatorRole::from_str(&role).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

pub fn query_one<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
