use std::sync::Arc;

use crate::models::Operator;

/// Decides what the operator list is allowed to show.
#[derive(Debug, Clone)]
pub struct DisplayService {
    super_admin_username: Arc<str>,
}

impl DisplayService {
    pub fn new(super_admin_username: &str) -> Self {
        Self {
            super_admin_username: Arc::from(super_admin_username),
        }
    }

    pub fn is_super_admin(&self, operator: &Operator) -> bool {
        self.is_super_admin_name(&operator.user_name)
    }

    /// The super admin name is reserved, no other operator may take it.
    pub fn is_super_admin_name(&self, user_name: &str) -> bool {
        user_name == &*self.super_admin_username
    }

    /// Drops the super admin, keeping the input order.
    pub fn show_all_without_super_admin(&self, operators: Vec<Operator>) -> Vec<Operator> {
        operators
            .into_iter()
            .filter(|op| !self.is_super_admin(op))
            .collect()
    }
}
