//! Server-rendered pages.
//!
//! Templates are embedded at compile time so the binary is self-contained.
//! Every variable a template reads is always inserted into its context
//! (as `null` when absent); Tera errors on undefined variables.

use std::sync::Arc;

use axum::response::Html;
use tera::{Context, Tera};

use crate::error::Result;

pub const INDEX: &str = "index.html";
pub const REGISTER: &str = "register.html";
pub const EDIT: &str = "edit.html";
pub const LOGIN: &str = "login.html";

const TPL_BASE: &str = include_str!("templates/base.html");
const TPL_INDEX: &str = include_str!("templates/index.html");
const TPL_REGISTER: &str = include_str!("templates/register.html");
const TPL_EDIT: &str = include_str!("templates/edit.html");
const TPL_LOGIN: &str = include_str!("templates/login.html");

#[derive(Clone)]
pub struct Views {
    tera: Arc<Tera>,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        // add_raw_templates resolves `extends` across the whole batch
        tera.add_raw_templates(vec![
            ("base.html", TPL_BASE),
            (INDEX, TPL_INDEX),
            (REGISTER, TPL_REGISTER),
            (EDIT, TPL_EDIT),
            (LOGIN, TPL_LOGIN),
        ])?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>> {
        Ok(Html(self.tera.render(name, context)?))
    }
}
