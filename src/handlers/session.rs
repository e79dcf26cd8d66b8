use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tera::Context;

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Form;
use crate::handlers::operators::LIST_ROUTE;
use crate::middleware::LOGIN_ROUTE;
use crate::models::normalize_user_name;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

pub async fn login_form(State(state): State<AppState>) -> Result<Response> {
    render_login(&state, StatusCode::OK, "", None)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<LoginForm>,
) -> Result<Response> {
    let user_name = normalize_user_name(&input.user_name);

    match state.operators.authenticate(&user_name, &input.password).await? {
        Some(operator) => {
            let jar = state.sessions.login(jar, &operator)?;
            tracing::info!("Operator {} ({}) signed in", operator.user_name, operator.id);
            Ok((jar, Redirect::to(LIST_ROUTE)).into_response())
        }
        None => {
            tracing::warn!("Failed sign-in for {:?}", user_name);
            render_login(
                &state,
                StatusCode::UNAUTHORIZED,
                &user_name,
                Some("Invalid user name or password"),
            )
        }
    }
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (state.sessions.logout(jar), Redirect::to(LOGIN_ROUTE))
}

fn render_login(
    state: &AppState,
    status: StatusCode,
    user_name: &str,
    error: Option<&str>,
) -> Result<Response> {
    let mut context = Context::new();
    context.insert("user_name", user_name);
    context.insert("error", &error);
    Ok((status, state.views.render(views::LOGIN, &context)?).into_response())
}
