use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::models::OperatorRole;
use crate::session::{CurrentUser, SessionUser};

pub const LOGIN_ROUTE: &str = "/login";

/// Resolve the session cookie to a live operator row.
/// A stale session (operator since deleted) counts as anonymous.
fn resolve_session(state: &AppState, jar: &CookieJar) -> Result<Option<SessionUser>> {
    let Some(id) = state.sessions.operator_id(jar) else {
        return Ok(None);
    };
    let operator = state.operators.find_by_id(id)?;
    Ok(operator.as_ref().map(SessionUser::from))
}

/// Inject [`CurrentUser`] and, when `auth_required` is set, keep anonymous
/// and non-admin operators out.
pub async fn session_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = resolve_session(&state, &jar)?;

    if state.auth_required {
        match &user {
            None => return Ok(Redirect::to(LOGIN_ROUTE).into_response()),
            Some(u) if u.role != OperatorRole::Admin => {
                tracing::warn!("Operator {} ({}) denied: admin role required", u.user_name, u.id);
                return Err(AppError::Forbidden("Admin role required".into()));
            }
            Some(_) => {}
        }
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
