//! Operator administration pages.
//!
//! Every write answers with a 303 to the list page and leaves its outcome
//! in the flash cookie, so reloading the list never repeats the write.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use tera::Context;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::{Form, Path};
use crate::flash::{self, FlashKind, FlashMessage};
use crate::middleware::session_auth;
use crate::models::{CreateOperator, OperatorForm, OperatorRole, UpdateOperator, ValidationErrors};
use crate::session::CurrentUser;
use crate::views;

pub const LIST_ROUTE: &str = "/operator/list";

const RESERVED_USER_NAME: &str = "This user name is reserved";

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/operator/list", get(list_operators))
        .route("/operator/", get(list_operators))
        .route("/operator/register", get(register_operator))
        .route("/operator/save", post(save_operator))
        .route("/operator/edit/{id}", get(edit_operator))
        .route("/operator/update", post(update_operator))
        .route("/operator/delete/{id}", get(delete_operator))
        .route("/operator/upgrade/{id}", get(upgrade_operator))
        .route("/operator/demote/{id}", get(demote_operator))
        .layer(middleware::from_fn_with_state(state, session_auth))
}

/// Everyone except the super admin, plus whatever the previous write left
/// in the flash cookie.
pub async fn list_operators(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let all = state.operators.find_all()?;
    let operators = state.display.show_all_without_super_admin(all);
    let (jar, flash) = flash::take(jar);

    let mut context = Context::new();
    context.insert("user", &user);
    context.insert("operators", &operators);
    context.insert("flash", &flash);
    Ok((jar, state.views.render(views::INDEX, &context)?))
}

pub async fn register_operator(State(state): State<AppState>) -> Result<Response> {
    render_form(
        &state,
        views::REGISTER,
        StatusCode::OK,
        &OperatorForm::default(),
        &ValidationErrors::default(),
    )
}

pub async fn save_operator(
    State(state): State<AppState>,
    Form(input): Form<CreateOperator>,
) -> Result<Response> {
    let input = input.normalized();
    let mut errors = input.validate();
    if state.display.is_super_admin_name(&input.user_name) {
        errors.add("user_name", RESERVED_USER_NAME);
    }
    if errors.get("user_name").is_none() && state.operators.user_name_taken(&input.user_name, None)? {
        errors.add("user_name", "User name already taken");
    }
    if !errors.is_empty() {
        return render_form(
            &state,
            views::REGISTER,
            StatusCode::UNPROCESSABLE_ENTITY,
            &OperatorForm::from(&input),
            &errors,
        );
    }

    let operator = state.operators.save(&input).await?;
    tracing::info!("Registered operator {} ({})", operator.user_name, operator.id);

    Ok(Redirect::to(LIST_ROUTE).into_response())
}

pub async fn edit_operator(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(operator) = state.operators.find_by_id(id)? else {
        return Ok(not_found(jar, id));
    };
    render_form(
        &state,
        views::EDIT,
        StatusCode::OK,
        &OperatorForm::from(&operator),
        &ValidationErrors::default(),
    )
}

pub async fn update_operator(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<UpdateOperator>,
) -> Result<Response> {
    let input = input.normalized();
    let mut errors = input.validate();
    if errors.get("user_name").is_none()
        && state.operators.user_name_taken(&input.user_name, Some(input.id))?
    {
        errors.add("user_name", "User name already taken");
    }

    let Some(existing) = state.operators.find_by_id(input.id)? else {
        return Ok(not_found(jar, input.id));
    };
    // The super admin is recognised by name, renaming it would unhide it
    if state.display.is_super_admin(&existing) {
        if existing.user_name != input.user_name {
            errors.add("user_name", "The super admin cannot be renamed");
        }
    } else if state.display.is_super_admin_name(&input.user_name) {
        errors.add("user_name", RESERVED_USER_NAME);
    }

    if !errors.is_empty() {
        let mut form = OperatorForm::from(&input);
        form.role = Some(existing.role);
        return render_form(
            &state,
            views::EDIT,
            StatusCode::UNPROCESSABLE_ENTITY,
            &form,
            &errors,
        );
    }

    if !state.operators.update(input.id, &input).await? {
        return Ok(not_found(jar, input.id));
    }
    tracing::info!("Updated operator {} ({})", input.user_name, input.id);

    Ok(redirect_with(jar, FlashMessage::new(FlashKind::Updated, input.user_name)))
}

pub async fn delete_operator(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(operator) = state.operators.find_by_id(id)? else {
        return Ok(not_found(jar, id));
    };
    if state.display.is_super_admin(&operator) {
        return Err(AppError::BadRequest("The super admin cannot be deleted".into()));
    }
    if user.is_some_and(|u| u.id == id) {
        return Err(AppError::BadRequest("Cannot delete yourself".into()));
    }

    state.operators.delete_by_id(id)?;
    tracing::info!("Deleted operator {} ({})", operator.user_name, id);

    Ok(redirect_with(jar, FlashMessage::new(FlashKind::DeletedUser, operator.user_name)))
}

pub async fn upgrade_operator(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(operator) = state.operators.find_by_id(id)? else {
        return Ok(not_found(jar, id));
    };

    let kind = if state.operators.check_role(&operator, OperatorRole::Admin) {
        FlashKind::AlreadyUpgraded
    } else {
        FlashKind::Upgraded
    };
    state.operators.upgrade(id)?;
    tracing::info!("Upgraded operator {} ({}): {}", operator.user_name, id, kind.as_ref());

    Ok(redirect_with(jar, FlashMessage::new(kind, operator.user_name)))
}

pub async fn demote_operator(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(operator) = state.operators.find_by_id(id)? else {
        return Ok(not_found(jar, id));
    };
    if state.display.is_super_admin(&operator) {
        return Err(AppError::BadRequest("The super admin cannot be demoted".into()));
    }
    if user.is_some_and(|u| u.id == id) {
        return Err(AppError::BadRequest("Cannot change your own role".into()));
    }

    let kind = if state.operators.check_role(&operator, OperatorRole::Admin) {
        FlashKind::Demoted
    } else {
        FlashKind::AlreadyDemoted
    };
    state.operators.demote(id)?;
    tracing::info!("Demoted operator {} ({}): {}", operator.user_name, id, kind.as_ref());

    Ok(redirect_with(jar, FlashMessage::new(kind, operator.user_name)))
}

fn render_form(
    state: &AppState,
    template: &str,
    status: StatusCode,
    operator: &OperatorForm,
    errors: &ValidationErrors,
) -> Result<Response> {
    let mut context = Context::new();
    context.insert("operator", operator);
    context.insert("errors", errors);
    Ok((status, state.views.render(template, &context)?).into_response())
}

fn redirect_with(jar: CookieJar, message: FlashMessage) -> Response {
    (flash::set(jar, &message), Redirect::to(LIST_ROUTE)).into_response()
}

fn not_found(jar: CookieJar, id: i64) -> Response {
    tracing::info!("Operator {} not found", id);
    redirect_with(jar, FlashMessage::new(FlashKind::NotFound, id.to_string()))
}
