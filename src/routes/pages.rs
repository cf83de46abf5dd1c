use askama::Template;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

use crate::{
    errors::AppointmentError,
    models::{Appointment, AppointmentFields},
    startup::AppState,
};

#[derive(Template)]
#[template(path = "welcome.html")]
struct WelcomeTemplate;

#[derive(Template, Default)]
#[template(path = "register.html")]
struct RegisterTemplate {
    error_message: Option<String>,
    fields: AppointmentFields,
}

#[derive(Template)]
#[template(path = "confirmation.html")]
struct ConfirmationTemplate {
    appointment: Appointment,
}

#[derive(Template)]
#[template(path = "reschedule.html")]
struct RescheduleTemplate;

pub async fn welcome_page() -> Result<Html<String>, AppointmentError> {
    Ok(Html(WelcomeTemplate.render()?))
}

pub async fn register_page() -> Result<Html<String>, AppointmentError> {
    Ok(Html(RegisterTemplate::default().render()?))
}

pub async fn reschedule_page() -> Result<Html<String>, AppointmentError> {
    Ok(Html(RescheduleTemplate.render()?))
}

#[instrument(name = "Web: Register POST", skip(state, payload))]
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Form<AppointmentFields>, FormRejection>,
) -> Result<Response, AppointmentError> {
    // an unreadable submission re-renders the empty form with the usual error
    let form = match payload {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!("Unreadable registration form: {}", rejection.body_text());
            AppointmentFields::default()
        }
    };
    match state.appointments.create(form.clone()).await {
        Ok(id) => {
            let appointment = state.appointments.get(&id.to_string()).await?;
            Ok(Html(ConfirmationTemplate { appointment }.render()?).into_response())
        }
        Err(AppointmentError::Validation(_)) => {
            // re-render with what the visitor already typed
            let page = RegisterTemplate {
                error_message: Some("Please fill all fields.".into()),
                fields: form,
            };
            Ok((StatusCode::BAD_REQUEST, Html(page.render()?)).into_response())
        }
        Err(e) => Err(e),
    }
}
