use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::{
    errors::{AppointmentError, ValidationError},
    models::{Appointment, AppointmentFields, RescheduleFields},
    startup::AppState,
};

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyRequest {
    pub appointment_number: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub id: Option<Value>,
    pub new_date: Option<Value>,
    pub new_time: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Unreadable bodies are treated as empty ones, so they fail field validation
/// with the usual message instead of a framework rejection.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::warn!("Unreadable JSON body: {}", rejection.body_text());
            T::default()
        }
    }
}

/// Strings pass through and numbers are taken as their text, so `"phone": 5551234`
/// or a numeric appointment number still count as provided.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn appointment_fields(body: &Map<String, Value>) -> AppointmentFields {
    let field = |name: &str| body.get(name).and_then(scalar_text);
    AppointmentFields {
        first_name: field("firstName"),
        last_name: field("lastName"),
        time: field("time"),
        date: field("date"),
        phone: field("phone"),
        email: field("email"),
    }
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "appointment-desk"
    }))
}

#[instrument(name = "HTTP: Create appointment", skip(state, payload))]
pub async fn create_appointment(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppointmentError> {
    let body: Map<String, Value> = body_or_default(payload);
    let id = state.appointments.create(appointment_fields(&body)).await?;
    Ok(Json(CreatedResponse { id: id.to_string() }))
}

#[instrument(name = "HTTP: Verify appointment", skip(state, payload))]
pub async fn verify_appointment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppointmentError> {
    let request: VerifyRequest = body_or_default(payload);
    let Some(number) = request
        .appointment_number
        .as_ref()
        .and_then(scalar_text)
        .filter(|n| !n.trim().is_empty())
    else {
        return Err(ValidationError {
            missing: vec!["appointment_number"],
        }
        .into());
    };

    let valid = state.appointments.exists(&number).await?;
    Ok(Json(VerifyResponse { valid }))
}

#[instrument(name = "HTTP: Get appointment", skip(state))]
pub async fn get_appointment(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Appointment>, AppointmentError> {
    let appointment = state.appointments.get(&id).await?;
    Ok(Json(appointment))
}

#[instrument(name = "HTTP: Update appointment", skip(state, payload))]
pub async fn update_appointment(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Response {
    let request: UpdateRequest = body_or_default(payload);
    let fields = RescheduleFields {
        id: request.id.as_ref().and_then(scalar_text),
        new_date: request.new_date.as_ref().and_then(scalar_text),
        new_time: request.new_time.as_ref().and_then(scalar_text),
    };

    match state.appointments.reschedule(fields).await {
        Ok(()) => Json(UpdateResponse {
            success: true,
            error: None,
        })
        .into_response(),
        Err(e) => {
            let body = Json(UpdateResponse {
                success: false,
                error: Some(e.public_message()),
            });
            (e.status_code(), body).into_response()
        }
    }
}
