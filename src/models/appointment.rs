use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Opaque appointment identifier shared by every store backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(Uuid);

impl AppointmentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Coerces client input into an id. Anything that is not a UUID yields `None`,
    /// which callers treat as "no such appointment".
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Raw booking input as submitted by the registration form or the JSON API.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub time: Option<String>,
    pub date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A validated booking that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAppointment {
    pub first_name: String,
    pub last_name: String,
    pub time: String,
    pub date: String,
    pub phone: String,
    pub email: String,
}

impl NewAppointment {
    pub fn parse(fields: AppointmentFields) -> Result<Self, ValidationError> {
        let mut missing = Vec::new();
        let appointment = Self {
            first_name: required(fields.first_name, "firstName", &mut missing),
            last_name: required(fields.last_name, "lastName", &mut missing),
            time: required(fields.time, "time", &mut missing),
            date: required(fields.date, "date", &mut missing),
            phone: required(fields.phone, "phone", &mut missing),
            email: required(fields.email, "email", &mut missing),
        };

        if missing.is_empty() {
            Ok(appointment)
        } else {
            Err(ValidationError { missing })
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub first_name: String,
    pub last_name: String,
    pub time: String,
    pub date: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(id: AppointmentId, new: NewAppointment, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            time: new.time,
            date: new.date,
            phone: new.phone,
            email: new.email,
            created_at,
        }
    }

    pub fn apply(&mut self, reschedule: &Reschedule) {
        self.date.clone_from(&reschedule.date);
        self.time.clone_from(&reschedule.time);
    }
}

/// Raw reschedule input. `id` has already been coerced to text by the caller.
#[derive(Clone, Debug, Default)]
pub struct RescheduleFields {
    pub id: Option<String>,
    pub new_date: Option<String>,
    pub new_time: Option<String>,
}

/// Replacement date and time for an existing appointment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reschedule {
    pub date: String,
    pub time: String,
}

impl RescheduleFields {
    /// Returns the raw id alongside the validated change.
    pub fn parse(self) -> Result<(String, Reschedule), ValidationError> {
        let mut missing = Vec::new();
        let id = required(self.id, "id", &mut missing);
        let reschedule = Reschedule {
            date: required(self.new_date, "new_date", &mut missing),
            time: required(self.new_time, "new_time", &mut missing),
        };

        if missing.is_empty() {
            Ok((id, reschedule))
        } else {
            Err(ValidationError { missing })
        }
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    match value.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_owned(),
        _ => {
            missing.push(field);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann_lee() -> AppointmentFields {
        AppointmentFields {
            first_name: Some("Ann".into()),
            last_name: Some("Lee".into()),
            time: Some("10:00".into()),
            date: Some("2025-01-01".into()),
            phone: Some("555-1234".into()),
            email: Some("a@x.com".into()),
        }
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let fields = AppointmentFields {
            first_name: Some("  Ann ".into()),
            email: Some("\ta@x.com\n".into()),
            ..ann_lee()
        };

        let parsed = NewAppointment::parse(fields).unwrap();
        assert_eq!(parsed.first_name, "Ann");
        assert_eq!(parsed.email, "a@x.com");
    }

    #[test]
    fn parse_reports_every_missing_field() {
        let fields = AppointmentFields {
            last_name: None,
            phone: Some("   ".into()),
            email: Some(String::new()),
            ..ann_lee()
        };

        let err = NewAppointment::parse(fields).unwrap_err();
        assert_eq!(err.missing, vec!["lastName", "phone", "email"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = NewAppointment::parse(AppointmentFields::default()).unwrap_err();
        assert_eq!(err.missing.len(), 6);
    }

    #[test]
    fn date_and_time_are_not_format_checked() {
        let fields = AppointmentFields {
            time: Some("after lunch".into()),
            date: Some("next tuesday".into()),
            ..ann_lee()
        };
        assert!(NewAppointment::parse(fields).is_ok());
    }

    #[test]
    fn id_parse_rejects_non_uuid_input() {
        assert!(AppointmentId::parse("42").is_none());
        assert!(AppointmentId::parse("").is_none());

        let id = AppointmentId::generate();
        assert_eq!(AppointmentId::parse(&id.to_string()), Some(id));
        assert_eq!(AppointmentId::parse(&format!(" {id} ")), Some(id));
    }

    #[test]
    fn reschedule_requires_all_three_fields() {
        let err = RescheduleFields {
            id: Some("abc".into()),
            new_date: None,
            new_time: Some(" ".into()),
        }
        .parse()
        .unwrap_err();
        assert_eq!(err.missing, vec!["new_date", "new_time"]);
    }

    #[test]
    fn apply_only_touches_date_and_time() {
        let id = AppointmentId::generate();
        let created_at = Utc::now();
        let mut appointment =
            Appointment::new(id, NewAppointment::parse(ann_lee()).unwrap(), created_at);

        appointment.apply(&Reschedule {
            date: "2025-01-02".into(),
            time: "11:00".into(),
        });

        assert_eq!(appointment.date, "2025-01-02");
        assert_eq!(appointment.time, "11:00");
        assert_eq!(appointment.first_name, "Ann");
        assert_eq!(appointment.id, id);
        assert_eq!(appointment.created_at, created_at);
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let appointment = Appointment::new(
            AppointmentId::generate(),
            NewAppointment::parse(ann_lee()).unwrap(),
            Utc::now(),
        );
        let json = serde_json::to_value(&appointment).unwrap();

        assert_eq!(json["firstName"], "Ann");
        assert_eq!(json["id"], appointment.id.to_string());
        assert!(json["createdAt"].is_string());
    }
}
