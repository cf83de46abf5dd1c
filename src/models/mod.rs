pub mod appointment;

pub use appointment::{
    Appointment, AppointmentFields, AppointmentId, NewAppointment, Reschedule, RescheduleFields,
};
