//! Employee field schema shared by the submitting form and the registration endpoint.
//!
//! Both sides link this crate and call [`schema::validate`] so that what the
//! form accepts can never drift from what the server accepts.
pub mod schema;
pub mod types;

pub use schema::validate;
pub use types::{
    Department, EmployeeDraft, EmployeeRecord, Field, FieldError, FieldErrorKind, FieldErrors,
    SubmissionResponse,
};
