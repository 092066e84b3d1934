use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use onboard_core::{validate, EmployeeDraft, Field, FieldError, FieldErrors};

use crate::transport::RegistrationClient;

pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// Global message shown after the server answered or could not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Failure(message) => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Which branch a call to [`FormController::submit`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Invalid,
    /// The server stored the record; the form was reset.
    Created,
    /// The server answered with a rejection or a store failure.
    Rejected,
    /// The server could not be reached or its answer could not be read.
    TransportFailed,
}

type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Holds draft values for one new employee and drives its submission.
pub struct FormController {
    draft: EmployeeDraft,
    errors: FieldErrors,
    notice: Option<Notice>,
    transport: RegistrationClient,
    today: Today,
}

impl FormController {
    pub fn new(transport: RegistrationClient) -> Self {
        Self {
            draft: EmployeeDraft::default(),
            errors: FieldErrors::new(),
            notice: None,
            transport,
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Replaces the source of "today" used to bound the date of joining.
    pub fn with_clock(mut self, today: Arc<dyn Fn() -> NaiveDate + Send + Sync>) -> Self {
        self.today = today;
        self
    }

    pub fn draft(&self) -> &EmployeeDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_for(&self, field: Field) -> Option<&FieldError> {
        self.errors.get(field)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Replaces a single draft value. Validation only runs on submit.
    pub fn update_field(&mut self, field: Field, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    /// Validates the draft and, when it passes, sends it to the server.
    ///
    /// The draft is kept on every path except a successful insert.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let candidate = match validate(&self.draft, (self.today)()) {
            Ok(record) => record,
            Err(errors) => {
                info!(stage = "form", failing = errors.len(), "draft failed validation");
                self.errors = errors;
                return SubmitOutcome::Invalid;
            }
        };
        self.errors.clear();

        match self.transport.submit(&candidate).await {
            Ok(response) if response.success => {
                info!(stage = "form", employee_id = %candidate.employee_id(), "employee submitted");
                self.draft = EmployeeDraft::default();
                self.notice = Some(Notice::Success(response.message));
                SubmitOutcome::Created
            }
            Ok(response) => {
                warn!(
                    stage = "form",
                    employee_id = %candidate.employee_id(),
                    message = %response.message,
                    "submission rejected by server"
                );
                self.notice = Some(Notice::Failure(response.message));
                SubmitOutcome::Rejected
            }
            Err(err) => {
                warn!(stage = "form", error = %err, endpoint = %self.transport.endpoint(), "submission failed");
                self.notice = Some(Notice::Failure(GENERIC_FAILURE_MESSAGE.to_string()));
                SubmitOutcome::TransportFailed
            }
        }
    }

    /// Clears the draft and every field error.
    pub fn reset(&mut self) {
        self.draft = EmployeeDraft::default();
        self.errors.clear();
    }
}
