use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use tracing::{error, info, warn};

use onboard_core::{
    types::{MESSAGE_DUPLICATE, MESSAGE_INSERT_FAILED, MESSAGE_QUERY_FAILED},
    validate, EmployeeDraft, SubmissionResponse,
};

use crate::problem::ProblemResponse;
use crate::router::AppState;

/// Result label recorded on `employee_submissions_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmissionResult {
    Created,
    Invalid,
    Duplicate,
    StoreError,
}

impl SubmissionResult {
    fn metric_label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Invalid => "invalid",
            Self::Duplicate => "duplicate",
            Self::StoreError => "store_error",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            Self::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

/// `POST /`: revalidates a submitted employee, rejects duplicates and stores it.
///
/// The duplicate lookup and the insert are two separate statements. When two
/// requests race past the lookup, the table's unique constraints let only one
/// insert through and the other is answered as a store failure.
pub async fn handle(State(state): State<AppState>, body: Bytes) -> Result<Response, ProblemResponse> {
    let start = Instant::now();

    let draft: EmployeeDraft = serde_json::from_slice(&body).map_err(|err| {
        warn!(stage = "register", error = %err, "rejecting unparseable submission");
        ProblemResponse::invalid_json(&err)
    })?;

    let (result, response) = register(&state, &draft).await;

    counter!("employee_submissions_total", "result" => result.metric_label()).increment(1);
    histogram!("employee_submission_seconds", "result" => result.metric_label())
        .record(start.elapsed().as_secs_f64());

    Ok((result.status(), Json(response)).into_response())
}

async fn register(state: &AppState, draft: &EmployeeDraft) -> (SubmissionResult, SubmissionResponse) {
    let record = match validate(draft, state.now().date_naive()) {
        Ok(record) => record,
        Err(errors) => {
            info!(
                stage = "register",
                employee_id = %draft.employee_id,
                failing = %errors,
                "submission failed validation"
            );
            return (
                SubmissionResult::Invalid,
                SubmissionResponse::rejected(errors.summary()),
            );
        }
    };

    let employees = state.storage().employees();

    match employees
        .find_conflicting(record.employee_id(), record.email())
        .await
    {
        Ok(existing) if !existing.is_empty() => {
            info!(
                stage = "register",
                employee_id = %record.employee_id(),
                matches = existing.len(),
                "employee already exists"
            );
            return (
                SubmissionResult::Duplicate,
                SubmissionResponse::rejected(MESSAGE_DUPLICATE),
            );
        }
        Ok(_) => {}
        Err(err) => {
            error!(stage = "register", error = %err, "duplicate lookup failed");
            return (
                SubmissionResult::StoreError,
                SubmissionResponse::failed(MESSAGE_QUERY_FAILED, err.to_string()),
            );
        }
    }

    match employees.insert(&record, state.now()).await {
        Ok(stored) => {
            info!(
                stage = "register",
                employee_id = %stored.employee_id,
                id = %stored.id,
                department = %stored.department,
                "employee stored"
            );
            (SubmissionResult::Created, SubmissionResponse::created())
        }
        Err(err) => {
            if err.is_duplicate() {
                warn!(stage = "register", error = %err, "insert lost a uniqueness race");
            } else {
                error!(stage = "register", error = %err, "insert failed");
            }
            (
                SubmissionResult::StoreError,
                SubmissionResponse::failed(MESSAGE_INSERT_FAILED, err.to_string()),
            )
        }
    }
}
