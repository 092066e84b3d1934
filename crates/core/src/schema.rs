use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::{Department, EmployeeDraft, EmployeeRecord, Field, FieldErrorKind, FieldErrors};

pub const EMPLOYEE_ID_MAX_CHARS: usize = 10;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// WHATWG `valid email address`: permissive local part, dot-separated domain
// labels of 1-63 characters that neither start nor end with a hyphen.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern")
});

// `\d` would accept non-ASCII digits.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern"));

/// Validates a draft against the employee field schema.
///
/// Every field is checked so that callers can report all failures at once. At
/// most one error is kept per field: the first constraint it violates.
/// `today` bounds `dateOfJoining`; a date equal to `today` is accepted.
pub fn validate(draft: &EmployeeDraft, today: NaiveDate) -> Result<EmployeeRecord, FieldErrors> {
    let mut errors = FieldErrors::new();

    for field in [Field::FirstName, Field::LastName, Field::Role] {
        require(&mut errors, field, draft.get(field));
    }

    if require(&mut errors, Field::EmployeeId, &draft.employee_id)
        && draft.employee_id.chars().count() > EMPLOYEE_ID_MAX_CHARS
    {
        errors.push(
            Field::EmployeeId,
            FieldErrorKind::TooLong,
            format!("Employee ID cannot exceed {EMPLOYEE_ID_MAX_CHARS} characters"),
        );
    }

    if require(&mut errors, Field::Email, &draft.email) && !EMAIL_PATTERN.is_match(&draft.email) {
        errors.push(Field::Email, FieldErrorKind::InvalidFormat, "Invalid email format");
    }

    if require(&mut errors, Field::PhoneNumber, &draft.phone_number)
        && !PHONE_PATTERN.is_match(&draft.phone_number)
    {
        errors.push(
            Field::PhoneNumber,
            FieldErrorKind::InvalidFormat,
            "Phone Number must be 10 digits",
        );
    }

    let department = if require(&mut errors, Field::Department, &draft.department) {
        let parsed = draft.department.parse::<Department>().ok();
        if parsed.is_none() {
            errors.push(
                Field::Department,
                FieldErrorKind::InvalidChoice,
                "Department must be one of HR, Engineering, Marketing, Intern",
            );
        }
        parsed
    } else {
        None
    };

    let date_of_joining = if require(&mut errors, Field::DateOfJoining, &draft.date_of_joining) {
        match NaiveDate::parse_from_str(draft.date_of_joining.trim(), DATE_FORMAT) {
            Ok(date) if date > today => {
                errors.push(
                    Field::DateOfJoining,
                    FieldErrorKind::OutOfRange,
                    "Date of Joining cannot be in the future",
                );
                None
            }
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(
                    Field::DateOfJoining,
                    FieldErrorKind::InvalidFormat,
                    "Date of Joining must be a valid date (YYYY-MM-DD)",
                );
                None
            }
        }
    } else {
        None
    };

    match (department, date_of_joining) {
        (Some(department), Some(date_of_joining)) if errors.is_empty() => Ok(EmployeeRecord {
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            employee_id: draft.employee_id.clone(),
            email: draft.email.clone(),
            phone_number: draft.phone_number.clone(),
            department,
            date_of_joining,
            role: draft.role.clone(),
        }),
        _ => Err(errors),
    }
}

/// Records a `Required` error for blank values. Returns `true` when the value is present.
fn require(errors: &mut FieldErrors, field: Field, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(
            field,
            FieldErrorKind::Required,
            format!("{} is required", field.label()),
        );
        false
    } else {
        true
    }
}
