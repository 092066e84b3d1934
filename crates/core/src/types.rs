use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fields of an employee submission in form order.
///
/// The ordering of the variants drives the ordering of [`FieldErrors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "firstName")]
    FirstName,
    #[serde(rename = "lastName")]
    LastName,
    #[serde(rename = "employeeID")]
    EmployeeId,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "phoneNumber")]
    PhoneNumber,
    #[serde(rename = "department")]
    Department,
    #[serde(rename = "dateOfJoining")]
    DateOfJoining,
    #[serde(rename = "role")]
    Role,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::FirstName,
        Field::LastName,
        Field::EmployeeId,
        Field::Email,
        Field::PhoneNumber,
        Field::Department,
        Field::DateOfJoining,
        Field::Role,
    ];

    /// Returns the JSON key used on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::EmployeeId => "employeeID",
            Self::Email => "email",
            Self::PhoneNumber => "phoneNumber",
            Self::Department => "department",
            Self::DateOfJoining => "dateOfJoining",
            Self::Role => "role",
        }
    }

    /// Returns the human readable label shown next to the input.
    pub fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::EmployeeId => "Employee ID",
            Self::Email => "Email",
            Self::PhoneNumber => "Phone Number",
            Self::Department => "Department",
            Self::DateOfJoining => "Date of Joining",
            Self::Role => "Role",
        }
    }

    pub fn from_wire_name(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.wire_name() == value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Closed set of departments an employee can join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "HR")]
    Hr,
    Engineering,
    Marketing,
    Intern,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Hr,
        Department::Engineering,
        Department::Marketing,
        Department::Intern,
    ];

    /// Returns the canonical representation used on the wire and in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hr => "HR",
            Self::Engineering => "Engineering",
            Self::Marketing => "Marketing",
            Self::Intern => "Intern",
        }
    }
}

impl FromStr for Department {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|department| department.as_str() == value)
            .ok_or(())
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, unvalidated form values. Missing JSON keys deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "employeeID")]
    pub employee_id: String,
    pub email: String,
    pub phone_number: String,
    pub department: String,
    pub date_of_joining: String,
    pub role: String,
}

impl EmployeeDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::EmployeeId => &self.employee_id,
            Field::Email => &self.email,
            Field::PhoneNumber => &self.phone_number,
            Field::Department => &self.department,
            Field::DateOfJoining => &self.date_of_joining,
            Field::Role => &self.role,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::EmployeeId => self.employee_id = value,
            Field::Email => self.email = value,
            Field::PhoneNumber => self.phone_number = value,
            Field::Department => self.department = value,
            Field::DateOfJoining => self.date_of_joining = value,
            Field::Role => self.role = value,
        }
    }

    /// Returns `true` when every field is empty.
    pub fn is_empty(&self) -> bool {
        Field::ALL.into_iter().all(|field| self.get(field).is_empty())
    }
}

/// Employee record that passed schema validation.
///
/// Only [`crate::schema::validate`] constructs values of this type, so holding
/// one proves the fields satisfy every constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    #[serde(rename = "employeeID")]
    pub(crate) employee_id: String,
    pub(crate) email: String,
    pub(crate) phone_number: String,
    pub(crate) department: Department,
    pub(crate) date_of_joining: NaiveDate,
    pub(crate) role: String,
}

impl EmployeeRecord {
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn department(&self) -> Department {
        self.department
    }

    pub fn date_of_joining(&self) -> NaiveDate {
        self.date_of_joining
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

/// Constraint violated by a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    TooLong,
    InvalidFormat,
    InvalidChoice,
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

/// Validation failures keyed by field, iterated in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for the field unless one is already present.
    pub fn push(&mut self, field: Field, kind: FieldErrorKind, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| FieldError {
            kind,
            message: message.into(),
        });
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0.iter().map(|(field, error)| (*field, error))
    }

    /// Produces a one-line summary naming every failing field.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.fields().map(Field::wire_name).collect();
        format!("Invalid employee record: {}", names.join(", "))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for FieldErrors {}

pub const MESSAGE_CREATED: &str = "Employee added successfully";
pub const MESSAGE_DUPLICATE: &str = "Employee already exists.";
pub const MESSAGE_QUERY_FAILED: &str = "Database error";
pub const MESSAGE_INSERT_FAILED: &str = "Failed to insert employee";

/// JSON body returned by the registration endpoint.
///
/// Validation and duplicate rejections share the `success: false` shape; the
/// `error` key is only present for store failures and carries diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionResponse {
    pub fn created() -> Self {
        Self {
            success: true,
            message: MESSAGE_CREATED.to_string(),
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}
