pub mod form;
pub mod transport;

pub use form::{FormController, Notice, SubmitOutcome, GENERIC_FAILURE_MESSAGE};
pub use transport::{RegistrationClient, TransportError};
