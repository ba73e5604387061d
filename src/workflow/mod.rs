use crate::store::StoreError;

pub mod attendance;
pub mod calendar;

/// A precondition the submitted form input failed. The display form is the
/// stable machine code surfaced to the console next to the field message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ValidationError {
    MissingDriver,
    EmptyTeam,
    NotFound,
    AlreadyCheckedOut,
    NotPending,
    InvalidTimeRange,
    CollectorCount,
    EmptyLocations,
    InvalidTransition,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::MissingDriver => "Driver name is required",
            ValidationError::EmptyTeam => "At least one team member is required",
            ValidationError::NotFound => "Record not found",
            ValidationError::AlreadyCheckedOut => "Team is already checked out",
            ValidationError::NotPending => "Record was already processed",
            ValidationError::InvalidTimeRange => "end_time must be after start_time",
            ValidationError::CollectorCount => "Exactly 3 collectors are required",
            ValidationError::EmptyLocations => "At least one location is required",
            ValidationError::InvalidTransition => "Report was already processed",
        }
    }
}

/// Recoverable either way: validation failures go back to the form inline,
/// collaborator failures become a transient retry notice.
#[derive(Debug, derive_more::Display)]
pub enum WorkflowError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),
    #[display(fmt = "{}", _0)]
    Collaborator(StoreError),
}

impl From<ValidationError> for WorkflowError {
    fn from(err: ValidationError) -> Self {
        WorkflowError::Validation(err)
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        WorkflowError::Collaborator(err)
    }
}

impl std::error::Error for WorkflowError {}

#[cfg(test)]
mod tests {
    use super::ValidationError;

    #[test]
    fn codes_are_kebab_case() {
        assert_eq!(ValidationError::MissingDriver.to_string(), "missing-driver");
        assert_eq!(ValidationError::EmptyTeam.to_string(), "empty-team");
        assert_eq!(ValidationError::NotFound.to_string(), "not-found");
        assert_eq!(
            ValidationError::AlreadyCheckedOut.to_string(),
            "already-checked-out"
        );
        assert_eq!(ValidationError::NotPending.to_string(), "not-pending");
    }
}
