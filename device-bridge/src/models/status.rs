use serde::Serialize;

/// Outcome of an operation that has no richer payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

/// Numeric error codes carried in `statusCode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ArgumentMissing,
    ArgumentInvalid,
    SelectorInvalid,
    InteractionKey,
    TimeoutWindowUpdate,
    CaptureFailed,
    DeviceError,
}

impl ErrorCode {
    /// Wire value of the code
    pub fn value(self) -> i32 {
        match self {
            ErrorCode::ArgumentMissing => 1000,
            ErrorCode::ArgumentInvalid => 1001,
            ErrorCode::SelectorInvalid => 1002,
            ErrorCode::InteractionKey => 2000,
            ErrorCode::TimeoutWindowUpdate => 3000,
            ErrorCode::CaptureFailed => 4000,
            ErrorCode::DeviceError => 5000,
        }
    }

    /// Default human-readable message for the code
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ArgumentMissing => "A selector must be specified",
            ErrorCode::ArgumentInvalid => "Invalid argument",
            ErrorCode::SelectorInvalid => "Invalid selector",
            ErrorCode::InteractionKey => "Cannot press KeyCode",
            ErrorCode::TimeoutWindowUpdate => "Timeout waiting for window update",
            ErrorCode::CaptureFailed => "Cannot get screenshot",
            ErrorCode::DeviceError => "Device error",
        }
    }
}

/// Uniform success/error envelope.
///
/// `statusCode` and `errorMessage` are only ever set on `ERROR`; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            status_code: None,
            error_message: None,
        }
    }

    /// Error without a status code
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            status_code: None,
            error_message: Some(message.into()),
        }
    }

    /// Error with a status code and its default message
    pub fn from_code(code: ErrorCode) -> Self {
        Self::with_code(code, code.message())
    }

    /// Error with a status code and a specific message
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            status_code: Some(code.value()),
            error_message: Some(message.into()),
        }
    }

    /// Map a driver's boolean result: OK when it succeeded, `on_failure` otherwise
    pub fn from_outcome(succeeded: bool, on_failure: impl FnOnce() -> Self) -> Self {
        if succeeded {
            Self::ok()
        } else {
            on_failure()
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn status_code(&self) -> Option<i32> {
        self.status_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
