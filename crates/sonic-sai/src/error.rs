//! Status codes returned by the device interface and the crate error type.

use std::fmt;
use thiserror::Error;

macro_rules! define_statuses {
    ($($variant:ident = $code:literal => $name:literal),+ $(,)?) => {
        /// Status codes matching `sai_status_t`.
        #[repr(i32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SaiStatus {
            $($variant = $code,)+
        }

        impl SaiStatus {
            /// Unknown codes map to `Failure`.
            pub fn from_raw(status: i32) -> Self {
                match status {
                    $($code => SaiStatus::$variant,)+
                    _ => SaiStatus::Failure,
                }
            }

            pub const fn name(&self) -> &'static str {
                match self {
                    $(SaiStatus::$variant => $name,)+
                }
            }
        }
    };
}

define_statuses! {
    Success = 0 => "SAI_STATUS_SUCCESS",
    Failure = -1 => "SAI_STATUS_FAILURE",
    NotSupported = -2 => "SAI_STATUS_NOT_SUPPORTED",
    NoMemory = -3 => "SAI_STATUS_NO_MEMORY",
    InsufficientResources = -4 => "SAI_STATUS_INSUFFICIENT_RESOURCES",
    InvalidParameter = -5 => "SAI_STATUS_INVALID_PARAMETER",
    ItemAlreadyExists = -6 => "SAI_STATUS_ITEM_ALREADY_EXISTS",
    ItemNotFound = -7 => "SAI_STATUS_ITEM_NOT_FOUND",
    BufferOverflow = -8 => "SAI_STATUS_BUFFER_OVERFLOW",
    TableFull = -13 => "SAI_STATUS_TABLE_FULL",
    MandatoryAttributeMissing = -14 => "SAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
    NotImplemented = -15 => "SAI_STATUS_NOT_IMPLEMENTED",
    ObjectInUse = -17 => "SAI_STATUS_OBJECT_IN_USE",
    InvalidObjectType = -18 => "SAI_STATUS_INVALID_OBJECT_TYPE",
    InvalidObjectId = -19 => "SAI_STATUS_INVALID_OBJECT_ID",
    NotExecuted = -23 => "SAI_STATUS_NOT_EXECUTED",
    InvalidAttribute = -24 => "SAI_STATUS_INVALID_ATTRIBUTE",
}

impl SaiStatus {
    pub fn is_success(&self) -> bool {
        *self == SaiStatus::Success
    }

    /// `Ok(())` for success, the status wrapped in an error otherwise.
    pub fn into_result(self) -> SaiResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SaiError::Status {
                status: self,
                context: "device call".to_string(),
            })
        }
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type for the SAI model and device interface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaiError {
    /// The device returned a non-success status.
    #[error("{status}: {context}")]
    Status { status: SaiStatus, context: String },

    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("not supported: {feature}")]
    NotSupported { feature: String },

    #[error("unknown object type: {name}")]
    UnknownObjectType { name: String },

    #[error("unknown attribute {attr} on {object_type}")]
    UnknownAttribute { object_type: String, attr: String },

    /// Text could not be parsed into the expected shape.
    #[error("failed to parse {what} from '{input}'")]
    Parse { what: &'static str, input: String },
}

impl SaiError {
    /// Device status with a description of the failing call.
    pub fn status(status: SaiStatus, context: impl Into<String>) -> Self {
        SaiError::Status {
            status,
            context: context.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SaiError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn not_supported(feature: impl Into<String>) -> Self {
        SaiError::NotSupported {
            feature: feature.into(),
        }
    }

    pub fn parse(what: &'static str, input: impl Into<String>) -> Self {
        SaiError::Parse {
            what,
            input: input.into(),
        }
    }

    /// Status code equivalent of this error.
    pub fn to_status(&self) -> SaiStatus {
        match self {
            SaiError::Status { status, .. } => *status,
            SaiError::NotSupported { .. } => SaiStatus::NotSupported,
            SaiError::UnknownObjectType { .. } => SaiStatus::InvalidObjectType,
            SaiError::UnknownAttribute { .. } => SaiStatus::InvalidAttribute,
            SaiError::InvalidParameter { .. } | SaiError::Parse { .. } => {
                SaiStatus::InvalidParameter
            }
        }
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;
