//! Provides the status taxonomy and the error type shared by all operations.
//!
//! Every fallible operation of this crate returns an [AdmResult]. Next to a human readable
//! cause (which is an `anyhow::Error` so that context can be attached while an error bubbles
//! up), each [AdmError] carries a [Status] which callers can use to distinguish the failure
//! class without parsing messages.
//!
//! # Example
//!
//! ```
//! use adm::status::{status_of, AdmResult, Status};
//!
//! fn lookup(name: &str) -> AdmResult<u32> {
//!     if name == "audioObject" {
//!         Ok(42)
//!     } else {
//!         Err(adm::adm_error!(NotFound, "Unknown element: {}", name))
//!     }
//! }
//!
//! assert_eq!(status_of(&lookup("audioObject")), Status::Ok);
//! assert_eq!(status_of(&lookup("foo")), Status::NotFound);
//! assert_eq!(lookup("foo").unwrap_err().to_string(), "NOT_FOUND: Unknown element: foo");
//! ```
use std::fmt::{Debug, Display, Formatter};

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Enumerates the terminal status of an operation.
///
/// The numeric codes are stable and can be obtained via [Status::code].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, FromPrimitive)]
pub enum Status {
    /// The operation completed successfully.
    Ok = 0,
    /// A generic failure like malformed XML or an I/O problem.
    Error = 1,
    /// A required buffer or handle was not supplied.
    NullPointer = 2,
    /// An argument (e.g. an ADM id string) was malformed or not permitted.
    InvalidArgument = 3,
    /// A number exceeded the range which can be represented.
    OutOfRange = 4,
    /// The requested entity, descriptor or value doesn't exist.
    NotFound = 5,
    /// An entity already exists or a lookup matched more than one candidate.
    NotUnique = 6,
    /// A value didn't match the type declared for its attribute.
    ValueTypeMismatch = 7,
    /// A relationship references an entity which cannot be resolved.
    InvalidRelationship = 8,
}

impl Status {
    /// Returns the stable numeric code of this status.
    ///
    /// # Example
    /// ```
    /// # use adm::status::Status;
    /// assert_eq!(Status::Ok.code(), 0);
    /// assert_eq!(Status::InvalidRelationship.code(), 8);
    /// ```
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Resolves a numeric code back into a status.
    ///
    /// # Example
    /// ```
    /// # use adm::status::Status;
    /// assert_eq!(Status::from_code(5), Some(Status::NotFound));
    /// assert_eq!(Status::from_code(42), None);
    /// ```
    pub fn from_code(code: i32) -> Option<Status> {
        Status::from_i32(code)
    }

    /// Returns the symbolic name of this status.
    pub fn name(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
            Status::NullPointer => "NULL_POINTER",
            Status::InvalidArgument => "INVALID_ARGUMENT",
            Status::OutOfRange => "OUT_OF_RANGE",
            Status::NotFound => "NOT_FOUND",
            Status::NotUnique => "NOT_UNIQUE",
            Status::ValueTypeMismatch => "VALUE_TYPE_MISMATCH",
            Status::InvalidRelationship => "INVALID_RELATIONSHIP",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a failed operation.
///
/// This combines the [Status] which classifies the failure with the actual cause. If the
/// failure happened while processing XML input, the byte position within the input is also
/// recorded so that the [Container](crate::container::Container) can report a line number.
pub struct AdmError {
    status: Status,
    cause: anyhow::Error,
    position: Option<usize>,
}

/// Represents the result of all fallible operations of this crate.
pub type AdmResult<T> = std::result::Result<T, AdmError>;

/// Creates an [AdmError] for the given status and message.
///
/// # Example
///
/// ```
/// use adm::status::Status;
///
/// let error = adm::adm_error!(OutOfRange, "Block index {} is too large", 0x1_0000_0000_u64);
/// assert_eq!(error.status(), Status::OutOfRange);
/// ```
#[macro_export]
macro_rules! adm_error {
    ($status:ident, $err:expr $(,)?) => ({
        $crate::status::AdmError::new(
            $crate::status::Status::$status,
            $crate::anyhow::anyhow!($err),
        )
    });
    ($status:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::status::AdmError::new(
            $crate::status::Status::$status,
            $crate::anyhow::anyhow!($fmt, $($arg)*),
        )
    };
}

impl AdmError {
    /// Creates a new error with the given status and cause.
    pub fn new(status: Status, cause: anyhow::Error) -> Self {
        AdmError {
            status,
            cause,
            position: None,
        }
    }

    /// Returns the status which classifies this error.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Provides access to the underlying cause.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Returns the byte position within the XML input at which the error occurred, if known.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Wraps the cause with additional context while keeping the status.
    pub fn context<C>(self, context: C) -> Self
    where
        C: Display + Send + Sync + 'static,
    {
        AdmError {
            status: self.status,
            cause: self.cause.context(context),
            position: self.position,
        }
    }

    /// Records the byte position at which the error occurred unless one is already known.
    pub fn at_position(mut self, position: usize) -> Self {
        if self.position.is_none() {
            self.position = Some(position);
        }

        self
    }

    /// Replaces the status of this error while keeping its cause.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

impl Display for AdmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.status, self.cause)
    }
}

impl Debug for AdmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.status, self.cause)
    }
}

impl std::error::Error for AdmError {}

impl From<quick_xml::Error> for AdmError {
    fn from(error: quick_xml::Error) -> Self {
        AdmError::new(Status::Error, anyhow::anyhow!("Malformed XML: {}", error))
    }
}

impl From<std::io::Error> for AdmError {
    fn from(error: std::io::Error) -> Self {
        AdmError::new(Status::Error, anyhow::Error::new(error))
    }
}

/// Determines the terminal status of the given result.
pub fn status_of<T>(result: &AdmResult<T>) -> Status {
    match result {
        Ok(_) => Status::Ok,
        Err(error) => error.status(),
    }
}
