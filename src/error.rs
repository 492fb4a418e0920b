//! Error types for XLSX serialization.
//!
//! All errors are fatal for the output session that raised them; nothing in
//! the crate retries internally.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: sink or archive failures while streaming a part
//! - **Missing Serializer**: a value reached the dynamic dispatch path and no
//!   serializer is registered for its concrete runtime type
//! - **Max Depth Exceeded**: the nesting guard tripped, which usually means a
//!   circular reference in the record graph
//! - **Serializer Construction**: a custom serializer factory failed; the
//!   captured error is raised on first use of the affected type
//!
//! ## Examples
//!
//! ```rust
//! use excel_serializer::{Error, ExcelFormatter, ExcelSerializerOptions};
//!
//! let options = ExcelSerializerOptions::new().with_max_depth(1);
//! let mut formatter = ExcelFormatter::new(&options);
//!
//! let result = formatter.enter_and_validate();
//! assert!(matches!(result, Err(Error::MaxDepthExceeded { depth: 1 })));
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors that can occur while serializing records
/// into a spreadsheet package.
///
/// Null-ish values are never errors: `None` always serializes as an empty
/// cell. Resolution itself never fails either; only required lookups on the
/// dynamic dispatch table and the formatter guards produce errors.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while writing a sheet part or assembling the archive
    #[error("IO error: {0}")]
    Io(String),

    /// No serializer is registered for the concrete runtime type of a
    /// dynamically-typed cell value
    #[error("no serializer available for type `{type_name}`")]
    MissingSerializer { type_name: String },

    /// The traversal nesting guard tripped. Likely a circular reference.
    #[error("serializer reached max depth {depth}; check for circular references")]
    MaxDepthExceeded { depth: usize },

    /// A custom serializer factory failed to build. Captured at registration
    /// time and raised here, on first actual use of the affected type.
    #[error("failed to construct serializer for `{type_name}`: {message}")]
    SerializerConstruction { type_name: String, message: String },
}

impl Error {
    /// Creates an I/O error from a display message.
    pub fn io<T: fmt::Display>(msg: T) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates a missing-serializer error naming the unresolvable type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use excel_serializer::Error;
    ///
    /// let err = Error::missing_serializer("my_crate::Widget");
    /// assert!(err.to_string().contains("my_crate::Widget"));
    /// ```
    pub fn missing_serializer(type_name: &str) -> Self {
        Error::MissingSerializer {
            type_name: type_name.to_string(),
        }
    }

    /// Creates a max-depth error carrying the offending depth.
    pub fn max_depth(depth: usize) -> Self {
        Error::MaxDepthExceeded { depth }
    }

    /// Creates a construction error for a serializer override that failed to
    /// build.
    pub fn construction<T: fmt::Display>(type_name: &str, message: T) -> Self {
        Error::SerializerConstruction {
            type_name: type_name.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
