use thiserror::Error;

use crate::{host::HostError, metadata::token::Token};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Most public entry points of this crate never hand these errors to the caller. Metadata
/// resolvers collapse them into `None`, and the rule loader skips the offending file or entry.
/// The `try_*` variants and the method-spec builder expose them for callers that need the
/// precise failure.
///
/// # Error Categories
///
/// ## Host Errors
/// - [`Error::Host`] - The runtime's introspection or emission capability reported a failure
/// - [`Error::NullHandle`] - A null assembly or module handle was passed in
/// - [`Error::InvalidToken`] - A token was null or of the wrong shape
/// - [`Error::UnexpectedTokenKind`] - A token referred to a different metadata table than required
/// - [`Error::EmptySignature`] - A signature blob was required but empty
///
/// ## Rule File Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Parse`] - The document is not valid JSON
/// - [`Error::InvalidRuleFile`] - The document is JSON, but not an array of integrations
/// - [`Error::InvalidIntegration`] - A single integration entry could not be used
/// - [`Error::Malformed`] - A single rule element is malformed
///
/// # Examples
///
/// ```rust
/// use dotprobe::{Error, integrations::load_integrations_from_str};
///
/// match load_integrations_from_str("{}") {
///     Ok(integrations) => println!("Loaded {} integrations", integrations.len()),
///     Err(Error::InvalidRuleFile(message)) => eprintln!("Not a rule file: {}", message),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The host runtime reported a failure status.
    ///
    /// Wraps the status code and the name of the host operation that failed.
    #[error("{0}")]
    Host(#[from] HostError),

    /// A runtime handle of the given kind was null.
    #[error("Null {0} handle")]
    NullHandle(&'static str),

    /// The token is null, or not a token this operation can use.
    #[error("Invalid token - {0}")]
    InvalidToken(Token),

    /// The token refers to a metadata table this operation does not handle.
    ///
    /// # Fields
    ///
    /// * `token` - The offending token
    /// * `expected` - Human readable list of the accepted token kinds
    #[error("Unexpected token kind - {token}, expected {expected}")]
    UnexpectedTokenKind {
        /// The offending token
        token: Token,
        /// The token kinds accepted by the failing operation
        expected: &'static str,
    },

    /// An instantiation signature was required but the blob is empty.
    #[error("Signature blob is empty")]
    EmptySignature,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading rule files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The rule document is not valid JSON.
    #[error("{0}")]
    Parse(#[from] serde_json::Error),

    /// The rule document is valid JSON but its root is not an array.
    #[error("Invalid rule file - {0}")]
    InvalidRuleFile(String),

    /// An integration entry is unusable, e.g. because it has no name.
    #[error("Invalid integration - {0}")]
    InvalidIntegration(String),

    /// A rule element is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
