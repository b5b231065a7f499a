use std::path::PathBuf;

use goimpl_parser::ParseFailure;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a resolution or generation run can fail.
///
/// Messages carry the identifier the user typed so a failure can be traced
/// back to its input without a debugger.
#[derive(Debug, Error)]
pub enum Error {
    // Parse errors
    #[error("couldn't parse interface: {0}")]
    UnparsableInterface(String),
    #[error("interface name cannot end with a '/' character: {0}")]
    TrailingSlash(String),
    #[error("interface name cannot end with a '.' character: {0}")]
    TrailingDot(String),
    #[error("invalid interface name: {0}")]
    InvalidInterfaceName(String),
    #[error("invalid type arguments in {input}: {reason}")]
    InvalidTypeArgs { input: String, reason: String },
    #[error("invalid receiver: {0:?}")]
    InvalidReceiver(String),

    // Lookup errors
    #[error("unrecognized interface: {0}")]
    UnrecognizedInterface(String),
    #[error("couldn't find package {path}: {reason}")]
    PackageNotFound { path: String, reason: String },
    #[error("couldn't find package in {}: {reason}", dir.display())]
    NoPackageInDir { dir: PathBuf, reason: String },
    #[error("found packages {first} and {second} in {}", dir.display())]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
    #[error("type {name} not found in {package}")]
    TypeNotFound { name: String, package: String },
    #[error("interface {iface} not found: {source}")]
    InterfaceNotFound {
        iface: String,
        #[source]
        source: Box<Error>,
    },

    // Shape errors
    #[error("not an interface: {0}")]
    NotInterface(String),
    #[error("empty interface: {0}")]
    EmptyInterface(String),
    #[error("interface {0} contains type constraints and has no method set to implement")]
    ConstraintInterface(String),
    #[error("interface embedding cycle: {}", chain.join(" -> "))]
    EmbeddingCycle { chain: Vec<String> },

    // I/O and syntax
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {failure}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        failure: ParseFailure,
    },
    /// The generated buffer did not parse. `source_text` is the buffer.
    #[error("error formatting source: {message}")]
    Format { message: String, source_text: String },

    // Output targets
    #[error("{0}")]
    Position(String),
    #[error("requested receiver not found: {0}")]
    ReceiverNotFound(String),
    #[error("invalid overlay archive: {0}")]
    Overlay(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(iface: &str, source: Error) -> Self {
        Error::InterfaceNotFound {
            iface: iface.to_string(),
            source: Box::new(source),
        }
    }
}
