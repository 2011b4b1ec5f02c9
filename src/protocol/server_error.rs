use std::error::Error;

/// Severity of a message sent by the server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// The request could not be answered; the connection stays usable.
    Error,
    /// A fatal, session-terminating error occured.
    Fatal,
    /// The server cannot continue at all.
    Panic,

    /// A severity value this client does not know.
    __UNKNOWN__(u8),
}
impl Severity {
    pub(crate) fn from_u8(i: u8) -> Self {
        match i {
            120 => Self::Error,
            200 => Self::Fatal,
            255 => Self::Panic,
            i => Self::__UNKNOWN__(i),
        }
    }
    /// Returns the number encoding of the severity.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Error => 120,
            Self::Fatal => 200,
            Self::Panic => 255,
            Self::__UNKNOWN__(i) => i,
        }
    }
}
impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Self::Error => write!(f, "Error")?,
            Self::Fatal => write!(f, "Fatal error")?,
            Self::Panic => write!(f, "Panic")?,
            Self::__UNKNOWN__(i) => write!(f, "Message of unknown severity ({i})")?,
        }
        Ok(())
    }
}

/// Describes an error that is reported by the database server in an
/// `ErrorResponse` message.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerError {
    severity: Severity,
    code: u32,
    message: String,
    attributes: Vec<(u16, String)>,
}

impl ServerError {
    pub(crate) fn new(
        severity: Severity,
        code: u32,
        message: String,
        attributes: Vec<(u16, String)>,
    ) -> Self {
        Self {
            severity,
            code,
            message,
            attributes,
        }
    }

    /// Returns the Severity of the error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the error code.
    #[must_use]
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Returns the description of the error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the error attributes the server attached, as pairs of
    /// attribute code and value.
    #[must_use]
    pub fn attributes(&self) -> &[(u16, String)] {
        &self.attributes
    }
}

impl Error for ServerError {}

impl std::fmt::Display for ServerError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            r#"{} [code: 0x{:08x}]: "{}""#,
            self.severity, self.code, self.message
        )
    }
}

impl std::fmt::Debug for ServerError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self}")
    }
}
