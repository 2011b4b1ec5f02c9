use crate::{EdbError, EdbResult};

pub(crate) mod buffer;
pub(crate) mod codecs;
pub(crate) mod message_type;
pub(crate) mod reply;
pub(crate) mod request;
pub(crate) mod server_error;
pub(crate) mod value;

/// Declares how many rows a query may return.
///
/// The flow engine enforces the declared cardinality against the rows that
/// actually arrive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cardinality {
    /// The query returns no rows at all; any data row is an error.
    NoResult,
    /// The query returns zero or one rows.
    AtMostOne,
    /// The query returns exactly one row.
    One,
    /// The query returns any number of rows.
    Many,
}
impl Cardinality {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::NoResult => 0x6e,
            Self::AtMostOne => 0x6f,
            Self::One => 0x41,
            Self::Many => 0x6d,
        }
    }
}

/// The serialization format in which result rows are requested.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    /// Rows are binary-encoded through the codec tree.
    Binary,
    /// Rows arrive as JSON strings.
    Json,
}
impl OutputFormat {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Binary => 0x62,
            Self::Json => 0x6a,
        }
    }
}

// The one-byte transaction state carried by every ReadyForCommand message.
// It is authoritative for the connection state after a flow.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum TransactionStatus {
    Idle,
    InTransaction,
    InFailedTransaction,
}
impl TransactionStatus {
    pub(crate) fn from_u8(val: u8) -> EdbResult<Self> {
        match val {
            0x49 => Ok(Self::Idle),
            0x54 => Ok(Self::InTransaction),
            0x45 => Ok(Self::InFailedTransaction),
            _ => Err(EdbError::Protocol(format!(
                "invalid transaction state byte 0x{val:x}"
            ))),
        }
    }
}

// The aspect requested with DescribeStatement.
pub(crate) const ASPECT_DATA_DESCRIPTION: u8 = 0x54;
