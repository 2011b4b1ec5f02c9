use crate::protocol::TransactionStatus;

/// The lifecycle state of a [`Connection`](crate::Connection).
///
/// After every completed flow the state reflects the transaction state byte
/// of the terminating `ReadyForCommand`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    /// The transport is not established yet.
    Unconnected,
    /// The handshake is running.
    Authenticating,
    /// Outside any transaction, ready for the next command.
    Ready,
    /// Inside an open transaction.
    InTransaction,
    /// Inside a transaction that has failed; only `ROLLBACK` is valid.
    InFailedTransaction,
    /// The connection is closed; every further operation fails.
    Closed,
}

impl From<TransactionStatus> for ConnectionState {
    fn from(status: TransactionStatus) -> ConnectionState {
        match status {
            TransactionStatus::Idle => ConnectionState::Ready,
            TransactionStatus::InTransaction => ConnectionState::InTransaction,
            TransactionStatus::InFailedTransaction => ConnectionState::InFailedTransaction,
        }
    }
}
