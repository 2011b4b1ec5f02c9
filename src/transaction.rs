use crate::protocol::value::QueryArgs;
use crate::protocol::{Cardinality, OutputFormat};
use crate::rows::RowSink;
use crate::{Connection, EdbError, EdbResult};

/// An explicit transaction.
///
/// The transaction borrows its connection exclusively, so no command can
/// bypass it while it is alive. The object is one-shot: once `commit` or
/// `rollback` has completed, every further operation fails with a usage
/// error.
///
/// ```rust,no_run
/// use edbconnect::Connection;
/// # fn main() -> edbconnect::EdbResult<()> {
/// let mut connection = Connection::connect("edgedb://edgedb@localhost:5656/edgedb")?;
/// let mut tx = connection.begin_transaction();
/// tx.start()?;
/// tx.execute_script("INSERT User { name := 'trillian' };")?;
/// tx.commit()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Transaction<'a> {
    connection: &'a mut Connection,
    started: bool,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(connection: &'a mut Connection) -> Transaction<'a> {
        Transaction {
            connection,
            started: false,
            finished: false,
        }
    }

    /// Starts the transaction on the server.
    pub fn start(&mut self) -> EdbResult<()> {
        self.assert_open()?;
        if self.started {
            return Err(EdbError::Usage("transaction is already started"));
        }
        self.connection.execute_script("START TRANSACTION")?;
        self.started = true;
        Ok(())
    }

    /// Commits the transaction; the object is finished afterwards.
    pub fn commit(&mut self) -> EdbResult<()> {
        self.assert_started()?;
        self.connection.execute_script("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    /// Rolls the transaction back; the object is finished afterwards.
    ///
    /// Rollback is also the only valid command after a statement inside
    /// the transaction has failed.
    pub fn rollback(&mut self) -> EdbResult<()> {
        self.assert_started()?;
        self.connection.execute_script("ROLLBACK")?;
        self.finished = true;
        Ok(())
    }

    /// Executes an EdgeQL script within the transaction.
    pub fn execute_script(&mut self, query: &str) -> EdbResult<()> {
        self.assert_started()?;
        self.connection.execute_script(query)
    }

    /// Executes a typed query within the transaction.
    pub fn query(
        &mut self,
        query: &str,
        args: &QueryArgs,
        sink: &mut dyn RowSink,
        cardinality: Cardinality,
        format: OutputFormat,
    ) -> EdbResult<()> {
        self.assert_started()?;
        self.connection
            .query(query, args, sink, cardinality, format)
    }

    fn assert_open(&self) -> EdbResult<()> {
        if self.finished {
            Err(EdbError::Usage(
                "transaction was already committed or rolled back",
            ))
        } else {
            Ok(())
        }
    }

    fn assert_started(&self) -> EdbResult<()> {
        self.assert_open()?;
        if self.started {
            Ok(())
        } else {
            Err(EdbError::Usage("transaction was not started"))
        }
    }
}

impl Drop for Transaction<'_> {
    // an abandoned open transaction is rolled back, best effort
    fn drop(&mut self) {
        if self.started && !self.finished {
            debug!("rolling back an unfinished transaction");
            self.connection.execute_script("ROLLBACK").ok();
        }
    }
}
