//! All writes go through one dedicated connection on its own thread, each job
//! in an immediate transaction. Readers use the pool.

use diesel::sqlite::SqliteConnection;
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};

use fueltrack_core::errors::{Error, Result};

use super::{get_connection, DbPool};
use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<Job>,
}

impl WriteHandle {
    /// Runs `job` inside a write transaction and returns its result. A job
    /// error rolls the transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let wrapped: Job = Box::new(move |conn: &mut SqliteConnection| {
            let outcome = conn
                .immediate_transaction::<T, StorageError, _>(|tx| job(tx).map_err(StorageError::from))
                .map_err(Error::from);
            let _ = reply_tx.send(outcome);
        });

        self.sender
            .send(wrapped)
            .map_err(|_| Error::from(StorageError::WriterClosed))?;
        reply_rx
            .await
            .map_err(|_| Error::from(StorageError::WriterClosed))?
    }
}

/// Starts the writer thread with one connection checked out of `pool`. The
/// thread exits once every handle is dropped.
pub fn spawn_writer(pool: &DbPool) -> Result<WriteHandle> {
    let mut conn = get_connection(pool)?;
    let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

    std::thread::Builder::new()
        .name("fueltrack-writer".to_string())
        .spawn(move || {
            while let Some(job) = receiver.blocking_recv() {
                job(&mut *conn);
            }
            debug!("[Storage] Writer stopped");
        })
        .map_err(|e| {
            error!("[Storage] Failed to start writer thread: {}", e);
            Error::Unexpected(format!("Failed to start writer thread: {}", e))
        })?;

    Ok(WriteHandle { sender })
}
