use std::any::Any;

use diesel::SqliteConnection;
use log::error;
use tokio::sync::{mpsc, oneshot};

use repricer_core::errors::{DatabaseError, Error, Result};

use super::DbPool;
use crate::errors::StorageError;

type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type Erased = Box<dyn Any + Send + 'static>;
type Envelope = (Job<Erased>, oneshot::Sender<Result<Erased>>);

const QUEUE_DEPTH: usize = 1024;

/// Handle to the single writer connection.
///
/// Every job runs inside its own `BEGIN IMMEDIATE` transaction, one at a time,
/// so existence checks and inserts issued by one job never interleave with
/// another writer.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Queues `job` on the writer and waits for its result.
    ///
    /// An `Err` returned by the job rolls its transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();
        let erased: Job<Erased> = Box::new(move |c: &mut SqliteConnection| {
            job(c).map(|v| Box::new(v) as Erased)
        });

        self.tx
            .send((erased, ret_tx))
            .await
            .map_err(|_| writer_gone("Writer is no longer accepting jobs"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_gone("Writer dropped the job without replying"))??;

        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| writer_gone("Writer returned a value of the wrong type"))
    }
}

fn writer_gone(message: &str) -> Error {
    Error::Database(DatabaseError::Internal(message.to_string()))
}

/// Spawns the writer task. It holds one pooled connection for its lifetime and
/// stops once every [`WriteHandle`] is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                // Dropping rx makes every exec() fail with an Internal error.
                error!("Writer could not acquire a database connection: {}", e);
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Erased> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(Error::from);

            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
