//! # Mirror Writer
//!
//! Single-writer queue in front of [`MirrorFile`].
//!
//! ## Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Mirror Access                                        │
//! │                                                                         │
//! │  record_scan ──┐                                                       │
//! │  record_scan ──┤  MirrorHandle (Clone)                                 │
//! │  rebuild     ──┤       │                                                │
//! │  restore     ──┤       │ mpsc (commands, each with a oneshot reply)    │
//! │  docs write  ──┘       │  (DocumentStore mutations: `exclusive`)       │
//! │                        ▼                                                │
//! │               ┌─────────────────────┐                                  │
//! │               │    MirrorWriter     │  one command at a time           │
//! │               │    (spawned task)   │                                  │
//! │               └─────────┬───────────┘                                  │
//! │                         ▼                                               │
//! │                 MirrorFile (spawn_blocking)                            │
//! │                                                                         │
//! │  An append is read-modify-write: no other operation may run between  │
//! │  its read and its write. Operations apply in queue order.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shutdown
//! [`MirrorHandle::shutdown`] stops intake; commands already queued are
//! still applied before the task exits.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use codescan_core::NewScanResult;

use crate::error::{ArchiveError, ArchiveResult};
use crate::mirror::MirrorFile;

/// Queue depth before callers start waiting.
const COMMAND_BUFFER: usize = 64;

enum MirrorCommand {
    Append {
        record: NewScanResult,
        reply: oneshot::Sender<ArchiveResult<()>>,
    },
    ReplaceAll {
        records: Vec<NewScanResult>,
        reply: oneshot::Sender<ArchiveResult<()>>,
    },
    Delete {
        reply: oneshot::Sender<ArchiveResult<bool>>,
    },
    ReadAll {
        reply: oneshot::Sender<ArchiveResult<Vec<NewScanResult>>>,
    },
    Exclusive {
        job: BlockingJob,
        reply: oneshot::Sender<ArchiveResult<()>>,
    },
}

/// Blocking file work queued behind mirror operations.
type BlockingJob = Box<dyn FnOnce() -> ArchiveResult<()> + Send + 'static>;

// =============================================================================
// Writer Task
// =============================================================================

/// Owns the mirror file and applies commands in arrival order.
pub struct MirrorWriter {
    file: MirrorFile,
    command_rx: mpsc::Receiver<MirrorCommand>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Cloneable handle for queueing mirror operations.
#[derive(Debug, Clone)]
pub struct MirrorHandle {
    command_tx: mpsc::Sender<MirrorCommand>,
    shutdown_tx: mpsc::Sender<()>,
}

impl MirrorWriter {
    /// Creates a writer and its handle. Call [`run`](Self::run) on a task.
    pub fn new(file: MirrorFile) -> (Self, MirrorHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer = MirrorWriter {
            file,
            command_rx,
            shutdown_rx,
        };
        let handle = MirrorHandle {
            command_tx,
            shutdown_tx,
        };

        (writer, handle)
    }

    /// Creates a writer and spawns it on the current runtime.
    pub fn spawn(file: MirrorFile) -> (MirrorHandle, JoinHandle<()>) {
        let (writer, handle) = MirrorWriter::new(file);
        let task = tokio::spawn(writer.run());
        (handle, task)
    }

    /// Runs until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!(path = %self.file.path().display(), "Mirror writer starting");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.apply(command).await,
                    None => break,
                },

                _ = self.shutdown_rx.recv() => {
                    debug!("Mirror writer draining queue");
                    self.command_rx.close();
                    while let Some(command) = self.command_rx.recv().await {
                        self.apply(command).await;
                    }
                    break;
                }
            }
        }

        info!("Mirror writer stopped");
    }

    async fn apply(&self, command: MirrorCommand) {
        match command {
            MirrorCommand::Append { record, reply } => {
                let result = self.file.append(record).await;
                log_failure("append", &result);
                let _ = reply.send(result);
            }
            MirrorCommand::ReplaceAll { records, reply } => {
                let result = self.file.write_all(records).await;
                log_failure("replace_all", &result);
                let _ = reply.send(result);
            }
            MirrorCommand::Delete { reply } => {
                let result = self.file.delete().await;
                log_failure("delete", &result);
                let _ = reply.send(result);
            }
            MirrorCommand::ReadAll { reply } => {
                let _ = reply.send(self.file.read_all().await);
            }
            MirrorCommand::Exclusive { job, reply } => {
                let result = match tokio::task::spawn_blocking(job).await {
                    Ok(result) => result,
                    Err(e) => Err(e.into()),
                };
                log_failure("exclusive", &result);
                let _ = reply.send(result);
            }
        }
    }
}

fn log_failure<T>(operation: &str, result: &ArchiveResult<T>) {
    if let Err(e) = result {
        error!(operation, error = %e, "Mirror operation failed");
    }
}

// =============================================================================
// Handle
// =============================================================================

impl MirrorHandle {
    /// Appends one record to the mirror.
    pub async fn append(&self, record: NewScanResult) -> ArchiveResult<()> {
        self.request(|reply| MirrorCommand::Append { record, reply })
            .await
    }

    /// Replaces the mirror with exactly `records`.
    pub async fn replace_all(&self, records: Vec<NewScanResult>) -> ArchiveResult<()> {
        self.request(|reply| MirrorCommand::ReplaceAll { records, reply })
            .await
    }

    /// Deletes the mirror file; `false` if there was none.
    pub async fn delete(&self) -> ArchiveResult<bool> {
        self.request(|reply| MirrorCommand::Delete { reply }).await
    }

    /// Reads the mirror, ordered after every previously queued write.
    pub async fn read_all(&self) -> ArchiveResult<Vec<NewScanResult>> {
        self.request(|reply| MirrorCommand::ReadAll { reply }).await
    }

    /// Runs blocking file work on the writer's queue, so it never overlaps
    /// a mirror operation. Used for other writes under the mirror's folder.
    pub async fn exclusive<F>(&self, job: F) -> ArchiveResult<()>
    where
        F: FnOnce() -> ArchiveResult<()> + Send + 'static,
    {
        self.request(|reply| MirrorCommand::Exclusive {
            job: Box::new(job),
            reply,
        })
        .await
    }

    /// Stops accepting new commands once the queue drains.
    pub async fn shutdown(&self) -> ArchiveResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| ArchiveError::WriterClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<ArchiveResult<T>>) -> MirrorCommand,
    ) -> ArchiveResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ArchiveError::WriterClosed)?;
        reply_rx.await.map_err(|_| ArchiveError::WriterClosed)?
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use codescan_core::CodeType;
    use std::collections::HashSet;

    fn record(content: String) -> NewScanResult {
        NewScanResult::new(content)
            .with_code_type(CodeType::QrCode)
            .with_timestamp(1_700_000_000_000)
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, task) = MirrorWriter::spawn(MirrorFile::in_data_dir(dir.path()));

        let mut joins = Vec::new();
        for i in 0..25 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                handle.append(record(format!("scan-{i}"))).await
            }));
        }
        for join in joins {
            join.await.unwrap().unwrap();
        }

        let contents: HashSet<String> = handle
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert_eq!(contents.len(), 25);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_all_then_append_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, _task) = MirrorWriter::spawn(MirrorFile::in_data_dir(dir.path()));

        handle
            .replace_all(vec![record("a".into()), record("b".into())])
            .await
            .unwrap();
        handle.append(record("c".into())).await.unwrap();

        let contents: Vec<String> = handle
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);

        assert!(handle.delete().await.unwrap());
        assert!(handle.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commands_after_shutdown_fail() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, task) = MirrorWriter::spawn(MirrorFile::in_data_dir(dir.path()));

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let err = handle.append(record("late".into())).await.unwrap_err();
        assert!(matches!(err, ArchiveError::WriterClosed));
    }
}
