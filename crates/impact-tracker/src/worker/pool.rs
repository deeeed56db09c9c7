use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};
use tokio::sync::broadcast;

use crate::broadcast::job_progress::JobProgressEvent;
use crate::db::Database;
use crate::ingest::progress::{BroadcastProgress, NoopProgress};
use crate::ingest::IngestPipeline;

/// One dispatched ingestion run: the pending job's id plus the decoded
/// file content the upload endpoint already accepted.
#[derive(Debug, Clone)]
pub struct IngestTask {
    pub job_id: String,
    pub file_content: String,
}

pub struct WorkerPool {
    task_sender: Sender<IngestTask>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(db: Database, worker_count: usize) -> Self {
        Self::with_progress_sender(db, worker_count, None)
    }

    /// Creates a new worker pool with an optional job progress broadcaster.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn with_progress_sender(
        db: Database,
        worker_count: usize,
        progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (task_sender, task_receiver) = bounded::<IngestTask>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_db = db.clone();
            let sender = progress_sender.clone();

            let handle = thread::spawn(move || {
                run_worker(worker_id, task_rx, shutdown_flag, worker_db, sender);
            });

            workers.push(handle);
        }

        info!("Started {} ingest workers", worker_count);

        Self {
            task_sender,
            workers,
            shutdown,
        }
    }

    pub fn submit(&self, task: IngestTask) -> Result<(), crate::error::WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(crate::error::WorkerError::ChannelClosed);
        }

        self.task_sender
            .send(task)
            .map_err(|_| crate::error::WorkerError::ChannelClosed)
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.task_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<IngestTask>,
    shutdown: Arc<AtomicBool>,
    db: Database,
    progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
) {
    debug!("Worker {} started", worker_id);

    let pipeline = IngestPipeline::new(db);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match task_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(task) => {
                debug!("Worker {} processing job {}", worker_id, task.job_id);

                if let Some(ref sender) = progress_sender {
                    let progress = BroadcastProgress::new(&task.job_id, Arc::clone(sender));
                    pipeline.run(&task.job_id, &task.file_content, &progress);
                } else {
                    pipeline.run(&task.job_id, &task.file_content, &NoopProgress);
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} task channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
