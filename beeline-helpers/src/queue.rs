use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio::time::delay_for;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// The submit side of the queue dropped before the job could be accepted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QueueClosed;

/// Handle for pushing work onto a bounded-concurrency FIFO executor.
#[derive(Clone)]
pub struct SubmitQueue {
    jobs: mpsc::Sender<Job>,
}

/// Task that dispatches queued jobs, keeping at most `concurrent` of them
/// in flight and pacing dispatches by `delay`.
pub struct SubmitWorker {
    jobs: mpsc::Receiver<Job>,
    concurrent: usize,
    delay: Duration,
}

pub fn submit_queue(concurrent: usize, delay: Duration) -> (SubmitQueue, SubmitWorker) {
    let (jobs_tx, jobs_rx) = mpsc::channel(1);

    let queue = SubmitQueue { jobs: jobs_tx };
    let worker = SubmitWorker {
        jobs: jobs_rx,
        concurrent: concurrent.max(1),
        delay,
    };

    (queue, worker)
}

impl SubmitQueue {
    pub async fn push<F>(&self, future: F) -> Result<(), QueueClosed>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.jobs
            .clone()
            .send(Box::pin(future))
            .await
            .map_err(|_| QueueClosed)
    }
}

impl SubmitWorker {
    pub async fn task(mut self) {
        let mut in_flight = FuturesUnordered::new();
        let mut active = 0;

        loop {
            tokio::select! {
                job = self.jobs.recv(), if active < self.concurrent => {
                    match job {
                        Some(job) => {
                            if self.delay > Duration::from_millis(0) {
                                delay_for(self.delay).await;
                            }
                            in_flight.push(job);
                            active += 1;
                        }
                        None => break,
                    }
                }
                Some(()) = in_flight.next() => {
                    active -= 1;
                }
            }
        }

        // The queue side is gone; let the remaining jobs finish.
        while in_flight.next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn dispatches_in_push_order() {
        let (queue, worker) = submit_queue(1, Duration::from_millis(0));
        tokio::spawn(worker.task());

        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let order = order.clone();
            queue
                .push(async move {
                    order.lock().unwrap().push(i);
                })
                .await
                .unwrap();
        }

        // A final job signals that everything before it ran.
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        queue
            .push(async move {
                let _ = done_tx.send(());
            })
            .await
            .unwrap();
        done_rx.await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn bounds_concurrency() {
        let (queue, worker) = submit_queue(2, Duration::from_millis(0));
        tokio::spawn(worker.task());

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut receivers = Vec::new();
        for _ in 0..6 {
            let active = active.clone();
            let peak = peak.clone();
            let (tx, rx) = tokio::sync::oneshot::channel();
            receivers.push(rx);
            queue
                .push(async move {
                    let running = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(running, Ordering::SeqCst);
                    delay_for(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    let _ = tx.send(());
                })
                .await
                .unwrap();
        }

        for rx in receivers {
            rx.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn push_fails_after_worker_drop() {
        let (queue, worker) = submit_queue(2, Duration::from_millis(0));
        drop(worker);

        assert_eq!(queue.push(async {}).await, Err(QueueClosed));
    }
}
