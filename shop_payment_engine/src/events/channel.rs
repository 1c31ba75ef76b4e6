//! In-process pub-sub for engine events
//!
//! [`EventChannel`] is a bounded, single-consumer queue. Any number of [`EventProducer`]s can publish onto it, and
//! exactly one consumer drains it by calling [`EventChannel::subscribe`], which hands back a lazy stream. The stream
//! ends once every producer has been dropped, and that is how shutdown propagates through the system.
//!
//! [`EventHandler`] sits on top of a channel and runs an async handler for every event received. The handlers are
//! stateless, i.e. they have no access to the internal state of the engine. All that is received is the event itself.
//!
//! Nothing here is persisted. Events that are in the queue when the process dies are lost.
use std::{future::Future, pin::Pin, sync::Arc};

use futures_util::{FutureExt, Stream, StreamExt};
use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

//--------------------------------------     EventChannel      ---------------------------------------------------------
pub struct EventChannel<E: Send + 'static> {
    sender: mpsc::Sender<E>,
    receiver: mpsc::Receiver<E>,
}

impl<E: Send + 'static> EventChannel<E> {
    /// Creates a channel that holds at most `buffer_size` undelivered events. Publishers wait for capacity once the
    /// buffer is full; events are never dropped because the consumer is slow.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { sender, receiver }
    }

    pub fn producer(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Consumes the channel and returns the stream of events. The stream cannot be restarted, and it ends when the last
    /// producer is dropped.
    pub fn subscribe(self) -> impl Stream<Item = E> + Send + 'static {
        // drop the internal sender so that when the last producer is dropped, the stream ends
        let Self { sender, receiver } = self;
        drop(sender);
        futures_util::stream::unfold(receiver, |mut rx| async move { rx.recv().await.map(|ev| (ev, rx)) })
    }
}

//--------------------------------------     EventHandler      ---------------------------------------------------------
pub struct EventHandler<E: Send + 'static> {
    channel: EventChannel<E>,
    handler: Handler<E>,
}

impl<E: Send + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        Self { channel: EventChannel::new(buffer_size), handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        self.channel.producer()
    }

    /// Runs the handler for every event, in the order they were published. Each event is handled on its own task, so
    /// a slow handler does not hold up the queue.
    ///
    /// Returns once all producers have been dropped and every handler that was started has finished.
    pub async fn start_handler(self) {
        debug!("📬️ Starting event handler");
        let Self { channel, handler } = self;
        let events = channel.subscribe();
        futures_util::pin_mut!(events);
        let mut jobs = JoinSet::new();
        while let Some(ev) = events.next().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&handler);
            jobs.spawn(async move {
                (handler)(ev).await;
                trace!("📬️ Event handled");
            });
            // Reap whatever has finished so that a long-lived handler does not accumulate completed jobs
            while let Some(Some(result)) = jobs.join_next().now_or_never() {
                log_job_result(result);
            }
        }
        if !jobs.is_empty() {
            debug!("📬️ Waiting for {} jobs to complete", jobs.len());
        }
        while let Some(result) = jobs.join_next().await {
            log_job_result(result);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn log_job_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!("📬️ An event handler job failed: {e}");
    }
}

//--------------------------------------     EventProducer     ---------------------------------------------------------
#[derive(Clone)]
pub struct EventProducer<E: Send> {
    sender: mpsc::Sender<E>,
}

impl<E: Send> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues the event, waiting for buffer space if necessary. If the consumer has gone away, the event is dropped
    /// and an error is logged.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
