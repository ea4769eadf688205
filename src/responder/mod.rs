use crate::event::AppEvent;
use crate::session::ScheduledReply;
use log::debug;
use std::sync::mpsc;
use tokio::runtime::Handle;
use tokio::time::{self, Duration};

#[derive(Debug, Clone)]
pub struct ReplyConfig {
    pub delay: Duration,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

/// Delivers scheduled replies after a fixed delay, standing in for the
/// character's "thinking time". Each submission gets its own sleep task;
/// staleness is decided at delivery by the controller, not here, so a task
/// firing after teardown costs nothing but a dropped event.
#[derive(Clone)]
pub struct ReplyScheduler {
    runtime_handle: Handle,
    tx: mpsc::Sender<AppEvent>,
    config: ReplyConfig,
}

impl ReplyScheduler {
    pub fn new(runtime_handle: Handle, tx: mpsc::Sender<AppEvent>, config: ReplyConfig) -> Self {
        Self {
            runtime_handle,
            tx,
            config,
        }
    }

    pub fn delay(&self) -> Duration {
        self.config.delay
    }

    pub fn schedule(&self, reply: ScheduledReply) {
        let tx = self.tx.clone();
        let delay = self.config.delay;

        debug!("reply scheduled: generation={}", reply.generation);
        self.runtime_handle.spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(AppEvent::ReplyReady {
                generation: reply.generation,
                text: reply.text,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{ReplyConfig, ReplyScheduler};
    use crate::event::AppEvent;
    use crate::session::ScheduledReply;
    use std::sync::mpsc;
    use tokio::runtime::Handle;
    use tokio::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn scheduled_reply_arrives_with_captured_generation() {
        let (tx, rx) = mpsc::channel();
        let scheduler = ReplyScheduler::new(
            Handle::current(),
            tx,
            ReplyConfig {
                delay: Duration::from_millis(10),
            },
        );

        scheduler.schedule(ScheduledReply {
            generation: 7,
            text: "ответ".to_string(),
        });

        let event = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(2)))
            .await
            .expect("receiver task should join")
            .expect("reply event should arrive");
        let AppEvent::ReplyReady { generation, text } = event;
        assert_eq!(generation, 7);
        assert_eq!(text, "ответ");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn each_submission_gets_its_own_delivery() {
        let (tx, rx) = mpsc::channel();
        let scheduler = ReplyScheduler::new(
            Handle::current(),
            tx,
            ReplyConfig {
                delay: Duration::from_millis(5),
            },
        );

        for _ in 0..3 {
            scheduler.schedule(ScheduledReply {
                generation: 1,
                text: "ответ".to_string(),
            });
        }

        let received = tokio::task::spawn_blocking(move || {
            (0..3)
                .map(|_| rx.recv_timeout(Duration::from_secs(2)))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .expect("receiver task should join")
        .expect("all three replies should arrive");
        assert_eq!(received.len(), 3);
    }
}
