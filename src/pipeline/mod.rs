//! The ingestion pipeline.
//!
//! One cycle flows through:
//! 1. Fetching — one `MailFetch::fetch()` call
//! 2. Assembling — group the batch into conversations (`assembler`)
//! 3. Processing — summarize each message, bounded by a timeout
//! 4. Publishing gate — fingerprint de-dup, then notify + render + publish
//! 5. Sleeping — fixed interval until the next cycle
//!
//! Cycles never run concurrently and messages are summarized sequentially.
//! A failed cycle is logged and retried on the next interval; nothing short
//! of startup collaborator construction is fatal.

pub mod assembler;
pub mod dedup;
pub mod normalize;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::fetch::MailFetch;
use crate::hub::{PushHub, PushUpdate};
use crate::llm::Summarizer;
use crate::notify::Notifier;
use crate::pipeline::dedup::SeenStore;
use crate::render::{highlight_priority, render_markdown};

/// Collaborators injected into the pipeline.
pub struct PipelineDeps {
    pub fetcher: Arc<dyn MailFetch>,
    pub summarizer: Arc<dyn Summarizer>,
    pub seen: Box<dyn SeenStore>,
    pub hub: Arc<PushHub>,
    pub notifier: Notifier,
}

/// Counters from one completed cycle, for structured logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Raw messages returned by the provider.
    pub fetched: usize,
    /// Conversations assembled (including ones whose messages all dropped).
    pub conversations: usize,
    /// Updates pushed to the hub this cycle.
    pub published: usize,
    /// Messages skipped because their fingerprint was already seen.
    pub duplicates: usize,
}

/// Drives fetch → assemble → summarize → dedup-gate → publish on a fixed
/// interval.
pub struct Pipeline {
    deps: PipelineDeps,
    poll_interval: Duration,
    summarize_timeout: Duration,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps, poll_interval: Duration, summarize_timeout: Duration) -> Self {
        Self {
            deps,
            poll_interval,
            summarize_timeout,
        }
    }

    /// Run until `shutdown` signals. The first cycle starts immediately;
    /// afterwards cycles tick at the poll interval. A cycle in flight
    /// finishes before the shutdown takes effect.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.poll_interval);
        // A cycle can outlast the interval (slow model, big batch); don't
        // burst to catch up afterwards.
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.changed() => break,
            }
            match self.run_cycle().await {
                Ok(stats) => info!(
                    fetched = stats.fetched,
                    conversations = stats.conversations,
                    published = stats.published,
                    duplicates = stats.duplicates,
                    "Cycle complete"
                ),
                Err(e) => warn!(error = %e, "Cycle failed, retrying next interval"),
            }
        }
        info!("Pipeline stopped");
    }

    /// Run a single ingestion cycle.
    pub async fn run_cycle(&self) -> Result<CycleStats, PipelineError> {
        let batch = self.deps.fetcher.fetch().await?;
        let mut stats = CycleStats {
            fetched: batch.len(),
            ..CycleStats::default()
        };

        let conversations = assembler::assemble(&batch);
        stats.conversations = conversations.len();

        for conversation in &conversations {
            for message in &conversation.messages {
                let summary = self.summarize_or_placeholder(&message.body).await;

                let fp = dedup::fingerprint(&message.date, &message.from, &conversation.subject);
                if self.deps.seen.was_seen(&fp).await? {
                    stats.duplicates += 1;
                    continue;
                }
                self.deps.seen.mark_seen(&fp).await?;

                self.deps.notifier.notify(&conversation.subject);
                self.deps
                    .hub
                    .publish(PushUpdate {
                        date: message.date.clone(),
                        from: message.from.clone(),
                        subject: conversation.subject.clone(),
                        message: highlight_priority(&render_markdown(&summary)),
                        original: render_markdown(&message.body),
                    })
                    .await;
                stats.published += 1;
            }
        }

        Ok(stats)
    }

    /// Summarize one message body, converting failure or timeout into a
    /// visible placeholder so the message still reaches subscribers instead
    /// of silently vanishing.
    async fn summarize_or_placeholder(&self, body: &str) -> String {
        let call = self.deps.summarizer.summarize(body);
        match tokio::time::timeout(self.summarize_timeout, call).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                warn!(error = %e, "Summarization failed");
                format!("(error: {e})")
            }
            Err(_) => {
                warn!(timeout = ?self.summarize_timeout, "Summarization timed out");
                format!(
                    "(error: summarization timed out after {}s)",
                    self.summarize_timeout.as_secs()
                )
            }
        }
    }
}
