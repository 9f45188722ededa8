//! In-process background jobs: scrape a product page, then hand the scraped
//! metadata to an AI job that drafts an SEO title and description.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::gemini::TextGenerator;
use crate::models::ScrapedProduct;
use crate::notify::{Notifier, ToastKind};
use crate::scrape::ProductScraper;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid URL: {0}")] InvalidUrl(String),
    #[error("Domain not allowed: {0}")] DomainNotAllowed(String),
    #[error("Job not found for payloadId: {0}")] NotFound(Uuid),
    #[error("Scrape failed: {0}")] Scrape(String),
    #[error("AI generation failed: {0}")] Generation(String),
    #[error("Job queue is closed")] QueueClosed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum JobSpec {
    Scrape { url: String },
    Ai { metadata: ScrapedProduct },
}

impl JobSpec {
    pub fn name(&self) -> &'static str {
        match self {
            JobSpec::Scrape { .. } => "scrape",
            JobSpec::Ai { .. } => "ai",
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Waiting,
    Active,
    Completed,
    Failed,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub payload_id: Uuid,
    pub spec: JobSpec,
    pub status: JobStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct Shared {
    jobs: RwLock<HashMap<Uuid, Job>>,
    sender: RwLock<Option<mpsc::UnboundedSender<Uuid>>>,
    allowed_domains: Vec<String>,
    history: usize,
    scraper: Arc<dyn ProductScraper>,
    generator: Arc<dyn TextGenerator>,
    notifier: Notifier,
}

#[derive(Clone)]
pub struct JobQueue {
    shared: Arc<Shared>,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl JobQueue {
    /// Spawns `concurrency` workers pulling from one channel. At most
    /// `history` finished (completed or failed) records are kept; the oldest
    /// are evicted first. Waiting and active jobs are never evicted.
    pub fn start(
        concurrency: usize,
        history: usize,
        allowed_domains: Vec<String>,
        scraper: Arc<dyn ProductScraper>,
        generator: Arc<dyn TextGenerator>,
        notifier: Notifier,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Uuid>();
        let receiver = Arc::new(Mutex::new(receiver));
        let shared = Arc::new(Shared {
            jobs: RwLock::new(HashMap::new()),
            sender: RwLock::new(Some(sender)),
            allowed_domains: allowed_domains.into_iter().map(|d| d.trim().to_lowercase()).filter(|d| !d.is_empty()).collect(),
            history,
            scraper,
            generator,
            notifier,
        });

        let workers = (0..concurrency.max(1))
            .map(|worker| {
                let shared = Arc::clone(&shared);
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(job_id) = next else { break };
                        process(&shared, job_id).await;
                    }
                    info!(worker, "job worker stopped");
                })
            })
            .collect();

        info!(concurrency, "🚀 Job queue started");
        Self { shared, workers: Arc::new(Mutex::new(workers)) }
    }

    /// Queues a job. A missing payload id gets a fresh one.
    pub fn schedule(&self, spec: JobSpec, payload_id: Option<Uuid>) -> Result<Uuid, JobError> {
        let payload_id = payload_id.unwrap_or_else(Uuid::new_v4);
        enqueue(&self.shared, spec, payload_id)?;
        Ok(payload_id)
    }

    /// Re-queues the newest waiting or failed job for the payload id.
    pub fn retry(&self, payload_id: Uuid) -> Result<Uuid, JobError> {
        let spec = {
            let jobs = self.shared.jobs.read();
            jobs.values()
                .filter(|j| j.payload_id == payload_id && matches!(j.status, JobStatus::Waiting | JobStatus::Failed))
                .max_by_key(|j| j.created_at)
                .map(|j| j.spec.clone())
        };
        let spec = spec.ok_or(JobError::NotFound(payload_id))?;
        info!(%payload_id, job = spec.name(), "🔄 Retrying job");
        enqueue(&self.shared, spec, payload_id)?;
        Ok(payload_id)
    }

    /// All jobs for a payload, oldest first.
    pub fn jobs_for(&self, payload_id: Uuid) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.shared.jobs.read().values().filter(|j| j.payload_id == payload_id).cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Stops accepting jobs and waits for the workers to drain the channel.
    pub async fn shutdown(&self) {
        self.shared.sender.write().take();
        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                error!("❌ Job worker ended abnormally: {}", e);
            }
        }
        info!("Job queue shut down");
    }
}

fn enqueue(shared: &Shared, spec: JobSpec, payload_id: Uuid) -> Result<(), JobError> {
    let now = Utc::now();
    let job = Job {
        id: Uuid::new_v4(),
        payload_id,
        spec,
        status: JobStatus::Waiting,
        attempts: 0,
        last_error: None,
        result: None,
        created_at: now,
        updated_at: now,
    };
    let id = job.id;
    let sender = shared.sender.read();
    let sender = sender.as_ref().ok_or(JobError::QueueClosed)?;
    shared.jobs.write().insert(id, job);
    sender.send(id).map_err(|_| JobError::QueueClosed)
}

async fn process(shared: &Shared, job_id: Uuid) {
    let Some((spec, payload_id)) = update(shared, job_id, |job| {
        job.status = JobStatus::Active;
        job.attempts += 1;
    })
    .map(|job| (job.spec, job.payload_id)) else {
        warn!(%job_id, "job vanished before processing");
        return;
    };

    let outcome = match &spec {
        JobSpec::Scrape { url } => run_scrape(shared, url, payload_id).await.map(|_| None),
        JobSpec::Ai { metadata } => run_ai(shared, metadata).await.map(Some),
    };

    match outcome {
        Ok(result) => {
            info!(%payload_id, "Job {} [{}] completed", spec.name(), job_id);
            shared.notifier.show(format!("Job {} finished for {}", spec.name(), payload_id), ToastKind::Info, None);
            finish(shared, job_id, |job| {
                job.status = JobStatus::Completed;
                job.result = result;
            });
        }
        Err(e) => {
            error!(%payload_id, "Job {} [{}] failed: {}", spec.name(), job_id, e);
            shared.notifier.show(format!("Job {} failed: {}", spec.name(), e), ToastKind::Error, None);
            finish(shared, job_id, |job| {
                job.status = JobStatus::Failed;
                job.last_error = Some(e.to_string());
            });
        }
    }
}

fn update(shared: &Shared, job_id: Uuid, change: impl FnOnce(&mut Job)) -> Option<Job> {
    let mut jobs = shared.jobs.write();
    let job = jobs.get_mut(&job_id)?;
    change(job);
    job.updated_at = Utc::now();
    Some(job.clone())
}

/// Records the final state of a job and trims the finished history in the
/// same critical section.
fn finish(shared: &Shared, job_id: Uuid, change: impl FnOnce(&mut Job)) {
    let mut jobs = shared.jobs.write();
    if let Some(job) = jobs.get_mut(&job_id) {
        change(job);
        job.updated_at = Utc::now();
    }

    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .values()
        .filter(|j| matches!(j.status, JobStatus::Completed | JobStatus::Failed))
        .map(|j| (j.updated_at, j.id))
        .collect();
    if finished.len() <= shared.history {
        return;
    }
    finished.sort();
    let excess = finished.len() - shared.history;
    for (_, id) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
    debug!(evicted = excess, "trimmed finished job history");
}

async fn run_scrape(shared: &Shared, url: &str, payload_id: Uuid) -> Result<(), JobError> {
    let parsed = Url::parse(url).map_err(|_| JobError::InvalidUrl(url.to_string()))?;
    let host = parsed.host_str().map(str::to_lowercase).ok_or_else(|| JobError::InvalidUrl(url.to_string()))?;
    if !shared.allowed_domains.iter().any(|d| *d == host) {
        return Err(JobError::DomainNotAllowed(host));
    }

    let metadata = shared.scraper.scrape(&parsed).await.map_err(|e| JobError::Scrape(e.to_string()))?;
    enqueue(shared, JobSpec::Ai { metadata }, payload_id)
}

async fn run_ai(shared: &Shared, metadata: &ScrapedProduct) -> Result<String, JobError> {
    let metadata = serde_json::to_string(metadata).map_err(|e| JobError::Generation(e.to_string()))?;
    let prompt = format!("Generate an SEO-optimized product page title and description based on the following metadata:\n{metadata}\n");
    let text = shared.generator.generate_text(&prompt).await.map_err(|e| JobError::Generation(e.to_string()))?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::tests::CannedGenerator;
    use crate::scrape::ScrapeError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct FakeScraper;

    #[async_trait]
    impl ProductScraper for FakeScraper {
        async fn scrape(&self, url: &Url) -> Result<ScrapedProduct, ScrapeError> {
            if url.path().contains("missing") {
                return Err(ScrapeError::Upstream { status: 404, message: "Not Found".into() });
            }
            Ok(ScrapedProduct {
                title: "Mug".into(),
                description: "A mug".into(),
                price: 9.99,
                images: vec![],
                url: url.to_string(),
            })
        }
    }

    fn queue(generator: Result<String, String>) -> (JobQueue, Notifier) {
        let notifier = Notifier::new(Duration::ZERO);
        let queue = JobQueue::start(
            2,
            100,
            vec![" Shop.Example.com ".into()],
            Arc::new(FakeScraper),
            Arc::new(CannedGenerator(generator)),
            notifier.clone(),
        );
        (queue, notifier)
    }

    async fn wait_for(queue: &JobQueue, payload_id: Uuid, done: impl Fn(&[Job]) -> bool) -> Vec<Job> {
        for _ in 0..200 {
            let jobs = queue.jobs_for(payload_id);
            if done(&jobs) {
                return jobs;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("jobs did not settle: {:?}", queue.jobs_for(payload_id));
    }

    fn settled(jobs: &[Job]) -> bool {
        !jobs.is_empty() && jobs.iter().all(|j| matches!(j.status, JobStatus::Completed | JobStatus::Failed))
    }

    #[tokio::test]
    async fn scrape_job_chains_into_ai_job() {
        let (queue, notifier) = queue(Ok("SEO title".into()));
        let payload_id = queue.schedule(JobSpec::Scrape { url: "https://shop.example.com/mug".into() }, None).unwrap();
        let jobs = wait_for(&queue, payload_id, |jobs| jobs.len() == 2 && settled(jobs)).await;

        assert_eq!(jobs[0].spec.name(), "scrape");
        assert_eq!(jobs[1].spec.name(), "ai");
        assert_eq!(jobs[1].result.as_deref(), Some("SEO title"));
        assert!(jobs.iter().all(|j| j.status == JobStatus::Completed && j.attempts == 1));
        assert_eq!(notifier.snapshot().len(), 2);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn disallowed_domain_fails_and_can_be_retried() {
        let (queue, notifier) = queue(Ok("unused".into()));
        let payload_id = queue.schedule(JobSpec::Scrape { url: "https://evil.example.org/x".into() }, None).unwrap();
        let jobs = wait_for(&queue, payload_id, settled).await;
        assert_eq!(jobs[0].status, JobStatus::Failed);
        assert_eq!(jobs[0].last_error.as_deref(), Some("Domain not allowed: evil.example.org"));
        assert_eq!(notifier.snapshot()[0].kind, ToastKind::Error);

        queue.retry(payload_id).unwrap();
        let jobs = wait_for(&queue, payload_id, |jobs| jobs.len() == 2 && settled(jobs)).await;
        assert!(jobs.iter().all(|j| j.status == JobStatus::Failed));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_url_and_generation_errors_are_recorded() {
        let (queue, _) = queue(Err("model down".into()));
        let bad = queue.schedule(JobSpec::Scrape { url: "not a url".into() }, None).unwrap();
        let jobs = wait_for(&queue, bad, settled).await;
        assert_eq!(jobs[0].last_error.as_deref(), Some("Invalid URL: not a url"));

        let ai = queue.schedule(JobSpec::Scrape { url: "https://shop.example.com/mug".into() }, None).unwrap();
        let jobs = wait_for(&queue, ai, |jobs| jobs.len() == 2 && settled(jobs)).await;
        assert_eq!(jobs[1].status, JobStatus::Failed);
        assert!(jobs[1].last_error.as_deref().unwrap().starts_with("AI generation failed"));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn finished_history_is_bounded() {
        let notifier = Notifier::new(Duration::ZERO);
        let queue = JobQueue::start(
            2,
            3,
            Vec::new(),
            Arc::new(FakeScraper),
            Arc::new(CannedGenerator(Ok("SEO".into()))),
            notifier,
        );
        let metadata = ScrapedProduct { title: "Mug".into(), description: "A mug".into(), price: 1.0, images: vec![], url: "https://shop.example.com".into() };
        for _ in 0..10 {
            queue.schedule(JobSpec::Ai { metadata: metadata.clone() }, None).unwrap();
        }

        for _ in 0..200 {
            let pending = queue.shared.jobs.read().values().any(|j| matches!(j.status, JobStatus::Waiting | JobStatus::Active));
            if !pending {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let jobs = queue.shared.jobs.read();
        assert_eq!(jobs.len(), 3);
        assert!(jobs.values().all(|j| j.status == JobStatus::Completed));
        drop(jobs);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn retry_without_candidates_is_not_found() {
        let (queue, _) = queue(Ok("x".into()));
        let missing = Uuid::new_v4();
        assert!(matches!(queue.retry(missing), Err(JobError::NotFound(id)) if id == missing));
        queue.shutdown().await;
        assert!(matches!(
            queue.schedule(JobSpec::Scrape { url: "https://shop.example.com".into() }, None),
            Err(JobError::QueueClosed)
        ));
    }
}
