//! Single-slot download job coordination.
//!
//! At most one download job runs at a time. The controller launches the
//! background worker, exposes a progress snapshot for polling, waits for the
//! deliverable with a bounded retry loop, and schedules delayed cleanup of
//! the serve directory after a pickup.
//!
//! A failed job is observably identical to a successful one except that no
//! result is ever published: progress reaches 100, `downloading` turns false,
//! and a later file request times out.

use crate::config::Settings;
use crate::error::{HentError, Result};
use crate::media::format::{format_duration, format_size, sanitize_filename};
use crate::media::{DownloadFormat, MediaExtractor, ProgressFn, TagWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A finished download awaiting pickup from the serve directory.
#[derive(Debug, Clone)]
pub struct CompletedDownload {
    pub path: PathBuf,
    pub title: String,
    pub format: DownloadFormat,
    /// Display duration, `minutes:seconds`.
    pub duration: String,
    /// Human-readable size label.
    pub size_label: String,
}

/// Poll snapshot of the current job.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ProgressSnapshot {
    pub progress: u8,
    pub downloading: bool,
}

/// Mutable job state, guarded by a single lock.
///
/// The result fields are published together so a reader never sees a
/// half-written outcome.
#[derive(Debug, Default)]
struct JobState {
    running: bool,
    progress: u8,
    result: Option<CompletedDownload>,
    /// Diagnostics only; never serialized to a client.
    last_error: Option<String>,
}

/// Filesystem and timing knobs for the controller.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub work_dir: PathBuf,
    pub serve_dir: PathBuf,
    pub output_stem: String,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub cleanup_delay: Duration,
}

impl ControllerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            work_dir: settings.work_dir(),
            serve_dir: settings.serve_dir(),
            output_stem: settings.downloader.output_stem.clone(),
            poll_interval: Duration::from_millis(settings.downloader.poll_interval_ms),
            max_wait: Duration::from_secs(settings.downloader.max_wait_seconds),
            cleanup_delay: Duration::from_secs(settings.downloader.cleanup_delay_seconds),
        }
    }
}

/// Coordinates one background download job at a time.
pub struct DownloadController {
    extractor: Arc<dyn MediaExtractor>,
    tagger: Arc<dyn TagWriter>,
    options: ControllerOptions,
    state: Arc<Mutex<JobState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DownloadController {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        tagger: Arc<dyn TagWriter>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            extractor,
            tagger,
            options,
            state: Arc::new(Mutex::new(JobState::default())),
            worker: Mutex::new(None),
        }
    }

    /// Start a download job in the background.
    ///
    /// Rejects empty URLs and refuses to queue behind a running job. Returns
    /// as soon as the worker is spawned.
    pub fn start(&self, url: &str, format: DownloadFormat) -> Result<()> {
        if url.trim().is_empty() {
            return Err(HentError::InvalidInput("URL must not be empty".to_string()));
        }

        {
            let mut state = lock(&self.state);
            if state.running {
                return Err(HentError::AlreadyRunning);
            }
            state.running = true;
            state.progress = 0;
            state.result = None;
            state.last_error = None;
        }

        let ctx = WorkerContext {
            extractor: Arc::clone(&self.extractor),
            tagger: Arc::clone(&self.tagger),
            state: Arc::clone(&self.state),
            work_dir: self.options.work_dir.clone(),
            serve_dir: self.options.serve_dir.clone(),
            output_stem: self.options.output_stem.clone(),
            url: url.to_string(),
            format,
        };

        let handle = tokio::spawn(run_worker(ctx));
        *lock_worker(&self.worker) = Some(handle);

        Ok(())
    }

    /// Current progress and running flag. Never blocks on the worker.
    pub fn progress(&self) -> ProgressSnapshot {
        let state = lock(&self.state);
        ProgressSnapshot {
            progress: state.progress,
            downloading: state.running,
        }
    }

    /// Wait for the deliverable file with a bounded retry loop.
    ///
    /// A file request is decoupled in time from the job that produced it, so
    /// this polls until the result is published AND the file exists on disk,
    /// giving up after the configured budget rather than hanging on a job
    /// that failed silently.
    pub async fn wait_for_file(&self) -> Option<CompletedDownload> {
        let mut waited = Duration::ZERO;
        loop {
            {
                let state = lock(&self.state);
                if let Some(done) = &state.result {
                    if done.path.exists() {
                        return Some(done.clone());
                    }
                }
            }
            if waited >= self.options.max_wait {
                return None;
            }
            tokio::time::sleep(self.options.poll_interval).await;
            waited += self.options.poll_interval;
        }
    }

    /// Empty the serve directory after a fixed delay.
    ///
    /// Individual deletion failures are logged and do not abort the rest.
    /// On a future multi-job design the delay could race a slow client that
    /// started its download just before the window; with one job at a time
    /// that cannot happen.
    pub fn schedule_cleanup(&self) -> JoinHandle<()> {
        let dir = self.options.serve_dir.clone();
        let delay = self.options.cleanup_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Cleanup could not read {}: {}", dir.display(), e);
                    return;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                match std::fs::remove_file(&path) {
                    Ok(()) => info!("Cleaned up {}", path.display()),
                    Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
                }
            }
        })
    }

    /// Take the handle of the most recently spawned worker.
    ///
    /// The current design never cancels a job, but the handle is kept
    /// rather than detached so a caller can await or abort it.
    pub fn take_worker(&self) -> Option<JoinHandle<()>> {
        lock_worker(&self.worker).take()
    }
}

fn lock<'a>(state: &'a Mutex<JobState>) -> MutexGuard<'a, JobState> {
    state.lock().expect("job state lock poisoned")
}

fn lock_worker<'a>(
    worker: &'a Mutex<Option<JoinHandle<()>>>,
) -> MutexGuard<'a, Option<JoinHandle<()>>> {
    worker.lock().expect("worker handle lock poisoned")
}

/// Everything the background worker needs, detached from the controller.
struct WorkerContext {
    extractor: Arc<dyn MediaExtractor>,
    tagger: Arc<dyn TagWriter>,
    state: Arc<Mutex<JobState>>,
    work_dir: PathBuf,
    serve_dir: PathBuf,
    output_stem: String,
    url: String,
    format: DownloadFormat,
}

/// Clears the job slot when the worker finishes, however it finishes.
///
/// Dropped even when the job body panics; a wedged `running` flag would
/// reject every future job.
struct FinishGuard {
    state: Arc<Mutex<JobState>>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.progress = 100;
        state.running = false;
    }
}

/// Run one job to completion and publish the outcome.
///
/// Errors end the job silently: they are logged, the result stays absent.
/// Progress is forced to 100 and the running flag cleared on every exit
/// path, success, failure or panic.
async fn run_worker(ctx: WorkerContext) {
    let _guard = FinishGuard {
        state: Arc::clone(&ctx.state),
    };

    match execute_job(&ctx).await {
        Ok(done) => {
            info!("File ready: {}", done.path.display());
            lock(&ctx.state).result = Some(done);
        }
        Err(e) => {
            error!("Download job failed: {}", e);
            lock(&ctx.state).last_error = Some(e.to_string());
        }
    }
}

async fn execute_job(ctx: &WorkerContext) -> Result<CompletedDownload> {
    std::fs::create_dir_all(&ctx.serve_dir)?;

    let info = ctx.extractor.fetch_info(&ctx.url).await?;

    let progress_state = Arc::clone(&ctx.state);
    let on_progress: ProgressFn = Box::new(move |pct| {
        lock(&progress_state).progress = pct;
    });

    ctx.extractor
        .download(&ctx.url, ctx.format, &ctx.work_dir, on_progress)
        .await?;

    let mut title = sanitize_filename(&info.title);
    if title.is_empty() {
        title = "video".to_string();
    }

    let produced = resolve_output(&ctx.work_dir, &ctx.output_stem, ctx.format);

    if ctx.format.is_audio() {
        if let Err(e) = ctx
            .tagger
            .embed(&produced, info.thumbnail.as_deref(), &title)
            .await
        {
            warn!("Tag embedding failed, serving untagged file: {}", e);
        }
    }

    let final_name = format!("{}.{}", title, ctx.format.extension());
    let dest = ctx.serve_dir.join(&final_name);

    // Last-writer-wins: an earlier deliverable with the same name is replaced.
    if dest.exists() {
        std::fs::remove_file(&dest)?;
    }
    std::fs::rename(&produced, &dest)?;

    let size_label = format_size(std::fs::metadata(&dest)?.len());

    Ok(CompletedDownload {
        path: dest,
        title,
        format: ctx.format,
        duration: format_duration(info.duration_seconds.unwrap_or(0)),
        size_label,
    })
}

/// Resolve the file the extractor produced.
///
/// Audio output gets the target extension forced onto the template stem,
/// whatever the intermediate container was. For video, when the expected
/// path is missing the work directory is scanned for any file with the
/// template prefix and target extension - merge output naming is not fully
/// deterministic, and this fallback is deliberate rather than incidental.
fn resolve_output(work_dir: &Path, output_stem: &str, format: DownloadFormat) -> PathBuf {
    let expected = work_dir.join(format!("{}.{}", output_stem, format.extension()));

    if format.is_audio() || expected.exists() {
        return expected;
    }

    let suffix = format!(".{}", format.extension());
    if let Ok(entries) = std::fs::read_dir(work_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(output_stem) && name.ends_with(&suffix) {
                return entry.path();
            }
        }
    }

    expected
}
