//! Poll-and-backoff loop: wait for a parse job's text to become available.
//!
//! The parsing service answers 404 while a job is still processing, so the
//! only sensible client behaviour is to ask, sleep, and ask again. The sleep
//! is a cooperative `tokio::time::sleep` — the hosting process keeps doing
//! unrelated work between polls.
//!
//! The loop is deadline-bounded: a job that never completes surfaces
//! [`ExtratoError::PollTimeout`] instead of pinning the batch forever.

use crate::config::PipelineConfig;
use crate::error::ExtratoError;
use crate::pipeline::parse::{JobId, ParseService, TextResult};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

/// Poll `service` until the job's text result is ready.
///
/// The first request goes out immediately; afterwards the loop sleeps
/// `poll_interval_secs` between attempts. A fatal HTTP error from the service
/// propagates at once — only "still processing" is retried.
pub async fn await_text<P>(
    service: &P,
    job: &JobId,
    config: &PipelineConfig,
) -> Result<String, ExtratoError>
where
    P: ParseService + ?Sized,
{
    let start = Instant::now();
    let interval = Duration::from_secs(config.poll_interval_secs);
    let timeout = Duration::from_secs(config.poll_timeout_secs);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match service.text_result(job).await? {
            TextResult::Ready(text) => {
                info!(
                    "Parse job {} ready after {} attempt(s), {} chars of text",
                    job,
                    attempts,
                    text.len()
                );
                return Ok(text);
            }
            TextResult::Pending => {
                if start.elapsed() >= timeout {
                    return Err(ExtratoError::PollTimeout {
                        job: job.to_string(),
                        secs: config.poll_timeout_secs,
                    });
                }
                debug!(
                    "Parse job {} still processing (attempt {}), retrying in {}s",
                    job, attempts, config.poll_interval_secs
                );
                sleep(interval).await;
            }
        }
    }
}
