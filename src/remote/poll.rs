use std::time::{Duration, Instant};

use super::{
    AnimationRequest, CancellationToken, GenerationError, GenerationResult, RemoteCollaborator,
};
use crate::asset::VideoAsset;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    Pending,
    Done(T),
}

/// Retry schedule for submit-then-poll operations.
///
/// The default polls every five seconds forever; ceilings are opt-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub backoff_factor: f32,
    pub max_interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_duration: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(30),
            max_attempts: None,
            max_duration: None,
        }
    }
}

impl PollPolicy {
    /// Delay before poll number `attempt + 1`, given `attempt` polls so far.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0);
        if factor <= 1.0 || attempt <= 1 {
            return self.interval.min(self.max_interval.max(self.interval));
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let scaled = self.interval.as_secs_f32() * factor.powi(exponent);
        let capped = scaled.min(self.max_interval.as_secs_f32());
        Duration::from_secs_f32(capped.max(self.interval.as_secs_f32()))
    }
}

/// Calls `probe` until it reports `Done`, sleeping per `policy` between calls.
///
/// Errors from `probe` end the loop immediately. Cancellation is checked
/// before each poll and interrupts the sleep.
pub fn poll_until_done<T, F>(
    operation: &'static str,
    policy: &PollPolicy,
    token: &CancellationToken,
    mut probe: F,
) -> GenerationResult<T>
where
    F: FnMut() -> GenerationResult<PollStatus<T>>,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;
    loop {
        if token.is_cancelled() {
            return Err(GenerationError::Cancelled { operation });
        }

        attempts = attempts.saturating_add(1);
        if let PollStatus::Done(value) = probe()? {
            tracing::info!(operation, attempts, "remote operation finished");
            return Ok(value);
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max)
            || policy
                .max_duration
                .is_some_and(|max| started.elapsed() >= max)
        {
            tracing::warn!(operation, attempts, "remote operation polling gave up");
            return Err(GenerationError::TimedOut {
                operation,
                attempts,
            });
        }

        let delay = policy.delay_after(attempts);
        tracing::debug!(
            operation,
            attempts,
            delay_ms = delay.as_millis() as u64,
            "operation pending"
        );
        if token.wait_timeout(delay) {
            return Err(GenerationError::Cancelled { operation });
        }
    }
}

/// Submits an animation request and polls it to completion.
pub fn animate<R: RemoteCollaborator + ?Sized>(
    remote: &R,
    request: &AnimationRequest,
    policy: &PollPolicy,
    token: &CancellationToken,
) -> GenerationResult<VideoAsset> {
    let handle = remote.submit_animation(request)?;
    tracing::debug!(handle = %handle.0, "animation submitted");
    poll_until_done("animate", policy, token, || remote.poll_animation(&handle))
}
