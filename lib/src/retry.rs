use std::time::Duration;

/// Returned by [`attempt`] once every try has failed
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Linear backoff: `base * attempt` after the n-th failure (1-based)
pub fn linear_backoff(base: Duration) -> impl Fn(u32) -> Duration {
    move |attempt| base.saturating_mul(attempt)
}

/// Runs `op` up to `max_attempts` times, sleeping `backoff(n)` after the n-th failure.
///
/// `op` receives the 1-based attempt number. There is no sleep after the final attempt.
pub fn attempt<T, E, B, F>(max_attempts: u32, backoff: B, op: F) -> Result<T, Exhausted<E>>
where
    E: std::fmt::Display,
    B: Fn(u32) -> Duration,
    F: FnMut(u32) -> Result<T, E>,
{
    attempt_with_sleep(max_attempts, backoff, sleep, op)
}

/// Same as [`attempt`] with the sleep function supplied by the caller
pub fn attempt_with_sleep<T, E, B, S, F>(
    max_attempts: u32,
    backoff: B,
    mut sleep: S,
    mut op: F,
) -> Result<T, Exhausted<E>>
where
    E: std::fmt::Display,
    B: Fn(u32) -> Duration,
    S: FnMut(Duration),
    F: FnMut(u32) -> Result<T, E>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                if attempt >= max_attempts {
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                sleep(backoff(attempt));
                attempt += 1;
            }
        }
    }
}

pub(crate) fn sleep(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
