//! Caller-side retry for transient embedding failures.
//!
//! Backends report failures once; [`RetryingEmbedder`] decides whether to try
//! again. Only errors with [`Error::is_transient`] are retried.

use std::time::Duration;

use docmind_core::config::EmbeddingConfig;
use docmind_core::error::{Error, Result};
use docmind_core::traits::Embedder;
use docmind_core::types::Vector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &EmbeddingConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            base_delay: Duration::from_millis(cfg.retry_base_ms),
            max_delay: Duration::from_millis(cfg.retry_max_ms),
            jitter: true,
        }
    }

    /// No sleeping between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self { max_retries, base_delay: Duration::ZERO, max_delay: Duration::ZERO, jitter: false }
    }

    /// `base * 2^attempt`, capped at `max_delay`, plus up to half again as jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let cap = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let exp = base.saturating_mul(1u64 << attempt.min(32)).min(cap);
        let jitter = if self.jitter && exp > 0 { fastrand::u64(0..=exp / 2) } else { 0 };
        Duration::from_millis(exp.saturating_add(jitter))
    }

    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(what, attempts = attempt + 1, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(what, attempt = attempt + 1, delay_ms = delay.as_millis(), error = %e, "transient failure, retrying");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wraps an embedder so every call goes through a [`RetryPolicy`].
pub struct RetryingEmbedder<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: Embedder> RetryingEmbedder<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy { self.policy }
}

impl<E: Embedder> Embedder for RetryingEmbedder<E> {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }

    fn dim(&self) -> usize { self.inner.dim() }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.policy.run("embed_batch", |_| self.inner.embed_batch(texts))
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        self.policy.run("embed", |_| self.inner.embed(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn delay_doubles_and_caps() {
        let p = RetryPolicy { jitter: false, ..RetryPolicy::default() };
        assert_eq!(p.delay_for(0), Duration::from_millis(200));
        assert_eq!(p.delay_for(1), Duration::from_millis(400));
        assert_eq!(p.delay_for(10), Duration::from_secs(5));
        assert_eq!(p.delay_for(200), Duration::from_secs(5));
    }

    #[test]
    fn jitter_stays_within_half() {
        let p = RetryPolicy::default();
        for _ in 0..50 {
            let d = p.delay_for(1);
            assert!(d >= Duration::from_millis(400) && d <= Duration::from_millis(600), "{d:?}");
        }
    }

    #[test]
    fn gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let out: Result<()> = RetryPolicy::immediate(2).run("t", |_| {
            calls.set(calls.get() + 1);
            Err(Error::Embedding("down".into()))
        });
        assert!(matches!(out, Err(Error::Embedding(_))));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn permanent_errors_fail_fast() {
        let calls = Cell::new(0);
        let out: Result<()> = RetryPolicy::immediate(5).run("t", |_| {
            calls.set(calls.get() + 1);
            Err(Error::DimensionMismatch { expected: 3, actual: 2 })
        });
        assert!(out.is_err());
        assert_eq!(calls.get(), 1);
    }
}
