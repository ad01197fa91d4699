//! EffectRunner - drive one effect in isolation
//!
//! The effect sees a single trigger action followed by silence; the runner
//! collects the actions it would dispatch until the expected count is reached
//! or the timeout elapses.

use crate::error::EffectRunnerError;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use statehouse::Effect;
use statehouse_config::StoreConfig;
use std::time::Duration;

/// Runs effects against a single trigger action, with a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectRunner {
    timeout: Duration,
}

impl EffectRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runner using the configured effect timeout
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.effect_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Feed `trigger` to `effect` and wait for `expected` output actions
    ///
    /// Returns the outputs in emission order. A batch that overshoots
    /// `expected` is returned whole. With `expected == 0` the runner waits for
    /// the first output (or the timeout) and never fails. An effect that ends
    /// before producing enough actions fails like a timeout.
    pub async fn run<A>(
        &self,
        effect: Effect<A>,
        trigger: A,
        expected: usize,
    ) -> Result<Vec<A>, EffectRunnerError>
    where
        A: Send + 'static,
    {
        log::debug!(
            "Running effect '{}', expecting {} actions",
            effect.name(),
            expected
        );
        let input: BoxStream<'static, A> = stream::once(async move { trigger })
            .chain(stream::pending())
            .boxed();
        let mut output = effect.connect(input);
        let mut received = Vec::new();

        let completed = tokio::time::timeout(self.timeout, async {
            while let Some(batch) = output.next().await {
                received.extend(batch);
                if received.len() >= expected {
                    return true;
                }
            }
            false
        })
        .await;

        match completed {
            Ok(true) => Ok(received),
            _ if expected == 0 => Ok(received),
            _ => {
                log::debug!(
                    "Effect produced {} of {} expected actions",
                    received.len(),
                    expected
                );
                Err(EffectRunnerError::Timeout {
                    expected,
                    received: received.len(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

impl Default for EffectRunner {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use statehouse::ActionStream;

    fn echo_twice() -> Effect<u32> {
        Effect::dispatching_many(|actions: ActionStream<u32>| actions.map(|n| vec![n, n + 1]))
    }

    #[tokio::test]
    async fn test_collects_expected_outputs() {
        let runner = EffectRunner::new(Duration::from_millis(200));
        let outputs = runner.run(echo_twice(), 7, 2).await.unwrap();
        assert_eq!(outputs, vec![7, 8]);
    }

    #[tokio::test]
    async fn test_overshooting_batch_is_returned_whole() {
        let runner = EffectRunner::new(Duration::from_millis(200));
        let outputs = runner.run(echo_twice(), 1, 1).await.unwrap();
        assert_eq!(outputs, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_times_out_when_count_is_not_reached() {
        let runner = EffectRunner::new(Duration::from_millis(50));
        let err = runner.run(echo_twice(), 1, 3).await.unwrap_err();
        assert_eq!(
            err,
            EffectRunnerError::Timeout {
                expected: 3,
                received: 2,
                timeout: Duration::from_millis(50),
            }
        );
    }

    #[tokio::test]
    async fn test_ended_effect_fails_like_timeout() {
        let runner = EffectRunner::new(Duration::from_secs(5));
        let effect = Effect::dispatching_one(|actions: ActionStream<u32>| actions.take(1));
        let err = runner.run(effect, 4, 2).await.unwrap_err();
        assert!(matches!(
            err,
            EffectRunnerError::Timeout { received: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_expecting_nothing_never_fails() {
        let runner = EffectRunner::new(Duration::from_millis(20));
        let silent = Effect::dispatching_one(|actions: ActionStream<u32>| {
            actions.filter(|_| futures::future::ready(false))
        });
        assert_eq!(runner.run(silent, 1, 0).await.unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_default_timeout_comes_from_config() {
        assert_eq!(EffectRunner::default().timeout(), Duration::from_millis(1000));
    }
}
