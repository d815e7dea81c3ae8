//! Primary/secondary fallback across completion backends.
//!
//! Every LLM-backed operation goes through [`FallbackResolver::resolve`],
//! which guarantees a usable result: primary backend, then secondary, then a
//! caller-supplied canned value. Upstream and parse failures never escape
//! this layer.

use std::sync::Arc;
use std::time::Duration;

use super::backend::{CompletionBackend, LlmError};
use super::DEFAULT_SYSTEM_PROMPT;

/// Timeout for calls on an interactive polling path. Analysis and report
/// generation pass `None` and run against the HTTP client's own limit.
pub const SHORT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FallbackResolver {
    primary: Arc<dyn CompletionBackend>,
    secondary: Option<Arc<dyn CompletionBackend>>,
}

impl FallbackResolver {
    pub fn new(
        primary: Arc<dyn CompletionBackend>,
        secondary: Option<Arc<dyn CompletionBackend>>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Resolve one task to a parsed value, degrading to `canned` when both
    /// backends fail or return something the parser rejects.
    pub async fn resolve<T, F>(
        &self,
        prompt: &str,
        short_timeout: Option<Duration>,
        parse: F,
        canned: T,
    ) -> T
    where
        F: Fn(&str) -> Result<T, LlmError>,
    {
        match try_backend(self.primary.as_ref(), prompt, short_timeout, &parse).await {
            Ok(value) => return value,
            Err(e) => {
                tracing::warn!(backend = self.primary.name(), error = %e, "primary completion failed");
            }
        }

        if let Some(secondary) = self.secondary.as_ref().filter(|b| b.is_configured()) {
            // No tight timeout on the fallback path; the first attempt
            // already spent the interactive budget.
            match try_backend(secondary.as_ref(), prompt, None, &parse).await {
                Ok(value) => return value,
                Err(e) => {
                    tracing::warn!(backend = secondary.name(), error = %e, "secondary completion failed");
                }
            }
        }

        tracing::warn!("all backends failed, returning canned fallback");
        canned
    }
}

async fn try_backend<T, F>(
    backend: &dyn CompletionBackend,
    prompt: &str,
    short_timeout: Option<Duration>,
    parse: &F,
) -> Result<T, LlmError>
where
    F: Fn(&str) -> Result<T, LlmError>,
{
    let completion = backend.complete(prompt, DEFAULT_SYSTEM_PROMPT);
    let raw = match short_timeout {
        Some(limit) => tokio::time::timeout(limit, completion)
            .await
            .map_err(|_| LlmError::Timeout)??,
        None => completion.await?,
    };
    parse(&raw)
}

#[cfg(test)]
pub mod testing {
    use async_trait::async_trait;

    use super::*;

    /// Backend returning a fixed response, for resolver and orchestrator tests.
    pub struct StaticBackend {
        pub name: &'static str,
        pub response: Result<String, ()>,
        pub configured: bool,
    }

    impl StaticBackend {
        pub fn ok(text: &str) -> Arc<dyn CompletionBackend> {
            Arc::new(Self {
                name: "static",
                response: Ok(text.to_string()),
                configured: true,
            })
        }

        pub fn failing() -> Arc<dyn CompletionBackend> {
            Arc::new(Self {
                name: "failing",
                response: Err(()),
                configured: true,
            })
        }

        pub fn unconfigured() -> Arc<dyn CompletionBackend> {
            Arc::new(Self {
                name: "unconfigured",
                response: Err(()),
                configured: false,
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for StaticBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.response.clone().map_err(|_| LlmError::Upstream {
                status: 503,
                detail: "unavailable".into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticBackend;
    use super::*;
    use crate::llm::parse;

    #[tokio::test]
    async fn primary_success_wins() {
        let resolver = FallbackResolver::new(
            StaticBackend::ok(r#"["One?", "Two?"]"#),
            Some(StaticBackend::ok(r#"["ignored"]"#)),
        );
        let result = resolver
            .resolve("p", Some(SHORT_TIMEOUT), parse::string_list, vec!["canned".into()])
            .await;
        assert_eq!(result, vec!["One?", "Two?"]);
    }

    #[tokio::test]
    async fn fenced_primary_output_is_transparent() {
        let resolver = FallbackResolver::new(
            StaticBackend::ok("```json\n[\"One?\", \"Two?\"]\n```"),
            None,
        );
        let result = resolver
            .resolve("p", Some(SHORT_TIMEOUT), parse::string_list, vec![])
            .await;
        assert_eq!(result, vec!["One?", "Two?"]);
    }

    #[tokio::test]
    async fn parse_failure_falls_through_to_secondary() {
        let resolver = FallbackResolver::new(
            StaticBackend::ok("I'd be happy to help with questions!"),
            Some(StaticBackend::ok(r#"["From secondary?"]"#)),
        );
        let result = resolver
            .resolve("p", Some(SHORT_TIMEOUT), parse::string_list, vec![])
            .await;
        assert_eq!(result, vec!["From secondary?"]);
    }

    #[tokio::test]
    async fn both_failing_returns_canned_exactly() {
        let resolver =
            FallbackResolver::new(StaticBackend::failing(), Some(StaticBackend::failing()));
        let canned = vec!["Canned question?".to_string()];
        let result = resolver
            .resolve("p", Some(SHORT_TIMEOUT), parse::string_list, canned.clone())
            .await;
        assert_eq!(result, canned);
    }

    #[tokio::test]
    async fn unconfigured_secondary_is_skipped() {
        let resolver = FallbackResolver::new(
            StaticBackend::failing(),
            Some(StaticBackend::unconfigured()),
        );
        let result = resolver
            .resolve("p", None, parse::string_list, vec!["canned".into()])
            .await;
        assert_eq!(result, vec!["canned"]);
    }

    #[tokio::test]
    async fn no_secondary_goes_straight_to_canned() {
        let resolver = FallbackResolver::new(StaticBackend::failing(), None);
        let result = resolver
            .resolve("p", None, parse::string_list, vec!["canned".into()])
            .await;
        assert_eq!(result, vec!["canned"]);
    }
}
