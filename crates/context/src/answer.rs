//! Answer requester
//!
//! Builds the combined prompt, calls the generator with a per-attempt timeout
//! and one bounded retry for transient failures, and derives the source list
//! from the passages in fused order. Failures never reach the caller as raw
//! error text: they become a fixed message with an empty source list.

use crate::prompts::{build_prompt, DEFAULT_SYSTEM_PROMPT, GENERATION_FAILED_ANSWER};
use hydradoc_common::config::LlmConfig;
use hydradoc_common::errors::AppError;
use hydradoc_common::llm::Generator;
use hydradoc_common::metrics;
use hydradoc_common::passage::RetrievedPassage;
use hydradoc_common::retry::retry_transient;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Outcome of one answer request
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
    pub attempts: u32,
    pub generated: bool,
}

/// Citation labels in first-seen order, duplicates removed
pub fn collect_sources(passages: &[RetrievedPassage]) -> Vec<String> {
    let mut seen = HashSet::new();
    passages
        .iter()
        .map(RetrievedPassage::source_label)
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

/// Prompts the generator and packages the answer
pub struct AnswerRequester {
    generator: Arc<dyn Generator>,
    system_prompt: String,
    timeout: Duration,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl AnswerRequester {
    pub fn new(generator: Arc<dyn Generator>, config: &LlmConfig) -> Self {
        Self {
            generator,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    pub async fn answer(&self, question: &str, context: &str, passages: &[RetrievedPassage]) -> Answer {
        let prompt = build_prompt(&self.system_prompt, context, question);
        let start = Instant::now();
        let timeout = self.timeout;
        let mut attempts = 0;

        let result = retry_transient("generation", self.max_attempts, self.retry_backoff, |attempt| {
            attempts = attempt;
            let generator = self.generator.clone();
            let prompt = prompt.as_str();
            async move {
                match tokio::time::timeout(timeout, generator.generate(prompt)).await {
                    Ok(result) => result,
                    Err(_) => Err(AppError::GenerationTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                }
            }
        })
        .await;

        metrics::record_generation(
            start.elapsed().as_secs_f64(),
            self.generator.model_name(),
            attempts,
            result.is_ok(),
        );

        match result {
            Ok(text) => {
                info!(
                    model = self.generator.model_name(),
                    attempts = attempts,
                    answer_chars = text.chars().count(),
                    "Answer generated"
                );
                Answer {
                    text,
                    sources: collect_sources(passages),
                    attempts,
                    generated: true,
                }
            }
            Err(e) => {
                error!(
                    model = self.generator.model_name(),
                    attempts = attempts,
                    question = %question,
                    error = %e,
                    "Answer generation failed"
                );
                Answer {
                    text: GENERATION_FAILED_ANSWER.to_string(),
                    sources: Vec::new(),
                    attempts,
                    generated: false,
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use hydradoc_common::errors::Result;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Generator replaying a script of outcomes and recording prompts
    pub(crate) struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String>>>,
        pub prompts: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedGenerator {
        pub(crate) fn new(script: Vec<Result<String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                prompts: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub(crate) fn answering(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub(crate) fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new(vec![Ok("too late".into()), Ok("too late".into())])
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| {
                Err(AppError::GenerationFailure {
                    message: "script exhausted".into(),
                    transient: false,
                })
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    pub(crate) fn fast_config() -> LlmConfig {
        LlmConfig {
            timeout_secs: 5,
            max_attempts: 2,
            retry_backoff_ms: 1,
            ..LlmConfig::default()
        }
    }

    fn transient() -> AppError {
        AppError::GenerationFailure {
            message: "503 Service Unavailable".into(),
            transient: true,
        }
    }

    fn passages() -> Vec<RetrievedPassage> {
        vec![
            RetrievedPassage::new("cdh2.pdf", 4, "a"),
            RetrievedPassage::new("oven.pdf", 39, "b"),
            RetrievedPassage::new("cdh2.pdf", 4, "a second chunk of page 4"),
            RetrievedPassage::new("cdh2.pdf", 7, "c"),
        ]
    }

    #[test]
    fn test_sources_deduplicated_in_first_seen_order() {
        assert_eq!(
            collect_sources(&passages()),
            vec!["cdh2.pdf (p. 4)", "oven.pdf (p. 39)", "cdh2.pdf (p. 7)"]
        );
        assert!(collect_sources(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_single_call_on_success() {
        let generator = Arc::new(ScriptedGenerator::answering("Nenndruck: 250 bar"));
        let requester = AnswerRequester::new(generator.clone(), &fast_config());

        let answer = requester.answer("Nenndruck?", "[Source: cdh2.pdf p.4]\na", &passages()).await;

        assert!(answer.generated);
        assert_eq!(answer.text, "Nenndruck: 250 bar");
        assert_eq!(answer.sources.len(), 3);
        assert_eq!(answer.attempts, 1);
        assert_eq!(generator.calls(), 1);

        let prompt = &generator.prompts.lock().unwrap()[0];
        assert!(prompt.starts_with(DEFAULT_SYSTEM_PROMPT));
        assert!(prompt.contains("[Source: cdh2.pdf p.4]\na"));
        assert!(prompt.contains("Question: Nenndruck?"));
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(transient()), Ok("ok".into())]));
        let requester = AnswerRequester::new(generator.clone(), &fast_config());

        let answer = requester.answer("q", "ctx", &passages()).await;

        assert!(answer.generated);
        assert_eq!(answer.text, "ok");
        assert_eq!(answer.attempts, 2);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(transient()),
            Err(transient()),
            Ok("never reached".into()),
        ]));
        let requester = AnswerRequester::new(generator.clone(), &fast_config());

        let answer = requester.answer("q", "ctx", &passages()).await;

        assert!(!answer.generated);
        assert_eq!(answer.text, GENERATION_FAILED_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried_and_not_leaked() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(AppError::GenerationFailure {
            message: "401 invalid api key sk-secret".into(),
            transient: false,
        })]));
        let requester = AnswerRequester::new(generator.clone(), &fast_config());

        let answer = requester.answer("q", "ctx", &passages()).await;

        assert_eq!(generator.calls(), 1);
        assert!(!answer.text.contains("sk-secret"));
        assert!(answer.sources.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_transient() {
        let generator = Arc::new(ScriptedGenerator::slow(Duration::from_secs(120)));
        let config = LlmConfig {
            timeout_secs: 1,
            ..fast_config()
        };
        let requester = AnswerRequester::new(generator.clone(), &config);

        let answer = requester.answer("q", "ctx", &passages()).await;

        assert!(!answer.generated);
        assert_eq!(answer.attempts, 2);
        assert_eq!(generator.calls(), 2);
    }
}
