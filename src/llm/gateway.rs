//! Completion gateway: deterministic prompt construction plus the
//! bounded-retry contract around the completion client.

use super::client::CompletionClient;
use super::error::{CompletionError, CompletionUnavailableError};
use super::types::{CompletionRequest, RawCompletion};
use crate::config::GenerationConfig;
use crate::spec::{FunctionSpec, Language};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Builds the synthesis prompt for a function.
///
/// Pure function of the spec fields and a fixed template: identical specs
/// always produce identical prompts, which is what makes response caching
/// and stub-based tests possible.
pub fn build_prompt(spec: &FunctionSpec, language: Language) -> String {
    let mut prompt = String::new();

    writeln!(
        prompt,
        "You are generating the body of a single {language} function."
    )
    .unwrap();
    writeln!(prompt).unwrap();
    writeln!(prompt, "Function: {}", spec.name).unwrap();
    if !spec.description.is_empty() {
        writeln!(prompt, "Description: {}", spec.description).unwrap();
    }

    if spec.parameters.is_empty() {
        writeln!(prompt, "Parameters: none").unwrap();
    } else {
        writeln!(prompt, "Parameters:").unwrap();
        for parameter in &spec.parameters {
            let requirement = if parameter.required {
                "required".to_string()
            } else if let Some(default) = &parameter.default {
                format!("optional, default {default}")
            } else {
                "optional".to_string()
            };
            let description = if parameter.description.is_empty() {
                String::new()
            } else {
                format!(" - {}", parameter.description)
            };
            writeln!(
                prompt,
                "  - {} ({}, {}){}",
                parameter.name,
                parameter.type_tag.as_str(),
                requirement,
                description
            )
            .unwrap();
        }
    }

    if let Some(input_type) = spec.input_type {
        writeln!(prompt, "Input type: {}", input_type.as_str()).unwrap();
    }
    writeln!(prompt, "Returns: {}", spec.output_type.as_str()).unwrap();

    if !spec.examples.is_empty() {
        writeln!(prompt).unwrap();
        writeln!(prompt, "Examples:").unwrap();
        for example in &spec.examples {
            writeln!(prompt, "  - input: {} -> output: {}", example.input, example.output)
                .unwrap();
        }
    }

    writeln!(prompt).unwrap();
    writeln!(prompt, "Requirements:").unwrap();
    writeln!(
        prompt,
        "- Respond with exactly one fenced code block tagged `{language}`."
    )
    .unwrap();
    writeln!(
        prompt,
        "- Define a function named `{}` taking the parameters in the declared order.",
        spec.name
    )
    .unwrap();
    writeln!(
        prompt,
        "- Business logic only: no HTTP servers, argument parsing, or file I/O."
    )
    .unwrap();

    prompt
}

/// Wraps a completion client with timeout/retry discipline and raw-response
/// capture. The client is the scarce, high-latency resource; the gateway is
/// cheap and cloneable across targets.
#[derive(Clone)]
pub struct CompletionGateway {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
    backoff_base: std::time::Duration,
}

impl CompletionGateway {
    pub fn new(client: Arc<dyn CompletionClient>, config: &GenerationConfig) -> Self {
        Self {
            client,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
        }
    }

    /// Synthesizes the business-logic body for one function.
    ///
    /// Retries transport-level failures up to the configured bound with
    /// exponential backoff; after exhausting retries the target fails with
    /// [`CompletionUnavailableError`]. Fatal for that target only.
    pub async fn synthesize(
        &self,
        spec: &FunctionSpec,
        language: Language,
    ) -> Result<RawCompletion, CompletionUnavailableError> {
        let request = CompletionRequest {
            prompt: build_prompt(spec, language),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            debug!(
                function = %spec.name,
                attempt = attempts,
                client = self.client.name(),
                "issuing completion call"
            );

            match self.client.complete(request.clone()).await {
                Ok(response) => {
                    return Ok(RawCompletion {
                        text: response.text,
                        model: self
                            .client
                            .model_info()
                            .unwrap_or_else(|| self.client.name().to_string()),
                        elapsed: start.elapsed(),
                        attempts,
                    });
                }
                Err(error) => {
                    let out_of_budget = attempts > self.max_retries;
                    if out_of_budget || !error.is_retryable() {
                        return Err(CompletionUnavailableError {
                            attempts,
                            last_error: error,
                        });
                    }

                    // attempts is at least 1 here, so the first delay is the base
                    let delay = self.backoff_base * 2u32.saturating_pow(attempts - 1);
                    warn!(
                        function = %spec.name,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "completion attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
