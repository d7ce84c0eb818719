//! OpenAI-compatible chat-completions client.
//!
//! Backs concept extraction, exercise generation and solution feedback.
//! Every call is bounded by the configured timeout; a timed-out call fails
//! with `ExtractionError::Timeout` and the caller commits nothing.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborators::{parse_concept_list, ConceptExtractor, Exercise, ExerciseGenerator};
use crate::config::Config;
use crate::errors::ExtractionError;
use crate::utils::TextUtils;

const EXTRACTION_PROMPT: &str = "You read programming course material and list the programming \
concepts it covers. Reply with a single comma-separated list of concept names and nothing else.";

const EXERCISE_PROMPT: &str = "You write short Python practice exercises. Reply with a JSON object \
of the form {\"exercise\": \"...\", \"hint\": \"...\"} and nothing else.";

const FEEDBACK_PROMPT: &str = "You review a learner's Python solution. Point out mistakes, say \
whether it solves the exercise, and suggest one improvement. Be concise.";

lazy_static! {
    static ref HINT_MARKER: Regex = Regex::new(r"(?i)\bhint:").unwrap();
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

pub struct LlmClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_chars: usize,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl LlmClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        max_chars: usize,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("LLM client initialized with backend: {}", base_url);
        Self {
            base_url,
            model: model.into(),
            api_key,
            max_chars,
            timeout,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.llm_base_url.clone(),
            config.openai_model.clone(),
            config.openai_api_key.clone(),
            config.extraction_max_chars,
            Duration::from_secs(config.llm_timeout_seconds),
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, ExtractionError>>,
    ) -> Result<T, ExtractionError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::Timeout(self.timeout.as_secs())),
        }
    }

    fn classify(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_timeout() {
            ExtractionError::Timeout(self.timeout.as_secs())
        } else {
            ExtractionError::from(e)
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ExtractionError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::new("system", system), ChatMessage::new("user", user)],
            max_tokens,
            temperature,
        };

        self.with_timeout(async {
            let mut builder = self.http_client.post(self.completions_url()).json(&request);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }
            let response = builder.send().await.map_err(|e| self.classify(e))?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(ExtractionError::Status { status, body });
            }

            let completion: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| self.classify(e))?;
            completion
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .map(|m| m.content)
                .ok_or_else(|| ExtractionError::Parse("response has no choices".to_string()))
        })
        .await
    }
}

/// Read an exercise reply: JSON first, then a "Hint:" marker, then the whole text.
pub fn parse_exercise(raw: &str) -> Result<Exercise, ExtractionError> {
    let body = TextUtils::strip_code_fence(raw);
    if body.is_empty() {
        return Err(ExtractionError::Parse("empty exercise response".to_string()));
    }

    if let Ok(exercise) = serde_json::from_str::<Exercise>(&body) {
        if !exercise.exercise.trim().is_empty() {
            return Ok(exercise);
        }
    }

    if let Some(marker) = HINT_MARKER.find(&body) {
        let exercise = body[..marker.start()].trim().trim_start_matches("Exercise:").trim();
        let hint = body[marker.end()..].trim();
        if !exercise.is_empty() {
            return Ok(Exercise {
                exercise: exercise.to_string(),
                hint: hint.to_string(),
            });
        }
    }

    warn!("Exercise response had no recognizable structure, using it verbatim");
    Ok(Exercise {
        exercise: body.to_string(),
        hint: String::new(),
    })
}

#[async_trait]
impl ConceptExtractor for LlmClient {
    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractionError> {
        let excerpt = TextUtils::truncate_chars(text, self.max_chars);
        debug!(
            "Extracting concepts from {} chars (budget {})",
            excerpt.chars().count(),
            self.max_chars
        );
        let raw = self.complete(EXTRACTION_PROMPT, excerpt.to_string(), 300, 0.2).await?;
        let concepts = parse_concept_list(&raw);
        info!("Extracted {} concept(s)", concepts.len());
        Ok(concepts)
    }
}

#[async_trait]
impl ExerciseGenerator for LlmClient {
    async fn generate_exercise(&self, concept: &str) -> Result<Exercise, ExtractionError> {
        debug!("Generating exercise for '{}'", concept);
        let prompt = format!(
            "Write one practice exercise about {} with a problem statement, an example \
             input/output, and a hint that does not give away the solution.",
            concept
        );
        let raw = self.complete(EXERCISE_PROMPT, prompt, 600, 0.9).await?;
        parse_exercise(&raw)
    }

    async fn check_solution(
        &self,
        concept: &str,
        exercise: &str,
        solution: &str,
    ) -> Result<String, ExtractionError> {
        debug!("Checking solution for '{}' ({} chars)", concept, solution.len());
        let prompt = format!(
            "Concept: {}\n\nExercise:\n{}\n\nLearner solution:\n{}",
            concept, exercise, solution
        );
        let feedback = self.complete(FEEDBACK_PROMPT, prompt, 500, 0.3).await?;
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(ExtractionError::Parse("empty feedback response".to_string()));
        }
        Ok(feedback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string()
    }

    fn client(url: &str, max_chars: usize) -> LlmClient {
        LlmClient::new(url, "test-model", Some("sk-test".into()), max_chars, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_extract_parses_comma_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({ "model": "test-model" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("Loops, Recursion, , Loops"))
            .create_async()
            .await;

        let concepts = client(&server.url(), 100).extract("some text").await.unwrap();
        assert_eq!(concepts, vec!["Loops", "Recursion", "Loops"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_extract_truncates_to_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("\"content\":\"abcde\"".to_string()))
            .with_status(200)
            .with_body(completion_body("Strings"))
            .create_async()
            .await;

        let concepts = client(&server.url(), 5).extract("abcdefghij").await.unwrap();
        assert_eq!(concepts, vec!["Strings"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_backend_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let err = client(&server.url(), 100).extract("text").await.unwrap_err();
        match err {
            ExtractionError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client(&server.url(), 100).extract("text").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let client = client("http://127.0.0.1:1", 100);
        let err = client.extract("text").await.unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Transport(_) | ExtractionError::Timeout(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_body_is_timeout() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(completion_body("Loops").as_bytes())
            })
            .create_async()
            .await;

        let client = LlmClient::new(&server.url(), "test-model", None, 100, Duration::from_secs(1));
        let err = client.extract("text").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(1)), "unexpected error: {err:?}");

        let err = client.generate_exercise("Loops").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(1)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_generate_exercise_reads_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion_body(
                "```json\n{\"exercise\": \"Sum a list\", \"hint\": \"Use a loop\"}\n```",
            ))
            .create_async()
            .await;

        let exercise = client(&server.url(), 100).generate_exercise("Loops").await.unwrap();
        assert_eq!(exercise.exercise, "Sum a list");
        assert_eq!(exercise.hint, "Use a loop");
    }

    #[tokio::test]
    async fn test_check_solution_returns_feedback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("Learner solution".to_string()))
            .with_status(200)
            .with_body(completion_body("  Looks correct.  "))
            .create_async()
            .await;

        let feedback = client(&server.url(), 100)
            .check_solution("Loops", "Sum a list", "print(sum(xs))")
            .await
            .unwrap();
        assert_eq!(feedback, "Looks correct.");
    }

    #[test]
    fn test_parse_exercise_hint_marker() {
        let exercise = parse_exercise("Exercise: Reverse a string\nHint: slicing").unwrap();
        assert_eq!(exercise.exercise, "Reverse a string");
        assert_eq!(exercise.hint, "slicing");
    }

    #[test]
    fn test_parse_exercise_plain_text() {
        let exercise = parse_exercise("Write FizzBuzz").unwrap();
        assert_eq!(exercise.exercise, "Write FizzBuzz");
        assert!(exercise.hint.is_empty());
        assert!(parse_exercise("   ").is_err());
    }
}
