//! Reference summaries from a chat-completion API.
//!
//! [`SummaryJob`] adds a `summary` column to a CSV file, one API call per
//! row. Transient API failures are retried according to a [`RetryPolicy`];
//! a row that still fails gets a failure marker instead of aborting the job.

use crate::cell::RawCell;
use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::table::Table;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// System prompt sent with every request.
pub const SYSTEM_PROMPT: &str = "당신은 뉴스를 요약하는 전문가입니다.";

/// Prefix of the marker written for rows that could not be summarized.
pub const FAILURE_MARKER: &str = "요약 실패";

/// Column written by [`SummaryJob`].
pub const SUMMARY_COLUMN: &str = "summary";

/// Builds the user prompt for `text`.
pub fn user_prompt(text: &str) -> String {
    format!(
        "다음은 뉴스 입니다. 이를 바탕으로 100자 내외로 요약한 내용을 생성해서 한글로 주세요:\n\n\"{}\"",
        text
    )
}

/// Produces a summary of a text.
pub trait Summarizer: Send + Sync {
    /// Summarizes `text`.
    fn summarize(&self, text: &str) -> Result<String>;
}

/// How a failed request is classified for retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429.
    RateLimited,
    /// No HTTP response (connect error, timeout).
    Connection,
    /// HTTP 5xx.
    Server,
    /// Anything else; never retried.
    Other,
}

impl FailureKind {
    /// Classifies an error.
    pub fn of(err: &Error) -> Self {
        match err {
            Error::Api {
                status: Some(429), ..
            } => FailureKind::RateLimited,
            Error::Api {
                status: Some(status),
                ..
            } if (500..600).contains(status) => FailureKind::Server,
            Error::Api { status: None, .. } | Error::Fetch(_) => FailureKind::Connection,
            _ => FailureKind::Other,
        }
    }
}

/// Exponential backoff for one failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Upper bound of the wait, in seconds.
    pub max_wait_secs: u64,
    /// Retries are allowed while the attempt number is below this.
    pub max_attempts: u32,
}

impl Backoff {
    /// Wait before retrying after `attempt` (1-based), or `None` to give up.
    pub fn wait(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let secs = 2u64.saturating_pow(attempt).min(self.max_wait_secs);
        Some(Duration::from_secs(secs))
    }
}

/// Retry rules per failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Backoff for rate limiting.
    pub rate_limit: Backoff,
    /// Backoff for connection errors.
    pub connection: Backoff,
    /// Backoff for server errors.
    pub server: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit: Backoff {
                max_wait_secs: 60,
                max_attempts: 3,
            },
            connection: Backoff {
                max_wait_secs: 30,
                max_attempts: 3,
            },
            server: Backoff {
                max_wait_secs: 30,
                max_attempts: 2,
            },
        }
    }
}

impl RetryPolicy {
    /// Never retries.
    pub fn none() -> Self {
        let never = Backoff {
            max_wait_secs: 0,
            max_attempts: 0,
        };
        Self {
            rate_limit: never,
            connection: never,
            server: never,
        }
    }

    /// Wait before retrying `err` after `attempt` (1-based), or `None`.
    pub fn retry_after(&self, err: &Error, attempt: u32) -> Option<Duration> {
        match FailureKind::of(err) {
            FailureKind::RateLimited => self.rate_limit.wait(attempt),
            FailureKind::Connection => self.connection.wait(attempt),
            FailureKind::Server => self.server.wait(attempt),
            FailureKind::Other => None,
        }
    }

    /// Runs `call` until it succeeds or the policy gives up.
    ///
    /// `sleep` is called with each backoff wait.
    pub fn run<T>(
        &self,
        mut call: impl FnMut() -> Result<T>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T> {
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) => match self.retry_after(&err, attempt) {
                    Some(wait) => {
                        warn!(
                            target: "newsprep::summarize",
                            "{} (attempt {}); retrying in {}s",
                            err,
                            attempt,
                            wait.as_secs()
                        );
                        sleep(wait);
                        attempt += 1;
                    }
                    None => {
                        error!(
                            target: "newsprep::summarize",
                            "giving up after {} attempts: {}", attempt, err
                        );
                        return Err(err);
                    }
                },
            }
        }
    }
}

/// Request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageStats {
    /// Requests sent.
    pub total_requests: u64,
    /// Requests that failed.
    pub failed_requests: u64,
    /// Time spent in requests.
    pub total_time: Duration,
}

impl UsageStats {
    /// Requests that succeeded.
    pub fn successful_requests(&self) -> u64 {
        self.total_requests - self.failed_requests
    }

    /// Share of successful requests, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests() as f64 / self.total_requests as f64 * 100.0
    }

    /// Mean request latency.
    pub fn average_latency(&self) -> Duration {
        if self.total_requests == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.total_requests as u32
    }
}

/// Tracks request counts and latency.
#[derive(Debug, Default)]
pub struct UsageMonitor {
    stats: Mutex<UsageStats>,
}

impl UsageMonitor {
    /// Creates an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs and records one request.
    pub fn track<T>(&self, request: impl FnOnce() -> Result<T>) -> Result<T> {
        let started = Instant::now();
        let result = request();
        let elapsed = started.elapsed();

        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        stats.total_requests += 1;
        stats.total_time += elapsed;
        if let Err(e) = &result {
            stats.failed_requests += 1;
            error!(target: "newsprep::summarize", "API request failed: {}", e);
        }
        result
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> UsageStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Clears the counters.
    pub fn reset(&self) {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner()) = UsageStats::default();
    }

    /// Logs the counters.
    pub fn report(&self) {
        let stats = self.stats();
        info!(
            target: "newsprep::summarize",
            "API usage: {} requests, {} succeeded, {} failed, {:.1}% success, {:.2}s total, {:.2}s average",
            stats.total_requests,
            stats.successful_requests(),
            stats.failed_requests,
            stats.success_rate(),
            stats.total_time.as_secs_f64(),
            stats.average_latency().as_secs_f64()
        );
    }
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Bearer token.
    pub api_key: String,
    /// API root, without the trailing `/chat/completions`.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Completion length limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry rules.
    pub retry: RetryPolicy,
}

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

impl SummarizerConfig {
    /// Creates a config with default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 300,
            temperature: 0.5,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }

    /// Reads `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        Ok(config)
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the retry rules.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Full URL of the completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

fn chat_request<'a>(config: &'a SummarizerConfig, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model: &config.model,
        messages: [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

/// Extracts the trimmed first choice of a completion response.
pub fn first_choice(body: &serde_json::Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.trim().to_string())
}

#[cfg(feature = "http")]
pub use http::ChatCompletionSummarizer;

#[cfg(feature = "http")]
mod http {
    use super::*;

    /// [`Summarizer`] over an OpenAI-compatible chat-completion API.
    #[derive(Debug)]
    pub struct ChatCompletionSummarizer {
        client: reqwest::blocking::Client,
        config: SummarizerConfig,
        monitor: UsageMonitor,
    }

    impl ChatCompletionSummarizer {
        /// Creates a summarizer.
        pub fn new(config: SummarizerConfig) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(config.timeout)
                .build()?;
            Ok(Self {
                client,
                config,
                monitor: UsageMonitor::new(),
            })
        }

        /// Creates a summarizer configured from the environment.
        pub fn from_env() -> Result<Self> {
            Self::new(SummarizerConfig::from_env()?)
        }

        /// Returns the usage monitor.
        pub fn monitor(&self) -> &UsageMonitor {
            &self.monitor
        }

        fn request(&self, prompt: &str) -> Result<String> {
            let response = self
                .client
                .post(self.config.endpoint())
                .bearer_auth(&self.config.api_key)
                .json(&chat_request(&self.config, prompt))
                .send()
                .map_err(|e| Error::Api {
                    status: e.status().map(|s| s.as_u16()),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().unwrap_or_default();
                return Err(Error::Api {
                    status: Some(status.as_u16()),
                    message,
                });
            }

            let body: serde_json::Value = response.json().map_err(|e| Error::Api {
                status: Some(status.as_u16()),
                message: format!("invalid response body: {e}"),
            })?;
            first_choice(&body).ok_or_else(|| Error::Api {
                status: Some(status.as_u16()),
                message: "response has no completion".to_string(),
            })
        }
    }

    impl Summarizer for ChatCompletionSummarizer {
        fn summarize(&self, text: &str) -> Result<String> {
            let prompt = user_prompt(text);
            self.config.retry.run(
                || self.monitor.track(|| self.request(&prompt)),
                thread::sleep,
            )
        }
    }
}

/// Outcome of a [`SummaryJob`].
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// File written.
    pub output: PathBuf,
    /// Rows processed.
    pub rows: usize,
    /// Rows summarized.
    pub succeeded: usize,
    /// Rows that got the failure marker.
    pub failed: usize,
}

/// Adds a summary column to a CSV file.
#[derive(Debug, Clone)]
pub struct SummaryJob {
    input: PathBuf,
    text_column: String,
    output: Option<PathBuf>,
    delay: Duration,
    encodings: Vec<TextEncoding>,
}

impl SummaryJob {
    /// Creates a job for `input` with default settings.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            text_column: "content".to_string(),
            output: None,
            delay: Duration::from_secs(1),
            encodings: TextEncoding::LADDER.to_vec(),
        }
    }

    /// Sets the text column.
    pub fn with_text_column(mut self, column: impl Into<String>) -> Self {
        self.text_column = column.into();
        self
    }

    /// Sets the output file.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Sets the pause between API calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Output file: the configured one, or `<stem>_with_summaries.csv`
    /// next to the input.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => default_output_path(&self.input),
        }
    }

    /// Runs the job.
    pub fn run(&self, summarizer: &dyn Summarizer) -> Result<SummaryReport> {
        self.run_with_progress(summarizer, |_, _| {})
    }

    /// Runs the job, calling `progress(done, total)` after each row.
    ///
    /// # Errors
    ///
    /// Fails if the input cannot be read, lacks the text column
    /// ([`Error::MissingColumns`]), or the output cannot be written.
    pub fn run_with_progress(
        &self,
        summarizer: &dyn Summarizer,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<SummaryReport> {
        let mut table = Table::read_with_ladder(&self.input, &self.encodings, |_| {})?.table;
        info!(
            target: "newsprep::summarize",
            "loaded {}: {} rows",
            self.input.display(),
            table.len()
        );

        let cells = table
            .column_cells(&self.text_column)
            .ok_or_else(|| Error::MissingColumns(vec![self.text_column.clone()]))?;

        let total = cells.len();
        let mut summaries = Vec::with_capacity(total);
        let mut failed = 0;

        for (row, cell) in cells.iter().enumerate() {
            if row > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            info!(target: "newsprep::summarize", "summarizing {}/{}", row + 1, total);

            match summarize_cell(summarizer, cell) {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    warn!(target: "newsprep::summarize", "row {}: summary failed: {}", row, e);
                    failed += 1;
                    summaries.push(format!("{}: {}", FAILURE_MARKER, e));
                }
            }
            progress(row + 1, total);
        }

        table.set_column(SUMMARY_COLUMN, summaries);
        let output = self.output_path();
        table.write(&output)?;
        info!(target: "newsprep::summarize", "summaries written to {}", output.display());

        Ok(SummaryReport {
            output,
            rows: total,
            succeeded: total - failed,
            failed,
        })
    }
}

fn summarize_cell(summarizer: &dyn Summarizer, cell: &RawCell) -> Result<String> {
    match cell.coerce() {
        Some(Ok(text)) if !text.trim().is_empty() => summarizer.summarize(&text),
        Some(Err(reason)) => Err(Error::Encoding(reason)),
        _ => Err(Error::Config("empty text".to_string())),
    }
}

/// `<dir>/<stem>_with_summaries.csv` for `<dir>/<stem>.csv`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_with_summaries.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct FirstWords;

    impl Summarizer for FirstWords {
        fn summarize(&self, text: &str) -> Result<String> {
            if text.contains("실패") {
                return Err(Error::Api {
                    status: Some(400),
                    message: "bad request".into(),
                });
            }
            Ok(text.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
        }
    }

    fn api_error(status: Option<u16>) -> Error {
        Error::Api {
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(FailureKind::of(&api_error(Some(429))), FailureKind::RateLimited);
        assert_eq!(FailureKind::of(&api_error(Some(503))), FailureKind::Server);
        assert_eq!(FailureKind::of(&api_error(None)), FailureKind::Connection);
        assert_eq!(FailureKind::of(&Error::Fetch("reset".into())), FailureKind::Connection);
        assert_eq!(FailureKind::of(&api_error(Some(401))), FailureKind::Other);
    }

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        let rate = api_error(Some(429));
        assert_eq!(policy.retry_after(&rate, 1), Some(Duration::from_secs(2)));
        assert_eq!(policy.retry_after(&rate, 2), Some(Duration::from_secs(4)));
        assert_eq!(policy.retry_after(&rate, 3), None);

        let server = api_error(Some(500));
        assert_eq!(policy.retry_after(&server, 1), Some(Duration::from_secs(2)));
        assert_eq!(policy.retry_after(&server, 2), None);

        assert_eq!(policy.retry_after(&api_error(Some(400)), 1), None);
    }

    #[test]
    fn test_backoff_is_capped() {
        let backoff = Backoff {
            max_wait_secs: 30,
            max_attempts: 10,
        };
        assert_eq!(backoff.wait(4), Some(Duration::from_secs(16)));
        assert_eq!(backoff.wait(5), Some(Duration::from_secs(30)));
        assert_eq!(backoff.wait(9), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_run_retries_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let mut waits = Vec::new();
        let result = RetryPolicy::default().run(
            || {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(api_error(Some(429)))
                } else {
                    Ok("요약")
                }
            },
            |wait| waits.push(wait),
        );
        assert_eq!(result.unwrap(), "요약");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(waits, vec![Duration::from_secs(2), Duration::from_secs(4)]);
    }

    #[test]
    fn test_run_gives_up() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = RetryPolicy::default().run(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(api_error(Some(502)))
            },
            |_| {},
        );
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let calls = AtomicUsize::new(0);
        let _ = RetryPolicy::none().run(
            || -> Result<()> {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(api_error(None))
            },
            |_| {},
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_usage_monitor() {
        let monitor = UsageMonitor::new();
        assert_eq!(monitor.stats().success_rate(), 0.0);
        let _ = monitor.track(|| Ok(1));
        let _ = monitor.track(|| -> Result<()> { Err(api_error(None)) });
        let _ = monitor.track(|| Ok(2));

        let stats = monitor.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.successful_requests(), 2);
        assert!((stats.success_rate() - 66.666).abs() < 0.01);
        monitor.report();

        monitor.reset();
        assert_eq!(monitor.stats().total_requests, 0);
    }

    #[test]
    fn test_prompt_and_request_body() {
        let prompt = user_prompt("국회 본회의 개최");
        assert!(prompt.starts_with("다음은 뉴스 입니다."));
        assert!(prompt.ends_with("\n\n\"국회 본회의 개최\""));

        let config = SummarizerConfig::new("sk-test").with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");

        let body = serde_json::to_value(chat_request(&config, &prompt)).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["content"], prompt.as_str());
    }

    #[test]
    fn test_first_choice() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  정부가 예산안을 발표했다.\n"}}]
        });
        assert_eq!(first_choice(&body).as_deref(), Some("정부가 예산안을 발표했다."));
        assert_eq!(first_choice(&serde_json::json!({"choices": []})), None);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("data/naver_news.csv")),
            PathBuf::from("data/naver_news_with_summaries.csv")
        );
    }

    #[test]
    fn test_job_writes_summaries_and_markers() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("articles.csv");
        fs::write(
            &input,
            "title,content\nA,정부가 예산안을 발표했다\nB,\nC,요청 실패 사례\n",
        )
        .unwrap();

        let mut progress = Vec::new();
        let report = SummaryJob::new(&input)
            .with_delay(Duration::ZERO)
            .run_with_progress(&FirstWords, |done, total| progress.push((done, total)))
            .unwrap();

        assert_eq!(report.output, dir.path().join("articles_with_summaries.csv"));
        assert_eq!(report.rows, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(progress.last(), Some(&(3, 3)));

        let written = Table::read(&report.output).unwrap();
        assert_eq!(written.encoding, TextEncoding::Utf8Sig);
        let table = written.table;
        assert_eq!(table.headers(), &["title", "content", "summary"]);
        assert_eq!(table.field(0, 2), Some("정부가 예산안을"));
        assert!(table.field(1, 2).unwrap().starts_with(FAILURE_MARKER));
        assert!(table.field(2, 2).unwrap().starts_with("요약 실패: API error (HTTP 400)"));
    }

    #[test]
    fn test_job_requires_text_column() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("other.csv");
        fs::write(&input, "title\nA\n").unwrap();

        let err = SummaryJob::new(&input).run(&FirstWords).unwrap_err();
        assert!(matches!(err, Error::MissingColumns(ref cols) if cols == &["content"]));
        assert!(!dir.path().join("other_with_summaries.csv").exists());
    }
}
