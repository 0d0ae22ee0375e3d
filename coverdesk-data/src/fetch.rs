//! Fetch strategy runner
//!
//! A single unreliable endpoint is queried with decreasing specificity:
//! authenticated POST, then query-string GET, then an alternate URL. Different
//! backend versions answer only one of these. The runner walks the strategies
//! strictly in order, never racing two requests, and stops at the first
//! non-empty success.
//!
//! An empty successful collection is provisional: some endpoints answer `[]`
//! when authentication fails, so the next strategy is still tried.

use crate::error::{DataError, DataResult};
use crate::parser::{self, ParseOutcome};
use crate::shape::{self, ShapeError, ShapeNormalizer};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, TransportError};
use crate::types::NormalizedCollection;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Message fragments marking a business error as authentication-related
///
/// Auth-like errors advance to the next strategy; any other business error is
/// a definitive backend answer and ends the sequence.
const AUTH_LIKE_TERMS: &[&str] = &[
    "auth",
    "login",
    "session",
    "token",
    "user",
    "invalid",
    "access denied",
    "forbidden",
    "permission",
];

/// One concrete request variant tried by the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchStrategy {
    /// Short name used in logs ("primary-post", "fallback-get", ...)
    pub label: String,
    pub method: HttpMethod,
    pub url: String,
    /// Identifier parameters: form body for POST, query string for GET
    pub params: Vec<(String, String)>,
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl FetchStrategy {
    fn to_request(&self) -> HttpRequest {
        let (query, body) = match self.method {
            HttpMethod::Get => (self.params.clone(), RequestBody::Empty),
            HttpMethod::Post => (Vec::new(), RequestBody::Form(self.params.clone())),
        };
        HttpRequest {
            method: self.method,
            url: self.url.clone(),
            query,
            body,
            bearer_token: self.bearer_token.clone(),
            timeout: self.timeout,
        }
    }
}

/// Classified result of one attempt, or of a whole strategy sequence
#[derive(Debug, Clone, PartialEq)]
pub enum FetchAttemptResult {
    /// Response normalized to a collection (possibly empty)
    Success(NormalizedCollection),
    /// Backend declared an explicit failure
    BusinessError(String),
    /// Network failure, timeout, or non-2xx status without a usable body
    TransportError(TransportError),
    /// Well-formed JSON that normalization could not interpret
    UnexpectedShape(ShapeError),
    /// Empty, markup or undecodable body
    Inconclusive,
}

impl FetchAttemptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchAttemptResult::Success(_))
    }

    pub fn collection(&self) -> Option<&NormalizedCollection> {
        match self {
            FetchAttemptResult::Success(collection) => Some(collection),
            _ => None,
        }
    }

    /// Text suitable for showing to the end user
    pub fn user_message(&self) -> String {
        match self {
            FetchAttemptResult::Success(collection) if collection.is_empty() => {
                "No records yet".to_string()
            }
            FetchAttemptResult::Success(collection) => format!("{} records", collection.len()),
            FetchAttemptResult::BusinessError(message) => message.clone(),
            FetchAttemptResult::TransportError(_) => "Check your connection".to_string(),
            FetchAttemptResult::UnexpectedShape(_) | FetchAttemptResult::Inconclusive => {
                "Unexpected server response".to_string()
            }
        }
    }

    /// Reporting priority when no strategy produced a non-empty success
    fn rank(&self) -> u8 {
        match self {
            FetchAttemptResult::BusinessError(_) => 4,
            FetchAttemptResult::Success(_) => 3,
            FetchAttemptResult::UnexpectedShape(_) => 2,
            FetchAttemptResult::TransportError(_) => 1,
            FetchAttemptResult::Inconclusive => 0,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FetchAttemptResult::Success(_) => "success",
            FetchAttemptResult::BusinessError(_) => "business_error",
            FetchAttemptResult::TransportError(_) => "transport_error",
            FetchAttemptResult::UnexpectedShape(_) => "unexpected_shape",
            FetchAttemptResult::Inconclusive => "inconclusive",
        }
    }
}

/// Classify one HTTP response
///
/// Parseable bodies are classified by content regardless of status; bodies
/// that do not parse are a transport error on non-2xx, inconclusive otherwise.
pub fn classify_response(response: &HttpResponse, normalizer: &ShapeNormalizer) -> FetchAttemptResult {
    match parser::parse(&response.body) {
        ParseOutcome::Parsed(value) => {
            if let Some(message) = shape::business_error(&value) {
                return FetchAttemptResult::BusinessError(message);
            }
            match normalizer.normalize(value) {
                Ok(collection) => FetchAttemptResult::Success(collection),
                Err(_) if !response.is_success() => {
                    FetchAttemptResult::TransportError(TransportError::Status(response.status))
                }
                Err(error) => FetchAttemptResult::UnexpectedShape(error),
            }
        }
        outcome => {
            if let ParseOutcome::MalformedJson { error, .. } = &outcome {
                debug!(error = %error, "Response body is malformed JSON");
            }
            if response.is_success() {
                FetchAttemptResult::Inconclusive
            } else {
                FetchAttemptResult::TransportError(TransportError::Status(response.status))
            }
        }
    }
}

/// Business error that should advance to the next strategy
pub fn is_auth_like(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    AUTH_LIKE_TERMS.iter().any(|term| message.contains(term))
}

/// Walks fetch strategies in order until one yields a non-empty collection
#[derive(Clone)]
pub struct FetchStrategyRunner {
    transport: Arc<dyn Transport>,
    normalizer: ShapeNormalizer,
}

impl FetchStrategyRunner {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            normalizer: ShapeNormalizer::for_all_tables(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: ShapeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Run `strategies` sequentially
    ///
    /// Returns the first non-empty `Success`. Otherwise returns the most
    /// informative result observed: business error, then empty success, then
    /// unexpected shape, then transport error, then inconclusive (later
    /// attempts win ties).
    ///
    /// # Errors
    /// [`DataError::Cancelled`] if `cancel` fires before the sequence completes.
    pub async fn run(
        &self,
        strategies: &[FetchStrategy],
        cancel: &CancellationToken,
    ) -> DataResult<FetchAttemptResult> {
        let mut best: Option<FetchAttemptResult> = None;

        for strategy in strategies {
            if cancel.is_cancelled() {
                return Err(DataError::Cancelled);
            }

            debug!(
                strategy = %strategy.label,
                method = %strategy.method,
                url = %strategy.url,
                "Attempting fetch strategy"
            );

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(strategy = %strategy.label, "Fetch cancelled in flight");
                    return Err(DataError::Cancelled);
                }
                response = tokio::time::timeout(strategy.timeout, self.transport.send(strategy.to_request())) => {
                    response.unwrap_or(Err(TransportError::Timeout))
                }
            };

            let result = match response {
                Ok(response) => classify_response(&response, &self.normalizer),
                Err(error) => FetchAttemptResult::TransportError(error),
            };

            debug!(strategy = %strategy.label, result = result.label(), "Fetch strategy classified");

            if let Some(records) = result.collection().map(NormalizedCollection::len).filter(|n| *n > 0) {
                info!(strategy = %strategy.label, records = records, "Fetch succeeded");
                return Ok(result);
            }

            let terminal = match &result {
                FetchAttemptResult::BusinessError(message) => !is_auth_like(message),
                FetchAttemptResult::UnexpectedShape(error) => {
                    warn!(strategy = %strategy.label, error = %error, "Unrecognized response shape");
                    true
                }
                _ => false,
            };

            best = Some(match best {
                Some(current) if current.rank() > result.rank() => current,
                _ => result,
            });

            if terminal {
                break;
            }
        }

        let result = best.unwrap_or(FetchAttemptResult::Inconclusive);
        if !result.is_success() {
            warn!(
                strategies = strategies.len(),
                result = result.label(),
                "Fetch strategies exhausted without records"
            );
        }
        Ok(result)
    }
}
