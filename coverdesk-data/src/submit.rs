//! Submission pipeline with a single reduced-payload fallback
//!
//! The backend occasionally rejects a fully populated submission for reasons
//! unrelated to the record itself (a session field mismatch, a column an older
//! schema lacks). When the primary attempt fails with an ambiguous message, the
//! pipeline resubmits once with only the essential fields and no attachments.
//! Genuine validation errors are never retried, and there is never a third
//! attempt.

use crate::error::{AttachmentError, DataError, DataResult};
use crate::parser::{self, ParseOutcome};
use crate::shape;
use crate::transport::{FilePart, HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, TransportError};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Built-in fragments marking a failure as ambiguous (case-insensitive)
pub const DEFAULT_AMBIGUOUS_TERMS: &[&str] = &[
    "invalid user",
    "user_id",
    "user id",
    "invalid session",
    "session expired",
    "invalid field",
    "invalid parameter",
    "unknown column",
];

/// Plain-text fragments indicating failure in a non-JSON response
const TEXT_FAILURE_TERMS: &[&str] = &["error", "fail", "invalid", "denied", "unable"];

/// Plain-text fragments indicating success in a non-JSON response
const TEXT_SUCCESS_TERMS: &[&str] = &["success", "inserted", "added", "saved", "submitted"];

/// Words that negate an otherwise positive message ("not added", "unsuccessful")
const NEGATION_WORDS: &[&str] = &[
    "not",
    "never",
    "cannot",
    "can't",
    "couldn't",
    "wasn't",
    "unsuccessful",
    "unsuccessfully",
];

/// Longest message surfaced from a plain-text response
const MAX_TEXT_MESSAGE_CHARS: usize = 200;

/// Where an attachment's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// File attached to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Multipart field name (e.g. `li_photo`)
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub source: AttachmentSource,
}

impl Attachment {
    pub fn from_path(
        field_name: impl Into<String>,
        path: impl Into<PathBuf>,
        mime_type: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self {
            field_name: field_name.into(),
            file_name,
            mime_type: mime_type.into(),
            source: AttachmentSource::Path(path),
        }
    }

    pub fn from_bytes(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            source: AttachmentSource::Bytes(bytes),
        }
    }

    async fn load(&self) -> Result<FilePart, AttachmentError> {
        if !is_valid_mime_type(&self.mime_type) {
            return Err(AttachmentError::InvalidMimeType {
                file_name: self.file_name.clone(),
                mime_type: self.mime_type.clone(),
            });
        }
        let bytes = match &self.source {
            AttachmentSource::Bytes(bytes) => bytes.clone(),
            AttachmentSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| AttachmentError::Read {
                        file_name: self.file_name.clone(),
                        path: path.clone(),
                        source,
                    })?
            }
        };
        Ok(FilePart {
            field_name: self.field_name.clone(),
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            bytes,
        })
    }
}

fn is_valid_mime_type(mime_type: &str) -> bool {
    match mime_type.split_once('/') {
        Some((kind, subtype)) => {
            !kind.trim().is_empty() && !subtype.trim().is_empty() && !subtype.contains('/')
        }
        None => false,
    }
}

/// Everything needed to submit one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDescriptor {
    /// Absolute submit URL
    pub endpoint: String,
    /// Session/user identifier fields, sent with every attempt
    pub identity: Vec<(String, String)>,
    /// Full field map, keyed by wire field name
    pub fields: BTreeMap<String, String>,
    /// Wire names kept in the fallback attempt
    pub essential: BTreeSet<String>,
    pub attachments: Vec<Attachment>,
    pub bearer_token: Option<String>,
}

impl SubmissionDescriptor {
    fn request(&self, fields: Vec<(String, String)>, files: Vec<FilePart>, timeout: Duration) -> HttpRequest {
        let mut all_fields = self.identity.clone();
        all_fields.extend(fields);
        HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.clone(),
            query: Vec::new(),
            body: RequestBody::Multipart {
                fields: all_fields,
                files,
            },
            bearer_token: self.bearer_token.clone(),
            timeout,
        }
    }

    fn full_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Field subset used by the fallback attempt
    pub fn essential_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|(name, _)| self.essential.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Final result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success,
    ValidationFailure(String),
    TransportFailure(TransportError),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success)
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionOutcome::Success => f.write_str("Saved successfully"),
            SubmissionOutcome::ValidationFailure(message) => f.write_str(message),
            SubmissionOutcome::TransportFailure(error) => {
                write!(f, "Check your connection ({})", error)
            }
        }
    }
}

/// Classification of one submission response
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Accepted,
    /// Failure whose message matches an ambiguous term
    Ambiguous(String),
    Rejected(String),
    Unreachable(TransportError),
}

/// Builds, sends and classifies submissions
#[derive(Clone)]
pub struct SubmissionPipeline {
    transport: Arc<dyn Transport>,
    ambiguous_terms: Vec<String>,
    timeout: Duration,
}

impl SubmissionPipeline {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            transport,
            ambiguous_terms: DEFAULT_AMBIGUOUS_TERMS.iter().map(|t| t.to_string()).collect(),
            timeout,
        }
    }

    /// Replace the ambiguous-failure vocabulary
    pub fn with_ambiguous_terms(mut self, terms: Vec<String>) -> Self {
        self.ambiguous_terms = terms
            .into_iter()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        self
    }

    /// Submit a record
    ///
    /// Attachments are loaded before any request is sent, so an unreadable
    /// file never produces a partial submission.
    ///
    /// # Errors
    /// - [`DataError::Attachment`] if an attachment cannot be prepared
    /// - [`DataError::Cancelled`] if `cancel` fires during either attempt
    pub async fn submit(
        &self,
        descriptor: &SubmissionDescriptor,
        cancel: &CancellationToken,
    ) -> DataResult<SubmissionOutcome> {
        let mut files = Vec::with_capacity(descriptor.attachments.len());
        for attachment in &descriptor.attachments {
            files.push(attachment.load().await?);
        }

        debug!(
            endpoint = %descriptor.endpoint,
            fields = descriptor.fields.len(),
            attachments = files.len(),
            "Submitting record"
        );
        let primary = descriptor.request(descriptor.full_fields(), files, self.timeout);

        let message = match self.attempt(primary, cancel).await? {
            Verdict::Accepted => {
                info!(endpoint = %descriptor.endpoint, "Submission accepted");
                return Ok(SubmissionOutcome::Success);
            }
            Verdict::Rejected(message) => {
                info!(endpoint = %descriptor.endpoint, message = %message, "Submission rejected");
                return Ok(SubmissionOutcome::ValidationFailure(message));
            }
            Verdict::Unreachable(error) => {
                warn!(endpoint = %descriptor.endpoint, error = %error, "Submission failed in transport");
                return Ok(SubmissionOutcome::TransportFailure(error));
            }
            Verdict::Ambiguous(message) => message,
        };

        let essential = descriptor.essential_fields();
        warn!(
            endpoint = %descriptor.endpoint,
            message = %message,
            essential_fields = essential.len(),
            "Ambiguous submission failure, retrying once with essential fields"
        );
        let fallback = descriptor.request(essential, Vec::new(), self.timeout);

        let outcome = match self.attempt(fallback, cancel).await? {
            Verdict::Accepted => SubmissionOutcome::Success,
            Verdict::Ambiguous(message) | Verdict::Rejected(message) => {
                SubmissionOutcome::ValidationFailure(message)
            }
            Verdict::Unreachable(error) => SubmissionOutcome::TransportFailure(error),
        };
        info!(
            endpoint = %descriptor.endpoint,
            success = outcome.is_success(),
            "Fallback submission finished"
        );
        Ok(outcome)
    }

    async fn attempt(&self, request: HttpRequest, cancel: &CancellationToken) -> DataResult<Verdict> {
        let timeout = request.timeout;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DataError::Cancelled),
            response = tokio::time::timeout(timeout, self.transport.send(request)) => {
                response.unwrap_or(Err(TransportError::Timeout))
            }
        };
        Ok(match response {
            Ok(response) => self.classify(&response),
            Err(error) => Verdict::Unreachable(error),
        })
    }

    fn classify(&self, response: &HttpResponse) -> Verdict {
        match parser::parse(&response.body) {
            ParseOutcome::Parsed(Value::String(text)) => self.classify_text(&text, response.status),
            ParseOutcome::Parsed(value) => {
                if shape::is_success_envelope(&value) {
                    return Verdict::Accepted;
                }
                if let Some(message) = shape::business_error(&value) {
                    return self.failure(message);
                }
                match value.as_object().and_then(shape::envelope_message) {
                    Some(message) if is_affirmative(&message) => Verdict::Accepted,
                    _ if !response.is_success() => {
                        Verdict::Unreachable(TransportError::Status(response.status))
                    }
                    Some(message) => self.failure(message),
                    None => Verdict::Rejected("Unexpected server response".to_string()),
                }
            }
            ParseOutcome::EmptyBody => {
                if response.is_success() {
                    Verdict::Rejected("Empty response from server".to_string())
                } else {
                    Verdict::Unreachable(TransportError::Status(response.status))
                }
            }
            ParseOutcome::NonJson(raw) | ParseOutcome::MalformedJson { raw, .. } => {
                self.classify_text(&raw, response.status)
            }
        }
    }

    fn classify_text(&self, raw: &str, status: u16) -> Verdict {
        if !(200..300).contains(&status) {
            return Verdict::Unreachable(TransportError::Status(status));
        }
        let text = plain_text(raw);
        if is_affirmative(&text) {
            Verdict::Accepted
        } else if is_negated(&text) || contains_any(&text, TEXT_FAILURE_TERMS) {
            self.failure(text)
        } else {
            Verdict::Rejected("Unexpected server response".to_string())
        }
    }

    fn failure(&self, message: String) -> Verdict {
        let lowered = message.to_lowercase();
        if self
            .ambiguous_terms
            .iter()
            .any(|term| lowered.contains(term.as_str()))
        {
            Verdict::Ambiguous(message)
        } else {
            Verdict::Rejected(message)
        }
    }
}

/// Positive message with no failure term and no negation anywhere in it
fn is_affirmative(text: &str) -> bool {
    !is_negated(text)
        && !contains_any(text, TEXT_FAILURE_TERMS)
        && contains_any(text, TEXT_SUCCESS_TERMS)
}

fn is_negated(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .any(|word| NEGATION_WORDS.contains(&word))
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    terms.iter().any(|term| lowered.contains(term))
}

/// Strip markup, collapse whitespace and cap the length
fn plain_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_TEXT_MESSAGE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Reply, ScriptedTransport};
    use std::io::Write;

    fn descriptor() -> SubmissionDescriptor {
        SubmissionDescriptor {
            endpoint: "http://backend.test/add_life_insurance.php".to_string(),
            identity: vec![
                ("user_id".to_string(), "7".to_string()),
                ("li_user_id".to_string(), "7".to_string()),
            ],
            fields: [
                ("li_name", "Ravi Kumar"),
                ("li_policy_no", "LI-2231"),
                ("li_nominee", "Sita Kumar"),
                ("li_email", "ravi@example.com"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            essential: ["li_name", "li_policy_no"].into_iter().map(String::from).collect(),
            attachments: vec![Attachment::from_bytes("li_photo", "photo.jpg", "image/jpeg", vec![1, 2, 3])],
            bearer_token: Some("t0k".to_string()),
        }
    }

    async fn submit(replies: Vec<Reply>) -> (SubmissionOutcome, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let pipeline = SubmissionPipeline::new(transport.clone(), Duration::from_secs(5));
        let outcome = pipeline
            .submit(&descriptor(), &CancellationToken::new())
            .await
            .unwrap();
        (outcome, transport)
    }

    fn multipart(request: &HttpRequest) -> (&Vec<(String, String)>, &Vec<FilePart>) {
        match &request.body {
            RequestBody::Multipart { fields, files } => (fields, files),
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    fn field_names(fields: &[(String, String)]) -> Vec<&str> {
        fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_primary_success() {
        let (outcome, transport) = submit(vec![Reply::Respond(200, r#"{"status":"success","message":"Policy added"}"#)]).await;

        assert_eq!(outcome, SubmissionOutcome::Success);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].bearer_token.as_deref(), Some("t0k"));

        let (fields, files) = multipart(&requests[0]);
        assert_eq!(
            field_names(fields),
            vec!["user_id", "li_user_id", "li_email", "li_name", "li_nominee", "li_policy_no"]
        );
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].field_name, "li_photo");
        assert_eq!(files[0].bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_definite_validation_failure_is_not_retried() {
        let (outcome, transport) = submit(vec![Reply::Respond(
            200,
            r#"{"status":"error","message":"Policy number already exists"}"#,
        )])
        .await;

        assert_eq!(
            outcome,
            SubmissionOutcome::ValidationFailure("Policy number already exists".to_string())
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let (outcome, transport) = submit(vec![Reply::Fail(TransportError::Timeout)]).await;

        assert_eq!(outcome, SubmissionOutcome::TransportFailure(TransportError::Timeout));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_failure_retries_once_with_essential_fields() {
        let (outcome, transport) = submit(vec![
            Reply::Respond(200, r#"{"status":"error","message":"Invalid session"}"#),
            Reply::Respond(200, r#"{"status":"success"}"#),
        ])
        .await;

        assert_eq!(outcome, SubmissionOutcome::Success);
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);

        let (fields, files) = multipart(&requests[1]);
        assert_eq!(
            field_names(fields),
            vec!["user_id", "li_user_id", "li_name", "li_policy_no"]
        );
        assert!(files.is_empty());
        assert_eq!(requests[1].bearer_token.as_deref(), Some("t0k"));
    }

    #[tokio::test]
    async fn test_fallback_failure_is_final() {
        let (outcome, transport) = submit(vec![
            Reply::Respond(200, r#"{"status":"error","message":"Invalid user"}"#),
            Reply::Respond(200, r#"{"status":"error","message":"Invalid user"}"#),
        ])
        .await;

        // Still ambiguous, but never a third attempt
        assert_eq!(outcome, SubmissionOutcome::ValidationFailure("Invalid user".to_string()));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_fallback_transport_failure() {
        let (outcome, transport) = submit(vec![
            Reply::Respond(200, r#"{"success":false,"error":"Unknown column 'li_nominee'"}"#),
            Reply::Fail(TransportError::Connect("refused".to_string())),
        ])
        .await;

        assert_eq!(
            outcome,
            SubmissionOutcome::TransportFailure(TransportError::Connect("refused".to_string()))
        );
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_plain_text_responses() {
        let (outcome, _) = submit(vec![Reply::Respond(200, "Record inserted successfully")]).await;
        assert_eq!(outcome, SubmissionOutcome::Success);

        let (outcome, transport) = submit(vec![
            Reply::Respond(
                200,
                "<br />\n<b>Fatal error</b>: Unknown column 'li_nominee' in 'field list'",
            ),
            Reply::Respond(200, "Data saved"),
        ])
        .await;
        assert_eq!(outcome, SubmissionOutcome::Success);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_non_2xx_html_is_transport_failure() {
        let (outcome, _) = submit(vec![Reply::Respond(502, "<html>Bad Gateway</html>")]).await;
        assert_eq!(outcome, SubmissionOutcome::TransportFailure(TransportError::Status(502)));
    }

    #[tokio::test]
    async fn test_empty_2xx_body_is_validation_failure() {
        let (outcome, _) = submit(vec![Reply::Respond(200, "   ")]).await;
        assert_eq!(
            outcome,
            SubmissionOutcome::ValidationFailure("Empty response from server".to_string())
        );
    }

    #[tokio::test]
    async fn test_message_only_success() {
        let (outcome, _) = submit(vec![Reply::Respond(200, r#"{"message":"Client added successfully","id":12}"#)]).await;
        assert_eq!(outcome, SubmissionOutcome::Success);
    }

    #[tokio::test]
    async fn test_negated_success_words_are_failures() {
        let bodies = [
            (r#"{"message":"Client not added"}"#, "Client not added"),
            ("Record not inserted", "Record not inserted"),
            ("Submission unsuccessful", "Submission unsuccessful"),
        ];
        for (body, message) in bodies {
            let (outcome, transport) = submit(vec![Reply::Respond(200, body)]).await;
            assert_eq!(
                outcome,
                SubmissionOutcome::ValidationFailure(message.to_string()),
                "body {:?}",
                body
            );
            assert_eq!(transport.request_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_message_only_failure_is_surfaced_verbatim() {
        let (outcome, transport) = submit(vec![Reply::Respond(200, r#"{"message":"Failed to add client"}"#)]).await;
        assert_eq!(
            outcome,
            SubmissionOutcome::ValidationFailure("Failed to add client".to_string())
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_message_only_ambiguous_failure_retries() {
        let (outcome, transport) = submit(vec![
            Reply::Respond(200, r#"{"msg":"Invalid field li_nominee"}"#),
            Reply::Respond(200, r#"{"message":"Policy added"}"#),
        ])
        .await;
        assert_eq!(outcome, SubmissionOutcome::Success);
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_affirmative_messages() {
        assert!(is_affirmative("Client added successfully"));
        assert!(is_affirmative("Policy No. 12 saved"));
        assert!(!is_affirmative("Client not added"));
        assert!(!is_affirmative("Couldn't save record"));
        assert!(!is_affirmative("Submission unsuccessful"));
        assert!(!is_affirmative("Insert failed"));
    }

    #[tokio::test]
    async fn test_custom_ambiguous_terms() {
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::Respond(
            200,
            r#"{"status":"error","message":"Invalid session"}"#,
        )]));
        let pipeline = SubmissionPipeline::new(transport.clone(), Duration::from_secs(5))
            .with_ambiguous_terms(vec!["  Token Mismatch ".to_string(), String::new()]);

        let outcome = pipeline
            .submit(&descriptor(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, SubmissionOutcome::ValidationFailure("Invalid session".to_string()));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_attachment_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let pipeline = SubmissionPipeline::new(transport.clone(), Duration::from_secs(5));
        let mut descriptor = descriptor();
        descriptor.attachments = vec![Attachment::from_path(
            "li_photo",
            "/nonexistent/coverdesk/photo.jpg",
            "image/jpeg",
        )];

        let result = pipeline.submit(&descriptor, &CancellationToken::new()).await;
        assert!(matches!(result, Err(DataError::Attachment(AttachmentError::Read { .. }))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_mime_type_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let pipeline = SubmissionPipeline::new(transport.clone(), Duration::from_secs(5));
        let mut descriptor = descriptor();
        descriptor.attachments = vec![Attachment::from_bytes("li_photo", "photo.jpg", "jpeg", vec![0])];

        let result = pipeline.submit(&descriptor, &CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(DataError::Attachment(AttachmentError::InvalidMimeType { .. }))
        ));
    }

    #[tokio::test]
    async fn test_attachment_loaded_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let attachment = Attachment::from_path("li_document", file.path(), "application/pdf");
        let part = attachment.load().await.unwrap();
        assert_eq!(part.bytes, b"%PDF-1.4".to_vec());
        assert_eq!(part.mime_type, "application/pdf");
        assert!(!part.file_name.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_submission() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let pipeline = SubmissionPipeline::new(transport.clone(), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pipeline.submit(&descriptor(), &cancel).await;
        assert!(matches!(result, Err(DataError::Cancelled)));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_plain_text_strips_markup() {
        assert_eq!(
            plain_text("<br />\n<b>Warning</b>:  Invalid   user_id"),
            "Warning : Invalid user_id"
        );
        assert_eq!(plain_text(&"x".repeat(500)).len(), MAX_TEXT_MESSAGE_CHARS);
    }

    #[test]
    fn test_mime_type_validation() {
        assert!(is_valid_mime_type("image/jpeg"));
        assert!(is_valid_mime_type("application/vnd.ms-excel"));
        assert!(!is_valid_mime_type("jpeg"));
        assert!(!is_valid_mime_type("image/"));
        assert!(!is_valid_mime_type("a/b/c"));
    }
}
