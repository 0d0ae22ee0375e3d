//! Consumer-facing record repository
//!
//! Composes the fetch runner, submission pipeline and field resolver per
//! record type, and keeps the most recent successful collection of each type.
//!
//! Cache replacement is wholesale and last-write-wins. A fetch updates its
//! record type's slot at most once, and never when cancelled. Callers that
//! need strict ordering between fetches of the same type must serialize them.

use crate::alias::CanonicalField;
use crate::error::{DataError, DataResult};
use crate::fetch::{FetchAttemptResult, FetchStrategy, FetchStrategyRunner};
use crate::record_type::RecordType;
use crate::resolver;
use crate::submit::{Attachment, SubmissionDescriptor, SubmissionOutcome, SubmissionPipeline};
use crate::transport::{HttpMethod, HttpTransport, Transport};
use crate::types::{NormalizedCollection, RawRecord, Session};
use coverdesk_common::config::TomlConfig;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Default shown when a display field resolves to nothing
pub const DISPLAY_DEFAULT: &str = "N/A";

/// Field values for a new record
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    fields: BTreeMap<CanonicalField, String>,
    extra: BTreeMap<String, String>,
    attachments: Vec<Attachment>,
}

impl RecordDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a canonical field
    pub fn set(mut self, field: CanonicalField, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    /// Set a wire field with no canonical counterpart (e.g. `li_nominee`)
    pub fn extra(mut self, wire_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(wire_name.into(), value.into());
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

/// Fetch, submit and field resolution per record type
pub struct RecordRepository {
    base_url: String,
    request_timeout: Duration,
    runner: FetchStrategyRunner,
    pipeline: SubmissionPipeline,
    session: RwLock<Option<Session>>,
    cache: RwLock<HashMap<RecordType, NormalizedCollection>>,
}

impl RecordRepository {
    /// Create a repository over an arbitrary transport
    pub fn new(transport: Arc<dyn Transport>, config: &TomlConfig) -> Self {
        let request_timeout = config.backend.request_timeout();
        let mut pipeline = SubmissionPipeline::new(transport.clone(), request_timeout);
        if let Some(terms) = &config.submission.ambiguous_terms {
            pipeline = pipeline.with_ambiguous_terms(terms.clone());
        }

        Self {
            base_url: config.backend.base_url.trim().trim_end_matches('/').to_string(),
            request_timeout,
            runner: FetchStrategyRunner::new(transport),
            pipeline,
            session: RwLock::new(None),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a repository backed by the reqwest transport
    pub fn from_config(config: &TomlConfig) -> DataResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.backend)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn with_session(self, session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
            ..self
        }
    }

    /// Replace the session used by subsequent operations
    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Strategy sequence for one record type: POST, GET, alternate GET
    pub fn fetch_strategies(&self, record_type: RecordType, session: &Session) -> Vec<FetchStrategy> {
        let endpoints = record_type.endpoints();
        let identity = session.identity_fields(record_type.prefix());

        vec![
            FetchStrategy {
                label: "primary-post".to_string(),
                method: HttpMethod::Post,
                url: self.url(endpoints.fetch),
                params: identity.clone(),
                bearer_token: session.token.clone(),
                timeout: self.request_timeout,
            },
            FetchStrategy {
                label: "fallback-get".to_string(),
                method: HttpMethod::Get,
                url: self.url(endpoints.fetch),
                params: identity,
                bearer_token: session.token.clone(),
                timeout: self.request_timeout,
            },
            FetchStrategy {
                label: "alternate-get".to_string(),
                method: HttpMethod::Get,
                url: self.url(endpoints.alternate_fetch),
                params: vec![(endpoints.alternate_param.to_string(), session.user_id.clone())],
                bearer_token: session.token.clone(),
                timeout: self.request_timeout,
            },
        ]
    }

    /// Fetch the collection for `record_type`
    ///
    /// On `Success` (including an empty collection) the cache slot is
    /// replaced. Other results leave the cache untouched.
    ///
    /// # Errors
    /// - [`DataError::MissingSession`] if no session is set
    /// - [`DataError::Cancelled`] if `cancel` fires; the cache is not modified
    pub async fn fetch(
        &self,
        record_type: RecordType,
        cancel: &CancellationToken,
    ) -> DataResult<FetchAttemptResult> {
        let session = self.session().await.ok_or(DataError::MissingSession)?;
        let operation_id = Uuid::new_v4();
        debug!(%operation_id, record_type = %record_type, "Fetching records");

        let strategies = self.fetch_strategies(record_type, &session);
        let result = self.runner.run(&strategies, cancel).await?;

        if cancel.is_cancelled() {
            debug!(%operation_id, record_type = %record_type, "Fetch cancelled after completion");
            return Err(DataError::Cancelled);
        }

        if let FetchAttemptResult::Success(collection) = &result {
            self.cache
                .write()
                .await
                .insert(record_type, collection.clone());
            info!(
                %operation_id,
                record_type = %record_type,
                records = collection.len(),
                "Record cache replaced"
            );
        }
        Ok(result)
    }

    /// Most recent successful collection for `record_type`
    pub async fn cached(&self, record_type: RecordType) -> Option<NormalizedCollection> {
        self.cache.read().await.get(&record_type).cloned()
    }

    /// Drop every cached collection (e.g. on logout)
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Build the submission descriptor for a draft
    ///
    /// `<prefix>_add_date` is stamped with today's date unless the draft sets
    /// `addDate`; it is always part of the essential subset. `userId` is
    /// carried by the session identity fields, never by the draft.
    pub fn submission_descriptor(
        &self,
        record_type: RecordType,
        session: &Session,
        draft: RecordDraft,
    ) -> SubmissionDescriptor {
        let mut fields = draft.extra;
        for (field, value) in draft.fields {
            if field == CanonicalField::UserId {
                continue;
            }
            fields.insert(record_type.wire_name(field), value);
        }

        let add_date = record_type.wire_name(CanonicalField::AddDate);
        fields
            .entry(add_date.clone())
            .or_insert_with(|| chrono::Local::now().format("%Y-%m-%d").to_string());

        let mut essential: BTreeSet<String> = record_type
            .essential_fields()
            .iter()
            .map(|field| record_type.wire_name(*field))
            .collect();
        essential.insert(add_date);

        SubmissionDescriptor {
            endpoint: self.url(record_type.endpoints().submit),
            identity: session.identity_fields(record_type.prefix()),
            fields,
            essential,
            attachments: draft.attachments,
            bearer_token: session.token.clone(),
        }
    }

    /// Submit a new record
    ///
    /// Does not touch the cache; fetch again to observe the new record.
    ///
    /// # Errors
    /// - [`DataError::MissingSession`] if no session is set
    /// - [`DataError::Attachment`] if an attachment cannot be read
    /// - [`DataError::Cancelled`] if `cancel` fires
    pub async fn submit(
        &self,
        record_type: RecordType,
        draft: RecordDraft,
        cancel: &CancellationToken,
    ) -> DataResult<SubmissionOutcome> {
        let session = self.session().await.ok_or(DataError::MissingSession)?;
        let descriptor = self.submission_descriptor(record_type, &session, draft);
        debug!(record_type = %record_type, "Submitting record");
        self.pipeline.submit(&descriptor, cancel).await
    }

    /// Resolve a canonical field through `record_type`'s alias table
    ///
    /// Returns `Value::Null` when nothing matches or the field is not
    /// registered for this type.
    pub fn field(&self, record_type: RecordType, record: &RawRecord, field: CanonicalField) -> Value {
        match record_type.alias_table().aliases(field) {
            Some(aliases) => resolver::resolve(record, aliases, Value::Null),
            None => Value::Null,
        }
    }

    /// Resolve a canonical field as display text, `"N/A"` when absent
    pub fn display(&self, record_type: RecordType, record: &RawRecord, field: CanonicalField) -> String {
        match record_type.alias_table().aliases(field) {
            Some(aliases) => resolver::resolve_display(record, aliases, DISPLAY_DEFAULT),
            None => DISPLAY_DEFAULT.to_string(),
        }
    }
}
