//! Core data types shared across the data-access layer

use serde::Serialize;
use serde_json::{Map, Value};

/// Untyped record exactly as received from the backend
pub type RawRecord = Map<String, Value>;

/// Flat, ordered list of raw records
///
/// Once produced by the shape normalizer this is never a lone object or a
/// nested envelope. Empty is a valid state, distinct from a failed fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedCollection {
    records: Vec<RawRecord>,
}

impl NormalizedCollection {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RawRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a NormalizedCollection {
    type Item = &'a RawRecord;
    type IntoIter = std::slice::Iter<'a, RawRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Authenticated identity attached to every fetch and submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Backend user identifier
    pub user_id: String,
    /// Server-side session identifier, when the login flow issued one
    pub session_id: Option<String>,
    /// Bearer token, sent as `Authorization: Bearer <token>`
    pub token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: None,
            token: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Identifier fields under every alias the backend accepts
    ///
    /// `user_id`, `<prefix>_user_id`, and `session_id` when present.
    pub fn identity_fields(&self, prefix: &str) -> Vec<(String, String)> {
        let mut fields = vec![
            ("user_id".to_string(), self.user_id.clone()),
            (format!("{}_user_id", prefix), self.user_id.clone()),
        ];
        if let Some(session_id) = &self.session_id {
            fields.push(("session_id".to_string(), session_id.clone()));
        }
        fields
    }
}
