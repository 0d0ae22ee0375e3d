//! Test Helper Utilities
//!
//! Shared utilities for testing coverdesk-data against a live HTTP backend

pub mod mock_backend;

// Re-export commonly used items
pub use mock_backend::{MockBackend, MockReply, RecordedRequest};

use coverdesk_common::config::TomlConfig;
use coverdesk_data::{RecordRepository, Session};

/// Config pointing at `base_url` with a short request timeout
pub fn test_config(base_url: &str) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.backend.base_url = base_url.to_string();
    config.backend.request_timeout_secs = 1;
    config.backend.connect_timeout_secs = 1;
    config
}

/// Repository with session `user_id = 42`, token `secret`
pub fn test_repository(base_url: &str) -> RecordRepository {
    RecordRepository::from_config(&test_config(base_url))
        .expect("repository should build")
        .with_session(Session::new("42").with_token("secret"))
}
