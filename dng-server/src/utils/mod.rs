//! Utility modules for dng-server

pub mod quota_retry;

pub use quota_retry::{retry_on_quota, QuotaLimited, DEFAULT_QUOTA_RETRY_INTERVAL};
