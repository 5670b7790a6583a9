//! Download token table
//!
//! Tokens are opaque, URL-safe strings that stand in for an artifact path on
//! disk. Only this table knows the mapping.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const TOKEN_BYTES: usize = 32;

/// A time-limited reference to an artifact
#[derive(Debug, Clone, Serialize)]
pub struct DownloadToken {
    pub token: String,
    pub artifact_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,

    /// File count, archive name and similar facts about the artifact
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DownloadToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_time
    }
}

/// Issues and resolves download tokens
#[derive(Debug, Default)]
pub struct DownloadTokenManager {
    tokens: DashMap<String, DownloadToken>,
}

impl DownloadTokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a token for `artifact_path` valid for `ttl`
    pub fn issue(
        &self,
        artifact_path: PathBuf,
        ttl: Duration,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> DownloadToken {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));

        let mut token = generate_token();
        while self.tokens.contains_key(&token) {
            token = generate_token();
        }

        let issued = DownloadToken {
            token: token.clone(),
            artifact_path,
            created_at: now,
            expiry_time: now + ttl,
            metadata,
        };
        self.tokens.insert(token, issued.clone());

        tracing::debug!(
            artifact = %issued.artifact_path.display(),
            expiry_time = %issued.expiry_time,
            "Issued download token"
        );
        issued
    }

    /// Looks up a token, evicting it if it has expired
    pub fn resolve(&self, token: &str) -> Option<DownloadToken> {
        self.resolve_at(token, Utc::now())
    }

    /// [`Self::resolve`] against an explicit clock
    pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<DownloadToken> {
        let found = self.tokens.get(token)?.clone();
        if found.is_expired(now) {
            self.tokens.remove_if(token, |_, t| t.is_expired(now));
            tracing::debug!("Evicted expired download token on lookup");
            return None;
        }
        Some(found)
    }

    /// Invalidates a token before its expiry
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }

    /// Removes every expired token and returns the removed entries
    ///
    /// Artifact files are left alone; deleting them is up to the caller.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> Vec<DownloadToken> {
        let expired: Vec<String> = self
            .tokens
            .iter()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|token| {
                self.tokens
                    .remove_if(&token, |_, t| t.is_expired(now))
                    .map(|(_, t)| t)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let manager = DownloadTokenManager::new();
        let issued = manager.issue(PathBuf::from("/tmp/a.zip"), Duration::from_secs(60), BTreeMap::new());

        assert_eq!(issued.token.len(), 43);
        assert!(issued
            .token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_are_unique() {
        let manager = DownloadTokenManager::new();
        let a = manager.issue(PathBuf::from("a"), Duration::from_secs(60), BTreeMap::new());
        let b = manager.issue(PathBuf::from("a"), Duration::from_secs(60), BTreeMap::new());
        assert_ne!(a.token, b.token);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_resolve_before_and_after_expiry() {
        let manager = DownloadTokenManager::new();
        let issued = manager.issue(PathBuf::from("/tmp/a.zip"), Duration::from_secs(60), BTreeMap::new());

        let before = issued.expiry_time - chrono::Duration::seconds(1);
        let resolved = manager.resolve_at(&issued.token, before).unwrap();
        assert_eq!(resolved.artifact_path, PathBuf::from("/tmp/a.zip"));

        let after = issued.expiry_time + chrono::Duration::seconds(1);
        assert!(manager.resolve_at(&issued.token, after).is_none());
        assert!(manager.is_empty());
        assert!(manager.resolve_at(&issued.token, before).is_none());
    }

    #[test]
    fn test_unknown_and_revoked() {
        let manager = DownloadTokenManager::new();
        assert!(manager.resolve("nope").is_none());

        let issued = manager.issue(PathBuf::from("a"), Duration::from_secs(60), BTreeMap::new());
        assert!(manager.revoke(&issued.token));
        assert!(!manager.revoke(&issued.token));
        assert!(manager.resolve(&issued.token).is_none());
    }

    #[test]
    fn test_evict_expired_keeps_live_tokens() {
        let manager = DownloadTokenManager::new();
        let short = manager.issue(PathBuf::from("a"), Duration::from_secs(1), BTreeMap::new());
        let long = manager.issue(PathBuf::from("b"), Duration::from_secs(3600), BTreeMap::new());

        let evicted = manager.evict_expired(short.expiry_time + chrono::Duration::seconds(5));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].token, short.token);
        assert!(manager.resolve(&long.token).is_some());
    }
}
