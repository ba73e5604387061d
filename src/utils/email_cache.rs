use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use moka::future::Cache;
use once_cell::sync::Lazy;

use crate::model::user::User;
use crate::store::{DocumentStore, MemoryStore, collections};

/// true  => email is TAKEN
/// false => email is AVAILABLE (usually we store only taken)
pub static EMAIL_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(std::time::Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single email as taken
pub async fn mark_taken(email: &str) {
    EMAIL_CACHE.insert(email.to_lowercase(), true).await;
}

/// Check if an email is taken
pub async fn is_taken(email: &str) -> bool {
    EMAIL_CACHE.get(&email.to_lowercase()).await.unwrap_or(false)
}

/// Batch mark emails as taken
async fn batch_mark(emails: &[String]) {
    let futures: Vec<_> = emails
        .iter()
        .map(|e| EMAIL_CACHE.insert(e.to_lowercase(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load only RECENT accounts into the in-memory cache (batched)
pub async fn warmup_email_cache(store: &MemoryStore, days: i64, batch_size: usize) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(days);

    let docs = store
        .all(collections::USERS)
        .map_err(|e| anyhow!("user scan failed: {}", e))?;

    let mut recent = Vec::new();
    for doc in &docs {
        match User::from_document(doc) {
            Ok(user) if user.last_login_at.map(|t| t >= cutoff).unwrap_or(false) => {
                recent.push(user.email.to_lowercase());
            }
            _ => {}
        }
    }

    for chunk in recent.chunks(batch_size.max(1)) {
        batch_mark(chunk).await;
    }

    tracing::info!(
        "Email cache warmup complete: {} recent users (last {} days)",
        recent.len(),
        days
    );

    Ok(())
}
