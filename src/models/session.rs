// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A server-side session row: opaque JSON payload keyed by sid, plus an
/// expiry the auth layer sweeps on. The storage layer stores and deletes
/// these but never decides when they die.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub sid: String,
    pub sess: serde_json::Value,
    pub expire: DateTime<Utc>,
}
