use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStats, CachedGuide};
use crate::error::AppError;

// Generate request as sent to the backend. Only read for validation; the raw body is relayed.
#[derive(Deserialize, Debug)]
pub struct GenerateRequest {
    pub model: Option<String>,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.model.as_deref() {
            Some(model) if !model.is_empty() => Ok(()),
            _ => Err(AppError::missing("model")),
        }
    }
}

// Body of cache-get and cache-delete
#[derive(Deserialize, Debug, Default)]
pub struct CacheKeyPayload {
    pub task_name: Option<String>,
    pub task_description: Option<String>,
    #[serde(default)]
    pub is_advanced: bool,
    pub model_name: Option<String>,
}

impl CacheKeyPayload {
    pub fn into_key(self) -> Result<CacheKey, AppError> {
        let task_name = self
            .task_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::missing("task_name"))?;
        // An empty description is a valid identity (projects have none)
        let task_description = self
            .task_description
            .ok_or_else(|| AppError::missing("task_description"))?;
        let model_name = self
            .model_name
            .filter(|model| !model.is_empty())
            .ok_or_else(|| AppError::missing("model_name"))?;

        Ok(CacheKey {
            task_name,
            task_description,
            is_advanced: self.is_advanced,
            model_name,
        })
    }
}

// Body of cache-save
#[derive(Deserialize, Debug)]
pub struct CacheSavePayload {
    #[serde(flatten)]
    pub key: CacheKeyPayload,
    pub guide_content: Option<String>,
}

impl CacheSavePayload {
    pub fn into_parts(self) -> Result<(CacheKey, String), AppError> {
        let key = self.key.into_key()?;
        let content = self
            .guide_content
            .ok_or_else(|| AppError::missing("guide_content"))?;
        Ok((key, content))
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct CacheLookupResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guide_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Option<CachedGuide>> for CacheLookupResponse {
    fn from(guide: Option<CachedGuide>) -> Self {
        match guide {
            Some(guide) => Self {
                found: true,
                guide_content: Some(guide.content),
                created_at: Some(guide.created_at),
            },
            None => Self {
                found: false,
                guide_content: None,
                created_at: None,
            },
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Serialize, Debug)]
pub struct CacheStatsResponse {
    pub total_guides: u64,
    pub normal_guides: u64,
    pub advanced_guides: u64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            total_guides: stats.total,
            normal_guides: stats.normal,
            advanced_guides: stats.advanced,
        }
    }
}
