//! Request validation. Runs before any store read or embedding call.

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::types::{RetrievalRequest, Scope};

pub const MAX_PROJECT_ID_CHARS: usize = 128;

/// A request that passed validation, with `k` resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub scope: Scope,
    pub query: String,
    pub k: usize,
}

pub fn validate_request(
    request: &RetrievalRequest,
    config: &RetrievalConfig,
) -> Result<ValidatedQuery, RetrievalError> {
    validate_project_id(&request.project_id)?;

    let query = request.query.trim();
    if query.is_empty() {
        return Err(RetrievalError::InvalidRequest("query must not be empty".to_string()));
    }
    let query_chars = query.chars().count();
    if query_chars > config.max_query_chars {
        return Err(RetrievalError::InvalidRequest(format!(
            "query is {query_chars} characters, limit is {}",
            config.max_query_chars
        )));
    }

    let k = resolve_k(request.k, config)?;

    let owner = match request.owner_id.as_deref().map(str::trim) {
        Some("") => {
            return Err(RetrievalError::InvalidRequest("owner_id must not be blank".to_string()))
        }
        other => other,
    };

    Ok(ValidatedQuery {
        scope: Scope::new(request.project_id.clone(), owner),
        query: query.to_string(),
        k,
    })
}

/// Checks a project id: 1 to `MAX_PROJECT_ID_CHARS` characters from
/// `[A-Za-z0-9_-]`. Such an id is also a single, safe path component.
pub fn validate_project_id(project_id: &str) -> Result<(), RetrievalError> {
    if project_id.is_empty() {
        return Err(RetrievalError::InvalidRequest("project_id must not be empty".to_string()));
    }
    if project_id.chars().count() > MAX_PROJECT_ID_CHARS {
        return Err(RetrievalError::InvalidRequest(format!(
            "project_id exceeds {MAX_PROJECT_ID_CHARS} characters"
        )));
    }
    if !project_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(RetrievalError::InvalidRequest(format!("malformed project_id: {project_id:?}")));
    }
    Ok(())
}

fn resolve_k(k: Option<i64>, config: &RetrievalConfig) -> Result<usize, RetrievalError> {
    let Some(k) = k else {
        return Ok(config.default_k);
    };
    if k <= 0 {
        return Err(RetrievalError::InvalidRequest(format!("k must be positive, got {k}")));
    }
    match usize::try_from(k) {
        Ok(k) if k <= config.max_k => Ok(k),
        _ => Err(RetrievalError::InvalidRequest(format!("k must be at most {}, got {k}", config.max_k))),
    }
}
