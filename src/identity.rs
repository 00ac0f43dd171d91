use tracing::error;

use crate::error::ResolveError;
use crate::scope::TenantScope;

/// Extracts the account identifier from an API key of the form
/// `<prefix>.<accountId>.<suffix>`.
pub fn resolve_account_id(api_key: &str) -> Result<String, ResolveError> {
    let account_id = api_key.split('.').nth(1).unwrap_or_default();

    if account_id.is_empty() {
        error!("Failed to get account ID from API key");
        return Err(ResolveError::MissingAccountId);
    }

    Ok(account_id.to_string())
}

/// Strips the scope namespace from a connector reference, so `account.github`
/// is looked up as `github`.
pub fn normalize_connector_ref(reference: &str) -> &str {
    match reference.split_once('.') {
        Some((_, identifier)) => identifier,
        None => reference,
    }
}

/// Scope a connector reference lives in. Unprefixed references belong to
/// `fallback`, which is usually the project being migrated.
pub fn connector_scope(reference: &str, fallback: &TenantScope) -> TenantScope {
    match reference.split_once('.') {
        Some(("account", _)) => TenantScope::account(fallback.account_id()),
        Some(("org", _)) => match fallback.org_id() {
            Some(org) => TenantScope::org(fallback.account_id(), org),
            None => TenantScope::account(fallback.account_id()),
        },
        _ => fallback.clone(),
    }
}

/// Maps a connector type onto the spelling manifest stores expect.
pub fn manifest_store_type(connector_type: &str) -> &str {
    match connector_type {
        "Gitlab" => "GitLab",
        other => other,
    }
}
