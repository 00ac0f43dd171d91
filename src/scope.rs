use std::fmt;

use serde::Serialize;

use crate::error::ScopeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeLevel {
    Account,
    Organization,
    Project,
}

/// The (account, organization, project) triple an API call addresses.
///
/// A project is only ever present together with its organization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TenantScope {
    account: String,
    org: Option<String>,
    project: Option<String>,
}

impl TenantScope {
    pub fn account(account: impl Into<String>) -> Self {
        TenantScope {
            account: account.into(),
            org: None,
            project: None,
        }
    }

    pub fn org(account: impl Into<String>, org: impl Into<String>) -> Self {
        TenantScope {
            account: account.into(),
            org: non_empty(org.into()),
            project: None,
        }
    }

    pub fn project(
        account: impl Into<String>,
        org: impl Into<String>,
        project: impl Into<String>,
    ) -> Result<Self, ScopeError> {
        Self::new(account, org, project)
    }

    /// Builds a scope from possibly empty identifiers, empty meaning "broader level".
    pub fn new(
        account: impl Into<String>,
        org: impl Into<String>,
        project: impl Into<String>,
    ) -> Result<Self, ScopeError> {
        let org = non_empty(org.into());
        let project = non_empty(project.into());

        if let (None, Some(project)) = (&org, &project) {
            return Err(ScopeError::ProjectWithoutOrg {
                project: project.clone(),
            });
        }

        Ok(TenantScope {
            account: account.into(),
            org,
            project,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org.as_deref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn level(&self) -> ScopeLevel {
        match (&self.org, &self.project) {
            (None, _) => ScopeLevel::Account,
            (Some(_), None) => ScopeLevel::Organization,
            (Some(_), Some(_)) => ScopeLevel::Project,
        }
    }

    /// Query parameters identifying this scope. Broader scopes omit the
    /// narrower identifiers instead of sending empty strings.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("accountIdentifier", self.account.clone())];
        if let Some(org) = &self.org {
            params.push(("orgIdentifier", org.clone()));
        }
        if let Some(project) = &self.project {
            params.push(("projectIdentifier", project.clone()));
        }
        params
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.account)?;
        if let Some(org) = &self.org {
            write!(f, "/{}", org)?;
        }
        if let Some(project) = &self.project {
            write!(f, "/{}", project)?;
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
