use std::fmt;

use tracing::warn;

use extapi_store::{Query, RecordStore};
use extapi_types::{Permission, Principal};

use crate::error::GateError;

/// What the principal is trying to do with a saved query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryAction {
    Create,
    Update,
    Delete,
}

impl QueryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Message returned to the client when the policy says no.
    pub fn denied_message(&self) -> String {
        format!("Insufficient permissions to {self} this query")
    }
}

impl fmt::Display for QueryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `principal` may save or remove `query` in its current state.
///
/// Anyone may manage their own private queries. Administrators may manage
/// anything. Shared queries need `manage_public_queries` on their project,
/// so a shared query with no project is admin-only.
pub fn can_manage_query(
    store: &dyn RecordStore,
    principal: &Principal,
    query: &Query,
) -> Result<bool, GateError> {
    if query.is_private() && query.user_id == Some(principal.id) {
        return Ok(true);
    }
    if principal.admin {
        return Ok(true);
    }
    if query.is_private() {
        return Ok(false);
    }
    let Some(project_id) = query.project_id else {
        return Ok(false);
    };
    let Some(project) = store.find_container(project_id)? else {
        return Ok(false);
    };
    Ok(store.has_capability(principal, &project, Permission::ManagePublicQueries)?)
}

/// [`can_manage_query`], logging denials.
pub fn authorize_query(
    store: &dyn RecordStore,
    principal: &Principal,
    query: &Query,
    action: QueryAction,
) -> Result<bool, GateError> {
    let allowed = can_manage_query(store, principal, query)?;
    if !allowed {
        warn!(user = %principal.login, %action, query = ?query.id, "query management denied");
    }
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded;
    use extapi_store::{Kinded, QueryKind};
    use extapi_types::{ProjectId, UserId, Visibility};

    fn query(owner: u64, visibility: Visibility, project: Option<u64>) -> Query {
        let mut q = Query::blank(QueryKind::Issue);
        q.name = "Open bugs".into();
        q.user_id = Some(UserId(owner));
        q.visibility = visibility;
        q.project_id = project.map(ProjectId);
        q
    }

    fn check(key: &str, q: &Query) -> bool {
        let store = seeded();
        let principal = store.authenticate(key).unwrap().unwrap();
        can_manage_query(&store, &principal, q).unwrap()
    }

    #[test]
    fn own_private_query() {
        assert!(check("k-dev", &query(2, Visibility::Private, None)));
        assert!(!check("k-viewer", &query(2, Visibility::Private, None)));
    }

    #[test]
    fn admin_manages_anything() {
        assert!(check("k-admin", &query(2, Visibility::Private, None)));
        assert!(check("k-admin", &query(2, Visibility::Public, None)));
    }

    #[test]
    fn public_global_query_is_admin_only() {
        assert!(!check("k-dev", &query(2, Visibility::Public, None)));
    }

    #[test]
    fn public_project_query_needs_manage_public_queries() {
        assert!(check("k-dev", &query(2, Visibility::Public, Some(1))));
        assert!(check("k-dev", &query(2, Visibility::Roles, Some(1))));
        assert!(!check("k-viewer", &query(3, Visibility::Public, Some(1))));
        assert!(!check("k-dev", &query(2, Visibility::Public, Some(99))));
    }

    #[test]
    fn denied_messages() {
        assert_eq!(
            QueryAction::Update.denied_message(),
            "Insufficient permissions to update this query"
        );
        let store = seeded();
        let viewer = store.authenticate("k-viewer").unwrap().unwrap();
        let q = query(2, Visibility::Private, None);
        assert!(!authorize_query(&store, &viewer, &q, QueryAction::Delete).unwrap());
    }
}
