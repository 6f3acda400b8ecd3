//! Path classification shared by the edge and client guards.

use crate::{
    config::PortalConfig,
    session::{Role, SessionRecord},
};

/// What a path requires before it may be rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Any session will do.
    Authenticated,
    /// A session whose role satisfies the given role.
    Role(Role),
}

impl Access {
    #[must_use]
    pub fn is_public(self) -> bool {
        self == Self::Public
    }

    #[must_use]
    pub fn is_satisfied_by(self, session: Option<&SessionRecord>) -> bool {
        match (self, session) {
            (Self::Public, _) => true,
            (_, None) => false,
            (Self::Authenticated, Some(_)) => true,
            (Self::Role(required), Some(record)) => record.role().satisfies(required),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GuardPolicy {
    login_path: String,
    public_paths: Vec<String>,
    exempt_prefixes: Vec<String>,
    scopes: Vec<(String, Role)>,
}

impl GuardPolicy {
    /// Policy with the portal's two scoped sections, `/cliente` and `/admin`.
    #[must_use]
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            login_path: config.login_path().to_string(),
            public_paths: config
                .public_paths()
                .iter()
                .map(|path| normalize(path).to_string())
                .collect(),
            exempt_prefixes: config.exempt_prefixes().to_vec(),
            scopes: vec![
                ("/cliente".to_string(), Role::Customer),
                ("/admin".to_string(), Role::Administrator),
            ],
        }
    }

    #[must_use]
    pub fn with_scope(mut self, prefix: &str, role: Role) -> Self {
        self.scopes.push((normalize(prefix).to_string(), role));
        self
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Classify `path`. Query strings, fragments and trailing slashes are ignored.
    #[must_use]
    pub fn requirement(&self, path: &str) -> Access {
        let raw = strip_query(path);
        if self
            .exempt_prefixes
            .iter()
            .any(|prefix| raw.starts_with(prefix.as_str()))
        {
            return Access::Public;
        }

        let path = normalize(raw);
        if self.public_paths.iter().any(|public| public == path) {
            return Access::Public;
        }

        self.scopes
            .iter()
            .find(|(prefix, _)| within(path, prefix))
            .map_or(Access::Authenticated, |(_, role)| Access::Role(*role))
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// `path` without query and trailing slashes; the root stays `/`.
pub(crate) fn normalize(path: &str) -> &str {
    let trimmed = strip_query(path).trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Prefix match on segment boundaries: `/admin` covers `/admin/x`, not `/administrar`.
fn within(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
