use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub download: bool,
}

/// Path-prefix access rule. Later matching rules override earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub allow: bool,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Directory under the storage root this user is confined to.
    pub scope: String,
    pub perm: Permissions,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            scope: "/".to_string(),
            perm: Permissions { download: true },
            rules: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_download(mut self, download: bool) -> Self {
        self.perm.download = download;
        self
    }

    pub fn with_rule(mut self, allow: bool, path: impl Into<String>) -> Self {
        self.rules.push(Rule { allow, path: path.into() });
        self
    }

    /// Whether `path` is reachable under this user's rules.
    pub fn check(&self, path: &str) -> bool {
        let mut allowed = true;
        for rule in &self.rules {
            if path.starts_with(&rule.path) {
                allowed = rule.allow;
            }
        }
        allowed
    }
}
