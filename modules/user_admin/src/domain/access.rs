use serde::{Deserialize, Serialize};

use crate::contract::model::CallerContext;
use crate::domain::ports::AccessPolicy;

/// Accepts requests whose referrer contains one of the configured markers
/// (for example `/admin/`). An empty marker list accepts nothing.
#[derive(Debug, Clone)]
pub struct ReferrerAllowList {
    markers: Vec<String>,
}

impl ReferrerAllowList {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }
}

impl AccessPolicy for ReferrerAllowList {
    fn permits(&self, caller: &CallerContext) -> bool {
        let Some(origin) = caller.origin.as_deref() else {
            return false;
        };
        self.markers.iter().any(|m| origin.contains(m.as_str()))
    }
}

/// What to do when the caller's identity or role cannot be established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedCallerPolicy {
    /// Refuse with `Unauthorized`.
    #[default]
    Deny,
    /// Log a warning and continue with the deletion.
    Allow,
}
