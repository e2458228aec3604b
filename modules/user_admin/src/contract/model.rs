use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier shared by the application user record and the authentication
/// identity. Never blank; otherwise kept exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role stored on the application user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Other(String),
}

impl Role {
    pub const ADMIN: &'static str = "admin";

    pub fn parse(raw: &str) -> Self {
        if raw == Self::ADMIN {
            Self::Admin
        } else {
            Self::Other(raw.to_owned())
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => Self::ADMIN,
            Self::Other(r) => r,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is known about who sent a deletion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    /// Referrer (or origin) of the request, checked by the access policy.
    pub origin: Option<String>,
    /// Bearer token of the caller, used to resolve identity and role.
    pub access_token: Option<String>,
}

impl CallerContext {
    pub fn new(origin: Option<String>, access_token: Option<String>) -> Self {
        Self {
            origin,
            access_token,
        }
    }
}

/// Result of removing an application user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRemoval {
    Deleted,
    AlreadyAbsent,
}

/// Coarse classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    NotFound,
    Timeout,
    Unavailable,
    Rejected,
    Malformed,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
            Self::Rejected => "rejected",
            Self::Malformed => "malformed",
        };
        f.write_str(s)
    }
}

/// Outcome of the application-record step of a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Deleted,
    AlreadyAbsent,
    Failed { kind: StoreErrorKind, reason: String },
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::AlreadyAbsent => "already_absent",
            Self::Failed { .. } => "failed",
        }
    }
}

impl From<RecordRemoval> for StepOutcome {
    fn from(r: RecordRemoval) -> Self {
        match r {
            RecordRemoval::Deleted => Self::Deleted,
            RecordRemoval::AlreadyAbsent => Self::AlreadyAbsent,
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { kind, reason } => write!(f, "failed ({kind}): {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Result of a successful deletion.
///
/// Success means the authentication identity is gone, so the user can no
/// longer log in. The application record may still exist when `record`
/// is `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionReport {
    pub user_id: UserId,
    pub record: StepOutcome,
    /// Whatever the identity provider returned for the delete call.
    pub identity: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

impl DeletionReport {
    /// Both stores are clean for this user.
    pub fn fully_purged(&self) -> bool {
        self.record.succeeded()
    }
}
