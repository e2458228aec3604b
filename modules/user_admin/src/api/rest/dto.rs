use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{DeletionReport, StepOutcome};

/// REST DTO for a delete request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeleteUserReq {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// Outcome of the application-record step, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatusDto {
    Deleted,
    AlreadyAbsent,
    Failed,
}

/// REST DTO for a successful deletion
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
    /// Provider payload returned by the authentication service.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub record: RecordStatusDto,
}

/// Error body shared by every failure response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            role: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role;
        self
    }
}

impl From<&StepOutcome> for RecordStatusDto {
    fn from(outcome: &StepOutcome) -> Self {
        match outcome {
            StepOutcome::Deleted => Self::Deleted,
            StepOutcome::AlreadyAbsent => Self::AlreadyAbsent,
            StepOutcome::Failed { .. } => Self::Failed,
        }
    }
}

impl From<DeletionReport> for DeleteUserResponse {
    fn from(report: DeletionReport) -> Self {
        Self {
            success: true,
            message: "User deleted successfully".to_string(),
            record: RecordStatusDto::from(&report.record),
            data: report.identity,
        }
    }
}
