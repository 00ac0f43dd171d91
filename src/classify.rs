//! Turns raw platform responses into migration decisions.
//!
//! A response is a tagged union resolved by HTTP status: `200` carries the
//! success body, anything else carries an [`ApiEnvelope`]. Only the envelope
//! is inspected; success bodies are passed through untouched.

use serde::{Deserialize, Serialize};

use crate::cli::AlreadyRemotePolicy;
use crate::entity::EntityKind;

const ALREADY_REMOTE: &str = "is already remote";
const FOLDER_NOT_SUPPORTED: &str = "Downloading folder not supported";

/// Status code and body of a platform call, before any interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        RawResponse {
            status,
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Uniform error body returned on non-200 responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default)]
    pub response_messages: Vec<ResponseMessage>,
}

impl ApiEnvelope {
    /// Operator-facing description; the correlation id is kept verbatim.
    pub fn detail(&self) -> String {
        let messages: Vec<&str> = self
            .response_messages
            .iter()
            .map(|m| m.message.as_str())
            .collect();

        format!(
            "CorrelationId: {}, ResponseMessages: [{}]",
            self.correlation_id,
            messages.join(", ")
        )
    }

    fn single_message_contains(&self, needle: &str) -> bool {
        match self.response_messages.as_slice() {
            [only] => only.message.contains(needle),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiResponse {
    Success(Vec<u8>),
    Error(ApiEnvelope),
}

impl ApiResponse {
    pub fn from_parts(status: u16, body: &[u8]) -> Result<Self, serde_json::Error> {
        if status == 200 {
            return Ok(ApiResponse::Success(body.to_vec()));
        }
        serde_json::from_slice(body).map(ApiResponse::Error)
    }
}

/// The call a response belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Move(EntityKind),
    Update(EntityKind),
    Download,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Success,
    AlreadyRemote,
    FolderNotDownloadable,
    DomainError { status: u16, detail: String },
    TransportError { status: u16, detail: String },
}

impl Classification {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Classification::DomainError { .. } | Classification::TransportError { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Classifier {
    already_remote: AlreadyRemotePolicy,
}

impl Classifier {
    pub fn new(already_remote: AlreadyRemotePolicy) -> Self {
        Classifier { already_remote }
    }

    pub fn classify(&self, status: u16, body: &[u8], operation: Operation) -> Classification {
        let envelope = match ApiResponse::from_parts(status, body) {
            Ok(ApiResponse::Success(_)) => return Classification::Success,
            Ok(ApiResponse::Error(envelope)) => envelope,
            Err(err) => {
                return Classification::TransportError {
                    status,
                    detail: format!("undecodable error response: {}", err),
                }
            }
        };

        match operation {
            Operation::Move(kind)
                if self.shortcuts_already_remote(kind)
                    && envelope.single_message_contains(ALREADY_REMOTE) =>
            {
                Classification::AlreadyRemote
            }
            Operation::Download if envelope.single_message_contains(FOLDER_NOT_SUPPORTED) => {
                Classification::FolderNotDownloadable
            }
            _ => Classification::DomainError {
                status,
                detail: envelope.detail(),
            },
        }
    }

    fn shortcuts_already_remote(&self, kind: EntityKind) -> bool {
        match self.already_remote {
            AlreadyRemotePolicy::Services => kind == EntityKind::Service,
            AlreadyRemotePolicy::All => matches!(
                kind,
                EntityKind::Pipeline | EntityKind::Template | EntityKind::Service
            ),
        }
    }

    pub fn classify_raw(&self, response: &RawResponse, operation: Operation) -> Classification {
        self.classify(response.status, &response.body, operation)
    }
}

/// Classifies with the default policy, where only services short-circuit on
/// "already remote".
pub fn classify(status: u16, body: &[u8], operation: Operation) -> Classification {
    Classifier::default().classify(status, body, operation)
}
