use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::infrastructure::error::AppError;

/// Structured channel result. Serializes as `{ok:true, data}` or
/// `{ok:false, code, message, conflictWith?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Wire", try_from = "Wire")]
pub enum Response {
    Ok(Value),
    Err(IpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct IpcError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_with: Option<String>,
}

impl From<AppError> for IpcError {
    fn from(err: AppError) -> Self {
        let conflict_with = match &err {
            AppError::Conflict { conflict_with, .. } => Some(conflict_with.clone()),
            _ => None,
        };
        IpcError {
            code: err.code().to_string(),
            message: err.to_string(),
            conflict_with,
        }
    }
}

impl From<AppError> for Response {
    fn from(err: AppError) -> Self {
        Response::Err(err.into())
    }
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    pub fn into_result(self) -> Result<Value, IpcError> {
        match self {
            Response::Ok(v) => Ok(v),
            Response::Err(e) => Err(e),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Wire {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conflict_with: Option<String>,
}

impl From<Response> for Wire {
    fn from(response: Response) -> Self {
        match response {
            Response::Ok(data) => Wire {
                ok: true,
                data: Some(data),
                code: None,
                message: None,
                conflict_with: None,
            },
            Response::Err(e) => Wire {
                ok: false,
                data: None,
                code: Some(e.code),
                message: Some(e.message),
                conflict_with: e.conflict_with,
            },
        }
    }
}

impl TryFrom<Wire> for Response {
    type Error = String;

    fn try_from(wire: Wire) -> Result<Self, Self::Error> {
        if wire.ok {
            return Ok(Response::Ok(wire.data.unwrap_or(Value::Null)));
        }
        let code = wire.code.ok_or("error response without code")?;
        Ok(Response::Err(IpcError {
            code,
            message: wire.message.unwrap_or_default(),
            conflict_with: wire.conflict_with,
        }))
    }
}
