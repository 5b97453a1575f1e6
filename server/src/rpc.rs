//! RPC transport: procedure routing and the response envelope.
//!
//! Queries are called with `GET /trpc/<procedure>?input=<json>`, mutations
//! with `POST /trpc/<procedure>` and a JSON body. Successful calls answer
//! `{"result":{"data":...}}`; failures answer
//! `{"error":{"message":...,"code":...,"data":{"code":...,"httpStatus":...,"path":...}}}`.

use std::{fmt, str::FromStr};

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};
use url::form_urlencoded;

use crate::error::ServiceError;
use crate::input::{
    self, AddInput, IdInput, ListInput, RawAddInput, RawIdInput, RawListInput, RawToggleInput,
    ToggleInput, ValidationError,
};
use crate::service::TodoService;

/// Whether a procedure reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcedureKind::Query => write!(f, "query"),
            ProcedureKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// Every procedure the router exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Procedure {
    List,
    ById,
    Add,
    Delete,
    Toggle,
}

impl Procedure {
    pub const ALL: [Procedure; 5] = [
        Procedure::List,
        Procedure::ById,
        Procedure::Add,
        Procedure::Delete,
        Procedure::Toggle,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Procedure::List => "todo.list",
            Procedure::ById => "todo.byId",
            Procedure::Add => "todo.add",
            Procedure::Delete => "todo.delete",
            Procedure::Toggle => "todo.toggle",
        }
    }

    pub fn kind(self) -> ProcedureKind {
        match self {
            Procedure::List | Procedure::ById => ProcedureKind::Query,
            Procedure::Add | Procedure::Delete | Procedure::Toggle => ProcedureKind::Mutation,
        }
    }
}

impl FromStr for Procedure {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Procedure::ALL
            .into_iter()
            .find(|p| p.path() == s)
            .ok_or(())
    }
}

/// Machine-readable error kinds carried in the envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    ParseError,
    BadRequest,
    NotFound,
    MethodNotSupported,
    Conflict,
    InternalServerError,
}

impl RpcErrorCode {
    /// JSON-RPC style numeric code.
    pub fn json_rpc_code(self) -> i32 {
        match self {
            RpcErrorCode::ParseError => -32700,
            RpcErrorCode::BadRequest => -32600,
            RpcErrorCode::NotFound => -32004,
            RpcErrorCode::MethodNotSupported => -32005,
            RpcErrorCode::Conflict => -32009,
            RpcErrorCode::InternalServerError => -32603,
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            RpcErrorCode::ParseError | RpcErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            RpcErrorCode::NotFound => StatusCode::NOT_FOUND,
            RpcErrorCode::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            RpcErrorCode::Conflict => StatusCode::CONFLICT,
            RpcErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An error ready to be written to the wire.
#[derive(Debug, Clone)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
    pub path: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
        }
    }

    fn from_validation(err: ValidationError, path: &str) -> Self {
        Self::new(RpcErrorCode::BadRequest, err.to_string(), path)
    }

    fn from_service(err: ServiceError, path: &str) -> Self {
        match err {
            ServiceError::NotFound { .. } => {
                Self::new(RpcErrorCode::NotFound, err.to_string(), path)
            }
            ServiceError::Conflict { .. } => {
                Self::new(RpcErrorCode::Conflict, err.to_string(), path)
            }
            ServiceError::Storage(inner) => {
                error!(path, error = %inner, "store failure");
                Self::new(RpcErrorCode::InternalServerError, "Internal server error", path)
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_client_error() {
            warn!(
                path = %self.path,
                code = ?self.code,
                message = %self.message,
                "procedure rejected"
            );
        }
        let body = json!({
            "error": {
                "message": self.message,
                "code": self.code.json_rpc_code(),
                "data": {
                    "code": self.code,
                    "httpStatus": status.as_u16(),
                    "path": self.path,
                },
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Wrap a procedure result in the success envelope.
fn ok<T: Serialize>(data: T) -> Response {
    Json(json!({ "result": { "data": data } })).into_response()
}

/// Success envelope for procedures with no return value.
fn ok_empty() -> Response {
    Json(json!({ "result": {} })).into_response()
}

/// `GET /trpc/{procedure}`
pub async fn query(
    State(service): State<TodoService>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, RpcError> {
    // Decoding is lossy, so a malformed query string surfaces as a JSON
    // parse error inside the envelope.
    let raw_input = query.as_deref().and_then(|q| {
        form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == "input")
            .map(|(_, value)| value.into_owned())
    });
    let input = match raw_input {
        Some(raw) => decode_json(raw.as_bytes(), &path)?,
        None => Value::Object(Default::default()),
    };
    dispatch(&service, &path, ProcedureKind::Query, input).await
}

/// `POST /trpc/{procedure}`
pub async fn mutation(
    State(service): State<TodoService>,
    Path(path): Path<String>,
    body: Bytes,
) -> Result<Response, RpcError> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        decode_json(&body, &path)?
    };
    dispatch(&service, &path, ProcedureKind::Mutation, input).await
}

fn decode_json(bytes: &[u8], path: &str) -> Result<Value, RpcError> {
    serde_json::from_slice(bytes).map_err(|e| {
        RpcError::new(
            RpcErrorCode::ParseError,
            format!("invalid JSON input: {e}"),
            path,
        )
    })
}

async fn dispatch(
    service: &TodoService,
    path: &str,
    called_as: ProcedureKind,
    input: Value,
) -> Result<Response, RpcError> {
    let procedure: Procedure = path.parse().map_err(|_| {
        RpcError::new(
            RpcErrorCode::NotFound,
            format!("No \"{called_as}\"-procedure on path \"{path}\""),
            path,
        )
    })?;
    if procedure.kind() != called_as {
        return Err(RpcError::new(
            RpcErrorCode::MethodNotSupported,
            format!(
                "Procedure \"{path}\" is a {} and cannot be called as a {called_as}",
                procedure.kind()
            ),
            path,
        ));
    }

    let invalid = |e| RpcError::from_validation(e, path);
    let failed = |e| RpcError::from_service(e, path);

    match procedure {
        Procedure::List => {
            let input: ListInput = input::parse::<RawListInput, _>(input).map_err(invalid)?;
            service.list(input).await.map(ok).map_err(failed)
        }
        Procedure::ById => {
            let input: IdInput = input::parse::<RawIdInput, _>(input).map_err(invalid)?;
            service.by_id(input).await.map(ok).map_err(failed)
        }
        Procedure::Add => {
            let input: AddInput = input::parse::<RawAddInput, _>(input).map_err(invalid)?;
            service.add(input).await.map(ok).map_err(failed)
        }
        Procedure::Delete => {
            let input: IdInput = input::parse::<RawIdInput, _>(input).map_err(invalid)?;
            service.delete(input).await.map(|()| ok_empty()).map_err(failed)
        }
        Procedure::Toggle => {
            let input: ToggleInput = input::parse::<RawToggleInput, _>(input).map_err(invalid)?;
            service.toggle(input).await.map(|()| ok_empty()).map_err(failed)
        }
    }
}
