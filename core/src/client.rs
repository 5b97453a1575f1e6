//! Stateless HTTP request builder and response parser for the todo procedures.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each procedure is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Queries travel as `GET /trpc/<procedure>?input=<json>`, mutations as
//! `POST /trpc/<procedure>` with a JSON body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AddTodo, ListTodos, Todo, TodoPage, ToggleTodo};

#[derive(Serialize)]
struct IdInput<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    data: ErrorData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorData {
    code: String,
    http_status: u16,
}

/// Synchronous, stateless client for the todo procedures.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list(&self, input: &ListTodos) -> Result<HttpRequest, ApiError> {
        self.query("todo.list", input)
    }

    pub fn build_by_id(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.query("todo.byId", &IdInput { id })
    }

    pub fn build_add(&self, input: &AddTodo) -> Result<HttpRequest, ApiError> {
        self.mutation("todo.add", input)
    }

    pub fn build_delete(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.mutation("todo.delete", &IdInput { id })
    }

    pub fn build_toggle(&self, input: &ToggleTodo) -> Result<HttpRequest, ApiError> {
        self.mutation("todo.toggle", input)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<TodoPage, ApiError> {
        parse_data(response)
    }

    pub fn parse_by_id(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_data(response)
    }

    pub fn parse_add(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_data(response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_result(response).map(|_| ())
    }

    pub fn parse_toggle(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_result(response).map(|_| ())
    }

    fn query<T: Serialize>(&self, procedure: &str, input: &T) -> Result<HttpRequest, ApiError> {
        let json = to_json(input)?;
        let encoded: String = form_urlencoded::byte_serialize(json.as_bytes()).collect();
        Ok(HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/trpc/{procedure}?input={encoded}", self.base_url),
            headers: Vec::new(),
            body: None,
        })
    }

    fn mutation<T: Serialize>(&self, procedure: &str, input: &T) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/trpc/{procedure}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(to_json(input)?),
        })
    }
}

fn to_json<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Decode the `result` member of a success envelope, or the error envelope.
fn parse_result(response: HttpResponse) -> Result<Value, ApiError> {
    let success = (200..300).contains(&response.status);
    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) if !success => {
            return Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            })
        }
        Err(e) => return Err(ApiError::DeserializationError(e.to_string())),
    };

    if value.get("error").is_some() {
        let envelope: ErrorEnvelope = serde_json::from_value(value)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        return Err(map_error(envelope.error));
    }

    match value {
        Value::Object(mut map) if success => map
            .remove("result")
            .ok_or_else(|| ApiError::DeserializationError("missing result".to_string())),
        _ if !success => Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        }),
        _ => Err(ApiError::DeserializationError(
            "expected a result envelope".to_string(),
        )),
    }
}

fn parse_data<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let mut result = parse_result(response)?;
    let data = result
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| ApiError::DeserializationError("missing result.data".to_string()))?;
    serde_json::from_value(data).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn map_error(error: ErrorBody) -> ApiError {
    let message = error.message;
    match error.data.code.as_str() {
        "NOT_FOUND" => ApiError::NotFound { message },
        "CONFLICT" => ApiError::Conflict { message },
        "BAD_REQUEST" | "PARSE_ERROR" => ApiError::Validation { message },
        _ => ApiError::Rpc {
            code: error.data.code,
            status: error.data.http_status,
            message,
        },
    }
}
