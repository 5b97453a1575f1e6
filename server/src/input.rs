//! Boundary parsing for procedure inputs.
//!
//! Each procedure has a `Raw*` struct that mirrors the JSON the caller sends
//! and a validated `*Input` struct the service consumes. Conversion happens
//! through `TryFrom`, so the service never sees a value that breaks the
//! field constraints.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 100;
pub const MAX_TITLE_CHARS: usize = 32;

/// Length of the hyphenated 8-4-4-4-12 UUID form.
const HYPHENATED_UUID_LEN: usize = 36;

/// A field that failed boundary validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid input: {0}")]
    Malformed(String),

    #[error("limit must be a whole number between 1 and {MAX_LIST_LIMIT}, got {0}")]
    InvalidLimit(f64),

    /// Title length is measured in UTF-16 code units.
    #[error("title must be between 1 and {MAX_TITLE_CHARS} characters, got {0}")]
    TitleLength(usize),

    #[error("id '{0}' is not a valid UUID")]
    InvalidUuid(String),
}

/// Decode a JSON value into a raw input, then validate it.
pub fn parse<R, T>(value: serde_json::Value) -> Result<T, ValidationError>
where
    R: serde::de::DeserializeOwned,
    T: TryFrom<R, Error = ValidationError>,
{
    let raw: R =
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    T::try_from(raw)
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RawListInput {
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListInput {
    pub limit: usize,
    pub cursor: Option<String>,
}

impl Default for ListInput {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            cursor: None,
        }
    }
}

impl TryFrom<RawListInput> for ListInput {
    type Error = ValidationError;

    fn try_from(raw: RawListInput) -> Result<Self, Self::Error> {
        let limit = match raw.limit {
            None => DEFAULT_LIST_LIMIT,
            Some(n) if n.fract() == 0.0 && (1.0..=MAX_LIST_LIMIT as f64).contains(&n) => {
                n as usize
            }
            Some(n) => return Err(ValidationError::InvalidLimit(n)),
        };
        // An empty cursor means "start from the newest".
        Ok(Self {
            limit,
            cursor: raw.cursor.filter(|c| !c.is_empty()),
        })
    }
}

// ---------------------------------------------------------------------------
// byId / delete
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawIdInput {
    pub id: String,
}

/// Input for procedures addressed by id alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdInput {
    pub id: String,
}

impl TryFrom<RawIdInput> for IdInput {
    type Error = ValidationError;

    fn try_from(raw: RawIdInput) -> Result<Self, Self::Error> {
        Ok(Self { id: raw.id })
    }
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawAddInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddInput {
    pub id: Option<String>,
    pub title: String,
    pub completed: bool,
}

impl TryFrom<RawAddInput> for AddInput {
    type Error = ValidationError;

    fn try_from(raw: RawAddInput) -> Result<Self, Self::Error> {
        if let Some(id) = &raw.id {
            // `Uuid::parse_str` also takes the simple, braced and URN forms.
            if id.len() != HYPHENATED_UUID_LEN || Uuid::parse_str(id).is_err() {
                return Err(ValidationError::InvalidUuid(id.clone()));
            }
        }
        let units = raw.title.encode_utf16().count();
        if !(1..=MAX_TITLE_CHARS).contains(&units) {
            return Err(ValidationError::TitleLength(units));
        }
        Ok(Self {
            id: raw.id,
            title: raw.title,
            completed: raw.completed.unwrap_or(false),
        })
    }
}

// ---------------------------------------------------------------------------
// toggle
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawToggleInput {
    pub id: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleInput {
    pub id: String,
    pub completed: bool,
}

impl TryFrom<RawToggleInput> for ToggleInput {
    type Error = ValidationError;

    fn try_from(raw: RawToggleInput) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            completed: raw.completed,
        })
    }
}
