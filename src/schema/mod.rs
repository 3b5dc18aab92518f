//! Quote-carrying extraction schemas.
//!
//! Every record requested from the extraction collaborator must carry a
//! verbatim `quote` so it can be grounded afterwards. For an item type `T`
//! the request uses [`Grounded<T>`] (all of `T`'s fields plus a required
//! `quote`), and the response is a [`Container<T>`] holding a list of them.
//!
//! Two ways to describe `T` are supported:
//! - Rust types implement [`ExtractionSchema`] and get their JSON Schema from
//!   [`grounded_schema`] / [`container_schema`]
//! - Schemas that only exist as JSON (e.g. loaded from a file) go through
//!   [`augment_json_schema`] / [`container_json_schema`]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Name of the field added to every item
pub const QUOTE_FIELD: &str = "quote";

/// Description sent to the collaborator for the quote field
pub const QUOTE_DESCRIPTION: &str =
    "Exact text copied verbatim from the source document that supports this item";

/// Schema errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema must be a JSON object")]
    NotAnObject,

    #[error("Schema 'properties' must be a JSON object")]
    InvalidProperties,

    #[error("Schema 'required' must be an array")]
    InvalidRequired,

    #[error("Schema already defines a 'quote' property")]
    QuoteFieldConflict,

    #[error("Invalid extraction response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// JSON type of an item field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }
}

/// One field of an item schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<&'static str>,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            description: None,
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// An item type the extraction collaborator can be asked to produce
pub trait ExtractionSchema: Serialize + DeserializeOwned {
    /// Schema title, e.g. "PerformanceMetric"
    fn schema_name() -> &'static str;

    /// The item's own fields, without the quote
    fn fields() -> Vec<FieldSpec>;
}

/// An item plus the verbatim quote supporting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grounded<T> {
    #[serde(flatten)]
    pub item: T,
    pub quote: String,
}

impl<T> Grounded<T> {
    pub fn new(item: T, quote: impl Into<String>) -> Self {
        Self {
            item,
            quote: quote.into(),
        }
    }

    pub fn into_parts(self) -> (T, String) {
        (self.item, self.quote)
    }
}

/// Attach a quote to any item
pub trait WithQuote: Sized {
    fn with_quote(self, quote: impl Into<String>) -> Grounded<Self>;
}

impl<T> WithQuote for T {
    fn with_quote(self, quote: impl Into<String>) -> Grounded<Self> {
        Grounded::new(self, quote)
    }
}

/// Response envelope returned by the extraction collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<Grounded<T>>,
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Container<T> {
    pub fn new(items: Vec<Grounded<T>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: DeserializeOwned> Container<T> {
    /// Parse a collaborator response. A surrounding markdown code fence
    /// (```json ... ```) is tolerated.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(strip_code_fence(raw))?)
    }
}

/// Remove a markdown code fence wrapped around a JSON payload
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// JSON Schema of `T` on its own
pub fn item_json_schema<T: ExtractionSchema>() -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in T::fields() {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(field.kind.as_str()));
        if let Some(description) = field.description {
            property.insert("description".to_string(), json!(description));
        }
        properties.insert(field.name.to_string(), Value::Object(property));
        if field.required {
            required.push(json!(field.name));
        }
    }

    json!({
        "title": T::schema_name(),
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// JSON Schema of `Grounded<T>`
pub fn grounded_schema<T: ExtractionSchema>() -> Result<Value, SchemaError> {
    augment_json_schema(&item_json_schema::<T>())
}

/// JSON Schema of `Container<T>`
pub fn container_schema<T: ExtractionSchema>() -> Result<Value, SchemaError> {
    container_json_schema(&item_json_schema::<T>())
}

/// Add a required string `quote` property to an object schema
pub fn augment_json_schema(schema: &Value) -> Result<Value, SchemaError> {
    let mut augmented = schema.as_object().cloned().ok_or(SchemaError::NotAnObject)?;

    let properties = augmented
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or(SchemaError::InvalidProperties)?;
    if properties.contains_key(QUOTE_FIELD) {
        return Err(SchemaError::QuoteFieldConflict);
    }
    properties.insert(
        QUOTE_FIELD.to_string(),
        json!({ "type": "string", "description": QUOTE_DESCRIPTION }),
    );

    let required = augmented
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or(SchemaError::InvalidRequired)?;
    required.push(json!(QUOTE_FIELD));

    augmented
        .entry("type")
        .or_insert_with(|| json!("object"));

    if let Some(Value::String(title)) = augmented.get("title").cloned() {
        augmented.insert("title".to_string(), json!(format!("Grounded{}", title)));
    }

    Ok(Value::Object(augmented))
}

/// Wrap an item schema (augmented with `quote`) into the `{items: [...]}`
/// response envelope. `items` defaults to an empty list.
pub fn container_json_schema(item_schema: &Value) -> Result<Value, SchemaError> {
    let grounded = augment_json_schema(item_schema)?;
    let title = item_schema
        .get("title")
        .and_then(Value::as_str)
        .map(|t| format!("{}Container", t))
        .unwrap_or_else(|| "Container".to_string());

    Ok(json!({
        "title": title,
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "items": grounded,
                "default": [],
            }
        },
    }))
}
