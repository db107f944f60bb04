//! Per-message key and value resolution
//!
//! Keys come from interpolated templates such as `user:${! meta("id") }`.
//! Values come from a single mapping such as `root = this.doc`.
//!
//! Supported expressions:
//! - `content()`: raw message body
//! - `meta("name")`: metadata value
//! - `json()`, `json("a.b")`, `this`, `this.a.b`: body parsed as JSON, optionally
//!   narrowed to a field (strings render unquoted)
//! - `"literal"`: quoted text

mod parser;


use bytes::Bytes;
use bytes::BytesMut;
use serde_json::Value;

use crate::ConfigurationError;
use crate::ItemError;
use crate::ItemErrorKind;
use crate::Message;

/// Produces the document key for a message
pub trait KeyResolver: Send + Sync + 'static {
    fn resolve_key(
        &self,
        message: &Message,
    ) -> std::result::Result<String, ItemError>;
}

/// Produces the payload for a message
pub trait ValueBuilder: Send + Sync + 'static {
    fn build_value(
        &self,
        message: &Message,
    ) -> std::result::Result<Bytes, ItemError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    Content,
    Meta(String),
    /// Path into the JSON body; empty means the whole document
    Json(Vec<String>),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Expr(Expr),
}

fn expression_error(detail: impl Into<String>) -> ItemError {
    ItemError::new(ItemErrorKind::Expression, detail)
}

impl Expr {
    fn eval(
        &self,
        message: &Message,
    ) -> std::result::Result<Bytes, ItemError> {
        match self {
            Expr::Content => Ok(message.body().clone()),
            Expr::Literal(text) => Ok(Bytes::from(text.clone())),
            Expr::Meta(name) => message
                .meta(name)
                .map(|v| Bytes::from(v.to_string()))
                .ok_or_else(|| expression_error(format!("metadata `{name}` not set"))),
            Expr::Json(path) => {
                let document: Value = serde_json::from_slice(message.body())
                    .map_err(|e| expression_error(format!("body is not json: {e}")))?;
                let value = lookup(&document, path)
                    .ok_or_else(|| expression_error(format!("path `{}` not found", path.join("."))))?;
                match value {
                    Value::String(s) => Ok(Bytes::from(s.clone())),
                    other => serde_json::to_vec(other)
                        .map(Bytes::from)
                        .map_err(|e| expression_error(e.to_string())),
                }
            }
        }
    }
}

fn lookup<'a>(
    document: &'a Value,
    path: &[String],
) -> Option<&'a Value> {
    path.iter().try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Template with literal text and `${! expr }` interpolations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolatedString {
    source: String,
    segments: Vec<Segment>,
}

impl InterpolatedString {
    pub fn parse(template: &str) -> std::result::Result<Self, ConfigurationError> {
        Ok(Self {
            source: template.to_string(),
            segments: parser::parse_template(template)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(
        &self,
        message: &Message,
    ) -> std::result::Result<String, ItemError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Expr(expr) => {
                    let bytes = expr.eval(message)?;
                    // Keys are text; lossy conversion would let distinct keys collide
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| expression_error(format!("`{}` is not valid utf-8: {e}", self.source)))?;
                    out.push_str(text);
                }
            }
        }
        Ok(out)
    }
}

impl KeyResolver for InterpolatedString {
    fn resolve_key(
        &self,
        message: &Message,
    ) -> std::result::Result<String, ItemError> {
        let key = self.render(message)?;
        if key.is_empty() {
            return Err(expression_error(format!("`{}` resolved to an empty key", self.source)));
        }
        Ok(key)
    }
}

/// Mapping producing the payload: either a single expression or, when it
/// contains `${! }` interpolations, a template rendered byte for byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMapping {
    source: String,
    segments: Vec<Segment>,
}

impl ValueMapping {
    pub fn parse(mapping: &str) -> std::result::Result<Self, ConfigurationError> {
        let segments = if parser::is_template(mapping) {
            parser::parse_template(mapping)?
        } else {
            vec![Segment::Expr(parser::parse_mapping(mapping)?)]
        };
        Ok(Self {
            source: mapping.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl ValueBuilder for ValueMapping {
    fn build_value(
        &self,
        message: &Message,
    ) -> std::result::Result<Bytes, ItemError> {
        if let [Segment::Expr(expr)] = self.segments.as_slice() {
            return expr.eval(message);
        }

        let mut out = BytesMut::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.extend_from_slice(text.as_bytes()),
                Segment::Expr(expr) => out.extend_from_slice(&expr.eval(message)?),
            }
        }
        Ok(out.freeze())
    }
}
