use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::ParseError;

/// The fields of one log line.
pub type StructuredLog = Map<String, Value>;

/// The field holding the text of an unstructured line.
pub const MESSAGE_FIELD: &str = "message";

/// How raw log output is turned into [`StructuredLog`] fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogParser {
    /// Every buffer holds one JSON object.
    #[default]
    Json,
    /// The buffer is the message, nothing is parsed.
    Text,
}

impl LogParser {
    pub fn parse(&self, buf: &[u8]) -> Result<StructuredLog, ParseError> {
        match self {
            LogParser::Text => {
                let mut fields = Map::new();
                fields.insert(
                    MESSAGE_FIELD.to_string(),
                    Value::String(String::from_utf8_lossy(buf).into_owned()),
                );
                Ok(fields)
            }
            LogParser::Json => match serde_json::from_slice(buf)? {
                Value::Object(fields) => Ok(fields),
                other => Err(ParseError::NotAnObject(json_type(&other))),
            },
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
