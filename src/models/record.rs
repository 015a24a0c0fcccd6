use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

pub type OrderRecord = Document;
pub type UserRecord = Document;

impl Document {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !value.is_null())
    }

    pub fn text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|text| !text.is_empty())
    }

    pub fn flag(&self, keys: &[&str]) -> Option<bool> {
        self.get(keys).and_then(|value| match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        self.get(keys).and_then(|value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse::<f64>().ok(),
            _ => None,
        })
    }

    pub fn timestamp(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .filter_map(Value::as_str)
            .find_map(|raw| {
                DateTime::parse_from_rfc3339(raw.trim())
                    .ok()
                    .map(|parsed| parsed.with_timezone(&Utc))
            })
    }

    pub fn child(&self, keys: &[&str]) -> Option<Document> {
        self.get(keys)
            .and_then(Value::as_object)
            .map(|fields| Document(fields.clone()))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
