//! Stateless JSON conversion entry point.

use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::JsonError;

/// JSON conversion facade.
///
/// Thin policy layer over serde_json: strict parse and stringify for typed
/// values, a lenient object parse that keeps target defaults for absent
/// properties, tuple parsing for mixed arrays and raw [`Value`] access.
/// `Option::None` fields serialize to JSON `null` and `null` parses back
/// to `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Json;

impl Json {
    pub fn new() -> Self {
        Json
    }

    pub fn stringify<T: Serialize>(&self, value: &T) -> Result<String, JsonError> {
        Ok(serde_json::to_string(value)?)
    }

    pub fn stringify_pretty<T: Serialize>(&self, value: &T) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    pub fn write<T: Serialize>(&self, value: &T, sink: impl io::Write) -> Result<(), JsonError> {
        Ok(serde_json::to_writer(sink, value)?)
    }

    pub fn parse<T: DeserializeOwned>(&self, input: &str) -> Result<T, JsonError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn read<T: DeserializeOwned>(&self, mut source: impl io::Read) -> Result<T, JsonError> {
        let mut input = String::new();
        source.read_to_string(&mut input)?;
        self.parse(&input)
    }

    /// Best-effort object parse.
    ///
    /// Properties present in the input override the target's defaults,
    /// properties the target does not know are logged and dropped, and
    /// target fields absent from the input keep their default values.
    /// Non-object input falls back to a strict parse.
    pub fn parse_lenient<T>(&self, input: &str) -> Result<T, JsonError>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let parsed: Value = serde_json::from_str(input)?;
        let Value::Object(incoming) = parsed else {
            return self.parse(input);
        };
        let mut base = serde_json::to_value(T::default())?;
        match &mut base {
            Value::Object(target) => {
                for (key, value) in incoming {
                    if target.contains_key(&key) {
                        target.insert(key, value);
                    } else {
                        log::warn!("Property '{}' does not match any field and is ignored", key);
                    }
                }
            }
            _ => return self.parse(input),
        }
        Ok(serde_json::from_value(base)?)
    }

    /// Parses a JSON array into raw values. Empty input yields an empty list.
    pub fn parse_values(&self, input: &str) -> Result<Vec<Value>, JsonError> {
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
    struct Employee {
        name: String,
        age: u32,
        postal_address: Option<String>,
    }

    #[test]
    fn test_stringify_and_parse() {
        let json = Json::new();
        let employee = Employee {
            name: "Bob".to_string(),
            age: 41,
            postal_address: Some("Road 1".to_string()),
        };
        let text = json.stringify(&employee).unwrap();
        let back: Employee = json.parse(&text).unwrap();
        assert_eq!(back, employee);
    }

    #[test]
    fn test_none_serializes_to_null() {
        let json = Json::new();
        let employee = Employee {
            name: "Bob".to_string(),
            age: 41,
            postal_address: None,
        };
        let text = json.stringify(&employee).unwrap();
        assert!(text.contains("\"postal_address\":null"));
        let back: Employee = json.parse(&text).unwrap();
        assert_eq!(back.postal_address, None);
    }

    #[test]
    fn test_parse_lenient_ignores_unknown_and_keeps_defaults() {
        let json = Json::new();
        let back: Employee = json
            .parse_lenient(r#"{"name":"Bob","shoe_size":43}"#)
            .unwrap();
        assert_eq!(back.name, "Bob");
        assert_eq!(back.age, 0);
        assert_eq!(back.postal_address, None);
    }

    #[test]
    fn test_parse_lenient_non_object_falls_back() {
        let json = Json::new();
        let back: Vec<u32> = json.parse_lenient("[1,2,3]").unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_mixed_array_as_tuple() {
        let json = Json::new();
        let (name, age, active): (String, u32, bool) =
            json.parse(r#"["Bob", 41, true]"#).unwrap();
        assert_eq!(name, "Bob");
        assert_eq!(age, 41);
        assert!(active);
    }

    #[test]
    fn test_parse_values() {
        let json = Json::new();
        let values = json.parse_values(r#"["a", 1, null]"#).unwrap();
        assert_eq!(values.len(), 3);
        assert!(values[2].is_null());
    }

    #[test]
    fn test_parse_values_empty_input() {
        let json = Json::new();
        assert!(json.parse_values("  ").unwrap().is_empty());
    }

    #[test]
    fn test_read_and_write() {
        let json = Json::new();
        let mut sink = Vec::new();
        json.write(&Employee::default(), &mut sink).unwrap();
        let back: Employee = json.read(sink.as_slice()).unwrap();
        assert_eq!(back, Employee::default());
    }

    #[test]
    fn test_parse_syntax_error() {
        let json = Json::new();
        let result: Result<Employee, _> = json.parse("{not json");
        assert!(matches!(result, Err(JsonError::SyntaxError(_))));
    }
}
