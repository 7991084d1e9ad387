//! In-band type tagging for JSON objects.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::JsonError;

const TYPE_PROPERTY: &str = "class";

type EncodeFn = Box<dyn Fn(&dyn Any) -> Result<Value, JsonError> + Send + Sync>;
type DecodeFn = Box<dyn Fn(Value) -> Result<Box<dyn Any>, JsonError> + Send + Sync>;

struct Registration {
    encode: EncodeFn,
    decode: DecodeFn,
}

/// Maps registered names to concrete types for tagged serialization.
///
/// [`stringify_object`] emits the registered name as the leading `class`
/// property; [`parse_object`] reads that property back and materializes the
/// registered type. The tag is plain data, so tagged output stays readable
/// by any JSON consumer.
///
/// [`stringify_object`]: TypeRegistry::stringify_object
/// [`parse_object`]: TypeRegistry::parse_object
#[derive(Default)]
pub struct TypeRegistry {
    names: HashMap<TypeId, String>,
    registrations: HashMap<String, Registration>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type under a name. Re-registering a name replaces the
    /// previous registration with a warning.
    pub fn register<T>(&mut self, name: &str)
    where
        T: Serialize + DeserializeOwned + Any,
    {
        if self.registrations.contains_key(name) {
            log::warn!("Type name '{}' was already registered and is replaced", name);
        }
        let encode: EncodeFn = Box::new(|any| {
            let value = any.downcast_ref::<T>().ok_or_else(|| JsonError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: "unexpected value".to_string(),
            })?;
            Ok(serde_json::to_value(value)?)
        });
        let decode: DecodeFn = Box::new(|value| {
            let concrete: T = serde_json::from_value(value)?;
            Ok(Box::new(concrete) as Box<dyn Any>)
        });
        self.names.insert(TypeId::of::<T>(), name.to_string());
        self.registrations
            .insert(name.to_string(), Registration { encode, decode });
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registrations.contains_key(name)
    }

    /// Serializes a registered value with its type tag leading the object.
    pub fn stringify_object<T: Any>(&self, value: &T) -> Result<String, JsonError> {
        let name = self.names.get(&TypeId::of::<T>()).ok_or_else(|| {
            JsonError::UnregisteredType(std::any::type_name::<T>().to_string())
        })?;
        let registration = self
            .registrations
            .get(name)
            .ok_or_else(|| JsonError::UnregisteredType(name.clone()))?;
        let encoded = (registration.encode)(value)?;
        let Value::Object(fields) = encoded else {
            return Err(JsonError::NotAnObject(std::any::type_name::<T>()));
        };
        let mut tagged = Map::new();
        tagged.insert(TYPE_PROPERTY.to_string(), Value::String(name.clone()));
        for (key, value) in fields {
            tagged.insert(key, value);
        }
        Ok(serde_json::to_string(&Value::Object(tagged))?)
    }

    /// Parses a tagged object into the type registered for its `class`
    /// property.
    pub fn parse_object(&self, input: &str) -> Result<Box<dyn Any>, JsonError> {
        self.parse_tagged(input).map(|(_, value)| value)
    }

    /// Like [`parse_object`] with the downcast included.
    ///
    /// [`parse_object`]: TypeRegistry::parse_object
    pub fn parse_object_as<T: Any>(&self, input: &str) -> Result<T, JsonError> {
        let (name, value) = self.parse_tagged(input)?;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| JsonError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: name,
            })
    }

    fn parse_tagged(&self, input: &str) -> Result<(String, Box<dyn Any>), JsonError> {
        let value: Value = serde_json::from_str(input)?;
        let Value::Object(mut fields) = value else {
            return Err(JsonError::MissingType);
        };
        let name = match fields.remove(TYPE_PROPERTY) {
            Some(Value::String(name)) => name,
            _ => return Err(JsonError::MissingType),
        };
        let registration = self
            .registrations
            .get(&name)
            .ok_or_else(|| JsonError::UnregisteredType(name.clone()))?;
        let decoded = (registration.decode)(Value::Object(fields))?;
        Ok((name, decoded))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Employee {
        name: String,
        age: u32,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Department {
        title: String,
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Employee>("employee");
        registry.register::<Department>("department");
        registry
    }

    #[test]
    fn test_type_tag_leads_the_object() {
        let text = registry()
            .stringify_object(&Employee {
                name: "Bob".to_string(),
                age: 41,
            })
            .unwrap();
        assert!(text.starts_with(r#"{"class":"employee""#), "got {text}");
    }

    #[test]
    fn test_tagged_roundtrip() {
        let registry = registry();
        let employee = Employee {
            name: "Bob".to_string(),
            age: 41,
        };
        let text = registry.stringify_object(&employee).unwrap();
        let back: Employee = registry.parse_object_as(&text).unwrap();
        assert_eq!(back, employee);
    }

    #[test]
    fn test_parse_object_dispatches_on_tag() {
        let registry = registry();
        let value = registry
            .parse_object(r#"{"class":"department","title":"Sales"}"#)
            .unwrap();
        let department = value.downcast_ref::<Department>().unwrap();
        assert_eq!(department.title, "Sales");
    }

    #[test]
    fn test_downcast_mismatch() {
        let registry = registry();
        let text = registry
            .stringify_object(&Department {
                title: "Sales".to_string(),
            })
            .unwrap();
        let result: Result<Employee, _> = registry.parse_object_as(&text);
        assert!(matches!(
            result,
            Err(JsonError::TypeMismatch { found, .. }) if found == "department"
        ));
    }

    #[test]
    fn test_unregistered_type_is_an_error() {
        let registry = TypeRegistry::new();
        let result = registry.stringify_object(&Employee {
            name: "Bob".to_string(),
            age: 41,
        });
        assert!(matches!(result, Err(JsonError::UnregisteredType(_))));
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let result = registry().parse_object(r#"{"class":"starship","name":"x"}"#);
        assert!(matches!(result, Err(JsonError::UnregisteredType(name)) if name == "starship"));
    }

    #[test]
    fn test_missing_tag_is_an_error() {
        let result = registry().parse_object(r#"{"name":"Bob"}"#);
        assert!(matches!(result, Err(JsonError::MissingType)));
    }
}
