//! Record field discovery.
//!
//! Strict descriptors validate column names against the bound record type.
//! The probe below recovers the field list a derived `Deserialize` impl
//! advertises: it asks the type to deserialize itself and intercepts the
//! `fields` argument of `deserialize_struct` before any value work happens.

use std::fmt;

use serde::de;

/// Field names of `T`'s derived struct impl, in declaration order, or `None`
/// when `T` does not deserialize as a struct (maps, sequences, enums).
pub(crate) fn struct_fields<T>() -> Option<&'static [&'static str]>
where
    T: de::DeserializeOwned,
{
    match T::deserialize(FieldProbe) {
        Err(ProbeOutcome::Fields(fields)) => Some(fields),
        _ => None,
    }
}

/// Carried out of the probe through the deserializer's error channel.
#[derive(Debug)]
enum ProbeOutcome {
    Fields(&'static [&'static str]),
    NotAStruct(String),
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Fields(fields) => write!(f, "captured {} fields", fields.len()),
            ProbeOutcome::NotAStruct(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ProbeOutcome {}

impl de::Error for ProbeOutcome {
    fn custom<T: fmt::Display>(message: T) -> Self {
        ProbeOutcome::NotAStruct(message.to_string())
    }
}

struct FieldProbe;

impl<'de> de::Deserializer<'de> for FieldProbe {
    type Error = ProbeOutcome;

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(ProbeOutcome::Fields(fields))
    }

    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        Err(ProbeOutcome::NotAStruct(
            "record type is not a struct".to_string(),
        ))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string bytes
        byte_buf option unit unit_struct newtype_struct seq tuple tuple_struct
        map enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Person {
        #[allow(dead_code)]
        name: String,
        #[allow(dead_code)]
        postal_address: Option<String>,
        #[allow(dead_code)]
        age: u32,
    }

    #[test]
    fn test_struct_fields_in_declaration_order() {
        assert_eq!(
            struct_fields::<Person>(),
            Some(["name", "postal_address", "age"].as_slice())
        );
    }

    #[test]
    fn test_non_struct_types_have_no_fields() {
        assert_eq!(struct_fields::<Vec<i32>>(), None);
        assert_eq!(struct_fields::<HashMap<String, String>>(), None);
        assert_eq!(struct_fields::<String>(), None);
        assert_eq!(struct_fields::<(String, u32)>(), None);
    }

    #[test]
    fn test_renamed_fields_are_reported_with_serde_names() {
        #[derive(Deserialize)]
        struct Renamed {
            #[allow(dead_code)]
            #[serde(rename = "label")]
            name: String,
        }
        assert_eq!(struct_fields::<Renamed>(), Some(["label"].as_slice()));
    }
}
