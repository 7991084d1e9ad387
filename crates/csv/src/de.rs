//! Record binding: raw cells to typed records.
//!
//! A parsed record arrives as ordered `(field, cell)` pairs, every cell an
//! optional string (`None` marks the null sentinel). Binding drives the
//! record type's `Deserialize` impl over those pairs like a string-keyed map
//! and coerces each cell according to the type the visitor asks for. Strict
//! mode turns every coercion problem into an error; relaxed mode logs a
//! warning and substitutes the type's default.

use serde::de::{self, Visitor};

use crate::error::CsvError;

pub(crate) struct RecordDeserializer {
    cells: Vec<(String, Option<String>)>,
    strict: bool,
    line: u64,
}

impl RecordDeserializer {
    pub(crate) fn new(cells: Vec<(String, Option<String>)>, strict: bool, line: u64) -> Self {
        RecordDeserializer {
            cells,
            strict,
            line,
        }
    }
}

impl<'de> de::Deserializer<'de> for RecordDeserializer {
    type Error = CsvError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(CellMap {
            cells: self.cells.into_iter(),
            pending: None,
            strict: self.strict,
            line: self.line,
        })
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string bytes
        byte_buf option unit unit_struct newtype_struct seq tuple tuple_struct
        enum identifier ignored_any
    }
}

struct CellMap {
    cells: std::vec::IntoIter<(String, Option<String>)>,
    pending: Option<(String, Option<String>)>,
    strict: bool,
    line: u64,
}

impl<'de> de::MapAccess<'de> for CellMap {
    type Error = CsvError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.cells.next() {
            None => Ok(None),
            Some((field, raw)) => {
                let key =
                    seed.deserialize(de::value::StringDeserializer::<CsvError>::new(field.clone()))?;
                self.pending = Some((field, raw));
                Ok(Some(key))
            }
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        let (field, raw) = self
            .pending
            .take()
            .ok_or_else(|| <CsvError as de::Error>::custom("value requested before key"))?;
        seed.deserialize(CellDeserializer {
            field,
            raw,
            strict: self.strict,
            line: self.line,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.cells.len())
    }
}

/// Coerces one raw cell into whatever the visitor requests.
struct CellDeserializer {
    field: String,
    raw: Option<String>,
    strict: bool,
    line: u64,
}

macro_rules! deserialize_parsed {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: Visitor<'de>,
        {
            match self.raw {
                None => {
                    if self.strict {
                        return Err(CsvError::NullValue(self.field));
                    }
                    log::warn!(
                        "null value for non-optional field '{}' at line {}, using default",
                        self.field,
                        self.line
                    );
                    visitor.$visit(<$ty>::default())
                }
                Some(raw) => match raw.trim().parse::<$ty>() {
                    Ok(value) => visitor.$visit(value),
                    Err(err) => {
                        if self.strict {
                            return Err(CsvError::coercion(
                                self.line,
                                &self.field,
                                &raw,
                                stringify!($ty),
                                err,
                            ));
                        }
                        log::warn!(
                            "cannot coerce '{}' into {} for field '{}' at line {}, using default",
                            raw,
                            stringify!($ty),
                            self.field,
                            self.line
                        );
                        visitor.$visit(<$ty>::default())
                    }
                },
            }
        }
    };
}

impl<'de> de::Deserializer<'de> for CellDeserializer {
    type Error = CsvError;

    deserialize_parsed!(deserialize_i8, visit_i8, i8);
    deserialize_parsed!(deserialize_i16, visit_i16, i16);
    deserialize_parsed!(deserialize_i32, visit_i32, i32);
    deserialize_parsed!(deserialize_i64, visit_i64, i64);
    deserialize_parsed!(deserialize_u8, visit_u8, u8);
    deserialize_parsed!(deserialize_u16, visit_u16, u16);
    deserialize_parsed!(deserialize_u32, visit_u32, u32);
    deserialize_parsed!(deserialize_u64, visit_u64, u64);
    deserialize_parsed!(deserialize_f32, visit_f32, f32);
    deserialize_parsed!(deserialize_f64, visit_f64, f64);

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.raw {
            None => {
                if self.strict {
                    return Err(CsvError::NullValue(self.field));
                }
                log::warn!(
                    "null value for non-optional field '{}' at line {}, using default",
                    self.field,
                    self.line
                );
                visitor.visit_bool(false)
            }
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => visitor.visit_bool(true),
                "false" | "0" => visitor.visit_bool(false),
                _ => {
                    if self.strict {
                        return Err(CsvError::coercion(
                            self.line,
                            &self.field,
                            &raw,
                            "bool",
                            "expected true, false, 1 or 0",
                        ));
                    }
                    log::warn!(
                        "cannot coerce '{}' into bool for field '{}' at line {}, using false",
                        raw,
                        self.field,
                        self.line
                    );
                    visitor.visit_bool(false)
                }
            },
        }
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.raw {
            None => {
                if self.strict {
                    return Err(CsvError::NullValue(self.field));
                }
                log::warn!(
                    "null value for non-optional field '{}' at line {}, using a space",
                    self.field,
                    self.line
                );
                visitor.visit_char(' ')
            }
            Some(raw) => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => visitor.visit_char(ch),
                    (first, _) => {
                        if self.strict {
                            return Err(CsvError::coercion(
                                self.line,
                                &self.field,
                                &raw,
                                "char",
                                "expected exactly one character",
                            ));
                        }
                        log::warn!(
                            "cannot coerce '{}' into char for field '{}' at line {}",
                            raw,
                            self.field,
                            self.line
                        );
                        visitor.visit_char(first.unwrap_or(' '))
                    }
                }
            }
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.raw {
            Some(raw) => visitor.visit_string(raw),
            None => {
                if self.strict {
                    return Err(CsvError::NullValue(self.field));
                }
                log::warn!(
                    "null value for non-optional field '{}' at line {}, using empty string",
                    self.field,
                    self.line
                );
                visitor.visit_string(String::new())
            }
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.raw.is_none() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.raw {
            Some(raw) => visitor.visit_enum(de::value::StringDeserializer::<CsvError>::new(raw)),
            None => Err(CsvError::NullValue(self.field)),
        }
    }

    fn deserialize_bytes<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(CsvError::BindError(format!(
            "field '{}' is binary, not supported in CSV records",
            self.field
        )))
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_seq<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(self.nested())
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(self.nested())
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(self.nested())
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(self.nested())
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(self.nested())
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.raw {
            Some(raw) => visitor.visit_string(raw),
            None => visitor.visit_unit(),
        }
    }
}

impl CellDeserializer {
    fn nested(&self) -> CsvError {
        CsvError::BindError(format!(
            "field '{}' is a nested aggregate, not supported in CSV records",
            self.field
        ))
    }
}
