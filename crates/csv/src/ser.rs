//! Record flattening: typed records to raw cells.
//!
//! The writer needs every record as ordered `(field, cell)` pairs with
//! `None` marking fields that must become the null sentinel. Records must be
//! structs or string-keyed maps; nested aggregates have no CSV shape and are
//! rejected.

use serde::ser::{self, Impossible, Serialize};

use crate::error::CsvError;

pub(crate) fn to_cells<T: Serialize>(record: &T) -> Result<Vec<(String, Option<String>)>, CsvError> {
    record.serialize(RecordSerializer)
}

struct RecordSerializer;

fn not_a_record(kind: &str) -> CsvError {
    CsvError::BindError(format!(
        "CSV records must be structs or string-keyed maps, got {kind}"
    ))
}

impl ser::Serializer for RecordSerializer {
    type Ok = Vec<(String, Option<String>)>;
    type Error = CsvError;

    type SerializeSeq = Impossible<Self::Ok, CsvError>;
    type SerializeTuple = Impossible<Self::Ok, CsvError>;
    type SerializeTupleStruct = Impossible<Self::Ok, CsvError>;
    type SerializeTupleVariant = Impossible<Self::Ok, CsvError>;
    type SerializeMap = CellCollector;
    type SerializeStruct = CellCollector;
    type SerializeStructVariant = Impossible<Self::Ok, CsvError>;

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(CellCollector::with_capacity(len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(CellCollector::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a boolean"))
    }

    fn serialize_i8(self, _v: i8) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_i16(self, _v: i16) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_i32(self, _v: i32) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_i64(self, _v: i64) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_u8(self, _v: u8) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_u16(self, _v: u16) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_u32(self, _v: u32) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_u64(self, _v: u64) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_f32(self, _v: f32) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_f64(self, _v: f64) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a number"))
    }

    fn serialize_char(self, _v: char) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a character"))
    }

    fn serialize_str(self, _v: &str) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a string"))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("bytes"))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("an option"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("a unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Err(not_a_record("an enum"))
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        Err(not_a_record("an enum"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(not_a_record("a sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(not_a_record("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(not_a_record("a tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(not_a_record("an enum"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(not_a_record("an enum"))
    }
}

pub(crate) struct CellCollector {
    cells: Vec<(String, Option<String>)>,
    key: Option<String>,
}

impl CellCollector {
    fn with_capacity(capacity: usize) -> Self {
        CellCollector {
            cells: Vec::with_capacity(capacity),
            key: None,
        }
    }
}

impl ser::SerializeStruct for CellCollector {
    type Ok = Vec<(String, Option<String>)>;
    type Error = CsvError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let cell = value.serialize(CellSerializer { field: key })?;
        self.cells.push((key.to_string(), cell));
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(self.cells)
    }
}

impl ser::SerializeMap for CellCollector {
    type Ok = Vec<(String, Option<String>)>;
    type Error = CsvError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| CsvError::BindError("map value serialized before key".to_string()))?;
        let cell = value.serialize(CellSerializer { field: "" })?;
        self.cells.push((key, cell));
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(self.cells)
    }
}

/// Serializes one field value into an optional cell string.
struct CellSerializer {
    field: &'static str,
}

impl CellSerializer {
    fn nested(&self) -> CsvError {
        CsvError::BindError(format!(
            "field '{}' is a nested aggregate, not supported in CSV records",
            self.field
        ))
    }
}

macro_rules! serialize_display {
    ($method:ident, $ty:ty) => {
        fn $method(self, value: $ty) -> Result<Self::Ok, Self::Error> {
            Ok(Some(value.to_string()))
        }
    };
}

impl ser::Serializer for CellSerializer {
    type Ok = Option<String>;
    type Error = CsvError;

    type SerializeSeq = Impossible<Self::Ok, CsvError>;
    type SerializeTuple = Impossible<Self::Ok, CsvError>;
    type SerializeTupleStruct = Impossible<Self::Ok, CsvError>;
    type SerializeTupleVariant = Impossible<Self::Ok, CsvError>;
    type SerializeMap = Impossible<Self::Ok, CsvError>;
    type SerializeStruct = Impossible<Self::Ok, CsvError>;
    type SerializeStructVariant = Impossible<Self::Ok, CsvError>;

    serialize_display!(serialize_bool, bool);
    serialize_display!(serialize_i8, i8);
    serialize_display!(serialize_i16, i16);
    serialize_display!(serialize_i32, i32);
    serialize_display!(serialize_i64, i64);
    serialize_display!(serialize_u8, u8);
    serialize_display!(serialize_u16, u16);
    serialize_display!(serialize_u32, u32);
    serialize_display!(serialize_u64, u64);
    serialize_display!(serialize_f32, f32);
    serialize_display!(serialize_f64, f64);
    serialize_display!(serialize_char, char);

    fn serialize_str(self, value: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Some(value.to_string()))
    }

    fn serialize_bytes(self, _value: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(CsvError::BindError(format!(
            "field '{}' is binary, not supported in CSV records",
            self.field
        )))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Ok(None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(Some(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        Err(self.nested())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(self.nested())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(self.nested())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(self.nested())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(self.nested())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(self.nested())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Err(self.nested())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(self.nested())
    }
}

/// Map keys must serialize as plain strings.
struct KeySerializer;

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = CsvError;

    type SerializeSeq = Impossible<String, CsvError>;
    type SerializeTuple = Impossible<String, CsvError>;
    type SerializeTupleStruct = Impossible<String, CsvError>;
    type SerializeTupleVariant = Impossible<String, CsvError>;
    type SerializeMap = Impossible<String, CsvError>;
    type SerializeStruct = Impossible<String, CsvError>;
    type SerializeStructVariant = Impossible<String, CsvError>;

    fn serialize_str(self, value: &str) -> Result<Self::Ok, Self::Error> {
        Ok(value.to_string())
    }

    fn serialize_bool(self, _v: bool) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_i8(self, _v: i8) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_i16(self, _v: i16) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_i32(self, _v: i32) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_i64(self, _v: i64) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_u8(self, _v: u8) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_u16(self, _v: u16) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_u32(self, _v: u32) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_u64(self, _v: u64) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_f32(self, _v: f32) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_f64(self, _v: f64) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_char(self, value: char) -> Result<Self::Ok, Self::Error> {
        Ok(value.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_some<T>(self, _value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        Err(Self::bad_key())
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        Err(Self::bad_key())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Err(Self::bad_key())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(Self::bad_key())
    }
}

impl KeySerializer {
    fn bad_key() -> CsvError {
        CsvError::BindError("map record keys must be strings".to_string())
    }
}
