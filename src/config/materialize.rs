//! Binding the merged tree onto the caller's typed object
//!
//! Environment and flag values arrive as strings. The deserializer here
//! converts string leaves to whatever primitive the target field asks for,
//! so `"101"` fills a `u32` and `"true"` fills a `bool`. Conversion is weak
//! in the other direction too: numbers and booleans fill string fields, and
//! a blank string reads as `0` or `false`.

use serde::de::{self, DeserializeOwned, DeserializeSeed, Deserializer, IntoDeserializer, Visitor};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use super::store::overlay;

/// Failure while binding the merged tree onto the target type.
#[derive(Debug)]
pub enum MaterializeError {
    /// A string leaf could not be converted to the requested primitive.
    Conversion { key: String, value: String, expected: &'static str },
    /// The tree does not fit the target type (missing field, wrong shape, ...).
    Shape { key: Option<String>, message: String },
}

impl MaterializeError {
    fn at(self, path: &str) -> Self {
        match self {
            MaterializeError::Shape { key: None, message } if !path.is_empty() => {
                MaterializeError::Shape { key: Some(path.to_string()), message }
            }
            other => other,
        }
    }
}

impl fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeError::Conversion { key, value, expected } => {
                write!(f, "invalid value {value:?} for `{key}`: expected {expected}")
            }
            MaterializeError::Shape { key: Some(key), message } => write!(f, "at `{key}`: {message}"),
            MaterializeError::Shape { key: None, message } => f.write_str(message),
        }
    }
}

impl std::error::Error for MaterializeError {}

impl de::Error for MaterializeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        MaterializeError::Shape { key: None, message: msg.to_string() }
    }
}

/// Overlay `merged` onto the current contents of `target` and rebuild it.
///
/// `target` is only replaced when the whole tree binds successfully.
pub fn materialize<T>(merged: Value, target: &mut T, delimiter: char) -> Result<(), MaterializeError>
where
    T: Serialize + DeserializeOwned,
{
    let mut tree = serde_json::to_value(&*target).map_err(|err| MaterializeError::Shape {
        key: None,
        message: format!("target cannot be represented as a config tree: {err}"),
    })?;
    overlay(&mut tree, merged);
    *target = T::deserialize(Lenient::new(tree, String::new(), delimiter))?;
    Ok(())
}

struct Lenient {
    value: Value,
    path: String,
    delimiter: char,
}

impl Lenient {
    fn new(value: Value, path: String, delimiter: char) -> Self {
        Self { value, path, delimiter }
    }

    fn child(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", self.path, self.delimiter, key)
        }
    }

    fn conversion(&self, value: &str, expected: &'static str) -> MaterializeError {
        MaterializeError::Conversion { key: self.path.clone(), value: value.to_string(), expected }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "" | "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Blank numeric input reads as zero.
fn or_zero(s: &str) -> &str {
    match s.trim() {
        "" => "0",
        trimmed => trimmed,
    }
}

fn split_list(s: &str) -> Vec<Value> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split(',').map(|part| Value::String(part.trim().to_string())).collect()
}

macro_rules! lenient_number {
    ($($method:ident => $visit:ident: $ty:ty, $expected:literal;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                match &self.value {
                    Value::String(s) => match or_zero(s).parse::<$ty>() {
                        Ok(n) => visitor.$visit(n),
                        Err(_) => Err(self.conversion(s, $expected)),
                    },
                    _ => self.deserialize_any(visitor),
                }
            }
        )*
    };
}

impl<'de> Deserializer<'de> for Lenient {
    type Error = MaterializeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let Lenient { value, path, delimiter } = self;
        match value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visitor.visit_seq(SeqDe::new(items, path, delimiter)),
            Value::Object(map) => visitor.visit_map(MapDe::new(map, path, delimiter)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match &self.value {
            Value::String(s) => match parse_bool(s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(self.conversion(s, "a boolean")),
            },
            _ => self.deserialize_any(visitor),
        }
    }

    lenient_number! {
        deserialize_i8 => visit_i8: i8, "an 8-bit integer";
        deserialize_i16 => visit_i16: i16, "a 16-bit integer";
        deserialize_i32 => visit_i32: i32, "a 32-bit integer";
        deserialize_i64 => visit_i64: i64, "a 64-bit integer";
        deserialize_u8 => visit_u8: u8, "an unsigned 8-bit integer";
        deserialize_u16 => visit_u16: u16, "an unsigned 16-bit integer";
        deserialize_u32 => visit_u32: u32, "an unsigned 32-bit integer";
        deserialize_u64 => visit_u64: u64, "an unsigned 64-bit integer";
        deserialize_f32 => visit_f32: f32, "a number";
        deserialize_f64 => visit_f64: f64, "a number";
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Number(n) => visitor.visit_string(n.to_string()),
            Value::Bool(b) => visitor.visit_string(b.to_string()),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::String(s) => {
                visitor.visit_seq(SeqDe::new(split_list(&s), self.path, self.delimiter))
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            other => other
                .deserialize_enum(name, variants, visitor)
                .map_err(<MaterializeError as de::Error>::custom),
        }
    }

    serde::forward_to_deserialize_any! {
        bytes byte_buf unit unit_struct map struct identifier ignored_any
    }
}

struct SeqDe {
    items: std::vec::IntoIter<Value>,
    index: usize,
    path: String,
    delimiter: char,
}

impl SeqDe {
    fn new(items: Vec<Value>, path: String, delimiter: char) -> Self {
        Self { items: items.into_iter(), index: 0, path, delimiter }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDe {
    type Error = MaterializeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error> {
        let Some(item) = self.items.next() else {
            return Ok(None);
        };
        let path = format!("{}[{}]", self.path, self.index);
        self.index += 1;
        seed.deserialize(Lenient::new(item, path.clone(), self.delimiter))
            .map(Some)
            .map_err(|err| err.at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct MapDe {
    entries: serde_json::map::IntoIter,
    pending: Option<Value>,
    parent: Lenient,
    current: String,
}

impl MapDe {
    fn new(map: Map<String, Value>, path: String, delimiter: char) -> Self {
        Self {
            entries: map.into_iter(),
            pending: None,
            parent: Lenient::new(Value::Null, path, delimiter),
            current: String::new(),
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDe {
    type Error = MaterializeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.current = self.parent.child(&key);
        self.pending = Some(value);
        let key_de = Lenient::new(Value::String(key), self.current.clone(), self.parent.delimiter);
        seed.deserialize(key_de).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        let value = self.pending.take().unwrap_or(Value::Null);
        let path = self.current.clone();
        seed.deserialize(Lenient::new(value, path.clone(), self.parent.delimiter))
            .map_err(|err| err.at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}
