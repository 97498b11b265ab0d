//! Request-parameter model binding.
//!
//! Binding happens in two steps. [`RequestParameterBinder`] collects the
//! request into a JSON object that constraints are checked against, then
//! [`build_model`] turns that object into the typed model.

use actiongate_core::ModelDescriptor;
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Unexpected, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

use super::operation::{ActionRequest, BindError};
use crate::traits::ModelBinder;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Binds query-string parameters plus a form or JSON body into one object.
///
/// Parameters bind as strings; a repeated key becomes an array. Body fields
/// override query parameters of the same name. A JSON body keeps its types.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestParameterBinder;

impl RequestParameterBinder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ModelBinder for RequestParameterBinder {
    fn bind(&self, request: &ActionRequest, _model: &ModelDescriptor) -> Result<Value, BindError> {
        let mut fields = request
            .query
            .as_deref()
            .map(|query| parse_pairs(query.as_bytes()))
            .unwrap_or_default();

        if request.body.is_empty() {
            return Ok(Value::Object(fields));
        }

        match request.content_type().as_deref() {
            Some(mime) if is_json(mime) => {
                let body: Value = serde_json::from_slice(&request.body)
                    .map_err(|err| BindError::MalformedBody(err.to_string()))?;
                match body {
                    Value::Object(map) => fields.extend(map),
                    Value::Null => {}
                    other => {
                        return Err(BindError::MalformedBody(format!(
                            "expected a JSON object, found {}",
                            json_kind(&other)
                        )))
                    }
                }
            }
            Some(FORM_CONTENT_TYPE) => fields.extend(parse_pairs(&request.body)),
            Some(other) => return Err(BindError::UnsupportedContentType(other.to_string())),
            None => return Err(BindError::UnsupportedContentType("none".to_string())),
        }
        Ok(Value::Object(fields))
    }
}

fn is_json(mime: &str) -> bool {
    mime == "application/json" || mime.ends_with("+json")
}

fn parse_pairs(input: &[u8]) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match fields.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key.into_owned(), value);
            }
        }
    }
    fields
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Typed model construction
// ---------------------------------------------------------------------------

/// Deserializes a bound object into `T`.
///
/// Query and form parameters arrive as strings, so a string coerces to the
/// number or boolean the model field asks for, and a lone value fills a
/// sequence field. Everything else follows `serde_json`.
///
/// # Errors
///
/// Returns the deserialization error when the value does not fit `T`.
pub fn build_model<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    T::deserialize(Coerced(value))
}

struct Coerced(Value);

impl<'de> IntoDeserializer<'de, serde_json::Error> for Coerced {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn parse_str<'de, T, V>(raw: &str, visitor: &V) -> Result<T, serde_json::Error>
where
    T: std::str::FromStr,
    V: Visitor<'de>,
{
    raw.trim()
        .parse()
        .map_err(|_| de::Error::invalid_value(Unexpected::Str(raw), visitor))
}

fn visit_array<'de, V: Visitor<'de>>(
    items: Vec<Value>,
    visitor: V,
) -> Result<V::Value, serde_json::Error> {
    SeqDeserializer::new(items.into_iter().map(Coerced)).deserialize_any(visitor)
}

fn visit_object<'de, V: Visitor<'de>>(
    map: Map<String, Value>,
    visitor: V,
) -> Result<V::Value, serde_json::Error> {
    MapDeserializer::new(map.into_iter().map(|(key, value)| (key, Coerced(value))))
        .deserialize_any(visitor)
}

impl<'de> Deserializer<'de> for Coerced {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => visit_array(items, visitor),
            Value::Object(map) => visit_object(map, visitor),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::String(raw) => {
                let flag = parse_str(&raw, &visitor)?;
                visitor.visit_bool(flag)
            }
            other => other.deserialize_bool(visitor),
        }
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::String(raw) => {
                let n = parse_str(&raw, &visitor)?;
                visitor.visit_i64(n)
            }
            other => other.deserialize_i64(visitor),
        }
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::String(raw) => {
                let n = parse_str(&raw, &visitor)?;
                visitor.visit_u64(n)
            }
            other => other.deserialize_u64(visitor),
        }
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::String(raw) => {
                let n = parse_str(&raw, &visitor)?;
                visitor.visit_f64(n)
            }
            other => other.deserialize_f64(visitor),
        }
    }

    // Narrower primitives range-check inside their visitors.
    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_i64(visitor)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_u64(visitor)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(Coerced(other)),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => visit_array(items, visitor),
            Value::Null => Value::Null.deserialize_seq(visitor),
            single => visit_array(vec![single], visitor),
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visit_object(map, visitor),
            other => other.deserialize_map(visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_unit(visitor)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_unit_struct(name, visitor)
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf tuple tuple_struct identifier ignored_any
    }
}
