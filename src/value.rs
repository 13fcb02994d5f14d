//! Binding of JSON arguments against resolved value shapes.

use ethers::types::{Address, I256, U256};
use serde_json::Value;

use crate::error::{AbiError, Result};
use crate::shape::{ByteWidth, Primitive, ValueShape};
use crate::signature::to_hex_prefixed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    FixedBytes(Vec<u8>),
    /// Unsigned integer and its declared bit width.
    Uint(U256, u16),
    /// Signed integer and its declared bit width.
    Int(I256, u16),
    Function { address: Address, selector: [u8; 4] },
    Array(Vec<AbiValue>),
    Struct(Vec<(String, AbiValue)>),
}

impl ValueShape {
    /// Checks `value` against this shape and converts it.
    ///
    /// Integers may be JSON numbers, decimal strings or `0x` hex strings;
    /// anything wider than 64 bits has to arrive as a string. Structs accept
    /// an object keyed by field name or a positional array.
    pub fn bind(&self, value: &Value) -> Result<AbiValue> {
        match self {
            ValueShape::Primitive(primitive) => bind_primitive(*primitive, value),
            ValueShape::FixedArray(inner, len) => {
                let items = value.as_array().ok_or_else(|| AbiError::mismatch(self, value))?;
                if items.len() != *len {
                    return Err(AbiError::mismatch(self, value));
                }
                bind_items(inner, items)
            }
            ValueShape::DynamicArray(inner) => {
                let items = value.as_array().ok_or_else(|| AbiError::mismatch(self, value))?;
                bind_items(inner, items)
            }
            ValueShape::Struct(fields) => match value {
                Value::Object(map) if map.len() == fields.len() => fields
                    .iter()
                    .map(|field| {
                        let item = map.get(&field.name).ok_or_else(|| AbiError::mismatch(self, value))?;
                        Ok((field.name.clone(), field.shape.bind(item)?))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(AbiValue::Struct),
                Value::Array(items) if items.len() == fields.len() => fields
                    .iter()
                    .zip(items)
                    .map(|(field, item)| Ok((field.name.clone(), field.shape.bind(item)?)))
                    .collect::<Result<Vec<_>>>()
                    .map(AbiValue::Struct),
                _ => Err(AbiError::mismatch(self, value)),
            },
        }
    }
}

fn bind_items(inner: &ValueShape, items: &[Value]) -> Result<AbiValue> {
    items
        .iter()
        .map(|item| inner.bind(item))
        .collect::<Result<Vec<_>>>()
        .map(AbiValue::Array)
}

fn bind_primitive(primitive: Primitive, value: &Value) -> Result<AbiValue> {
    let mismatch = || AbiError::mismatch(primitive, value);
    match primitive {
        Primitive::Address => {
            let bytes = value.as_str().and_then(|s| decode_hex(s, Some(20))).ok_or_else(mismatch)?;
            Ok(AbiValue::Address(Address::from_slice(&bytes)))
        }
        Primitive::Bool => value.as_bool().map(AbiValue::Bool).ok_or_else(mismatch),
        Primitive::String => value
            .as_str()
            .map(|s| AbiValue::String(s.to_string()))
            .ok_or_else(mismatch),
        Primitive::Bytes(ByteWidth::Dynamic) => bind_bytes(value, None).map(AbiValue::Bytes).ok_or_else(mismatch),
        Primitive::Bytes(ByteWidth::Fixed(n)) => bind_bytes(value, Some(n as usize))
            .map(AbiValue::FixedBytes)
            .ok_or_else(mismatch),
        Primitive::Integer { signed, bits } => bind_integer(value, signed, bits).ok_or_else(mismatch),
        Primitive::Function => {
            let bytes = value.as_str().and_then(|s| decode_hex(s, Some(24))).ok_or_else(mismatch)?;
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&bytes[20..]);
            Ok(AbiValue::Function {
                address: Address::from_slice(&bytes[..20]),
                selector,
            })
        }
    }
}

/// Decodes a `0x`-prefixed hex string, optionally requiring a byte length.
fn decode_hex(s: &str, len: Option<usize>) -> Option<Vec<u8>> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    let bytes = hex::decode(digits).ok()?;
    match len {
        Some(expected) if bytes.len() != expected => None,
        _ => Some(bytes),
    }
}

fn bind_bytes(value: &Value, len: Option<usize>) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => decode_hex(s, len),
        Value::Array(items) => {
            let bytes = items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()?;
            match len {
                Some(expected) if bytes.len() != expected => None,
                _ => Some(bytes),
            }
        }
        _ => None,
    }
}

fn bind_integer(value: &Value, signed: bool, bits: u16) -> Option<AbiValue> {
    let (negative, magnitude) = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                (false, U256::from(u))
            } else {
                let i = n.as_i64()?;
                (i < 0, U256::from(i.unsigned_abs()))
            }
        }
        Value::String(s) => parse_integer(s)?,
        _ => return None,
    };

    if signed {
        let limit = U256::one() << (bits as usize - 1);
        let in_range = if negative { magnitude <= limit } else { magnitude < limit };
        if !in_range {
            return None;
        }
        let raw = if negative {
            (!magnitude).overflowing_add(U256::one()).0
        } else {
            magnitude
        };
        Some(AbiValue::Int(I256::from_raw(raw), bits))
    } else {
        if (negative && !magnitude.is_zero()) || magnitude.bits() > bits as usize {
            return None;
        }
        Some(AbiValue::Uint(magnitude, bits))
    }
}

/// Parses an optionally negative decimal or `0x` hex string into sign and
/// magnitude.
fn parse_integer(s: &str) -> Option<(bool, U256)> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = if let Some(hex_digits) = digits.strip_prefix("0x") {
        if hex_digits.is_empty() || !hex_digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        U256::from_str_radix(hex_digits, 16).ok()?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        U256::from_dec_str(digits).ok()?
    };
    Some((negative, magnitude))
}

impl AbiValue {
    /// JSON rendering that [`ValueShape::bind`] accepts back. Integers become
    /// decimal strings so no width loses precision.
    pub fn to_json(&self) -> Value {
        match self {
            AbiValue::Address(address) => Value::String(to_hex_prefixed(address.as_bytes())),
            AbiValue::Bool(b) => Value::Bool(*b),
            AbiValue::String(s) => Value::String(s.clone()),
            AbiValue::Bytes(bytes) | AbiValue::FixedBytes(bytes) => Value::String(to_hex_prefixed(bytes)),
            AbiValue::Uint(n, _) => Value::String(n.to_string()),
            AbiValue::Int(n, _) => Value::String(n.to_string()),
            AbiValue::Function { address, selector } => {
                let mut bytes = address.as_bytes().to_vec();
                bytes.extend_from_slice(selector);
                Value::String(to_hex_prefixed(bytes))
            }
            AbiValue::Array(items) => Value::Array(items.iter().map(AbiValue::to_json).collect()),
            AbiValue::Struct(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}
