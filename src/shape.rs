//! Resolution of ABI type strings into the shape of the values they denote.
//!
//! A parameter's type is split into an elementary base and its array
//! suffixes. The base resolves to a [`Primitive`] (or, for `tuple`, to a
//! [`ValueShape::Struct`] built from the parameter's components) and the
//! suffixes are re-applied left to right, so the rightmost suffix is the
//! outermost array: `uint256[3][]` is a dynamic array of `uint256[3]`.

use std::fmt;

use crate::error::{AbiError, Result};
use crate::types::{Event, Function, Parameter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteWidth {
    Fixed(u8),
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// 20-byte address written as `0x` + 40 hex digits.
    Address,
    Bool,
    /// UTF-8 text.
    String,
    Bytes(ByteWidth),
    /// Integers of any width are carried as 256-bit values, never as a
    /// machine word that could lose precision.
    Integer { signed: bool, bits: u16 },
    /// An address followed by a 4-byte selector.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueShape {
    Primitive(Primitive),
    FixedArray(Box<ValueShape>, usize),
    DynamicArray(Box<ValueShape>),
    Struct(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub shape: ValueShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySuffix {
    Dynamic,
    Fixed(usize),
}

/// Splits `ty` into its base type and array suffixes, listed in the order
/// they are written (innermost first).
pub fn split_array_suffixes(ty: &str) -> Result<(&str, Vec<ArraySuffix>)> {
    let invalid = || AbiError::InvalidArraySuffix(ty.to_string());
    let mut rest = ty;
    let mut suffixes = Vec::new();

    while let Some(stripped) = rest.strip_suffix(']') {
        let open = stripped.rfind('[').ok_or_else(invalid)?;
        let size = &stripped[open + 1..];
        let suffix = if size.is_empty() {
            ArraySuffix::Dynamic
        } else {
            ArraySuffix::Fixed(parse_positive(size).ok_or_else(invalid)?)
        };
        suffixes.push(suffix);
        rest = &stripped[..open];
    }

    if rest.contains('[') || rest.contains(']') {
        return Err(invalid());
    }
    suffixes.reverse();
    Ok((rest, suffixes))
}

fn parse_positive(digits: &str) -> Option<usize> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Resolves a suffix-free, non-tuple type.
pub fn resolve_elementary(base: &str) -> Result<Primitive> {
    let unknown = || AbiError::UnknownAbiType(base.to_string());
    let primitive = match base {
        "address" => Primitive::Address,
        "bool" => Primitive::Bool,
        "string" => Primitive::String,
        "bytes" => Primitive::Bytes(ByteWidth::Dynamic),
        "function" => Primitive::Function,
        "tuple" => return Err(AbiError::MissingTupleComponents(base.to_string())),
        _ => {
            if let Some(width) = base.strip_prefix("bytes") {
                match parse_positive(width) {
                    Some(n @ 1..=32) => Primitive::Bytes(ByteWidth::Fixed(n as u8)),
                    _ => return Err(unknown()),
                }
            } else if let Some(bits) = base.strip_prefix("uint") {
                Primitive::Integer {
                    signed: false,
                    bits: integer_bits(bits).ok_or_else(unknown)?,
                }
            } else if let Some(bits) = base.strip_prefix("int") {
                Primitive::Integer {
                    signed: true,
                    bits: integer_bits(bits).ok_or_else(unknown)?,
                }
            } else {
                return Err(unknown());
            }
        }
    };
    Ok(primitive)
}

fn integer_bits(digits: &str) -> Option<u16> {
    if digits.is_empty() {
        return Some(256);
    }
    match parse_positive(digits)? {
        n @ 8..=256 if n % 8 == 0 => Some(n as u16),
        _ => None,
    }
}

/// Resolves a parameter into the shape of its values.
pub fn resolve(param: &Parameter) -> Result<ValueShape> {
    let (base, suffixes) = split_array_suffixes(&param.ty)?;

    let base_shape = if base == "tuple" {
        let components = param
            .components
            .as_ref()
            .ok_or_else(|| AbiError::MissingTupleComponents(param.ty.clone()))?;
        ValueShape::Struct(resolve_fields(&param.ty, components)?)
    } else {
        ValueShape::Primitive(resolve_elementary(base)?)
    };

    Ok(suffixes.into_iter().fold(base_shape, |inner, suffix| match suffix {
        ArraySuffix::Dynamic => ValueShape::DynamicArray(Box::new(inner)),
        ArraySuffix::Fixed(n) => ValueShape::FixedArray(Box::new(inner), n),
    }))
}

/// Resolves a bare type string; tuples need components and therefore fail.
pub fn resolve_type(ty: &str) -> Result<ValueShape> {
    resolve(&Parameter::new(ty, ""))
}

/// Resolves each parameter in order.
pub fn parameters_shape(params: &[Parameter]) -> Result<Vec<ValueShape>> {
    params.iter().map(resolve).collect()
}

/// Named fields for a parameter list; unnamed parameters take their
/// position as field name. Field names must be unique within `owner`.
fn resolve_fields(owner: &str, params: &[Parameter]) -> Result<Vec<Field>> {
    let mut fields: Vec<Field> = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let name = field_name(param, i);
        if fields.iter().any(|field| field.name == name) {
            return Err(AbiError::DuplicateFieldName {
                ty: owner.to_string(),
                field: name,
            });
        }
        fields.push(Field {
            name,
            shape: resolve(param)?,
        });
    }
    Ok(fields)
}

fn field_name(param: &Parameter, position: usize) -> String {
    if param.name.is_empty() {
        position.to_string()
    } else {
        param.name.clone()
    }
}

impl Parameter {
    pub fn shape(&self) -> Result<ValueShape> {
        resolve(self)
    }
}

impl ValueShape {
    pub fn field(&self, name: &str) -> Option<&ValueShape> {
        match self {
            ValueShape::Struct(fields) => fields.iter().find(|f| f.name == name).map(|f| &f.shape),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&ValueShape> {
        match self {
            ValueShape::FixedArray(inner, _) | ValueShape::DynamicArray(inner) => Some(inner),
            _ => None,
        }
    }

    /// Number of nested array levels.
    pub fn dimensions(&self) -> usize {
        self.element().map_or(0, |inner| 1 + inner.dimensions())
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Address => f.write_str("address"),
            Primitive::Bool => f.write_str("bool"),
            Primitive::String => f.write_str("string"),
            Primitive::Bytes(ByteWidth::Dynamic) => f.write_str("bytes"),
            Primitive::Bytes(ByteWidth::Fixed(n)) => write!(f, "bytes{}", n),
            Primitive::Integer { signed: true, bits } => write!(f, "int{}", bits),
            Primitive::Integer { signed: false, bits } => write!(f, "uint{}", bits),
            Primitive::Function => f.write_str("function"),
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Primitive(p) => write!(f, "{}", p),
            ValueShape::FixedArray(inner, n) => write!(f, "{}[{}]", inner, n),
            ValueShape::DynamicArray(inner) => write!(f, "{}[]", inner),
            ValueShape::Struct(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", field.shape, field.name)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// What a function call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputShape {
    Unit,
    Single(ValueShape),
    Tuple(Vec<ValueShape>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionShape {
    pub inputs: Vec<ValueShape>,
    pub output: OutputShape,
}

/// Event inputs split into topic (indexed) and data fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventShape {
    pub indexed: Vec<Field>,
    pub data: Vec<Field>,
}

impl Function {
    pub fn shape(&self) -> Result<FunctionShape> {
        let inputs = parameters_shape(&self.inputs)?;
        let mut outputs = parameters_shape(&self.outputs)?;
        let output = match outputs.len() {
            0 => OutputShape::Unit,
            1 => OutputShape::Single(outputs.remove(0)),
            _ => OutputShape::Tuple(outputs),
        };
        Ok(FunctionShape { inputs, output })
    }
}

impl Event {
    pub fn shape(&self) -> Result<EventShape> {
        let fields = resolve_fields(&self.name, &self.inputs)?;
        let (indexed, data) = fields
            .into_iter()
            .zip(&self.inputs)
            .partition::<Vec<_>, _>(|(_, param)| param.indexed);
        Ok(EventShape {
            indexed: indexed.into_iter().map(|(field, _)| field).collect(),
            data: data.into_iter().map(|(field, _)| field).collect(),
        })
    }
}
