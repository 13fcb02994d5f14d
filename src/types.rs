// ABI data model

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    NonPayable,
    Payable,
}

impl StateMutability {
    pub const ALL: [StateMutability; 4] = [
        StateMutability::Pure,
        StateMutability::View,
        StateMutability::NonPayable,
        StateMutability::Payable,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "pure" => Some(StateMutability::Pure),
            "view" => Some(StateMutability::View),
            "nonpayable" => Some(StateMutability::NonPayable),
            "payable" => Some(StateMutability::Payable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }

    /// `pure` and `view` functions cannot change chain state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positional keyword allowed between a parameter's type and its name.
///
/// Only `indexed` survives parsing; the data-location hints are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Calldata,
    Indexed,
    Memory,
    Storage,
}

impl Modifier {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "calldata" => Some(Modifier::Calldata),
            "indexed" => Some(Modifier::Indexed),
            "memory" => Some(Modifier::Memory),
            "storage" => Some(Modifier::Storage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Function,
    Event,
    Error,
    Constructor,
    Fallback,
    Receive,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Function => "function",
            EntryKind::Event => "event",
            EntryKind::Error => "error",
            EntryKind::Constructor => "constructor",
            EntryKind::Fallback => "fallback",
            EntryKind::Receive => "receive",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub indexed: bool,
    #[serde(rename = "internalType", default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Parameter>>,
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            indexed: false,
            internal_type: None,
            components: None,
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn with_components(mut self, components: Vec<Parameter>) -> Self {
        self.components = Some(components);
        self
    }

    /// The type with every trailing `[..]` suffix removed.
    pub fn root_type(&self) -> &str {
        self.ty.split('[').next().unwrap_or(&self.ty)
    }

    pub fn is_tuple(&self) -> bool {
        self.root_type() == "tuple"
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ty)?;
        if self.indexed {
            f.write_str(" indexed")?;
        }
        if !self.name.is_empty() {
            write!(f, " {}", self.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
    #[serde(rename = "stateMutability")]
    pub state_mutability: StateMutability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub anonymous: bool,
}

/// A custom `error` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomError {
    pub name: String,
    pub inputs: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constructor {
    pub inputs: Vec<Parameter>,
    #[serde(rename = "stateMutability")]
    pub state_mutability: StateMutability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    #[serde(rename = "stateMutability")]
    pub state_mutability: StateMutability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receive {
    #[serde(rename = "stateMutability")]
    pub state_mutability: StateMutability,
}

impl Default for Receive {
    fn default() -> Self {
        Self {
            state_mutability: StateMutability::Payable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Function(Function),
    Event(Event),
    Error(CustomError),
    Constructor(Constructor),
    Fallback(Fallback),
    Receive(Receive),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Function(_) => EntryKind::Function,
            Entry::Event(_) => EntryKind::Event,
            Entry::Error(_) => EntryKind::Error,
            Entry::Constructor(_) => EntryKind::Constructor,
            Entry::Fallback(_) => EntryKind::Fallback,
            Entry::Receive(_) => EntryKind::Receive,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Entry::Function(f) => Some(&f.name),
            Entry::Event(e) => Some(&e.name),
            Entry::Error(e) => Some(&e.name),
            Entry::Constructor(_) | Entry::Fallback(_) | Entry::Receive(_) => None,
        }
    }

    pub fn inputs(&self) -> &[Parameter] {
        match self {
            Entry::Function(f) => &f.inputs,
            Entry::Event(e) => &e.inputs,
            Entry::Error(e) => &e.inputs,
            Entry::Constructor(c) => &c.inputs,
            Entry::Fallback(_) | Entry::Receive(_) => &[],
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Entry::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Entry::Event(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&CustomError> {
        match self {
            Entry::Error(e) => Some(e),
            _ => None,
        }
    }
}

struct ParamList<'a>(&'a [Parameter]);

impl fmt::Display for ParamList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, param) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        Ok(())
    }
}

/// Renders the human-readable declaration form, e.g.
/// `function balanceOf(address owner) view returns (uint256 balance)`.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Function(func) => {
                write!(f, "function {}({})", func.name, ParamList(&func.inputs))?;
                if func.state_mutability != StateMutability::NonPayable {
                    write!(f, " {}", func.state_mutability)?;
                }
                if !func.outputs.is_empty() {
                    write!(f, " returns ({})", ParamList(&func.outputs))?;
                }
                Ok(())
            }
            Entry::Event(event) => {
                write!(f, "event {}({})", event.name, ParamList(&event.inputs))?;
                if event.anonymous {
                    f.write_str(" anonymous")?;
                }
                Ok(())
            }
            Entry::Error(error) => write!(f, "error {}({})", error.name, ParamList(&error.inputs)),
            Entry::Constructor(ctor) => {
                write!(f, "constructor({})", ParamList(&ctor.inputs))?;
                if ctor.state_mutability == StateMutability::Payable {
                    f.write_str(" payable")?;
                }
                Ok(())
            }
            Entry::Fallback(fallback) => {
                f.write_str("fallback() external")?;
                if fallback.state_mutability == StateMutability::Payable {
                    f.write_str(" payable")?;
                }
                Ok(())
            }
            Entry::Receive(_) => f.write_str("receive() external payable"),
        }
    }
}
