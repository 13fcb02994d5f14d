//! Parsing and shape resolution for Ethereum contract ABIs.
//!
//! Descriptors come from human-readable declarations
//! (`function balanceOf(address owner) view returns (uint256)`) or from the
//! structured JSON form, and every parameter resolves to a [`ValueShape`]
//! that arguments can be bound against.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod human_readable;
pub mod json_abi;
pub mod loader;
pub mod shape;
pub mod signature;
pub mod text;
pub mod types;
pub mod value;

pub use config::{MutabilityMode, ParserConfig};
pub use descriptor::{Descriptor, Lookup, Overloads};
pub use error::{AbiError, Result};
pub use human_readable::{ParseReport, RejectedDeclaration, SignatureParser};
pub use shape::{EventShape, Field, FunctionShape, OutputShape, Primitive, ValueShape};
pub use types::{
    Constructor, CustomError, Entry, EntryKind, Event, Fallback, Function, Parameter, Receive, StateMutability,
};
pub use value::AbiValue;
