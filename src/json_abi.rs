//! Ingestion of the structured (JSON) ABI form.
//!
//! Every element is checked against the ABI schema before it becomes an
//! [`Entry`]; the first non-conforming element fails the whole document.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::descriptor::Descriptor;
use crate::error::{AbiError, Result};
use crate::types::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    inputs: Option<Vec<Parameter>>,
    outputs: Option<Vec<Parameter>>,
    state_mutability: Option<String>,
    constant: Option<bool>,
    payable: Option<bool>,
    anonymous: Option<bool>,
}

impl Descriptor {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        let Value::Array(elements) = value else {
            return Err(AbiError::SchemaViolation {
                index: 0,
                reason: "an ABI must be a JSON array".to_string(),
            });
        };

        let mut entries = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            let entry = entry_from_value(index, element)?;
            if matches!(entry, Entry::Constructor(_) | Entry::Fallback(_) | Entry::Receive(_))
                && entries.iter().any(|e: &Entry| e.kind() == entry.kind())
            {
                return Err(violation(index, format!("more than one {}", entry.kind())));
            }
            debug!("Ingested {} `{}`", entry.kind(), entry.name().unwrap_or_default());
            entries.push(entry);
        }
        Ok(Descriptor::new(entries))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn violation(index: usize, reason: impl Into<String>) -> AbiError {
    AbiError::SchemaViolation {
        index,
        reason: reason.into(),
    }
}

fn entry_from_value(index: usize, element: Value) -> Result<Entry> {
    if element.is_string() {
        return Err(violation(index, "human-readable declaration inside a JSON ABI"));
    }
    let raw: RawEntry = serde_json::from_value(element).map_err(|e| violation(index, e.to_string()))?;

    let kind = raw.kind.as_deref().unwrap_or("function");
    let inputs = raw.inputs.clone().unwrap_or_default();
    check_parameters(index, &inputs, kind == "event")?;

    let entry = match kind {
        "function" => {
            let outputs = raw.outputs.clone().unwrap_or_default();
            check_parameters(index, &outputs, false)?;
            Entry::Function(Function {
                name: required_name(index, &raw)?,
                inputs,
                outputs,
                state_mutability: mutability(index, &raw)?,
            })
        }
        "event" => Entry::Event(Event {
            name: required_name(index, &raw)?,
            inputs,
            anonymous: raw.anonymous.unwrap_or(false),
        }),
        "error" => Entry::Error(CustomError {
            name: required_name(index, &raw)?,
            inputs,
        }),
        "constructor" => Entry::Constructor(Constructor {
            inputs,
            state_mutability: payable_or_not(index, mutability(index, &raw)?)?,
        }),
        "fallback" => Entry::Fallback(Fallback {
            state_mutability: payable_or_not(index, mutability(index, &raw)?)?,
        }),
        "receive" => {
            if raw.state_mutability.as_deref().map_or(false, |m| m != "payable") {
                return Err(violation(index, "receive must be payable"));
            }
            Entry::Receive(Receive::default())
        }
        other => return Err(violation(index, format!("unknown entry type `{}`", other))),
    };
    Ok(entry)
}

fn required_name(index: usize, raw: &RawEntry) -> Result<String> {
    match raw.name.as_deref() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(violation(index, "missing name")),
    }
}

/// `stateMutability` wins; older ABIs only carry `constant` and `payable`.
fn mutability(index: usize, raw: &RawEntry) -> Result<StateMutability> {
    if let Some(token) = raw.state_mutability.as_deref() {
        return StateMutability::from_token(token)
            .ok_or_else(|| violation(index, format!("unknown stateMutability `{}`", token)));
    }
    Ok(match (raw.constant, raw.payable) {
        (Some(true), _) => StateMutability::View,
        (_, Some(true)) => StateMutability::Payable,
        _ => StateMutability::NonPayable,
    })
}

fn payable_or_not(index: usize, mutability: StateMutability) -> Result<StateMutability> {
    match mutability {
        StateMutability::Payable | StateMutability::NonPayable => Ok(mutability),
        other => Err(violation(index, format!("`{}` is not allowed here", other))),
    }
}

fn check_parameters(index: usize, params: &[Parameter], allow_indexed: bool) -> Result<()> {
    for param in params {
        if param.ty.trim().is_empty() {
            return Err(violation(index, "parameter without a type"));
        }
        if param.indexed && !allow_indexed {
            return Err(violation(index, format!("`{}` is indexed outside an event", param)));
        }
        match (&param.components, param.is_tuple()) {
            (None, true) => return Err(violation(index, format!("tuple `{}` has no components", param))),
            (Some(_), false) => {
                return Err(violation(index, format!("`{}` has components but is not a tuple", param)))
            }
            (Some(components), true) => check_parameters(index, components, false)?,
            (None, false) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Primitive, ValueShape};
    use serde_json::json;

    fn erc20() -> Value {
        json!([
            {
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [{ "name": "name", "type": "string" }, { "name": "symbol", "type": "string" }]
            },
            {
                "type": "function",
                "name": "transfer",
                "stateMutability": "nonpayable",
                "inputs": [
                    { "name": "to", "type": "address", "internalType": "address" },
                    { "name": "amount", "type": "uint256", "internalType": "uint256" }
                ],
                "outputs": [{ "name": "", "type": "bool" }]
            },
            {
                "type": "event",
                "name": "Transfer",
                "anonymous": false,
                "inputs": [
                    { "name": "from", "type": "address", "indexed": true },
                    { "name": "to", "type": "address", "indexed": true },
                    { "name": "value", "type": "uint256", "indexed": false }
                ]
            },
            { "type": "error", "name": "InsufficientBalance", "inputs": [{ "name": "needed", "type": "uint256" }] },
            { "type": "receive", "stateMutability": "payable" }
        ])
    }

    #[test]
    fn test_ingest_structured_abi() {
        let descriptor = Descriptor::from_json_value(erc20()).unwrap();
        assert_eq!(descriptor.len(), 5);

        let transfer = descriptor.function("transfer").unwrap().single().unwrap();
        assert_eq!(transfer.inputs[1].internal_type.as_deref(), Some("uint256"));
        assert_eq!(transfer.outputs.len(), 1);

        let event = descriptor.event("Transfer").unwrap();
        assert!(event.inputs[0].indexed && event.inputs[1].indexed && !event.inputs[2].indexed);

        assert_eq!(descriptor.constructor().unwrap().inputs.len(), 2);
        assert!(descriptor.receive().is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let descriptor = Descriptor::from_json_value(erc20()).unwrap();
        let json = descriptor.to_json_string().unwrap();
        assert_eq!(Descriptor::from_json_str(&json).unwrap(), descriptor);
    }

    #[test]
    fn test_missing_type_defaults_to_function() {
        let descriptor = Descriptor::from_json_value(json!([
            { "name": "owner", "inputs": [], "outputs": [{ "name": "", "type": "address" }], "constant": true }
        ]))
        .unwrap();
        let owner = descriptor.function("owner").unwrap().single().unwrap();
        assert_eq!(owner.state_mutability, StateMutability::View);
    }

    #[test]
    fn test_legacy_payable() {
        let descriptor = Descriptor::from_json_value(json!([
            { "type": "function", "name": "deposit", "inputs": [], "outputs": [], "payable": true }
        ]))
        .unwrap();
        assert_eq!(
            descriptor.function("deposit").unwrap().single().unwrap().state_mutability,
            StateMutability::Payable
        );
    }

    #[test]
    fn test_nested_tuple_components() {
        let descriptor = Descriptor::from_json_value(json!([{
            "type": "function",
            "name": "f",
            "stateMutability": "pure",
            "inputs": [{
                "name": "s",
                "type": "tuple",
                "components": [
                    { "name": "a", "type": "uint256" },
                    { "name": "c", "type": "tuple[]", "components": [
                        { "name": "x", "type": "uint256" },
                        { "name": "y", "type": "tuple", "components": [{ "name": "a", "type": "string" }] }
                    ]}
                ]
            }],
            "outputs": []
        }]))
        .unwrap();

        let f = descriptor.function("f").unwrap().single().unwrap();
        let shape = f.inputs[0].shape().unwrap();
        let y = shape.field("c").unwrap().element().unwrap().field("y").unwrap();
        assert_eq!(y.field("a"), Some(&ValueShape::Primitive(Primitive::String)));
        assert_eq!(f.signature(), "f((uint256,(uint256,(string))[]))");
    }

    #[test]
    fn test_schema_violations() {
        let cases = [
            json!({ "type": "function" }),
            json!([{ "type": "function", "inputs": [] }]),
            json!([{ "type": "banana", "name": "x" }]),
            json!([{ "type": "function", "name": "f", "inputs": [{ "name": "t", "type": "tuple" }] }]),
            json!([{ "type": "function", "name": "f", "inputs": [{ "name": "t", "type": "uint", "components": [] }] }]),
            json!([{ "type": "function", "name": "f", "inputs": [{ "name": "a", "type": "address", "indexed": true }] }]),
            json!([{ "type": "function", "name": "f", "stateMutability": "constant" }]),
            json!([{ "type": "constructor", "stateMutability": "view" }]),
            json!([{ "type": "receive", "stateMutability": "nonpayable" }]),
            json!([{ "type": "constructor" }, { "type": "constructor" }]),
            json!(["function f()"]),
            json!([{ "type": "function", "name": "f", "inputs": "nope" }]),
        ];
        for case in cases {
            let result = Descriptor::from_json_value(case.clone());
            assert!(
                matches!(result, Err(AbiError::SchemaViolation { .. })),
                "{} should violate the schema, got {:?}",
                case,
                result
            );
        }
    }

    #[test]
    fn test_invalid_json_text() {
        assert!(matches!(Descriptor::from_json_str("[{"), Err(AbiError::Json(_))));
    }
}
