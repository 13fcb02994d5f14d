//! Canonical signatures, function selectors and event topics.

use sha3::{Digest, Keccak256};

use crate::text::{split, trim};
use crate::types::{CustomError, Event, Function, Parameter};

pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

/// First four bytes of the Keccak-256 hash of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature);
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn to_hex_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Canonical type of a parameter as used in signatures: `uint`/`int` widen
/// to 256 bits and tuples expand to their component list.
pub fn canonical_type(param: &Parameter) -> String {
    let (root, suffixes) = split_root(&param.ty);
    match (root, &param.components) {
        ("tuple", Some(components)) => format!("({}){}", canonical_list(components), suffixes),
        _ => format!("{}{}", canonical_root(root), suffixes),
    }
}

/// Canonicalises a bare type string such as `uint[]` or `(uint,bool)[2]`.
pub fn canonical_type_str(ty: &str) -> String {
    let ty = trim(ty);
    if let Some(inner) = ty.strip_prefix('(') {
        if let Some(close) = matching_paren(inner) {
            let components: Vec<String> = split_top_level(&inner[..close])
                .into_iter()
                .map(canonical_type_str)
                .collect();
            return format!("({}){}", components.join(","), trim(&inner[close + 1..]));
        }
    }
    let (root, suffixes) = split_root(ty);
    format!("{}{}", canonical_root(trim(root)), suffixes)
}

fn canonical_list(params: &[Parameter]) -> String {
    params.iter().map(canonical_type).collect::<Vec<_>>().join(",")
}

fn split_root(ty: &str) -> (&str, &str) {
    match ty.find('[') {
        Some(i) => ty.split_at(i),
        None => (ty, ""),
    }
}

fn canonical_root(root: &str) -> &str {
    match root {
        "uint" => "uint256",
        "int" => "int256",
        other => other,
    }
}

/// Byte offset of the `)` closing a group whose `(` was just consumed.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn split_top_level(list: &str) -> Vec<&str> {
    if trim(list).is_empty() {
        return Vec::new();
    }
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&list[start..]);
    pieces
}

impl Function {
    /// `name(type1,type2)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, canonical_list(&self.inputs))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }

    /// Signature including outputs, e.g. `balanceOf(address)(uint256)`.
    pub fn full_signature(&self) -> String {
        format!("{}({})", self.signature(), canonical_list(&self.outputs))
    }
}

impl Event {
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, canonical_list(&self.inputs))
    }

    /// The topic-0 hash; anonymous events do not emit it.
    pub fn topic(&self) -> Option<[u8; 32]> {
        (!self.anonymous).then(|| keccak256(self.signature()))
    }
}

impl CustomError {
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, canonical_list(&self.inputs))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }
}

/// Splits a canonical signature's argument list, e.g. for
/// `transfer(address,uint256)` returns `["address", "uint256"]`.
pub fn signature_types(signature: &str) -> Vec<&str> {
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let inner = &signature[open + 1..];
    let close = matching_paren(inner).unwrap_or(inner.len());
    let list = &inner[..close];
    if list.contains('(') {
        split_top_level(list)
    } else if list.is_empty() {
        Vec::new()
    } else {
        split(list, ",")
    }
}
