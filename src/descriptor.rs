use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::error::{AbiError, Result};
use crate::human_readable::{ParseReport, SignatureParser};
use crate::shape::parameters_shape;
use crate::signature::{canonical_type, canonical_type_str};
use crate::types::*;

/// A normalised contract interface: entries in declaration order.
///
/// Functions may share a name (overloads). Events and errors are expected to
/// have unique names; duplicates are kept but reported by
/// [`Descriptor::duplicate_names`] and make name lookups fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Descriptor {
    entries: Vec<Entry>,
}

/// Result of a name lookup.
#[derive(Debug, Clone)]
pub enum Lookup<'a> {
    Entry(&'a Entry),
    Overloads(Overloads<'a>),
}

/// Every function sharing one name, in declaration order.
#[derive(Debug, Clone)]
pub struct Overloads<'a> {
    name: String,
    candidates: Vec<&'a Function>,
}

impl Descriptor {
    pub fn new(entries: Vec<Entry>) -> Self {
        let descriptor = Self { entries };
        for duplicate in descriptor.duplicate_names() {
            warn!("{}", duplicate);
        }
        descriptor
    }

    /// Parses human-readable declarations with the default configuration.
    pub fn from_human_readable<I, S>(declarations: I) -> ParseReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SignatureParser::new().parse(declarations)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.entries.iter().filter_map(Entry::as_function)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter().filter_map(Entry::as_event)
    }

    pub fn errors(&self) -> impl Iterator<Item = &CustomError> {
        self.entries.iter().filter_map(Entry::as_error)
    }

    /// One `DuplicateEventOrErrorName` per event or error name declared
    /// more than once.
    pub fn duplicate_names(&self) -> Vec<AbiError> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();

        for entry in &self.entries {
            let kind = entry.kind();
            if !matches!(kind, EntryKind::Event | EntryKind::Error) {
                continue;
            }
            let Some(name) = entry.name() else { continue };
            if !seen.insert((kind, name)) && reported.insert((kind, name)) {
                duplicates.push(AbiError::DuplicateEventOrErrorName {
                    kind,
                    name: name.to_string(),
                });
            }
        }
        duplicates
    }

    /// Distinct names of entries of `kind`, in declaration order.
    ///
    /// `mutability` restricts functions to the given state mutabilities and
    /// has no effect on other kinds.
    pub fn names_of(&self, kind: EntryKind, mutability: Option<&[StateMutability]>) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| entry.kind() == kind)
            .filter(|entry| match (entry, mutability) {
                (Entry::Function(f), Some(allowed)) => allowed.contains(&f.state_mutability),
                _ => true,
            })
            .filter_map(Entry::name)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn function_names(&self, mutability: Option<&[StateMutability]>) -> Vec<&str> {
        self.names_of(EntryKind::Function, mutability)
    }

    pub fn event_names(&self) -> Vec<&str> {
        self.names_of(EntryKind::Event, None)
    }

    pub fn error_names(&self) -> Vec<&str> {
        self.names_of(EntryKind::Error, None)
    }

    /// Looks an entry up by kind and name.
    ///
    /// Functions always come back as an overload set. Constructors, fallback
    /// and receive entries are nameless, so `name` is ignored for them.
    pub fn lookup(&self, kind: EntryKind, name: &str) -> Result<Lookup<'_>> {
        if kind == EntryKind::Function {
            return self.function(name).map(Lookup::Overloads);
        }
        self.unique_entry(kind, name).map(Lookup::Entry)
    }

    fn unique_entry(&self, kind: EntryKind, name: &str) -> Result<&Entry> {
        let mut matches = self
            .entries
            .iter()
            .filter(|entry| entry.kind() == kind)
            .filter(|entry| entry.name().map_or(true, |n| n == name));

        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry),
            (None, _) => Err(not_found(kind, name)),
            (Some(first), Some(_)) if first.name().is_none() => Err(AbiError::DuplicateEntry(kind)),
            (Some(_), Some(_)) => Err(AbiError::DuplicateEventOrErrorName {
                kind,
                name: name.to_string(),
            }),
        }
    }

    pub fn function(&self, name: &str) -> Result<Overloads<'_>> {
        let candidates: Vec<&Function> = self.functions().filter(|f| f.name == name).collect();
        if candidates.is_empty() {
            return Err(not_found(EntryKind::Function, name));
        }
        Ok(Overloads {
            name: name.to_string(),
            candidates,
        })
    }

    /// The overload of `name` whose inputs have exactly `input_types`.
    pub fn function_by_signature(&self, name: &str, input_types: &[&str]) -> Result<&Function> {
        self.function(name)?.by_input_types(input_types)
    }

    pub fn event(&self, name: &str) -> Result<&Event> {
        self.unique_entry(EntryKind::Event, name)?
            .as_event()
            .ok_or_else(|| not_found(EntryKind::Event, name))
    }

    pub fn error(&self, name: &str) -> Result<&CustomError> {
        self.unique_entry(EntryKind::Error, name)?
            .as_error()
            .ok_or_else(|| not_found(EntryKind::Error, name))
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Constructor(ctor) => Some(ctor),
            _ => None,
        })
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Fallback(fallback) => Some(fallback),
            _ => None,
        })
    }

    pub fn receive(&self) -> Option<&Receive> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Receive(receive) => Some(receive),
            _ => None,
        })
    }
}

fn not_found(kind: EntryKind, name: &str) -> AbiError {
    AbiError::EntryNotFound {
        kind,
        name: name.to_string(),
    }
}

impl<'a> IntoIterator for &'a Descriptor {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'a> Overloads<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn as_slice(&self) -> &[&'a Function] {
        &self.candidates
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Function> + '_ {
        self.candidates.iter().copied()
    }

    /// The only overload, or `AmbiguousOverload` when there are several.
    pub fn single(&self) -> Result<&'a Function> {
        self.unique(self.candidates.clone())
    }

    /// Narrows by input parameter types. `uint` and `uint256` compare equal.
    pub fn by_input_types(&self, input_types: &[&str]) -> Result<&'a Function> {
        let wanted: Vec<String> = input_types.iter().map(|ty| canonical_type_str(ty)).collect();
        let matching = self
            .candidates
            .iter()
            .copied()
            .filter(|f| f.inputs.len() == wanted.len())
            .filter(|f| f.inputs.iter().map(canonical_type).eq(wanted.iter().cloned()))
            .collect();
        self.unique(matching)
    }

    /// Narrows to the overloads whose input shapes accept `args`.
    pub fn matching_args(&self, args: &[serde_json::Value]) -> Result<&'a Function> {
        let matching = self
            .candidates
            .iter()
            .copied()
            .filter(|f| f.inputs.len() == args.len())
            .filter(|f| match parameters_shape(&f.inputs) {
                Ok(shapes) => shapes.iter().zip(args).all(|(shape, arg)| shape.bind(arg).is_ok()),
                Err(_) => false,
            })
            .collect();
        self.unique(matching)
    }

    fn unique(&self, mut matching: Vec<&'a Function>) -> Result<&'a Function> {
        match matching.len() {
            0 => Err(not_found(EntryKind::Function, &self.name)),
            1 => Ok(matching.remove(0)),
            count => Err(AbiError::AmbiguousOverload {
                name: self.name.clone(),
                count,
            }),
        }
    }
}
