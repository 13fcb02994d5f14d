use tracing::{debug, warn};

use crate::config::{MutabilityMode, ParserConfig};
use crate::descriptor::Descriptor;
use crate::error::{AbiError, Result};
use crate::text::{split, tokens, trim};
use crate::types::*;

const RESERVED_NAMES: [&str; 3] = ["constructor", "error", "event"];

/// A declaration split into its kind, bare name and everything from the
/// first `(` onwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    pub kind: EntryKind,
    pub name: &'a str,
    pub remainder: &'a str,
}

/// A declaration the parser skipped, with its position in the input batch.
#[derive(Debug)]
pub struct RejectedDeclaration {
    pub index: usize,
    pub source: String,
    pub error: AbiError,
}

#[derive(Debug)]
pub struct ParseReport {
    pub descriptor: Descriptor,
    pub rejected: Vec<RejectedDeclaration>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Parser for human-readable ABI declarations such as
/// `function balanceOf(address owner) view returns (uint balance)`.
#[derive(Debug, Clone, Default)]
pub struct SignatureParser {
    config: ParserConfig,
}

impl SignatureParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a batch of declarations.
    ///
    /// A malformed declaration is recorded in [`ParseReport::rejected`] and
    /// does not stop the remaining declarations from being parsed.
    pub fn parse<I, S>(&self, declarations: I) -> ParseReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        let mut rejected = Vec::new();

        for (index, declaration) in declarations.into_iter().enumerate() {
            let declaration = declaration.as_ref();
            match self.parse_declaration(declaration) {
                Ok(entry) => {
                    debug!("Parsed {} `{}`", entry.kind(), entry.name().unwrap_or_default());
                    entries.push(entry);
                }
                Err(error) => {
                    warn!("Skipping declaration {}: {}", index, error);
                    rejected.push(RejectedDeclaration {
                        index,
                        source: declaration.to_string(),
                        error,
                    });
                }
            }
        }

        ParseReport {
            descriptor: Descriptor::new(entries),
            rejected,
        }
    }

    pub fn parse_declaration(&self, declaration: &str) -> Result<Entry> {
        let declaration = trim(declaration);
        let classified = classify(declaration)?;
        let (inputs, tail) = split_parameter_list(classified.remainder, declaration)?;
        let inputs = parse_parameters(inputs)?;

        let entry = match classified.kind {
            EntryKind::Function => {
                let outputs = match extract_output_list(tail, declaration)? {
                    Some(list) => parse_parameters(list)?,
                    None => Vec::new(),
                };
                Entry::Function(Function {
                    name: classified.name.to_string(),
                    inputs,
                    outputs,
                    state_mutability: resolve_mutability(tail, self.config.mutability)?,
                })
            }
            EntryKind::Event => {
                reject_mutability(EntryKind::Event, tail)?;
                Entry::Event(Event {
                    name: classified.name.to_string(),
                    inputs,
                    anonymous: tokens(tail).contains(&"anonymous"),
                })
            }
            EntryKind::Error => {
                reject_mutability(EntryKind::Error, tail)?;
                Entry::Error(CustomError {
                    name: classified.name.to_string(),
                    inputs,
                })
            }
            EntryKind::Constructor => Entry::Constructor(Constructor {
                inputs,
                state_mutability: constructor_mutability(tail, self.config.mutability)?,
            }),
            EntryKind::Fallback | EntryKind::Receive => {
                return Err(AbiError::UnrecognizedDeclaration(declaration.to_string()))
            }
        };

        reject_misplaced_indexed(&entry)?;
        Ok(entry)
    }
}

/// Determines the kind and bare name of a declaration.
pub fn classify(declaration: &str) -> Result<Classified<'_>> {
    let unrecognized = || AbiError::UnrecognizedDeclaration(declaration.to_string());
    let open = declaration.find('(').ok_or_else(unrecognized)?;
    let (head, remainder) = declaration.split_at(open);

    let (kind, name) = if let Some(rest) = head.strip_prefix("function ") {
        (EntryKind::Function, trim(rest))
    } else if declaration.starts_with("constructor(") {
        (EntryKind::Constructor, "")
    } else if let Some(rest) = head.strip_prefix("error ") {
        (EntryKind::Error, trim(rest))
    } else if let Some(rest) = head.strip_prefix("event ") {
        (EntryKind::Event, trim(rest))
    } else {
        let name = trim(head);
        if RESERVED_NAMES.contains(&name) {
            return Err(unrecognized());
        }
        (EntryKind::Function, name)
    };

    if kind != EntryKind::Constructor && !is_identifier(name) {
        return Err(unrecognized());
    }

    Ok(Classified {
        kind,
        name,
        remainder,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Splits `(params) tail` into the parameter list and the tail.
fn split_parameter_list<'a>(remainder: &'a str, declaration: &str) -> Result<(&'a str, &'a str)> {
    let close = remainder
        .find(')')
        .ok_or_else(|| AbiError::UnrecognizedDeclaration(declaration.to_string()))?;
    let list = &remainder[1..close];
    if list.contains('(') {
        return Err(AbiError::InlineTupleUnsupported(list.to_string()));
    }
    Ok((list, &remainder[close + 1..]))
}

/// The output list is the first parenthesised group after the inputs, which
/// covers both `returns (T)` and the `name(args)(T)` shorthand.
fn extract_output_list<'a>(tail: &'a str, declaration: &str) -> Result<Option<&'a str>> {
    match tail.find('(') {
        Some(open) => split_parameter_list(&tail[open..], declaration).map(|(list, _)| Some(list)),
        None => Ok(None),
    }
}

pub fn parse_parameters(list: &str) -> Result<Vec<Parameter>> {
    if trim(list).is_empty() {
        return Ok(Vec::new());
    }
    split(list, ",")
        .into_iter()
        .map(|fragment| parse_parameter(trim(fragment)))
        .collect()
}

/// Parses `TYPE [MODIFIER] [NAME]`.
///
/// A lone trailing modifier is a modifier, not a name: `address indexed`
/// is an unnamed indexed address.
pub fn parse_parameter(fragment: &str) -> Result<Parameter> {
    let invalid = || AbiError::InvalidParameter(fragment.to_string());
    if fragment.contains('(') {
        return Err(AbiError::InlineTupleUnsupported(fragment.to_string()));
    }

    let parts = tokens(fragment);
    match parts.as_slice() {
        [ty] => Ok(Parameter::new(*ty, "")),
        [ty, last] => match Modifier::from_token(last) {
            Some(modifier) => Ok(with_modifier(Parameter::new(*ty, ""), modifier)),
            None => Ok(Parameter::new(*ty, *last)),
        },
        [ty, modifier, name] => match (Modifier::from_token(modifier), Modifier::from_token(name)) {
            (Some(modifier), None) => Ok(with_modifier(Parameter::new(*ty, *name), modifier)),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn with_modifier(param: Parameter, modifier: Modifier) -> Parameter {
    match modifier {
        Modifier::Indexed => param.indexed(),
        Modifier::Calldata | Modifier::Memory | Modifier::Storage => param,
    }
}

/// Resolves the mutability keyword in the text following a function's
/// input list, defaulting to `nonpayable`.
pub fn resolve_mutability(tail: &str, mode: MutabilityMode) -> Result<StateMutability> {
    let mut found: Vec<StateMutability> = Vec::new();
    for token in split(tail, " ") {
        if let Some(mutability) = StateMutability::from_token(token) {
            if !found.contains(&mutability) {
                found.push(mutability);
            }
        }
    }

    match (found.as_slice(), mode) {
        ([], _) => Ok(StateMutability::NonPayable),
        ([only], _) => Ok(*only),
        ([first, ..], MutabilityMode::Relaxed) => Ok(*first),
        (_, MutabilityMode::Strict) => Err(AbiError::AmbiguousMutability {
            clause: trim(tail).to_string(),
            found: found.iter().map(|m| m.as_str().to_string()).collect(),
        }),
    }
}

/// Constructors are either `payable` or `nonpayable`.
fn constructor_mutability(tail: &str, mode: MutabilityMode) -> Result<StateMutability> {
    match resolve_mutability(tail, mode)? {
        mutability @ (StateMutability::Payable | StateMutability::NonPayable) => Ok(mutability),
        mutability => Err(AbiError::InvalidMutability {
            kind: EntryKind::Constructor,
            mutability,
        }),
    }
}

fn reject_mutability(kind: EntryKind, tail: &str) -> Result<()> {
    match tokens(tail).into_iter().find_map(StateMutability::from_token) {
        Some(mutability) => Err(AbiError::InvalidMutability { kind, mutability }),
        None => Ok(()),
    }
}

/// Mutability of a whole function declaration, e.g.
/// `function foo(uint256[] memory x) external view returns (address)`.
pub fn extract_state_mutability(declaration: &str, mode: MutabilityMode) -> Result<StateMutability> {
    let close = declaration
        .find(')')
        .ok_or_else(|| AbiError::UnrecognizedDeclaration(declaration.to_string()))?;
    resolve_mutability(&declaration[close + 1..], mode)
}

fn reject_misplaced_indexed(entry: &Entry) -> Result<()> {
    let outputs: &[Parameter] = match entry {
        Entry::Event(_) => return Ok(()),
        Entry::Function(f) => &f.outputs,
        _ => &[],
    };
    match entry.inputs().iter().chain(outputs).find(|p| p.indexed) {
        Some(param) => Err(AbiError::IndexedOutsideEvent {
            kind: entry.kind(),
            parameter: param.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(declaration: &str) -> Entry {
        SignatureParser::new().parse_declaration(declaration).unwrap()
    }

    #[test]
    fn test_classify_keywords() {
        let c = classify("function transferFrom(address from)").unwrap();
        assert_eq!((c.kind, c.name, c.remainder), (EntryKind::Function, "transferFrom", "(address from)"));

        let c = classify("event Transfer(address indexed from)").unwrap();
        assert_eq!((c.kind, c.name), (EntryKind::Event, "Transfer"));

        let c = classify("error InsufficientBalance(uint balance)").unwrap();
        assert_eq!((c.kind, c.name), (EntryKind::Error, "InsufficientBalance"));

        let c = classify("constructor(string symbol, string name)").unwrap();
        assert_eq!((c.kind, c.name), (EntryKind::Constructor, ""));
    }

    #[test]
    fn test_classify_bare_function() {
        let c = classify("bar(uint256[] memory x)(address)").unwrap();
        assert_eq!((c.kind, c.name), (EntryKind::Function, "bar"));
        assert_eq!(classify("function    foo   (uint256 x)").unwrap().name, "foo");
    }

    #[test]
    fn test_classify_rejects() {
        assert!(matches!(classify("function foo"), Err(AbiError::UnrecognizedDeclaration(_))));
        assert!(matches!(classify("event(uint a)"), Err(AbiError::UnrecognizedDeclaration(_))));
        assert!(matches!(classify("constructor (uint a)"), Err(AbiError::UnrecognizedDeclaration(_))));
        assert!(matches!(classify("error (uint a)"), Err(AbiError::UnrecognizedDeclaration(_))));
        assert!(matches!(classify("(uint a)"), Err(AbiError::UnrecognizedDeclaration(_))));
        assert!(classify("eventually(uint a)").is_ok());
    }

    #[test]
    fn test_parse_parameter() {
        assert_eq!(parse_parameter("address memory addr").unwrap(), Parameter::new("address", "addr"));
        assert_eq!(
            parse_parameter("address indexed addr").unwrap(),
            Parameter::new("address", "addr").indexed()
        );
        assert_eq!(parse_parameter("address addr").unwrap(), Parameter::new("address", "addr"));
        assert_eq!(parse_parameter("address   indexed").unwrap(), Parameter::new("address", "").indexed());
        assert_eq!(parse_parameter("address     memory").unwrap(), Parameter::new("address", ""));
        assert_eq!(parse_parameter("address").unwrap(), Parameter::new("address", ""));
        assert_eq!(parse_parameter("bytes calldata data").unwrap(), Parameter::new("bytes", "data"));
    }

    #[test]
    fn test_parse_parameter_rejects() {
        assert!(matches!(parse_parameter(""), Err(AbiError::InvalidParameter(_))));
        assert!(matches!(parse_parameter("uint a b"), Err(AbiError::InvalidParameter(_))));
        assert!(matches!(parse_parameter("uint memory indexed"), Err(AbiError::InvalidParameter(_))));
        assert!(matches!(parse_parameter("uint memory a b"), Err(AbiError::InvalidParameter(_))));
        assert!(matches!(
            parse_parameter("(uint a, uint b) pair"),
            Err(AbiError::InlineTupleUnsupported(_))
        ));
    }

    #[test]
    fn test_extract_state_mutability() {
        let strict = MutabilityMode::Strict;
        assert_eq!(extract_state_mutability("function foo()", strict).unwrap(), StateMutability::NonPayable);
        assert_eq!(
            extract_state_mutability(
                "function    foo   (uint256[]     memory x) external view returns (address)",
                strict
            )
            .unwrap(),
            StateMutability::View
        );
        assert_eq!(
            extract_state_mutability("function foo() external payable", strict).unwrap(),
            StateMutability::Payable
        );
    }

    #[test]
    fn test_mutability_ambiguity() {
        let tail = " external view payable";
        assert!(matches!(
            resolve_mutability(tail, MutabilityMode::Strict),
            Err(AbiError::AmbiguousMutability { .. })
        ));
        assert_eq!(resolve_mutability(tail, MutabilityMode::Relaxed).unwrap(), StateMutability::View);
        assert_eq!(
            resolve_mutability(" view view", MutabilityMode::Strict).unwrap(),
            StateMutability::View
        );
    }

    #[test]
    fn test_parse_function_with_returns() {
        let entry = parse("function balanceOf(address owner) view returns (uint balance)");
        assert_eq!(
            entry,
            Entry::Function(Function {
                name: "balanceOf".to_string(),
                inputs: vec![Parameter::new("address", "owner")],
                outputs: vec![Parameter::new("uint", "balance")],
                state_mutability: StateMutability::View,
            })
        );
    }

    #[test]
    fn test_parse_shorthand_outputs() {
        let function = match parse("foo(address[] memory, bytes memory)(bytes memory)") {
            Entry::Function(f) => f,
            other => panic!("expected function, got {:?}", other),
        };
        assert_eq!(function.inputs, vec![Parameter::new("address[]", ""), Parameter::new("bytes", "")]);
        assert_eq!(function.outputs, vec![Parameter::new("bytes", "")]);
        assert_eq!(function.state_mutability, StateMutability::NonPayable);

        let function = parse("bar()()");
        assert!(function.inputs().is_empty());
        assert!(function.as_function().unwrap().outputs.is_empty());
    }

    #[test]
    fn test_parse_event() {
        let entry = parse("event Transfer(address indexed from, address indexed to, address value)");
        let event = entry.as_event().unwrap();
        assert_eq!(event.name, "Transfer");
        assert_eq!(event.inputs.len(), 3);
        assert!(event.inputs[0].indexed);
        assert!(event.inputs[1].indexed);
        assert!(!event.inputs[2].indexed);
        assert!(!event.anonymous);

        assert!(parse("event Ping(uint256 id) anonymous").as_event().unwrap().anonymous);
    }

    #[test]
    fn test_parse_constructor() {
        let entry = parse("constructor(string symbol, string name)");
        assert_eq!(entry.kind(), EntryKind::Constructor);
        assert_eq!(entry.name(), None);
        assert_eq!(entry.inputs().len(), 2);
    }

    #[test]
    fn test_constructor_mutability() {
        match parse("constructor(uint a) payable") {
            Entry::Constructor(ctor) => assert_eq!(ctor.state_mutability, StateMutability::Payable),
            other => panic!("expected constructor, got {:?}", other),
        }

        let parser = SignatureParser::new();
        for (declaration, rejected) in [
            ("constructor(uint a) view", StateMutability::View),
            ("constructor() pure", StateMutability::Pure),
        ] {
            assert!(matches!(
                parser.parse_declaration(declaration),
                Err(AbiError::InvalidMutability { kind: EntryKind::Constructor, mutability }) if mutability == rejected
            ));
        }
    }

    #[test]
    fn test_mutability_after_event_or_error_rejected() {
        let parser = SignatureParser::new();
        assert!(matches!(
            parser.parse_declaration("event E(uint a) view"),
            Err(AbiError::InvalidMutability {
                kind: EntryKind::Event,
                mutability: StateMutability::View
            })
        ));
        assert!(matches!(
            parser.parse_declaration("error Oops() payable"),
            Err(AbiError::InvalidMutability {
                kind: EntryKind::Error,
                mutability: StateMutability::Payable
            })
        ));
        assert!(parser.parse_declaration("event E(uint a) anonymous").is_ok());
    }

    #[test]
    fn test_indexed_outside_event_rejected() {
        let result = SignatureParser::new().parse_declaration("function f(address indexed a)");
        assert!(matches!(result, Err(AbiError::IndexedOutsideEvent { kind: EntryKind::Function, .. })));
    }

    #[test]
    fn test_batch_parse_is_best_effort() {
        let report = SignatureParser::new().parse([
            "function a()",
            "event(uint x)",
            "function b() view pure",
            "error Oops()",
        ]);
        assert_eq!(report.descriptor.len(), 2);
        let rejected: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
        assert_eq!(rejected, vec![1, 2]);
        assert!(matches!(report.rejected[1].error, AbiError::AmbiguousMutability { .. }));

        let relaxed = SignatureParser::with_config(ParserConfig::relaxed())
            .parse(["function b() view pure"]);
        assert!(relaxed.is_clean());
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        fn type_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("address".to_string()),
                Just("bool".to_string()),
                Just("string".to_string()),
                Just("bytes32".to_string()),
                Just("uint256[]".to_string()),
                Just("int8[3][]".to_string()),
            ]
        }

        fn name_strategy() -> impl Strategy<Value = String> {
            "[a-z][a-zA-Z0-9_]{0,8}".prop_filter("reserved word", |s| {
                Modifier::from_token(s).is_none() && StateMutability::from_token(s).is_none()
            })
        }

        proptest! {
            /// Rendering a parsed event and parsing it again yields the same entry.
            #[test]
            fn event_round_trip(
                name in "[A-Z][a-zA-Z0-9]{0,8}",
                params in prop::collection::vec((type_strategy(), name_strategy(), any::<bool>()), 0..5),
            ) {
                let fragments: Vec<String> = params
                    .iter()
                    .map(|(ty, n, indexed)| {
                        if *indexed { format!("{}   indexed  {}", ty, n) } else { format!("{} {}", ty, n) }
                    })
                    .collect();
                let declaration = format!("event {}( {} )", name, fragments.join(" ,"));
                let parser = SignatureParser::new();
                let entry = parser.parse_declaration(&declaration).unwrap();
                let event = entry.as_event().unwrap();
                for (param, (ty, n, indexed)) in event.inputs.iter().zip(&params) {
                    prop_assert_eq!(&param.ty, ty);
                    prop_assert_eq!(&param.name, n);
                    prop_assert_eq!(param.indexed, *indexed);
                }
                let reparsed = parser.parse_declaration(&entry.to_string()).unwrap();
                prop_assert_eq!(reparsed, entry);
            }
        }
    }
}
