/// How the parser treats a declaration carrying more than one distinct
/// mutability keyword (`function f() view payable`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutabilityMode {
    /// Reject the declaration with `AmbiguousMutability`.
    #[default]
    Strict,
    /// Take the first keyword in token order.
    Relaxed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    pub mutability: MutabilityMode,
}

impl ParserConfig {
    pub fn relaxed() -> Self {
        Self {
            mutability: MutabilityMode::Relaxed,
        }
    }
}
