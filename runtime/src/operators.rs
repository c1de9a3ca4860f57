use enum_assoc::Assoc;

/// Unary operators the parser may attach to an expression. Each variant
/// is annotated with the method name dispatch resolves it to, via
/// `enum_assoc::Assoc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Assoc)]
#[func(pub const fn method_name(&self) -> &'static str)]
pub enum UnaryOperator {
    #[assoc(method_name = "not")]
    Not,
    #[assoc(method_name = "negate")]
    Negate,
}

/// Binary operators the parser may attach to an expression. Every
/// language-level comparison/arithmetic operator is just a method name
/// dispatched on the receiver, so this enum exists purely to let the AST
/// carry a compact tag that maps back to that name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Assoc)]
#[func(pub const fn method_name(&self) -> &'static str)]
pub enum BinaryOperator {
    #[assoc(method_name = "+")]
    Add,
    #[assoc(method_name = "-")]
    Sub,
    #[assoc(method_name = "*")]
    Mul,
    #[assoc(method_name = "/")]
    Div,
    #[assoc(method_name = "%")]
    Mod,

    #[assoc(method_name = "==")]
    Eq,
    #[assoc(method_name = "!=")]
    NotEq,
    #[assoc(method_name = ">")]
    GreaterThan,
    #[assoc(method_name = "<")]
    LessThan,
    #[assoc(method_name = ">=")]
    GreaterEqual,
    #[assoc(method_name = "<=")]
    LessEqual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_operators_map_to_dispatched_method_names() {
        assert_eq!(BinaryOperator::Add.method_name(), "+");
        assert_eq!(BinaryOperator::LessEqual.method_name(), "<=");
    }
}
