use crate::operators::{BinaryOperator, UnaryOperator};

/// A block literal attached to a method call. Shares its parameter shape
/// with a method definition but has no name of its own.
#[derive(Debug, Clone)]
pub struct BlockLiteral {
    pub params: Vec<String>,
    pub splat_index: Option<usize>,
    pub body: Vec<Node>,
}

/// The AST node variants consumed from the parser. This crate only
/// defines the shape of the tree — producing one is the parser's job,
/// out of scope here. Plain data; the driver is the one that gives it
/// behavior by visiting it.
#[derive(Debug, Clone)]
pub enum Node {
    Program(Vec<Node>),

    IntegerLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    SymbolLit(String),
    NilLit,
    ListLit(Vec<Node>),
    MapLit(Vec<(Node, Node)>),

    /// A bare name reference; the driver decides whether to resolve it
    /// as a local variable or as a zero-argument method call on the
    /// current `self`.
    Identifier(String),

    InstanceVarRef(String),
    InstanceVarAssign {
        name: String,
        value: Box<Node>,
    },
    LocalAssign {
        name: String,
        value: Box<Node>,
    },

    UnaryOp {
        op: UnaryOperator,
        expr: Box<Node>,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },

    MethodCall {
        receiver: Option<Box<Node>>,
        name: String,
        args: Vec<Node>,
        block: Option<Box<BlockLiteral>>,
    },

    MethodDef {
        name: String,
        params: Vec<String>,
        splat_index: Option<usize>,
        block_param: Option<String>,
        body: Vec<Node>,
    },

    ModuleDecl {
        name: String,
        body: Vec<Node>,
    },
    TypeDecl {
        name: String,
        supertype: Option<String>,
        includes: Vec<String>,
        extends: Vec<String>,
        body: Vec<Node>,
    },

    If {
        cond: Box<Node>,
        then_branch: Vec<Node>,
        elifs: Vec<(Node, Vec<Node>)>,
        else_branch: Option<Vec<Node>>,
    },
    While {
        cond: Box<Node>,
        body: Vec<Node>,
    },
    Block(Vec<Node>),
    Return(Option<Box<Node>>),
}
