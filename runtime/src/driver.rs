use crate::ast::{BlockLiteral, Node};
use crate::dispatch;
use ember_common::{
    BuiltinType, Clause, Dispatch, EvalError, EvalResult, Functor, Instance, ListData, MapData,
    Module, Scope, Symbol, SymbolTable, Type, UserClause, Value,
};
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use strum::IntoEnumIterator;

/// A user-defined clause body: the AST nodes making up a method or block.
/// Stored behind `Rc<dyn Any>` in `ember_common::UserClause` — this is the
/// one place that downcasts it back, since this crate is the only one
/// that ever constructs a `UserClause`.
pub struct MethodBody(pub Vec<Node>);

pub(crate) fn method_body(body: &Rc<dyn Any>) -> &MethodBody {
    body.downcast_ref::<MethodBody>()
        .expect("ember_runtime is the only crate that constructs UserClause bodies")
}

/// Drives AST evaluation. Owns the scope stack, the current-`self`
/// stack, and the registry of built-in types the prelude wires native
/// clauses onto.
pub struct Interpreter {
    pub(crate) symbol_table: SymbolTable,
    pub(crate) builtins: HashMap<BuiltinType, Rc<Type>>,
    self_stack: Vec<Value>,
    /// Where a `MethodDef` node currently being evaluated registers its
    /// Functor: the kernel scope at top level, a type's instance scope
    /// inside a `TypeDecl` body, or a module's scope inside a
    /// `ModuleDecl` body.
    define_scope_stack: Vec<Scope>,
}

impl Interpreter {
    pub fn new() -> Self {
        let symbol_table = SymbolTable::new();
        let kernel = symbol_table.root().clone();
        let mut interpreter = Interpreter {
            symbol_table,
            builtins: HashMap::new(),
            self_stack: vec![Value::Nil],
            define_scope_stack: vec![kernel],
        };
        interpreter.install_builtin_types();
        crate::prelude::install(&mut interpreter);
        interpreter
    }

    fn install_builtin_types(&mut self) {
        for builtin in BuiltinType::iter() {
            let ty = Type::new(builtin.to_string());
            self.symbol_table
                .root()
                .define(&builtin.to_string(), Value::Type(ty.clone()));
            self.builtins.insert(builtin, ty);
        }
    }

    pub fn builtin_type(&self, builtin: BuiltinType) -> Rc<Type> {
        self.builtins
            .get(&builtin)
            .expect("install_builtin_types ran for every BuiltinType variant")
            .clone()
    }

    pub fn current_self(&self) -> Value {
        self.self_stack
            .last()
            .cloned()
            .expect("self_stack always has at least the top-level nil self")
    }

    pub(crate) fn push_self(&mut self, value: Value) {
        self.self_stack.push(value);
    }

    pub(crate) fn pop_self(&mut self) {
        self.self_stack.pop();
    }

    fn current_define_scope(&self) -> Scope {
        self.define_scope_stack
            .last()
            .expect("define_scope_stack always has the kernel scope")
            .clone()
    }

    /// Evaluates a complete program.
    pub fn run(&mut self, program: &Node) -> EvalResult<Value> {
        self.eval(program)
    }

    /// Evaluates a sequence of statements in a fresh block scope, nested
    /// inside `lexical_parent`, returning the last statement's value (or
    /// `Nil` for an empty body).
    pub(crate) fn eval_block(&mut self, body: &[Node], lexical_parent: &Scope) -> EvalResult<Value> {
        self.symbol_table.push_frame(Some(lexical_parent), true);
        let result = self.eval_statements(body);
        self.symbol_table.pop();
        result
    }

    fn eval_statements(&mut self, body: &[Node]) -> EvalResult<Value> {
        let mut last = Value::Nil;
        for node in body {
            last = self.eval(node)?;
        }
        Ok(last)
    }

    pub fn eval(&mut self, node: &Node) -> EvalResult<Value> {
        match node {
            Node::Program(statements) => self.eval_statements(statements),

            Node::IntegerLit(n) => Ok(Value::Integer(*n)),
            Node::FloatLit(x) => Ok(Value::Float(*x)),
            Node::BoolLit(b) => Ok(Value::Boolean(*b)),
            Node::StringLit(s) => Ok(Value::String(Rc::from(s.as_str()))),
            Node::SymbolLit(name) => Ok(Value::Symbol(Symbol::intern(name))),
            Node::NilLit => Ok(Value::Nil),

            Node::ListLit(elements) => {
                let values = elements
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::List(ListData::new(values)))
            }
            Node::MapLit(pairs) => {
                let mut evaluated = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    evaluated.push((self.eval(k)?, self.eval(v)?));
                }
                Ok(Value::Map(MapData::from_pairs(evaluated)))
            }

            Node::Identifier(name) => {
                if let Some(value) = self.symbol_table.current().read(name) {
                    return Ok(value);
                }
                // Not a local binding; try it as a zero-arg method call on
                // the current self before giving up.
                let receiver = self.current_self();
                dispatch::call_method(self, receiver, name, &[], None)
                    .map_err(|_| EvalError::unresolved_identifier(name))
            }

            Node::InstanceVarRef(name) => dispatch::read_ivar(&self.current_self(), name),
            Node::InstanceVarAssign { name, value } => {
                let value = self.eval(value)?;
                dispatch::write_ivar(&self.current_self(), name, value.clone())?;
                Ok(value)
            }
            Node::LocalAssign { name, value } => {
                let value = self.eval(value)?;
                self.symbol_table.current().assign(name, value.clone());
                Ok(value)
            }

            Node::UnaryOp { op, expr } => {
                let receiver = self.eval(expr)?;
                dispatch::call_method(self, receiver, op.method_name(), &[], None)
            }
            Node::BinaryOp { op, lhs, rhs } => {
                let receiver = self.eval(lhs)?;
                let arg = self.eval(rhs)?;
                dispatch::call_method(self, receiver, op.method_name(), &[arg], None)
            }

            Node::MethodCall {
                receiver,
                name,
                args,
                block,
            } => {
                let receiver_value = match receiver {
                    Some(expr) => self.eval(expr)?,
                    None => self.current_self(),
                };
                let arg_values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<EvalResult<Vec<_>>>()?;
                let block_value = match block {
                    Some(block_literal) => Some(Value::Functor(self.make_block_functor(block_literal))),
                    None => None,
                };
                dispatch::call_method(self, receiver_value, name, &arg_values, block_value)
            }

            Node::MethodDef {
                name,
                params,
                splat_index,
                block_param,
                body,
            } => {
                let scope = self.current_define_scope();
                let functor = match scope.read(name) {
                    Some(Value::Functor(existing)) => existing,
                    _ => Functor::new(name.clone(), None, false),
                };
                functor.add_clause(Clause::User(UserClause {
                    params: params.clone(),
                    splat_index: *splat_index,
                    block_param: block_param.clone(),
                    body: Rc::new(MethodBody(body.clone())),
                }));
                scope.define(name, Value::Functor(functor));
                Ok(Value::Nil)
            }

            Node::ModuleDecl { name, body } => {
                let module = match self.current_define_scope().read(name) {
                    Some(Value::Module(existing)) => existing,
                    _ => Module::new(name.clone()),
                };
                self.current_define_scope().define(name, Value::Module(module.clone()));
                self.define_scope_stack.push(module.scope.clone());
                self.push_self(Value::Module(module));
                let result = self.eval_statements(body);
                self.pop_self();
                self.define_scope_stack.pop();
                result
            }

            Node::TypeDecl {
                name,
                supertype,
                includes,
                extends,
                body,
            } => {
                let ty = match self.current_define_scope().read(name) {
                    Some(Value::Type(existing)) => existing,
                    _ => Type::new(name.clone()),
                };
                if let Some(supertype_name) = supertype {
                    if let Some(Value::Type(supertype)) = self.symbol_table.current().read(supertype_name)
                    {
                        ty.set_supertype(supertype);
                    }
                }
                for include_name in includes {
                    if let Some(Value::Module(module)) = self.symbol_table.current().read(include_name) {
                        ty.include(module);
                    }
                }
                for extend_name in extends {
                    if let Some(Value::Module(module)) = self.symbol_table.current().read(extend_name) {
                        ty.extend(module);
                    }
                }
                if ty.static_scope.read("new").is_none() {
                    register_new_method(&ty);
                }
                self.current_define_scope().define(name, Value::Type(ty.clone()));
                // Plain MethodDefs inside a type body define instance
                // methods — the type's instance scope is what every
                // instance inherits bindings from. Class-level (static)
                // methods have no distinct AST node beyond `new`, which
                // is wired directly onto `static_scope` above.
                self.define_scope_stack.push(ty.instance_scope.clone());
                self.push_self(Value::Type(ty));
                let result = self.eval_statements(body);
                self.pop_self();
                self.define_scope_stack.pop();
                result
            }

            Node::If {
                cond,
                then_branch,
                elifs,
                else_branch,
            } => {
                if self.eval(cond)?.truthy() {
                    let parent = self.symbol_table.current().clone();
                    return self.eval_block(then_branch, &parent);
                }
                for (elif_cond, elif_body) in elifs {
                    if self.eval(elif_cond)?.truthy() {
                        let parent = self.symbol_table.current().clone();
                        return self.eval_block(elif_body, &parent);
                    }
                }
                match else_branch {
                    Some(body) => {
                        let parent = self.symbol_table.current().clone();
                        self.eval_block(body, &parent)
                    }
                    None => Ok(Value::Nil),
                }
            }

            Node::While { cond, body } => {
                while self.eval(cond)?.truthy() {
                    let parent = self.symbol_table.current().clone();
                    self.eval_block(body, &parent)?;
                }
                Ok(Value::Nil)
            }

            Node::Block(body) => {
                let parent = self.symbol_table.current().clone();
                self.eval_block(body, &parent)
            }

            Node::Return(value) => match value {
                Some(expr) => self.eval(expr),
                None => Ok(Value::Nil),
            },
        }
    }

    /// Wraps a block literal into a closure-mode Functor capturing the
    /// scope it was created in.
    fn make_block_functor(&mut self, block_literal: &BlockLiteral) -> Rc<Functor> {
        let lexical_scope = self.symbol_table.current().clone();
        let functor = Functor::new("<block>", Some(lexical_scope), true);
        functor.add_clause(Clause::User(UserClause {
            params: block_literal.params.clone(),
            splat_index: block_literal.splat_index,
            block_param: None,
            body: Rc::new(MethodBody(block_literal.body.clone())),
        }));
        functor
    }
}

/// Installs a default `new` constructor on a user-declared type's static
/// scope, allocating a fresh `Instance` of the receiver type. Needed for
/// `TypeDecl`-created types to be instantiable at all.
fn register_new_method(ty: &Rc<Type>) {
    let functor = Functor::new("new", None, false);
    functor.add_clause(Clause::Native(Rc::new(|_dispatcher, receiver, _args, _block| {
        match receiver {
            Value::Type(t) => Ok(Value::Instance(Instance::new(t))),
            other => Err(EvalError::type_misuse(format!(
                "'new' called on non-Type receiver {}",
                other.type_name()
            ))),
        }
    })));
    ty.static_scope.define("new", Value::Functor(functor));
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatch for Interpreter {
    fn invoke_functor(
        &mut self,
        functor: &Functor,
        receiver: Value,
        args: &[Value],
        block: Option<Value>,
    ) -> EvalResult<Value> {
        dispatch::invoke(self, functor, receiver, args, block)
    }

    fn call_method(
        &mut self,
        receiver: Value,
        name: &str,
        args: &[Value],
        block: Option<Value>,
    ) -> EvalResult<Value> {
        dispatch::call_method(self, receiver, name, args, block)
    }
}
