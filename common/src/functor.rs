use crate::error::EvalResult;
use crate::scope::Scope;
use crate::value::Value;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Seam between this crate's object model and whatever drives AST
/// evaluation. Lets `Functor`/native clauses stay generic over a
/// concrete evaluator rather than depending on the driver crate directly.
pub trait Dispatch {
    /// Invokes `functor`'s selected clause with `receiver` as `this`.
    /// Used by native clauses that need to call back into user code,
    /// e.g. `Map#each` invoking its block once per entry.
    fn invoke_functor(
        &mut self,
        functor: &Functor,
        receiver: Value,
        args: &[Value],
        block: Option<Value>,
    ) -> EvalResult<Value>;

    /// Performs full method dispatch for `name` on `receiver`. Used by
    /// native clauses that need the language-level
    /// operator rather than a specific Functor, e.g. List equality
    /// dispatching `==` on each pair of elements.
    fn call_method(
        &mut self,
        receiver: Value,
        name: &str,
        args: &[Value],
        block: Option<Value>,
    ) -> EvalResult<Value>;
}

/// An opaque native callable: `(receiver, positional_args, block) -> V`.
/// Takes the dispatcher too, so natives like `Map#each` can invoke a
/// supplied block.
pub type NativeFn =
    Rc<dyn Fn(&mut dyn Dispatch, Value, &[Value], Option<Value>) -> EvalResult<Value>>;

/// A user-defined clause: formal parameters (optionally including a
/// single splat at a known index, and an optional block parameter) plus
/// a body.
///
/// `body` is opaque to this crate — it is whatever AST representation
/// the driver crate uses, type-erased behind `Any`. The driver crate is
/// the only one that ever constructs a `UserClause` and the only one
/// that ever reads `body` back, so the downcast at the call site always
/// succeeds.
#[derive(Clone)]
pub struct UserClause {
    pub params: Vec<String>,
    pub splat_index: Option<usize>,
    pub block_param: Option<String>,
    pub body: Rc<dyn Any>,
}

impl UserClause {
    /// Number of required (non-splat) positional parameters.
    pub fn required_arity(&self) -> usize {
        match self.splat_index {
            Some(_) => self.params.len() - 1,
            None => self.params.len(),
        }
    }

    pub fn accepts(&self, arg_count: usize) -> bool {
        match self.splat_index {
            Some(_) => arg_count >= self.required_arity(),
            None => arg_count == self.params.len(),
        }
    }
}

/// One implementation body of a Functor. A Functor may carry several, in
/// definition order.
#[derive(Clone)]
pub enum Clause {
    User(UserClause),
    Native(NativeFn),
}

/// A named callable holding one or more clauses, unifying user-defined
/// methods and native built-ins. Carries its own lexical scope, closure
/// flag, and optional bound receiver, plus the per-object binding table
/// every non-primitive value carries.
pub struct Functor {
    pub name: String,
    clauses: RefCell<Vec<Clause>>,
    pub lexical_scope: Option<Scope>,
    pub closure: bool,
    closed_self: RefCell<Option<Value>>,
    pub ivars: Scope,
}

impl Functor {
    pub fn new(name: impl Into<String>, lexical_scope: Option<Scope>, closure: bool) -> Rc<Functor> {
        Rc::new(Functor {
            name: name.into(),
            clauses: RefCell::new(Vec::new()),
            lexical_scope,
            closure,
            closed_self: RefCell::new(None),
            ivars: Scope::detached(),
        })
    }

    pub fn with_closed_self(self: &Rc<Functor>, receiver: Value) -> Rc<Functor> {
        Rc::new(Functor {
            name: self.name.clone(),
            clauses: RefCell::new(self.clauses.borrow().clone()),
            lexical_scope: self.lexical_scope.clone(),
            closure: self.closure,
            closed_self: RefCell::new(Some(receiver)),
            ivars: Scope::detached(),
        })
    }

    pub fn closed_self(&self) -> Option<Value> {
        self.closed_self.borrow().clone()
    }

    /// Appends a clause to this Functor's clause list.
    pub fn add_clause(&self, clause: Clause) {
        self.clauses.borrow_mut().push(clause);
    }

    pub fn clauses(&self) -> Vec<Clause> {
        self.clauses.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_clause_without_splat_requires_exact_arity() {
        let clause = UserClause {
            params: vec!["a".into(), "b".into()],
            splat_index: None,
            block_param: None,
            body: Rc::new(()),
        };
        assert!(clause.accepts(2));
        assert!(!clause.accepts(1));
        assert!(!clause.accepts(3));
    }

    #[test]
    fn user_clause_with_splat_accepts_any_count_above_required() {
        let clause = UserClause {
            params: vec!["first".into(), "rest".into()],
            splat_index: Some(1),
            block_param: None,
            body: Rc::new(()),
        };
        assert!(clause.accepts(1));
        assert!(clause.accepts(5));
        assert!(!clause.accepts(0));
    }

    #[test]
    fn add_clause_appends_preserving_order() {
        let functor = Functor::new("greet", None, false);
        functor.add_clause(Clause::User(UserClause {
            params: vec![],
            splat_index: None,
            block_param: None,
            body: Rc::new(()),
        }));
        functor.add_clause(Clause::User(UserClause {
            params: vec!["x".into()],
            splat_index: None,
            block_param: None,
            body: Rc::new(()),
        }));
        assert_eq!(functor.clauses().len(), 2);
    }
}
