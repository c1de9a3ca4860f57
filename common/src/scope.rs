use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single lexically-nested binding table: an ordered mapping from
/// identifier strings to values with an optional parent pointer. Cheap
/// to clone — it is a handle onto shared, mutable storage, passed around
/// by handle rather than by value.
#[derive(Clone)]
pub struct Scope(Rc<ScopeInner>);

struct ScopeInner {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Scope>,
}

impl Scope {
    /// A scope with no parent — used for the kernel/root scope and for
    /// fresh call frames that do not capture a lexical environment.
    pub fn detached() -> Scope {
        Scope(Rc::new(ScopeInner {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// A scope whose parent is `parent` — used for closure-capturing
    /// frames and for nested lexical blocks.
    pub fn child_of(parent: &Scope) -> Scope {
        Scope(Rc::new(ScopeInner {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0.parent.clone()
    }

    /// Binds `name` in this exact scope, overwriting any existing
    /// binding of the same name in this scope only.
    pub fn define(&self, name: &str, value: Value) {
        self.0.bindings.borrow_mut().insert(name.to_string(), value);
    }

    /// Reads a name, searching this scope then parents outward. Returns
    /// `None` if no scope in the chain binds it (the caller turns that
    /// into an unresolved-identifier error by the caller).
    pub fn read(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.0.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.0.parent.as_ref().and_then(|p| p.read(name))
    }

    pub fn contains_locally(&self, name: &str) -> bool {
        self.0.bindings.borrow().contains_key(name)
    }

    /// Assigns `name`, mutating the nearest enclosing scope that already
    /// binds it, or defining it in this scope if none does: "walk then
    /// define at top-of-stack if missing", where `self` plays the role of
    /// the top-of-stack scope.
    pub fn assign(&self, name: &str, value: Value) {
        if self.contains_locally(name) {
            self.define(name, value);
            return;
        }
        let mut cursor = self.0.parent.clone();
        while let Some(scope) = cursor {
            if scope.contains_locally(name) {
                scope.define(name, value);
                return;
            }
            cursor = scope.0.parent.clone();
        }
        self.define(name, value);
    }

    pub fn same_scope(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A stack of scopes, with at least one root scope present at all times.
/// Call frames, block bodies, and other lexical units push/pop against
/// this stack; lookups on the current top walk its own parent chain,
/// which `push_closure`/`push_frame` wire up appropriately.
pub struct SymbolTable {
    frames: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            frames: vec![Scope::detached()],
        }
    }

    pub fn root(&self) -> &Scope {
        self.frames.first().expect("symbol table always has a root scope")
    }

    pub fn current(&self) -> &Scope {
        self.frames.last().expect("symbol table always has a root scope")
    }

    /// Pushes a lexical block scope nested inside the current top.
    pub fn push_block(&mut self) {
        let child = Scope::child_of(self.current());
        self.frames.push(child);
    }

    /// Pushes a call frame whose parent is `lexical_scope` when `closure`
    /// is true, or a fresh parentless scope otherwise (a Functor's
    /// frame-creation rule).
    pub fn push_frame(&mut self, lexical_scope: Option<&Scope>, closure: bool) {
        let frame = match (closure, lexical_scope) {
            (true, Some(parent)) => Scope::child_of(parent),
            _ => Scope::detached(),
        };
        self.frames.push(frame);
    }

    /// Pops the current top scope. The root scope is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn assign_mutates_nearest_enclosing_binding() {
        let mut table = SymbolTable::new();
        table.current().define("x", Value::Integer(1));
        table.push_block();
        table.current().assign("x", Value::Integer(2));
        // mutated the outer binding, not a fresh inner one
        assert!(!table.current().contains_locally("x"));
        table.pop();
        assert_eq!(table.current().read("x"), Some(Value::Integer(2)));
    }

    #[test]
    fn assign_to_new_name_binds_in_innermost_scope() {
        let mut table = SymbolTable::new();
        table.push_block();
        table.current().assign("y", Value::Integer(7));
        assert!(table.current().contains_locally("y"));
    }

    #[test]
    fn read_misses_report_none() {
        let table = SymbolTable::new();
        assert_eq!(table.current().read("nope"), None);
    }

    #[test]
    fn closure_frame_parent_is_captured_scope_not_call_stack_top() {
        let mut table = SymbolTable::new();
        table.current().define("captured", Value::Integer(42));
        let captured_scope = table.current().clone();

        table.push_block();
        table.current().define("shadow_only_here", Value::Integer(0));

        // Invoking a closure whose lexical_scope is the root, bypassing
        // the literal call-stack top (which has `shadow_only_here`).
        table.push_frame(Some(&captured_scope), true);
        assert_eq!(table.current().read("captured"), Some(Value::Integer(42)));
        assert_eq!(table.current().read("shadow_only_here"), None);
    }

    #[test]
    fn non_closure_frame_has_no_parent() {
        let mut table = SymbolTable::new();
        table.current().define("outer", Value::Integer(1));
        table.push_frame(None, false);
        assert_eq!(table.current().read("outer"), None);
    }
}
