use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;

/// Interning table for `Symbol`. Single logical evaluation thread per
/// spec.md §5, so a plain `RefCell`/`Cell` pair (matching the rest of this
/// crate's `Rc`/`RefCell` idiom) is enough — no cross-thread
/// synchronization primitives are needed.
struct SymbolTable {
    ids: RefCell<HashMap<String, Symbol>>,
    next_id: Cell<u64>,
}

thread_local! {
    static TABLE: SymbolTable = SymbolTable {
        ids: RefCell::new(HashMap::new()),
        next_id: Cell::new(0),
    };
}

/// An interned, immutable name-valued atom. Two symbols with the same
/// name are the same object and share a stable numeric id assigned at
/// first interning.
#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    name: std::rc::Rc<str>,
}

impl Symbol {
    /// Interns `name`, returning the existing symbol if one was already
    /// interned, or assigning the next monotonic id otherwise.
    pub fn intern(name: &str) -> Symbol {
        TABLE.with(|table| {
            let mut ids = table.ids.borrow_mut();
            if let Some(existing) = ids.get(name) {
                return existing.clone();
            }
            let id = table.next_id.get();
            table.next_id.set(id + 1);
            let symbol = Symbol {
                id,
                name: std::rc::Rc::from(name),
            };
            ids.insert(name.to_string(), symbol.clone());
            symbol
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_names_are_the_same_object() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn distinct_names_get_distinct_ids() {
        let a = Symbol::intern("alpha_distinct");
        let b = Symbol::intern("beta_distinct");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn ids_are_assigned_monotonically_for_fresh_names() {
        let a = Symbol::intern("mono_one");
        let b = Symbol::intern("mono_two");
        assert!(b.id() > a.id());
    }
}
