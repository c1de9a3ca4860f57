use crate::container::{Instance, Module, Type};
use crate::functor::Functor;
use crate::scope::Scope;
use crate::symbol::Symbol;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use strum_macros::{Display as StrumDisplay, EnumIter};

/// A tagged union of primitive and heap values. Primitive variants are
/// inline; heap variants share reference semantics through `Rc` rather
/// than being copied by value.
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(Rc<str>),
    Nil,
    Symbol(Symbol),
    List(Rc<ListData>),
    Map(Rc<MapData>),
    Instance(Rc<Instance>),
    Module(Rc<Module>),
    Type(Rc<Type>),
    Functor(Rc<Functor>),
}

/// Enumerates the eleven built-in classes the prelude wires native
/// clauses onto. `EnumIter` lets prelude setup loop over every variant
/// instead of hand-listing it twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter)]
pub enum BuiltinType {
    Integer,
    Float,
    Boolean,
    String,
    Nil,
    Symbol,
    List,
    Map,
    Functor,
    Module,
    Type,
}

impl Value {
    /// Every value reports a type_name string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Boolean(_) => "Boolean",
            Value::String(_) => "String",
            Value::Nil => "Nil",
            Value::Symbol(_) => "Symbol",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Instance(instance) => {
                // Leaked once per distinct type name; acceptable for a
                // tree-walking interpreter whose types live for the
                // program's duration.
                Box::leak(instance.ty.name.clone().into_boxed_str())
            }
            Value::Module(_) => "Module",
            Value::Type(_) => "Type",
            Value::Functor(_) => "Functor",
        }
    }

    pub fn builtin_type(&self) -> Option<BuiltinType> {
        Some(match self {
            Value::Integer(_) => BuiltinType::Integer,
            Value::Float(_) => BuiltinType::Float,
            Value::Boolean(_) => BuiltinType::Boolean,
            Value::String(_) => BuiltinType::String,
            Value::Nil => BuiltinType::Nil,
            Value::Symbol(_) => BuiltinType::Symbol,
            Value::List(_) => BuiltinType::List,
            Value::Map(_) => BuiltinType::Map,
            Value::Functor(_) => BuiltinType::Functor,
            Value::Module(_) => BuiltinType::Module,
            Value::Type(_) => BuiltinType::Type,
            Value::Instance(_) => return None,
        })
    }

    /// Only `Nil` and `Boolean(false)` are non-truthy.
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Integer(_)
                | Value::Float(_)
                | Value::Boolean(_)
                | Value::String(_)
                | Value::Nil
                | Value::Symbol(_)
        )
    }

    /// Host-level identity key, used only by `MapData`'s internal index.
    /// Needed so `Map` can index entries efficiently, but never stands in
    /// for the language-level `==` operator. Never compare user-visible
    /// equality with this.
    fn host_key(&self) -> HostKey {
        HostKey(self.clone())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Nil => write!(f, "nil"),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(_) => write!(f, "#<List>"),
            Value::Map(_) => write!(f, "#<Map>"),
            Value::Instance(i) => write!(f, "#<{}>", i.ty.name),
            Value::Module(m) => write!(f, "#<Module {}>", m.name),
            Value::Type(t) => write!(f, "#<Type {}>", t.name),
            Value::Functor(func) => write!(f, "#<Functor {}>", func.name),
        }
    }
}

/// Nil is a singleton: all Nil values compare equal. This `PartialEq` is
/// the *host* notion used for the `HostKey` wrapper below and for tests,
/// not the dispatched language `==`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => Rc::ptr_eq(a, b),
            (Value::Functor(a), Value::Functor(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A hashable, host-identity wrapper around `Value`. Exists only so
/// `MapData` can index entries by host identity — the subset operators
/// lean on exactly this, rather than on dispatched `==`.
#[derive(Clone)]
struct HostKey(Value);

impl PartialEq for HostKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for HostKey {}

impl std::hash::Hash for HostKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Value::Integer(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::String(s) => s.hash(state),
            Value::Nil => {}
            Value::Symbol(s) => s.hash(state),
            Value::List(l) => (Rc::as_ptr(l) as usize).hash(state),
            Value::Map(m) => (Rc::as_ptr(m) as usize).hash(state),
            Value::Instance(i) => (Rc::as_ptr(i) as usize).hash(state),
            Value::Module(m) => (Rc::as_ptr(m) as usize).hash(state),
            Value::Type(t) => (Rc::as_ptr(t) as usize).hash(state),
            Value::Functor(func) => (Rc::as_ptr(func) as usize).hash(state),
        }
    }
}

/// An ordered, mutable sequence of values, plus the per-object binding
/// table every heap container carries.
pub struct ListData {
    elements: RefCell<Vec<Value>>,
    pub ivars: Scope,
}

impl ListData {
    pub fn new(elements: Vec<Value>) -> Rc<ListData> {
        Rc::new(ListData {
            elements: RefCell::new(elements),
            ivars: Scope::detached(),
        })
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.elements.borrow().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.elements.borrow_mut().push(value);
    }

    /// Overwrites the element at `index` in place. Caller ensures `index`
    /// is in bounds.
    pub fn set(&self, index: usize, value: Value) {
        self.elements.borrow_mut()[index] = value;
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.elements.borrow().clone()
    }
}

/// An ordered mapping from Value to Value, preserving insertion order of
/// currently-present keys. Internally this is a `Vec` for order plus a
/// `HashMap` index keyed by host identity for O(1)-average lookup.
pub struct MapData {
    entries: RefCell<Vec<(Value, Value)>>,
    index: RefCell<HashMap<HostKey, usize>>,
    pub ivars: Scope,
}

impl MapData {
    pub fn new() -> Rc<MapData> {
        Rc::new(MapData {
            entries: RefCell::new(Vec::new()),
            index: RefCell::new(HashMap::new()),
            ivars: Scope::detached(),
        })
    }

    pub fn from_pairs(pairs: Vec<(Value, Value)>) -> Rc<MapData> {
        let map = MapData::new();
        for (k, v) in pairs {
            map.set(k, v);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Map indexing [k]`: returns the bound value or `None` (the caller
    /// maps that to `Nil`); never raises for missing keys.
    pub fn get(&self, key: &Value) -> Option<Value> {
        let index = self.index.borrow();
        index
            .get(&key.host_key())
            .map(|&i| self.entries.borrow()[i].1.clone())
    }

    /// `Map index-assign [k]=v`: binds `k` to `v` in place.
    pub fn set(&self, key: Value, value: Value) {
        let existing = self.index.borrow().get(&key.host_key()).copied();
        match existing {
            Some(i) => self.entries.borrow_mut()[i].1 = value,
            None => {
                let i = self.entries.borrow().len();
                self.entries.borrow_mut().push((key.clone(), value));
                self.index.borrow_mut().insert(key.host_key(), i);
            }
        }
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.borrow().clone()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Host-level key-set difference, used by the subset operators: by
    /// host identity, not dispatched `==`.
    pub fn keys_not_in(&self, other: &MapData) -> Vec<Value> {
        let other_index = other.index.borrow();
        self.entries()
            .into_iter()
            .filter(|(k, _)| !other_index.contains_key(&k.host_key()))
            .map(|(k, _)| k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_a_singleton_by_value() {
        assert_eq!(Value::Nil, Value::Nil);
    }

    #[test]
    fn only_nil_and_false_are_non_truthy() {
        assert!(!Value::Nil.truthy());
        assert!(!Value::Boolean(false).truthy());
        assert!(Value::Boolean(true).truthy());
        assert!(Value::Integer(0).truthy());
        assert!(Value::String(Rc::from("")).truthy());
    }

    #[test]
    fn map_get_of_absent_key_is_none_never_panics() {
        let map = MapData::new();
        assert_eq!(map.get(&Value::Integer(1)), None);
    }

    #[test]
    fn map_preserves_insertion_order() {
        let map = MapData::new();
        map.set(Value::Integer(1), Value::Integer(10));
        map.set(Value::Integer(2), Value::Integer(20));
        map.set(Value::Integer(1), Value::Integer(99)); // overwrite, not reorder
        let keys: Vec<i64> = map
            .keys()
            .into_iter()
            .map(|v| match v {
                Value::Integer(i) => i,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(keys, vec![1, 2]);
        assert_eq!(map.get(&Value::Integer(1)), Some(Value::Integer(99)));
    }

    #[test]
    fn list_equality_by_host_identity_not_structural() {
        let a = ListData::new(vec![Value::Integer(1)]);
        let b = ListData::new(vec![Value::Integer(1)]);
        assert_ne!(Value::List(a.clone()), Value::List(b));
        assert_eq!(Value::List(a.clone()), Value::List(a));
    }
}
