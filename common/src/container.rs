use crate::scope::Scope;
use std::cell::RefCell;
use std::rc::Rc;

/// A named namespace with its own binding scope. A module may itself mix
/// in other modules, so its own ancestor list recurses the same way a
/// type's does.
pub struct Module {
    pub name: String,
    pub scope: Scope,
    included_modules: RefCell<Vec<Rc<Module>>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Rc<Module> {
        Rc::new(Module {
            name: name.into(),
            scope: Scope::detached(),
            included_modules: RefCell::new(Vec::new()),
        })
    }

    /// Prepends `module` to this module's own included-modules list, so
    /// the most recent inclusion is searched first.
    pub fn include(&self, module: Rc<Module>) {
        self.included_modules.borrow_mut().insert(0, module);
    }

    pub fn included_modules(&self) -> Vec<Rc<Module>> {
        self.included_modules.borrow().clone()
    }

    /// This module's own ancestor list, by the same algorithm as
    /// `Type::ancestors`, minus any supertype step since modules have
    /// none.
    pub fn ancestors(&self) -> Vec<Ancestor> {
        let mut seen = Vec::new();
        append_module_ancestors(&self.included_modules(), &mut seen);
        seen
    }
}

/// One entry of an ancestor list: either a module or a type, each
/// contributing the scope method dispatch should search.
#[derive(Clone)]
pub enum Ancestor {
    Module(Rc<Module>),
    Type(Rc<Type>),
}

impl Ancestor {
    pub fn dispatch_scope(&self) -> Scope {
        match self {
            Ancestor::Module(m) => m.scope.clone(),
            Ancestor::Type(t) => t.instance_scope.clone(),
        }
    }

    fn identity(&self) -> *const () {
        match self {
            Ancestor::Module(m) => Rc::as_ptr(m) as *const (),
            Ancestor::Type(t) => Rc::as_ptr(t) as *const (),
        }
    }
}

fn push_unique(seen: &mut Vec<Ancestor>, candidate: Ancestor) {
    let id = candidate.identity();
    if !seen.iter().any(|a| a.identity() == id) {
        seen.push(candidate);
    }
}

fn append_module_ancestors(modules: &[Rc<Module>], seen: &mut Vec<Ancestor>) {
    for module in modules {
        push_unique(seen, Ancestor::Module(module.clone()));
        for ancestor in module.ancestors() {
            push_unique(seen, ancestor);
        }
    }
}

/// A class: name, static scope, instance scope, optional supertype,
/// ordered included/extended module lists.
pub struct Type {
    pub name: String,
    pub static_scope: Scope,
    pub instance_scope: Scope,
    supertype: RefCell<Option<Rc<Type>>>,
    included_modules: RefCell<Vec<Rc<Module>>>,
    extended_modules: RefCell<Vec<Rc<Module>>>,
}

impl Type {
    pub fn new(name: impl Into<String>) -> Rc<Type> {
        Rc::new(Type {
            name: name.into(),
            static_scope: Scope::detached(),
            instance_scope: Scope::detached(),
            supertype: RefCell::new(None),
            included_modules: RefCell::new(Vec::new()),
            extended_modules: RefCell::new(Vec::new()),
        })
    }

    pub fn set_supertype(&self, supertype: Rc<Type>) {
        *self.supertype.borrow_mut() = Some(supertype);
    }

    pub fn supertype(&self) -> Option<Rc<Type>> {
        self.supertype.borrow().clone()
    }

    pub fn include(&self, module: Rc<Module>) {
        self.included_modules.borrow_mut().insert(0, module);
    }

    pub fn extend(&self, module: Rc<Module>) {
        self.extended_modules.borrow_mut().insert(0, module);
    }

    pub fn included_modules(&self) -> Vec<Rc<Module>> {
        self.included_modules.borrow().clone()
    }

    pub fn extended_modules(&self) -> Vec<Rc<Module>> {
        self.extended_modules.borrow().clone()
    }

    /// The ancestor list used for normal (instance) method dispatch:
    /// included modules (each recursively expanded), then the supertype,
    /// then the supertype's own ancestors.
    pub fn ancestors(&self) -> Vec<Ancestor> {
        let mut seen = Vec::new();
        append_module_ancestors(&self.included_modules(), &mut seen);
        if let Some(supertype) = self.supertype() {
            push_unique(&mut seen, Ancestor::Type(supertype.clone()));
            for ancestor in supertype.ancestors() {
                push_unique(&mut seen, ancestor);
            }
        }
        seen
    }

    /// The ancestor list used when dispatching on the type object itself:
    /// same shape as `ancestors`, but built from `extended_modules` and
    /// the supertype chain's own extended ancestors.
    pub fn extended_ancestors(&self) -> Vec<Ancestor> {
        let mut seen = Vec::new();
        append_module_ancestors(&self.extended_modules(), &mut seen);
        if let Some(supertype) = self.supertype() {
            push_unique(&mut seen, Ancestor::Type(supertype.clone()));
            for ancestor in supertype.extended_ancestors() {
                push_unique(&mut seen, ancestor);
            }
        }
        seen
    }
}

/// An object of a user-defined type: a type pointer plus a per-instance
/// scope whose parent is the type's instance scope, so plain ivar lookup
/// naturally falls back to the class's instance bindings.
pub struct Instance {
    pub ty: Rc<Type>,
    pub ivars: Scope,
}

impl Instance {
    pub fn new(ty: Rc<Type>) -> Rc<Instance> {
        let ivars = Scope::child_of(&ty.instance_scope);
        Rc::new(Instance { ty, ivars })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ancestor_names(ancestors: &[Ancestor]) -> Vec<String> {
        ancestors
            .iter()
            .map(|a| match a {
                Ancestor::Module(m) => m.name.clone(),
                Ancestor::Type(t) => t.name.clone(),
            })
            .collect()
    }

    #[test]
    fn ancestors_follow_include_then_supertype_order() {
        let base = Type::new("Base");
        let m1 = Module::new("M1");
        let m2 = Module::new("M2");

        let derived = Type::new("Derived");
        derived.set_supertype(base.clone());
        derived.include(m1.clone());
        derived.include(m2.clone()); // most recent inclusion searched first

        let names = ancestor_names(&derived.ancestors());
        assert_eq!(names, vec!["M2", "M1", "Base"]);
    }

    #[test]
    fn ancestors_are_duplicate_free_preserving_first_occurrence() {
        let shared = Module::new("Shared");
        let base = Type::new("Base");
        base.include(shared.clone());

        let derived = Type::new("Derived");
        derived.set_supertype(base);
        derived.include(shared.clone()); // also included directly

        let names = ancestor_names(&derived.ancestors());
        assert_eq!(names, vec!["Shared", "Base"]);
    }

    #[test]
    fn extended_ancestors_use_extended_modules_not_included() {
        let base = Type::new("Base");
        let instance_mixin = Module::new("InstanceMixin");
        let static_mixin = Module::new("StaticMixin");
        base.include(instance_mixin);
        base.extend(static_mixin);

        let names = ancestor_names(&base.extended_ancestors());
        assert_eq!(names, vec!["StaticMixin"]);
    }

    #[test]
    fn nested_module_inclusion_is_recursively_expanded() {
        let inner = Module::new("Inner");
        let outer = Module::new("Outer");
        outer.include(inner.clone());

        let host = Type::new("Host");
        host.include(outer.clone());

        let names = ancestor_names(&host.ancestors());
        assert_eq!(names, vec!["Outer", "Inner"]);
    }

    #[test]
    fn instance_ivar_lookup_falls_back_to_instance_scope() {
        use crate::value::Value;

        let ty = Type::new("Point");
        ty.instance_scope.define("default_label", Value::Integer(0));
        let instance = Instance::new(ty);

        assert_eq!(
            instance.ivars.read("default_label"),
            Some(Value::Integer(0))
        );
    }
}
