use crate::driver::Interpreter;
use ember_common::{Clause, EvalError, EvalResult, Functor, ListData, Scope, UserClause, Value};

/// Builds the ordered list of scopes method dispatch searches for a given
/// receiver. Instances search their own ivars first — which already
/// falls back to the type's instance scope via `Scope`'s parent chain
/// (`Instance::new` wires that up) — then the type's ancestor list.
/// Types dispatch against their static scope, then their *extended*
/// ancestor list. Modules and primitives have a single scope to search.
pub fn dispatch_chain(interpreter: &Interpreter, receiver: &Value) -> Vec<Scope> {
    match receiver {
        Value::Instance(instance) => {
            let mut chain = vec![instance.ivars.clone()];
            for ancestor in instance.ty.ancestors() {
                chain.push(ancestor.dispatch_scope());
            }
            chain
        }
        Value::Type(ty) => {
            let mut chain = vec![ty.static_scope.clone()];
            for ancestor in ty.extended_ancestors() {
                chain.push(ancestor.dispatch_scope());
            }
            chain
        }
        Value::Module(module) => vec![module.scope.clone()],
        _ => {
            let builtin = receiver
                .builtin_type()
                .expect("every non-Instance value has a builtin type");
            let ty = interpreter
                .builtins
                .get(&builtin)
                .expect("prelude installs every BuiltinType variant");
            vec![ty.instance_scope.clone()]
        }
    }
}

/// Performs full method dispatch: walk the receiver's chain, take the
/// first scope binding `name` to a Functor, and invoke it.
pub fn call_method(
    interpreter: &mut Interpreter,
    receiver: Value,
    name: &str,
    args: &[Value],
    block: Option<Value>,
) -> EvalResult<Value> {
    for scope in dispatch_chain(interpreter, &receiver) {
        if let Some(Value::Functor(functor)) = scope.read(name) {
            return invoke(interpreter, &functor, receiver, args, block);
        }
    }
    Err(EvalError::no_such_method(receiver.type_name(), name))
}

/// Selects the first clause of `functor` whose arity accepts `arg_count`.
/// Native clauses are always eligible — arity checking for them is the
/// native callable's own responsibility.
fn select_clause(functor: &Functor, arg_count: usize) -> Option<Clause> {
    functor.clauses().into_iter().find(|clause| match clause {
        Clause::Native(_) => true,
        Clause::User(user) => user.accepts(arg_count),
    })
}

/// Invokes `functor`'s selected clause with `receiver` as `this`. A
/// `Functor` with a `closed_self` (produced by
/// `Functor::with_closed_self`) uses that bound receiver instead of the
/// one passed at the call site.
pub fn invoke(
    interpreter: &mut Interpreter,
    functor: &Functor,
    receiver: Value,
    args: &[Value],
    block: Option<Value>,
) -> EvalResult<Value> {
    let clause = select_clause(functor, args.len())
        .ok_or_else(|| EvalError::arity_mismatch(&functor.name, "a clause matching", args.len()))?;
    let this = functor.closed_self().unwrap_or(receiver);
    match clause {
        Clause::Native(native) => native(interpreter, this, args, block),
        Clause::User(user) => invoke_user_clause(interpreter, functor, &user, this, args, block),
    }
}

/// Runs a user clause's body: the new frame's parent is the Functor's
/// captured `lexical_scope` when its `closure` flag is set (as for block
/// literals), otherwise a fresh parentless scope (as for plain method
/// definitions).
fn invoke_user_clause(
    interpreter: &mut Interpreter,
    functor: &Functor,
    clause: &UserClause,
    this: Value,
    args: &[Value],
    block: Option<Value>,
) -> EvalResult<Value> {
    interpreter
        .symbol_table
        .push_frame(functor.lexical_scope.as_ref(), functor.closure);
    let frame = interpreter.symbol_table.current().clone();
    bind_params(&frame, clause, args, block)?;
    interpreter.push_self(this);
    let body = crate::driver::method_body(&clause.body);
    let result = interpreter.eval_block(&body.0, &frame);
    interpreter.pop_self();
    interpreter.symbol_table.pop();
    result
}

/// Binds positional parameters, the splat (if any, as a List covering the
/// middle of the argument list), and the block parameter.
fn bind_params(
    frame: &Scope,
    clause: &UserClause,
    args: &[Value],
    block: Option<Value>,
) -> EvalResult<()> {
    match clause.splat_index {
        None => {
            for (name, value) in clause.params.iter().zip(args.iter()) {
                frame.define(name, value.clone());
            }
        }
        Some(splat_index) => {
            let before = &clause.params[..splat_index];
            let after = &clause.params[splat_index + 1..];
            for (name, value) in before.iter().zip(args.iter()) {
                frame.define(name, value.clone());
            }
            let splat_end = args.len().saturating_sub(after.len());
            let splat_values: Vec<Value> = args[before.len().min(splat_end)..splat_end].to_vec();
            frame.define(&clause.params[splat_index], Value::List(ListData::new(splat_values)));
            for (name, value) in after.iter().zip(args[splat_end..].iter()) {
                frame.define(name, value.clone());
            }
        }
    }
    if let Some(block_param) = &clause.block_param {
        frame.define(block_param, block.unwrap_or(Value::Nil));
    }
    Ok(())
}

/// Reads an instance variable off `receiver`: only non-primitive values
/// carry a binding table; reading one off a primitive is a type error,
/// not a silent `nil`.
pub fn read_ivar(receiver: &Value, name: &str) -> EvalResult<Value> {
    ivar_scope(receiver)?.read(name).map_or_else(|| Ok(Value::Nil), Ok)
    // unresolved ivars read as nil, matching undeclared-local semantics
    // rather than raising; only the receiver kind is invariant-checked.
}

/// Writes an instance variable on `receiver`.
pub fn write_ivar(receiver: &Value, name: &str, value: Value) -> EvalResult<()> {
    ivar_scope(receiver)?.define(name, value);
    Ok(())
}

fn ivar_scope(receiver: &Value) -> EvalResult<Scope> {
    match receiver {
        Value::Instance(i) => Ok(i.ivars.clone()),
        Value::Module(m) => Ok(m.scope.clone()),
        Value::Type(t) => Ok(t.static_scope.clone()),
        Value::List(l) => Ok(l.ivars.clone()),
        Value::Map(m) => Ok(m.ivars.clone()),
        Value::Functor(f) => Ok(f.ivars.clone()),
        _ => Err(EvalError::type_misuse(format!(
            "{} has no instance variables",
            receiver.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_common::Type;
    use std::rc::Rc;

    #[test]
    fn dispatch_chain_for_instance_starts_with_its_own_ivars() {
        let interpreter = Interpreter::new();
        let ty = Type::new("Widget");
        let instance = ember_common::Instance::new(ty);
        let chain = dispatch_chain(&interpreter, &Value::Instance(instance.clone()));
        assert!(chain[0].same_scope(&instance.ivars));
    }

    #[test]
    fn dispatch_chain_for_primitive_is_its_builtin_instance_scope() {
        let interpreter = Interpreter::new();
        let chain = dispatch_chain(&interpreter, &Value::Integer(1));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn write_ivar_on_primitive_is_a_type_error() {
        let result = write_ivar(&Value::Integer(1), "x", Value::Nil);
        assert!(result.is_err());
    }

    #[test]
    fn closed_self_functor_resolves_this_to_the_bound_receiver() {
        // A native clause that just hands back whatever `this` it sees,
        // so the test can tell a bound receiver apart from the one
        // supplied at the call site.
        let functor = ember_common::Functor::new("bound", None, false);
        functor.add_clause(Clause::Native(Rc::new(|_d, this, _args, _block| Ok(this))));

        let bound_receiver = Value::Integer(7);
        let bound = functor.with_closed_self(bound_receiver.clone());

        let mut interpreter = Interpreter::new();
        let call_site_receiver = Value::Integer(99);
        let result = invoke(&mut interpreter, &bound, call_site_receiver, &[], None).unwrap();

        assert_eq!(result, bound_receiver);
    }
}
