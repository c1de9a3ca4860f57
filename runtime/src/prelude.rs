//! Native method registration for the eleven built-in types: for each
//! built-in class, native clauses are appended to the Functor bound to
//! a method name in `type.instance_scope`, using the same mechanism
//! `MethodDef` uses for user code. This keeps `x + y` on the same
//! dispatch path whether `x` is a user Instance or a Map.

use crate::driver::Interpreter;
use ember_common::{
    BuiltinType, Clause, Dispatch, EvalError, EvalResult, ListData, MapData, NativeFn, Type, Value,
};
use std::rc::Rc;

pub fn install(interpreter: &mut Interpreter) {
    install_generic_identity(interpreter);
    install_not(interpreter);
    install_numeric(interpreter, BuiltinType::Integer);
    install_numeric(interpreter, BuiltinType::Float);
    install_string(interpreter);
    install_list(interpreter);
    install_map(interpreter);
}

fn register(ty: &Rc<Type>, name: &str, native: NativeFn) {
    let scope = &ty.instance_scope;
    let functor = match scope.read(name) {
        Some(Value::Functor(existing)) => existing,
        _ => ember_common::Functor::new(name, None, false),
    };
    functor.add_clause(Clause::Native(native));
    scope.define(name, Value::Functor(functor));
}

/// `not` is defined identically for every built-in type — truthiness is
/// total over all values — so it is installed once per type rather than
/// duplicated per type-specific section.
fn install_not(interpreter: &mut Interpreter) {
    for builtin in [
        BuiltinType::Integer,
        BuiltinType::Float,
        BuiltinType::Boolean,
        BuiltinType::String,
        BuiltinType::Nil,
        BuiltinType::Symbol,
        BuiltinType::List,
        BuiltinType::Map,
        BuiltinType::Functor,
        BuiltinType::Module,
        BuiltinType::Type,
    ] {
        let ty = interpreter.builtin_type(builtin);
        register(
            &ty,
            "not",
            Rc::new(|_d, receiver, _args, _block| Ok(Value::Boolean(!receiver.truthy()))),
        );
    }
}

/// Identity `==`/`!=`, reusing `Value`'s host `PartialEq`: this host
/// comparison is exactly the right language-level semantics for
/// primitives and for the heap types that compare by identity — List
/// and Map are the exceptions, overridden in `install_list`/
/// `install_map` with dispatched, structural comparisons.
fn install_generic_identity(interpreter: &mut Interpreter) {
    for builtin in [
        BuiltinType::Integer,
        BuiltinType::Float,
        BuiltinType::Boolean,
        BuiltinType::String,
        BuiltinType::Nil,
        BuiltinType::Symbol,
        BuiltinType::Functor,
        BuiltinType::Module,
        BuiltinType::Type,
    ] {
        let ty = interpreter.builtin_type(builtin);
        register(
            &ty,
            "==",
            Rc::new(|_d, receiver, args, _block| {
                let other = args.first().cloned().unwrap_or(Value::Nil);
                Ok(Value::Boolean(receiver == other))
            }),
        );
        register(
            &ty,
            "!=",
            Rc::new(|_d, receiver, args, _block| {
                let other = args.first().cloned().unwrap_or(Value::Nil);
                Ok(Value::Boolean(receiver != other))
            }),
        );
    }
}

fn expect_integer(value: Option<&Value>) -> EvalResult<i64> {
    match value {
        Some(Value::Integer(i)) => Ok(*i),
        Some(other) => Err(EvalError::type_misuse(format!(
            "expected an Integer argument, got {}",
            other.type_name()
        ))),
        None => Err(EvalError::arity_mismatch("<native>", "1 argument", 0)),
    }
}

fn install_numeric(interpreter: &mut Interpreter, builtin: BuiltinType) {
    let ty = interpreter.builtin_type(builtin);

    macro_rules! arith {
        ($name:expr, $op:tt) => {
            register(&ty, $name, Rc::new(|_d, receiver, args, _block| {
                match (&receiver, args.first()) {
                    (Value::Integer(a), Some(Value::Integer(b))) => Ok(Value::Integer(a $op b)),
                    (Value::Float(a), Some(Value::Float(b))) => Ok(Value::Float(a $op b)),
                    _ => Err(EvalError::type_misuse(format!(
                        "cannot apply {} to {} and {:?}",
                        $name,
                        receiver.type_name(),
                        args.first()
                    ))),
                }
            }));
        };
    }
    arith!("+", +);
    arith!("-", -);
    arith!("*", *);

    register(
        &ty,
        "/",
        Rc::new(|_d, receiver, args, _block| match (&receiver, args.first()) {
            (Value::Integer(_), Some(Value::Integer(0))) => {
                Err(EvalError::type_misuse("integer division by zero"))
            }
            (Value::Integer(a), Some(Value::Integer(b))) => Ok(Value::Integer(a / b)),
            (Value::Float(a), Some(Value::Float(b))) => Ok(Value::Float(a / b)),
            _ => Err(EvalError::type_misuse("'/' expects a matching numeric argument")),
        }),
    );
    register(
        &ty,
        "%",
        Rc::new(|_d, receiver, args, _block| match (&receiver, args.first()) {
            (Value::Integer(_), Some(Value::Integer(0))) => {
                Err(EvalError::type_misuse("integer modulo by zero"))
            }
            (Value::Integer(a), Some(Value::Integer(b))) => Ok(Value::Integer(a % b)),
            (Value::Float(a), Some(Value::Float(b))) => Ok(Value::Float(a % b)),
            _ => Err(EvalError::type_misuse("'%' expects a matching numeric argument")),
        }),
    );

    macro_rules! compare {
        ($name:expr, $op:tt) => {
            register(&ty, $name, Rc::new(|_d, receiver, args, _block| {
                match (&receiver, args.first()) {
                    (Value::Integer(a), Some(Value::Integer(b))) => Ok(Value::Boolean(a $op b)),
                    (Value::Float(a), Some(Value::Float(b))) => Ok(Value::Boolean(a $op b)),
                    _ => Err(EvalError::type_misuse(format!(
                        "cannot compare {} with {:?}",
                        receiver.type_name(),
                        args.first()
                    ))),
                }
            }));
        };
    }
    compare!(">", >);
    compare!("<", <);
    compare!(">=", >=);
    compare!("<=", <=);

    register(
        &ty,
        "negate",
        Rc::new(|_d, receiver, _args, _block| match receiver {
            Value::Integer(i) => Ok(Value::Integer(-i)),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(EvalError::type_misuse(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }),
    );
}

fn install_string(interpreter: &mut Interpreter) {
    let ty = interpreter.builtin_type(BuiltinType::String);

    register(
        &ty,
        "+",
        Rc::new(|_d, receiver, args, _block| match (&receiver, args.first()) {
            (Value::String(a), Some(Value::String(b))) => {
                Ok(Value::String(Rc::from(format!("{}{}", a, b))))
            }
            _ => Err(EvalError::type_misuse("'+' on String expects a String argument")),
        }),
    );

    macro_rules! compare {
        ($name:expr, $op:tt) => {
            register(&ty, $name, Rc::new(|_d, receiver, args, _block| {
                match (&receiver, args.first()) {
                    (Value::String(a), Some(Value::String(b))) => {
                        Ok(Value::Boolean(a.as_ref() $op b.as_ref()))
                    }
                    _ => Err(EvalError::type_misuse("expected a String argument")),
                }
            }));
        };
    }
    compare!(">", >);
    compare!("<", <);
    compare!(">=", >=);
    compare!("<=", <=);
}

fn expect_list(value: &Value) -> EvalResult<Rc<ListData>> {
    match value {
        Value::List(list) => Ok(list.clone()),
        other => Err(EvalError::type_misuse(format!(
            "expected a List, got {}",
            other.type_name()
        ))),
    }
}

fn install_list(interpreter: &mut Interpreter) {
    let ty = interpreter.builtin_type(BuiltinType::List);

    register(
        &ty,
        "size",
        Rc::new(|_d, receiver, _args, _block| Ok(Value::Integer(expect_list(&receiver)?.len() as i64))),
    );

    register(
        &ty,
        "[]",
        Rc::new(|_d, receiver, args, _block| {
            let list = expect_list(&receiver)?;
            let index = expect_integer(args.first())?;
            if index < 0 {
                return Ok(Value::Nil);
            }
            Ok(list.get(index as usize).unwrap_or(Value::Nil))
        }),
    );

    // Extrapolates Map's "bind in place" shape to List, growing the list
    // with Nil padding when the index is past the current end.
    register(
        &ty,
        "[]=",
        Rc::new(|_d, receiver, args, _block| {
            let list = expect_list(&receiver)?;
            let index = expect_integer(args.first())?;
            let value = args
                .get(1)
                .cloned()
                .ok_or_else(|| EvalError::arity_mismatch("[]=", "2 arguments", args.len()))?;
            if index < 0 {
                return Err(EvalError::index_error("negative list index"));
            }
            let index = index as usize;
            while list.len() < index {
                list.push(Value::Nil);
            }
            if index == list.len() {
                list.push(value.clone());
            } else {
                list.set(index, value.clone());
            }
            Ok(value)
        }),
    );

    register(
        &ty,
        "+",
        Rc::new(|_d, receiver, args, _block| {
            let a = expect_list(&receiver)?;
            let b = expect_list(args.first().unwrap_or(&Value::Nil))?;
            let mut combined = a.to_vec();
            combined.extend(b.to_vec());
            Ok(Value::List(ListData::new(combined)))
        }),
    );

    register(
        &ty,
        "push",
        Rc::new(|_d, receiver, args, _block| {
            let list = expect_list(&receiver)?;
            let value = args.first().cloned().unwrap_or(Value::Nil);
            list.push(value);
            Ok(receiver)
        }),
    );

    register(
        &ty,
        "each",
        Rc::new(|dispatcher, receiver, _args, block| {
            let list = expect_list(&receiver)?;
            if let Some(Value::Functor(block_functor)) = &block {
                for element in list.to_vec() {
                    dispatcher.invoke_functor(block_functor, Value::Nil, &[element], None)?;
                }
            }
            Ok(receiver)
        }),
    );

    // List equality: same length and pairwise dispatched `==`, not host
    // identity.
    register(&ty, "==", Rc::new(list_eq));
    register(
        &ty,
        "!=",
        Rc::new(|dispatcher, receiver, args, block| {
            let equal = list_eq(dispatcher, receiver, args, block)?;
            Ok(Value::Boolean(!equal.truthy()))
        }),
    );
}

fn list_eq(
    dispatcher: &mut dyn Dispatch,
    receiver: Value,
    args: &[Value],
    _block: Option<Value>,
) -> EvalResult<Value> {
    let a = expect_list(&receiver)?;
    let other = args.first().cloned().unwrap_or(Value::Nil);
    let b = match expect_list(&other) {
        Ok(b) => b,
        Err(_) => return Ok(Value::Boolean(false)),
    };
    if a.len() != b.len() {
        return Ok(Value::Boolean(false));
    }
    for i in 0..a.len() {
        let av = a.get(i).expect("index within bounds");
        let bv = b.get(i).expect("index within bounds");
        let equal = dispatcher.call_method(av, "==", &[bv], None)?.truthy();
        if !equal {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn expect_map(value: &Value) -> EvalResult<Rc<MapData>> {
    match value {
        Value::Map(map) => Ok(map.clone()),
        other => Err(EvalError::type_misuse(format!(
            "expected a Map, got {}",
            other.type_name()
        ))),
    }
}

fn install_map(interpreter: &mut Interpreter) {
    let ty = interpreter.builtin_type(BuiltinType::Map);

    register(
        &ty,
        "size",
        Rc::new(|_d, receiver, _args, _block| Ok(Value::Integer(expect_map(&receiver)?.len() as i64))),
    );

    register(
        &ty,
        "[]",
        Rc::new(|_d, receiver, args, _block| {
            let map = expect_map(&receiver)?;
            let key = args.first().cloned().unwrap_or(Value::Nil);
            Ok(map.get(&key).unwrap_or(Value::Nil))
        }),
    );

    register(
        &ty,
        "[]=",
        Rc::new(|_d, receiver, args, _block| {
            let map = expect_map(&receiver)?;
            let key = args
                .first()
                .cloned()
                .ok_or_else(|| EvalError::arity_mismatch("[]=", "2 arguments", args.len()))?;
            let value = args
                .get(1)
                .cloned()
                .ok_or_else(|| EvalError::arity_mismatch("[]=", "2 arguments", args.len()))?;
            map.set(key, value.clone());
            Ok(value)
        }),
    );

    register(
        &ty,
        "+",
        Rc::new(|_d, receiver, args, _block| {
            let a = expect_map(&receiver)?;
            let b = expect_map(args.first().unwrap_or(&Value::Nil))?;
            let merged = MapData::new();
            for (k, v) in a.entries() {
                merged.set(k, v);
            }
            // argument wins on key collision
            for (k, v) in b.entries() {
                merged.set(k, v);
            }
            Ok(Value::Map(merged))
        }),
    );

    register(
        &ty,
        "each",
        Rc::new(|dispatcher, receiver, _args, block| {
            let map = expect_map(&receiver)?;
            if let Some(Value::Functor(block_functor)) = &block {
                for (key, value) in map.entries() {
                    dispatcher.invoke_functor(block_functor, Value::Nil, &[key, value], None)?;
                }
            }
            Ok(receiver)
        }),
    );

    // Map subset/proper-subset: host key-set difference, not dispatched
    // `==`. Intentionally not unified with the dispatched-equality
    // `==`/`!=` below.
    register(
        &ty,
        "<=",
        Rc::new(|_d, receiver, args, _block| {
            let a = expect_map(&receiver)?;
            let b = expect_map(args.first().unwrap_or(&Value::Nil))?;
            Ok(Value::Boolean(a.keys_not_in(&b).is_empty()))
        }),
    );
    register(
        &ty,
        "<",
        Rc::new(|_d, receiver, args, _block| {
            let a = expect_map(&receiver)?;
            let b = expect_map(args.first().unwrap_or(&Value::Nil))?;
            let is_subset = a.keys_not_in(&b).is_empty();
            let keys_equal = is_subset && b.keys_not_in(&a).is_empty();
            Ok(Value::Boolean(is_subset && !keys_equal))
        }),
    );

    register(&ty, "==", Rc::new(map_eq));
    register(&ty, "!=", Rc::new(map_not_eq));
}

fn map_eq(
    dispatcher: &mut dyn Dispatch,
    receiver: Value,
    args: &[Value],
    _block: Option<Value>,
) -> EvalResult<Value> {
    let a = expect_map(&receiver)?;
    let other = args.first().cloned().unwrap_or(Value::Nil);
    let b = match expect_map(&other) {
        Ok(b) => b,
        Err(_) => return Ok(Value::Boolean(false)),
    };
    if a.len() != b.len() {
        return Ok(Value::Boolean(false));
    }
    for ((rk, rv), (ok, ov)) in a.entries().into_iter().zip(b.entries()) {
        let keys_equal = dispatcher.call_method(rk, "==", &[ok], None)?.truthy();
        if !keys_equal {
            return Ok(Value::Boolean(false));
        }
        let values_equal = dispatcher.call_method(rv, "==", &[ov], None)?.truthy();
        if !values_equal {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// `map_not_eq` returns `true` inside the key-comparison branch where
/// `false` appears to be intended — i.e. it should fall through to
/// compare values when a pair of keys match, but instead treats a key
/// match alone as conclusive proof of inequality. Preserved as observed
/// rather than "fixed".
fn map_not_eq(
    dispatcher: &mut dyn Dispatch,
    receiver: Value,
    args: &[Value],
    _block: Option<Value>,
) -> EvalResult<Value> {
    let a = expect_map(&receiver)?;
    let other = args.first().cloned().unwrap_or(Value::Nil);
    let b = match expect_map(&other) {
        Ok(b) => b,
        Err(_) => return Ok(Value::Boolean(true)),
    };
    if a.len() != b.len() {
        return Ok(Value::Boolean(true));
    }
    for ((rk, rv), (ok, ov)) in a.entries().into_iter().zip(b.entries()) {
        let keys_equal = dispatcher.call_method(rk, "==", &[ok], None)?.truthy();
        if keys_equal {
            return Ok(Value::Boolean(true));
        }
        let values_equal = dispatcher.call_method(rv, "==", &[ov], None)?.truthy();
        if !values_equal {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_addition_dispatches_through_prelude() {
        let mut interpreter = Interpreter::new();
        let result = ember_common::Dispatch::call_method(
            &mut interpreter,
            Value::Integer(2),
            "+",
            &[Value::Integer(3)],
            None,
        )
        .unwrap();
        assert_eq!(result, Value::Integer(5));
    }

    #[test]
    fn empty_maps_are_equal() {
        let mut interpreter = Interpreter::new();
        let result = ember_common::Dispatch::call_method(
            &mut interpreter,
            Value::Map(MapData::new()),
            "==",
            &[Value::Map(MapData::new())],
            None,
        )
        .unwrap();
        assert_eq!(result, Value::Boolean(true));
    }

    #[test]
    fn map_not_eq_returns_true_for_a_matching_single_entry_map_due_to_the_documented_bug() {
        let mut interpreter = Interpreter::new();
        let a = MapData::new();
        a.set(Value::Symbol(ember_common::Symbol::intern("k")), Value::Integer(1));
        let b = MapData::new();
        b.set(Value::Symbol(ember_common::Symbol::intern("k")), Value::Integer(1));
        // Two genuinely equal single-entry maps: map_not_eq should say
        // `false`, but the documented bug makes it say `true` as soon as
        // the (matching) keys are compared.
        let result =
            ember_common::Dispatch::call_method(&mut interpreter, Value::Map(a), "!=", &[Value::Map(b)], None)
                .unwrap();
        assert_eq!(result, Value::Boolean(true));
    }

    #[test]
    fn map_subset_uses_host_identity_not_dispatched_equality() {
        let mut interpreter = Interpreter::new();
        let a = MapData::new();
        a.set(Value::Integer(1), Value::Nil);
        let b = MapData::new();
        b.set(Value::Integer(1), Value::Nil);
        b.set(Value::Integer(2), Value::Nil);
        let result =
            ember_common::Dispatch::call_method(&mut interpreter, Value::Map(a), "<=", &[Value::Map(b)], None)
                .unwrap();
        assert_eq!(result, Value::Boolean(true));
    }
}
