//! End-to-end scenarios driven by hand-built `Node` trees (no parser
//! exists in this crate; constructing the tree directly is the same
//! shape a parser's output would take).

use ember_common::Value;
use ember_runtime::{BlockLiteral, Interpreter, Node};

fn run(program: Node) -> Value {
    Interpreter::new().run(&program).expect("program should evaluate")
}

fn symbol(name: &str) -> Node {
    Node::SymbolLit(name.to_string())
}

fn call(receiver: Node, name: &str, args: Vec<Node>) -> Node {
    Node::MethodCall {
        receiver: Some(Box::new(receiver)),
        name: name.to_string(),
        args,
        block: None,
    }
}

fn as_bool(v: Value) -> bool {
    match v {
        Value::Boolean(b) => b,
        other => panic!("expected Boolean, got {:?}", other),
    }
}

fn as_int(v: Value) -> i64 {
    match v {
        Value::Integer(i) => i,
        other => panic!("expected Integer, got {:?}", other),
    }
}

#[test]
fn two_empty_maps_are_equal() {
    let program = Node::BinaryOp {
        op: ember_runtime::BinaryOperator::Eq,
        lhs: Box::new(Node::MapLit(vec![])),
        rhs: Box::new(Node::MapLit(vec![])),
    };
    assert!(as_bool(run(program)));
}

#[test]
fn map_size_counts_entries() {
    let map = Node::MapLit(vec![
        (symbol("a"), Node::IntegerLit(1)),
        (symbol("b"), Node::IntegerLit(2)),
    ]);
    let program = call(map, "size", vec![]);
    assert_eq!(as_int(run(program)), 2);
}

#[test]
fn map_merge_is_right_biased() {
    let left = Node::MapLit(vec![(symbol("a"), Node::IntegerLit(1))]);
    let right = Node::MapLit(vec![
        (symbol("a"), Node::IntegerLit(2)),
        (symbol("b"), Node::IntegerLit(3)),
    ]);
    let merged = call(left, "+", vec![right]);
    let program = call(merged, "[]", vec![symbol("a")]);
    assert_eq!(as_int(run(program)), 2);
}

#[test]
fn map_index_of_missing_key_is_nil() {
    let map = Node::MapLit(vec![(symbol("a"), Node::IntegerLit(1))]);
    let program = call(map, "[]", vec![symbol("missing")]);
    assert!(matches!(run(program), Value::Nil));
}

#[test]
fn map_index_assign_grows_size() {
    let program = Node::Program(vec![
        Node::LocalAssign {
            name: "x".to_string(),
            value: Box::new(Node::MapLit(vec![(symbol("a"), Node::IntegerLit(1))])),
        },
        call(
            Node::Identifier("x".to_string()),
            "[]=",
            vec![symbol("b"), Node::IntegerLit(2)],
        ),
        call(Node::Identifier("x".to_string()), "size", vec![]),
    ]);
    assert_eq!(as_int(run(program)), 2);
}

#[test]
fn map_each_visits_entries_in_insertion_order() {
    // "each" takes its block positionally via `MethodCall.block`, so
    // build that call directly rather than through the `call` helper.
    let each_call = Node::MethodCall {
        receiver: Some(Box::new(Node::MapLit(vec![
            (symbol("a"), Node::IntegerLit(1)),
            (symbol("b"), Node::IntegerLit(2)),
        ]))),
        name: "each".to_string(),
        args: vec![],
        block: Some(Box::new(BlockLiteral {
            params: vec!["k".to_string(), "v".to_string()],
            splat_index: None,
            body: vec![call(
                Node::Identifier("acc".to_string()),
                "push",
                vec![Node::Identifier("v".to_string())],
            )],
        })),
    };

    let full_program = Node::Program(vec![
        Node::LocalAssign {
            name: "acc".to_string(),
            value: Box::new(Node::ListLit(vec![])),
        },
        each_call,
        call(Node::Identifier("acc".to_string()), "[]", vec![Node::IntegerLit(0)]),
    ]);
    assert_eq!(as_int(run(full_program)), 1);
}

#[test]
fn module_include_brings_its_methods_to_instances() {
    // module M
    //   def foo
    //     42
    //   end
    // end
    // type A
    //   include M
    // end
    // A.new.foo
    let program = Node::Program(vec![
        Node::ModuleDecl {
            name: "M".to_string(),
            body: vec![Node::MethodDef {
                name: "foo".to_string(),
                params: vec![],
                splat_index: None,
                block_param: None,
                body: vec![Node::IntegerLit(42)],
            }],
        },
        Node::TypeDecl {
            name: "A".to_string(),
            supertype: None,
            includes: vec!["M".to_string()],
            extends: vec![],
            body: vec![],
        },
        call(
            call(Node::Identifier("A".to_string()), "new", vec![]),
            "foo",
            vec![],
        ),
    ]);
    assert_eq!(as_int(run(program)), 42);
}

#[test]
fn instance_method_defined_directly_on_a_type_is_dispatched() {
    // type Counter
    //   def value
    //     99
    //   end
    // end
    // Counter.new.value
    let program = Node::Program(vec![
        Node::TypeDecl {
            name: "Counter".to_string(),
            supertype: None,
            includes: vec![],
            extends: vec![],
            body: vec![Node::MethodDef {
                name: "value".to_string(),
                params: vec![],
                splat_index: None,
                block_param: None,
                body: vec![Node::IntegerLit(99)],
            }],
        },
        call(
            call(Node::Identifier("Counter".to_string()), "new", vec![]),
            "value",
            vec![],
        ),
    ]);
    assert_eq!(as_int(run(program)), 99);
}

#[test]
fn while_loop_mutates_an_outer_local_via_assign() {
    // x = 0
    // while x < 3
    //   x = x + 1
    // end
    // x
    let program = Node::Program(vec![
        Node::LocalAssign {
            name: "x".to_string(),
            value: Box::new(Node::IntegerLit(0)),
        },
        Node::While {
            cond: Box::new(Node::BinaryOp {
                op: ember_runtime::BinaryOperator::LessThan,
                lhs: Box::new(Node::Identifier("x".to_string())),
                rhs: Box::new(Node::IntegerLit(3)),
            }),
            body: vec![Node::LocalAssign {
                name: "x".to_string(),
                value: Box::new(Node::BinaryOp {
                    op: ember_runtime::BinaryOperator::Add,
                    lhs: Box::new(Node::Identifier("x".to_string())),
                    rhs: Box::new(Node::IntegerLit(1)),
                }),
            }],
        },
        Node::Identifier("x".to_string()),
    ]);
    assert_eq!(as_int(run(program)), 3);
}

#[test]
fn block_literal_closes_over_its_defining_scope() {
    // captured = 10
    // adder = { |n| n + captured }   -- modelled as an immediate block call
    // adder.call(5) -> 15, via List#each reusing a one-element list
    let program = Node::Program(vec![
        Node::LocalAssign {
            name: "captured".to_string(),
            value: Box::new(Node::IntegerLit(10)),
        },
        Node::LocalAssign {
            name: "acc".to_string(),
            value: Box::new(Node::ListLit(vec![])),
        },
        Node::MethodCall {
            receiver: Some(Box::new(Node::ListLit(vec![Node::IntegerLit(5)]))),
            name: "each".to_string(),
            args: vec![],
            block: Some(Box::new(BlockLiteral {
                params: vec!["n".to_string()],
                splat_index: None,
                body: vec![call(
                    Node::Identifier("acc".to_string()),
                    "push",
                    vec![Node::BinaryOp {
                        op: ember_runtime::BinaryOperator::Add,
                        lhs: Box::new(Node::Identifier("n".to_string())),
                        rhs: Box::new(Node::Identifier("captured".to_string())),
                    }],
                )],
            })),
        },
        call(Node::Identifier("acc".to_string()), "[]", vec![Node::IntegerLit(0)]),
    ]);
    assert_eq!(as_int(run(program)), 15);
}

#[test]
fn unresolved_identifier_is_an_error_not_a_panic() {
    let program = Node::Identifier("totally_undefined_name".to_string());
    let result = Interpreter::new().run(&program);
    assert!(result.is_err());
}
