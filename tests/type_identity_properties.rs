//! Property-based tests for structural type identity
//!
//! These tests verify invariants that should hold for all types:
//! - Identity is reflexive and symmetric
//! - Wrapping both sides in the same constructor preserves identity
//! - Signatures never ignore an extra parameter or result
//! - Interface method order is irrelevant

use noop_lifecycle::types::{BasicKind, FunctionSignature, Method, StructField, Type};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn basic_kind() -> impl Strategy<Value = BasicKind> {
    prop_oneof![
        Just(BasicKind::Bool),
        Just(BasicKind::Int),
        Just(BasicKind::Int64),
        Just(BasicKind::Float64),
        Just(BasicKind::String),
        Just(BasicKind::Uint8),
    ]
}

fn leaf_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        basic_kind().prop_map(Type::basic),
        ("[a-z]{1,3}", "[A-Z][a-z]{0,4}").prop_map(|(pkg, name)| Type::named(pkg, name)),
        Just(Type::error()),
        Just(Type::empty_interface()),
    ]
}

/// Arbitrary types up to a small depth.
fn any_type() -> impl Strategy<Value = Type> {
    leaf_type().prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::pointer),
            inner
                .clone()
                .prop_map(|elem| Type::Slice { elem: Box::new(elem) }),
            (0u64..4, inner.clone()).prop_map(|(len, elem)| Type::Array {
                len,
                elem: Box::new(elem)
            }),
            (inner.clone(), inner.clone()).prop_map(|(key, value)| Type::Map {
                key: Box::new(key),
                value: Box::new(value)
            }),
            (vec(inner.clone(), 0..3), vec(inner.clone(), 0..2), any::<bool>()).prop_map(
                |(params, results, variadic)| Type::Signature(FunctionSignature {
                    params,
                    results,
                    variadic
                })
            ),
            vec(("[A-Z][a-z]{0,3}", inner.clone()), 0..3).prop_map(|fields| Type::Struct {
                fields: fields
                    .into_iter()
                    .map(|(name, ty)| StructField {
                        name,
                        ty,
                        embedded: false,
                        tag: String::new(),
                    })
                    .collect()
            }),
        ]
    })
}

fn signature() -> impl Strategy<Value = FunctionSignature> {
    (vec(any_type(), 0..3), vec(any_type(), 0..2))
        .prop_map(|(params, results)| FunctionSignature::new(params, results))
}

proptest! {
    #[test]
    fn prop_identity_is_reflexive(ty in any_type()) {
        prop_assert!(ty.identical(&ty.clone()));
    }

    #[test]
    fn prop_identity_is_symmetric(a in any_type(), b in any_type()) {
        prop_assert_eq!(a.identical(&b), b.identical(&a));
    }

    #[test]
    fn prop_pointer_preserves_identity(a in any_type(), b in any_type()) {
        prop_assert_eq!(
            a.identical(&b),
            Type::pointer(a.clone()).identical(&Type::pointer(b.clone()))
        );
    }

    #[test]
    fn prop_extra_parameter_breaks_identity(sig in signature(), extra in any_type()) {
        let mut longer = sig.clone();
        longer.params.push(extra);
        prop_assert!(!sig.identical(&longer));
        prop_assert!(!Type::Signature(longer).identical(&Type::Signature(sig)));
    }

    #[test]
    fn prop_extra_result_breaks_identity(sig in signature(), extra in any_type()) {
        let mut longer = sig.clone();
        longer.results.push(extra);
        prop_assert!(!sig.identical(&longer));
    }

    #[test]
    fn prop_variadic_flag_is_part_of_identity(sig in signature()) {
        let mut variadic = sig.clone();
        variadic.variadic = true;
        prop_assert!(!sig.identical(&variadic));
    }

    #[test]
    fn prop_interface_method_order_is_irrelevant(
        methods in btree_map("[A-Z][a-z]{0,5}", signature(), 0..4)
    ) {
        let forward: Vec<Method> = methods
            .into_iter()
            .map(|(name, signature)| Method { name, signature })
            .collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = Type::Interface { methods: forward, embedded: Vec::new() };
        let b = Type::Interface { methods: backward, embedded: Vec::new() };
        prop_assert!(a.identical(&b));
    }

    #[test]
    fn prop_named_types_differ_by_package(name in "[A-Z][a-z]{0,5}", pkg in "[a-z]{1,4}") {
        let here = Type::named(pkg.clone(), name.clone());
        let elsewhere = Type::named(format!("{}/v2", pkg), name);
        prop_assert!(!here.identical(&elsewhere));
    }
}
