//! Target signature registry.
//!
//! Both fingerprints are taken from named function-type declarations in
//! the reference SDK packages, computed once per run and passed by
//! reference to every matcher.

use crate::errors::{Error, Result};
use crate::layout::ProjectLayout;
use crate::program::{ObjectKind, Package, Program};
use crate::types::{FunctionSignature, Type};

/// Reference declaration for descriptor-convention lifecycle functions.
pub const DESCRIPTOR_REFERENCE: &str = "CreateFunc";
/// Reference declaration for operation-convention lifecycle functions.
pub const OPERATION_REFERENCE: &str = "ResourceRunFunc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRegistry {
    /// Underlying signature of `pluginsdk.CreateFunc`.
    pub descriptor: FunctionSignature,
    /// Underlying signature of `sdk.ResourceRunFunc`.
    pub operation: FunctionSignature,
}

impl SignatureRegistry {
    pub fn build(program: &Program, layout: &ProjectLayout) -> Result<Self> {
        let descriptor = reference_signature(
            program,
            &program.packages[layout.descriptor_sdk],
            DESCRIPTOR_REFERENCE,
        )?;
        let operation = reference_signature(
            program,
            &program.packages[layout.operation_sdk],
            OPERATION_REFERENCE,
        )?;
        Ok(Self {
            descriptor,
            operation,
        })
    }
}

/// Underlying function signature of the named type `name` declared in `pkg`.
pub fn reference_signature(
    program: &Program,
    pkg: &Package,
    name: &str,
) -> Result<FunctionSignature> {
    let mut declared = pkg
        .info
        .defs
        .values()
        .filter_map(|id| program.object(*id))
        .filter(|obj| obj.name == name && obj.package == pkg.path)
        .peekable();
    if declared.peek().is_none() {
        return Err(Error::discovery(format!(
            "reference type `{}` not found in {}",
            name, pkg.path
        )));
    }
    let object = declared
        .find(|obj| obj.kind == ObjectKind::TypeName)
        .ok_or_else(|| Error::discovery(format!("`{}.{}` is not a type declaration", pkg.path, name)))?;

    let named = match &object.ty {
        Type::Named(named) if !object.alias => named,
        _ => {
            return Err(Error::discovery(format!(
                "`{}.{}` is not a named type",
                pkg.path, name
            )))
        }
    };

    match program.underlying(named) {
        Some(Type::Signature(sig)) => Ok(sig.clone()),
        Some(_) => Err(Error::discovery(format!(
            "`{}.{}` is not a function type",
            pkg.path, name
        ))),
        None => Err(Error::discovery(format!(
            "underlying type of `{}.{}` is unknown",
            pkg.path, name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeId;
    use crate::program::{Object, ObjectId, Package};
    use crate::types::BasicKind;

    const SDK: &str = "example.com/p/internal/sdk";

    fn program_with(name: &str, kind: ObjectKind, underlying: Type) -> Program {
        let mut program = Program::default();
        let mut pkg = Package {
            path: SDK.into(),
            name: "sdk".into(),
            files: Vec::new(),
            info: Default::default(),
            errors: Vec::new(),
        };
        pkg.info.defs.insert(NodeId(1), ObjectId(1));
        program.objects.insert(
            ObjectId(1),
            Object {
                name: name.into(),
                kind,
                package: SDK.into(),
                ty: Type::named(SDK, name),
                alias: false,
            },
        );
        program.named.insert((SDK.into(), name.into()), underlying);
        program.packages.push(pkg);
        program
    }

    #[test]
    fn test_reference_signature_takes_underlying() {
        let sig = FunctionSignature::new(vec![Type::named("context", "Context")], vec![Type::error()]);
        let program = program_with(OPERATION_REFERENCE, ObjectKind::TypeName, Type::Signature(sig.clone()));
        let found = reference_signature(&program, &program.packages[0], OPERATION_REFERENCE).unwrap();
        assert_eq!(found, sig);
    }

    #[test]
    fn test_missing_reference_is_fatal() {
        let program = program_with("Other", ObjectKind::TypeName, Type::Signature(Default::default()));
        let err = reference_signature(&program, &program.packages[0], OPERATION_REFERENCE).unwrap_err();
        assert!(err.to_string().contains("reference type `ResourceRunFunc` not found"));
    }

    #[test]
    fn test_non_function_reference_is_fatal() {
        let program = program_with(
            OPERATION_REFERENCE,
            ObjectKind::TypeName,
            Type::basic(BasicKind::String),
        );
        let err = reference_signature(&program, &program.packages[0], OPERATION_REFERENCE).unwrap_err();
        assert!(err.to_string().contains("is not a function type"));
    }

    #[test]
    fn test_type_name_wins_over_same_named_function() {
        let sig = FunctionSignature::new(vec![Type::named("context", "Context")], vec![Type::error()]);
        let mut program = program_with(OPERATION_REFERENCE, ObjectKind::TypeName, Type::Signature(sig.clone()));
        // Same-named functions declared alongside the type.
        for (node, object) in [(0, 2), (2, 3)] {
            program.packages[0].info.defs.insert(NodeId(node), ObjectId(object));
            program.objects.insert(
                ObjectId(object),
                Object {
                    name: OPERATION_REFERENCE.into(),
                    kind: ObjectKind::Func,
                    package: SDK.into(),
                    ty: Type::Signature(Default::default()),
                    alias: false,
                },
            );
        }
        let found = reference_signature(&program, &program.packages[0], OPERATION_REFERENCE).unwrap();
        assert_eq!(found, sig);
    }

    #[test]
    fn test_function_object_is_not_a_reference_type() {
        let program = program_with(OPERATION_REFERENCE, ObjectKind::Func, Type::Signature(Default::default()));
        let err = reference_signature(&program, &program.packages[0], OPERATION_REFERENCE).unwrap_err();
        assert!(err.to_string().contains("is not a type declaration"));
    }
}
