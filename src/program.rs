//! The loaded, type-checked program handed over by the semantic model
//! provider: parsed packages plus the read-only binding table.

use crate::ast::{Expr, ExprKind, NodeId, SourceFile};
use crate::types::{NamedRef, Type};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Program-wide identity of a declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    TypeName,
    /// Free function or method.
    Func,
    Var,
    Const,
    PkgName,
    Label,
    Builtin,
    Nil,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    /// Import path of the declaring package; empty for universe objects.
    #[serde(default)]
    pub package: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// For type names: whether the declaration is an alias (`type A = B`).
    #[serde(default)]
    pub alias: bool,
}

/// Type and binding facts for one package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypesInfo {
    /// Inferred type of each expression.
    #[serde(default)]
    pub types: HashMap<NodeId, Type>,
    /// Identifiers that declare an object.
    #[serde(default)]
    pub defs: HashMap<NodeId, ObjectId>,
    /// Identifiers that refer to an object declared elsewhere.
    #[serde(default)]
    pub uses: HashMap<NodeId, ObjectId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageError {
    #[serde(default)]
    pub position: Option<String>,
    pub message: String,
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Import path.
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub info: TypesInfo,
    #[serde(default)]
    pub errors: Vec<PackageError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedDef {
    pub package: String,
    pub name: String,
    pub underlying: Type,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub objects: HashMap<ObjectId, Object>,
    /// Underlying types of every named type, as a flat list on the wire.
    #[serde(default, with = "named_table")]
    pub named: HashMap<(String, String), Type>,
}

impl Program {
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn underlying(&self, named: &NamedRef) -> Option<&Type> {
        self.named.get(&named.key())
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.path == path)
    }

    /// Total number of provider-reported errors across all packages.
    pub fn error_count(&self) -> usize {
        self.packages.iter().map(|p| p.errors.len()).sum()
    }

    /// Inferred type of `expr` within `pkg`.
    ///
    /// Falls back to the bound object's type for identifiers and for the
    /// selector of a qualified or member reference.
    pub fn type_of(&self, pkg: &Package, expr: &Expr) -> Option<Type> {
        if let Some(ty) = pkg.info.types.get(&expr.id) {
            return Some(ty.clone());
        }
        self.referenced_object(pkg, expr).map(|obj| obj.ty.clone())
    }

    /// Object an identifier or selector expression refers to.
    pub fn referenced_object(&self, pkg: &Package, expr: &Expr) -> Option<&Object> {
        self.referenced_id(pkg, expr).and_then(|id| self.object(id))
    }

    pub fn referenced_id(&self, pkg: &Package, expr: &Expr) -> Option<ObjectId> {
        let node = match &expr.kind {
            ExprKind::Ident { .. } => expr.id,
            ExprKind::Selector { sel, .. } => sel.id,
            _ => return None,
        };
        pkg.info.uses.get(&node).copied()
    }
}

mod named_table {
    use super::NamedDef;
    use crate::types::Type;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        table: &HashMap<(String, String), Type>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut defs: Vec<NamedDef> = table
            .iter()
            .map(|((package, name), underlying)| NamedDef {
                package: package.clone(),
                name: name.clone(),
                underlying: underlying.clone(),
            })
            .collect();
        defs.sort_by(|a, b| (&a.package, &a.name).cmp(&(&b.package, &b.name)));
        defs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<(String, String), Type>, D::Error> {
        let defs = Vec::<NamedDef>::deserialize(deserializer)?;
        Ok(defs
            .into_iter()
            .map(|d| ((d.package, d.name), d.underlying))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ident;
    use crate::types::FunctionSignature;

    fn package_with_use(node: NodeId, object: ObjectId) -> Package {
        let mut info = TypesInfo::default();
        info.uses.insert(node, object);
        Package {
            path: "example.com/svc".into(),
            name: "svc".into(),
            files: Vec::new(),
            info,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_type_of_falls_back_to_bound_object() {
        let sig = Type::Signature(FunctionSignature::new(vec![], vec![Type::error()]));
        let mut program = Program::default();
        program.objects.insert(
            ObjectId(1),
            Object {
                name: "fooCreate".into(),
                kind: ObjectKind::Func,
                package: "example.com/svc".into(),
                ty: sig.clone(),
                alias: false,
            },
        );
        let pkg = package_with_use(NodeId(10), ObjectId(1));
        let expr = Expr::ident(NodeId(10), "fooCreate");

        assert_eq!(program.type_of(&pkg, &expr), Some(sig));
        assert_eq!(program.type_of(&pkg, &Expr::nil()), None);
    }

    #[test]
    fn test_selector_binds_through_sel_ident() {
        let pkg = package_with_use(NodeId(3), ObjectId(9));
        let expr = Expr::new(
            NodeId(1),
            ExprKind::Selector {
                x: Box::new(Expr::ident(NodeId(2), "other")),
                sel: Ident::new(NodeId(3), "Create"),
            },
        );
        assert_eq!(Program::default().referenced_id(&pkg, &expr), Some(ObjectId(9)));
    }

    #[test]
    fn test_named_table_round_trips_through_json() {
        let mut program = Program::default();
        program.named.insert(
            ("example.com/sdk".into(), "ResourceRunFunc".into()),
            Type::Signature(FunctionSignature::default()),
        );
        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        let named = NamedRef::new("example.com/sdk", "ResourceRunFunc");
        assert!(back.underlying(&named).is_some());
    }
}
