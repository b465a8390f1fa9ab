//! Lifecycle match-site discovery for the two authoring conventions.
//!
//! # Descriptor convention
//!
//! ```go
//! func resourceFoo() *pluginsdk.Resource {
//!     return &pluginsdk.Resource{
//!         Create: resourceFooCreate,
//!         Update: resourceFooUpdate,
//!         Delete: func(d *pluginsdk.ResourceData, meta interface{}) error { ... },
//!     }
//! }
//! ```
//!
//! Every `Create`/`Update`/`Delete` keyed element whose value has the
//! `pluginsdk.CreateFunc` signature is a site.
//!
//! # Operation convention
//!
//! ```go
//! func (r FooResource) Create() sdk.ResourceFunc {
//!     return sdk.ResourceFunc{
//!         Func: func(ctx context.Context, metadata sdk.ResourceMetaData) error { ... },
//!     }
//! }
//! ```
//!
//! Inside a method named `Create`/`Update`/`Delete` returning
//! `sdk.ResourceFunc`, every `Func` keyed element whose value has the
//! `sdk.ResourceRunFunc` signature is a site.
//!
//! Both matchers are plain functions from a declaration to its sites.
//! Neither descends into a matched element, but siblings and nested
//! literals elsewhere in the body are still visited.

use crate::ast::{walk_expr, Decl, Expr, ExprKind, FuncDecl, NodeId, SourceFile, Visit};
use crate::layout::ProjectLayout;
use crate::program::{Package, Program};
use crate::registry::SignatureRegistry;
use crate::types::FunctionSignature;
use rayon::prelude::*;
use std::fmt;

/// Element keys, and method names, that denote lifecycle operations.
pub const LIFECYCLE_KEYS: [&str; 3] = ["Create", "Update", "Delete"];
/// Result type of descriptor-convention declarations: `*pluginsdk.Resource`.
pub const DESCRIPTOR_TYPE: (&str, &str) = ("pluginsdk", "Resource");
/// Result type of operation-convention declarations: `sdk.ResourceFunc`.
pub const OPERATION_TYPE: (&str, &str) = ("sdk", "ResourceFunc");
/// Element key carrying the operation-convention function.
pub const OPERATION_FIELD: &str = "Func";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey {
    pub package: usize,
    pub file: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Convention {
    /// Function values assigned to lifecycle keys of a resource descriptor.
    Descriptor,
    /// Function values wrapped by lifecycle-named methods.
    Operation,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor => write!(f, "descriptor"),
            Self::Operation => write!(f, "operation"),
        }
    }
}

/// A keyed element whose value is believed to implement a lifecycle
/// operation.
#[derive(Debug, Clone)]
pub struct MatchSite<'p> {
    pub convention: Convention,
    pub file: FileKey,
    /// Name of the enclosing declaration.
    pub decl: &'p str,
    /// Line of the enclosing declaration, when known.
    pub line: Option<u32>,
    /// Key of the matched element.
    pub key: &'p str,
    pub value: &'p Expr,
}

impl MatchSite<'_> {
    pub fn value_id(&self) -> NodeId {
        self.value.id
    }
}

/// Run both matchers over every file of every service package.
///
/// Files are independent, so they are matched in parallel; the result is
/// ordered by file, then by traversal order within the file.
pub fn match_program<'p>(
    program: &'p Program,
    layout: &ProjectLayout,
    registry: &SignatureRegistry,
) -> Vec<MatchSite<'p>> {
    let files: Vec<(FileKey, &Package, &SourceFile)> = layout
        .service_packages(program)
        .flat_map(|(pkg_idx, pkg)| {
            pkg.files.iter().enumerate().map(move |(file_idx, file)| {
                let key = FileKey {
                    package: pkg_idx,
                    file: file_idx,
                };
                (key, pkg, file)
            })
        })
        .collect();

    files
        .par_iter()
        .flat_map_iter(|&(key, pkg, file)| match_file(program, pkg, key, file, registry))
        .collect()
}

pub fn match_file<'p>(
    program: &'p Program,
    pkg: &'p Package,
    key: FileKey,
    file: &'p SourceFile,
    registry: &SignatureRegistry,
) -> Vec<MatchSite<'p>> {
    let mut sites = Vec::new();
    for decl in &file.decls {
        let Decl::Func(func) = decl else {
            continue;
        };
        sites.extend(descriptor_sites(program, pkg, key, func, &registry.descriptor));
        sites.extend(operation_sites(program, pkg, key, func, &registry.operation));
    }
    if !sites.is_empty() {
        log::debug!("{}: {} match site(s)", file.path.display(), sites.len());
    }
    sites
}

/// Sites of the descriptor convention in one declaration.
pub fn descriptor_sites<'p>(
    program: &'p Program,
    pkg: &'p Package,
    file: FileKey,
    func: &'p FuncDecl,
    target: &FunctionSignature,
) -> Vec<MatchSite<'p>> {
    if !returns_descriptor(func) {
        return Vec::new();
    }
    collect_sites(
        program,
        pkg,
        file,
        func,
        target,
        Convention::Descriptor,
        &LIFECYCLE_KEYS,
    )
}

/// Sites of the operation convention in one declaration.
pub fn operation_sites<'p>(
    program: &'p Program,
    pkg: &'p Package,
    file: FileKey,
    func: &'p FuncDecl,
    target: &FunctionSignature,
) -> Vec<MatchSite<'p>> {
    if !LIFECYCLE_KEYS.contains(&func.name.name.as_str()) || !returns_operation(func) {
        return Vec::new();
    }
    collect_sites(
        program,
        pkg,
        file,
        func,
        target,
        Convention::Operation,
        &[OPERATION_FIELD],
    )
}

/// `func ...() *pluginsdk.Resource`
pub fn returns_descriptor(func: &FuncDecl) -> bool {
    match func.sole_result().map(|r| &r.kind) {
        Some(ExprKind::Star { x }) => x.as_qualified() == Some(DESCRIPTOR_TYPE),
        _ => false,
    }
}

/// `func ...() sdk.ResourceFunc`
pub fn returns_operation(func: &FuncDecl) -> bool {
    func.sole_result()
        .and_then(Expr::as_qualified)
        .is_some_and(|q| q == OPERATION_TYPE)
}

fn collect_sites<'p>(
    program: &'p Program,
    pkg: &'p Package,
    file: FileKey,
    func: &'p FuncDecl,
    target: &FunctionSignature,
    convention: Convention,
    keys: &[&str],
) -> Vec<MatchSite<'p>> {
    let mut finder = KeyedValueFinder {
        program,
        pkg,
        target,
        keys,
        found: Vec::new(),
    };
    finder.visit_func_decl(func);

    finder
        .found
        .into_iter()
        .map(|(key, value)| MatchSite {
            convention,
            file,
            decl: &func.name.name,
            line: func.span.map(|s| s.line),
            key,
            value,
        })
        .collect()
}

struct KeyedValueFinder<'p, 't> {
    program: &'p Program,
    pkg: &'p Package,
    target: &'t FunctionSignature,
    keys: &'t [&'t str],
    found: Vec<(&'p str, &'p Expr)>,
}

impl<'p> KeyedValueFinder<'p, '_> {
    fn matches(&self, key: &'p Expr, value: &'p Expr) -> Option<&'p str> {
        let key = key.as_ident()?;
        if !self.keys.contains(&key) {
            return None;
        }
        let ty = self.program.type_of(self.pkg, value)?;
        ty.as_signature()
            .is_some_and(|sig| sig.identical(self.target))
            .then_some(key)
    }
}

impl<'p> Visit<'p> for KeyedValueFinder<'p, '_> {
    fn visit_expr(&mut self, expr: &'p Expr) {
        if let ExprKind::KeyValue { key, value } = &expr.kind {
            if let Some(key) = self.matches(key, value) {
                self.found.push((key, &**value));
                return;
            }
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Decl, Stmt, StmtKind};
    use crate::testkit::{
        descriptor_signature, match_all, operation_signature, return_stmt, test_project,
        ProgramBuilder,
    };
    use crate::types::Type;

    /// `&pluginsdk.Resource{<key>: <value>}`
    fn resource_literal(b: &mut ProgramBuilder, key: &str, value: Expr) -> Expr {
        let kv = b.key_value(key, value);
        let ty = b.qualified("pluginsdk", "Resource");
        let lit = b.composite(ty, vec![kv]);
        b.address_of(lit)
    }

    #[test]
    fn test_returns_descriptor_requires_pointer() {
        let mut b = ProgramBuilder::new();
        let resource = b.qualified("pluginsdk", "Resource");
        let ptr = b.star(resource);
        let by_pointer = b.func_decl("resourceFoo", vec![ptr], Vec::new());
        let resource = b.qualified("pluginsdk", "Resource");
        let by_value = b.func_decl("resourceBar", vec![resource], Vec::new());
        assert!(returns_descriptor(&by_pointer));
        assert!(!returns_descriptor(&by_value));
    }

    #[test]
    fn test_returns_operation_requires_sole_result() {
        let mut b = ProgramBuilder::new();
        let result = b.qualified("sdk", "ResourceFunc");
        let single = b.func_decl("Create", vec![result], Vec::new());
        let result = b.qualified("sdk", "ResourceFunc");
        let err = b.ident_expr("error");
        let pair = b.func_decl("Create", vec![result, err], Vec::new());
        assert!(returns_operation(&single));
        assert!(!returns_operation(&pair));
    }

    #[test]
    fn test_all_three_lifecycle_keys_are_matched() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let create = b.declare_lifecycle_func(pkg, file, "fooCreate");
        let read = b.declare_lifecycle_func(pkg, file, "fooRead");
        let update = b.declare_lifecycle_func(pkg, file, "fooUpdate");
        let delete = b.declare_lifecycle_func(pkg, file, "fooDelete");
        let elements = vec![
            ("Create", b.reference(pkg, create)),
            ("Read", b.reference(pkg, read)),
            ("Update", b.reference(pkg, update)),
            ("Delete", b.reference(pkg, delete)),
        ];
        b.descriptor_resource(pkg, file, "resourceFoo", elements);
        let program = b.build();

        let sites = match_all(&program);
        let keys: Vec<_> = sites.iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["Create", "Update", "Delete"]);
        assert!(sites.iter().all(|s| s.decl == "resourceFoo"));
        assert!(sites.iter().all(|s| s.convention == Convention::Descriptor));
    }

    #[test]
    fn test_value_with_different_signature_is_not_matched() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let mut sig = descriptor_signature();
        sig.params.pop();
        let value = b.typed_ident(pkg, "fooCreate", Type::Signature(sig));
        b.descriptor_resource(pkg, file, "resourceFoo", vec![("Create", value)]);
        let program = b.build();

        assert!(match_all(&program).is_empty());
    }

    #[test]
    fn test_named_function_type_is_not_identical_to_signature() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let named = Type::named(format!("{}/internal/tf/pluginsdk", crate::testkit::MODULE), "CreateFunc");
        let value = b.typed_ident(pkg, "fooCreate", named);
        b.descriptor_resource(pkg, file, "resourceFoo", vec![("Create", value)]);
        let program = b.build();

        assert!(match_all(&program).is_empty());
    }

    #[test]
    fn test_operation_site_requires_lifecycle_name() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let read = b.operation_literal(pkg, Vec::new());
        b.operation_method(pkg, file, "FooResource", "Read", read);
        let create = b.operation_literal(pkg, Vec::new());
        b.operation_method(pkg, file, "FooResource", "Create", create);
        let program = b.build();

        let sites = match_all(&program);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].decl, "Create");
        assert_eq!(sites[0].key, OPERATION_FIELD);
        assert_eq!(sites[0].convention, Convention::Operation);
    }

    #[test]
    fn test_descriptor_signature_does_not_match_operation_field() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let lit = b.descriptor_literal(pkg, Vec::new());
        b.operation_method(pkg, file, "FooResource", "Delete", lit);
        let program = b.build();

        assert!(match_all(&program).is_empty());
        assert_ne!(descriptor_signature(), operation_signature());
    }

    #[test]
    fn test_reference_packages_are_not_matched() {
        let mut b = ProgramBuilder::new();
        let file = b.add_file(0, "resource.go");
        let lit = b.descriptor_literal(0, Vec::new());
        b.descriptor_resource(0, file, "resourceInternal", vec![("Create", lit)]);
        let program = b.build();

        assert!(match_all(&program).is_empty());
    }

    #[test]
    fn test_matched_value_is_not_searched_further() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let create = b.declare_lifecycle_func(pkg, file, "fooCreate");
        let value = b.reference(pkg, create);
        let inner = resource_literal(&mut b, "Create", value);
        let body = vec![Stmt::new(StmtKind::Expr { expr: inner })];
        let delete = b.descriptor_literal(pkg, body);
        b.descriptor_resource(pkg, file, "resourceFoo", vec![("Delete", delete)]);
        let program = b.build();

        let sites = match_all(&program);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].key, "Delete");
        assert!(sites[0].value.is_func_lit());
    }

    #[test]
    fn test_literals_nested_elsewhere_in_body_are_searched() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let create = b.declare_lifecycle_func(pkg, file, "fooCreate");
        let update = b.declare_lifecycle_func(pkg, file, "fooUpdate");

        // Under a sibling key that is not itself a lifecycle key.
        let value = b.reference(pkg, create);
        let inner = resource_literal(&mut b, "Create", value);
        let read = b.descriptor_literal(pkg, vec![return_stmt(vec![inner])]);
        b.descriptor_resource(pkg, file, "resourceFoo", vec![("Read", read)]);

        // Inside an if block.
        let value = b.reference(pkg, update);
        let inner = resource_literal(&mut b, "Update", value);
        let cond = b.raw_expr("legacy");
        let guarded = Stmt::new(StmtKind::If {
            init: None,
            cond,
            then: Block::new(vec![return_stmt(vec![inner])]),
            els: None,
        });
        let resource = b.qualified("pluginsdk", "Resource");
        let result = b.star(resource);
        let body = vec![guarded, return_stmt(vec![Expr::nil()])];
        let func = b.func_decl("resourceLegacy", vec![result], body);
        b.push_decl(pkg, file, Decl::Func(func));
        let program = b.build();

        let sites = match_all(&program);
        let found: Vec<_> = sites.iter().map(|s| (s.decl, s.key)).collect();
        assert_eq!(found, vec![("resourceFoo", "Create"), ("resourceLegacy", "Update")]);
    }

    #[test]
    fn test_sites_outlive_layout_and_registry() {
        let mut b = ProgramBuilder::new();
        let pkg = b.service_package("compute");
        let file = b.add_file(pkg, "foo_resource.go");
        let create = b.declare_lifecycle_func(pkg, file, "fooCreate");
        let value = b.reference(pkg, create);
        b.descriptor_resource(pkg, file, "resourceFoo", vec![("Create", value)]);
        let program = b.build();

        let sites = {
            let layout = ProjectLayout::classify(&program, &test_project()).unwrap();
            let registry = SignatureRegistry::build(&program, &layout).unwrap();
            match_program(&program, &layout, &registry)
        };
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].key, "Create");
    }
}
