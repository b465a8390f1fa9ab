//! Mutation planning and application.
//!
//! Use sites get their value replaced by `nil`. Resolved definitions get
//! their whole body replaced by a single `return` of the zero value of
//! each declared result. Mutations are applied per file on a copy of the
//! tree; the copy replaces the original only once the serializer has
//! written it, so a file is either fully rewritten or left as it was.

use crate::ast::{walk_expr_mut, Block, Decl, Expr, ExprKind, Field, NodeId, SourceFile, Stmt, StmtKind, VisitMut};
use crate::errors::{Error, Result};
use crate::matchers::FileKey;
use crate::observability::{set_current_file, set_phase, RunPhase};
use crate::printer::render_stmts;
use crate::program::Program;
use crate::resolver::{DefinitionSite, Resolution};
use crate::serializer::Serializer;
use crate::types::{BasicKind, Type};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Mutation {
    /// Replace the expression with this id by `nil`.
    BlankValue { value: NodeId },
    /// Replace the body of the declaration at this index.
    BlankBody { decl: usize, body: Vec<Stmt> },
}

#[derive(Debug, Default)]
pub struct RewritePlan {
    pub files: BTreeMap<FileKey, Vec<Mutation>>,
    pub use_site_mutations: usize,
    pub definitions_blanked: usize,
    /// Definitions whose body already was the sentinel.
    pub definitions_unchanged: usize,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub fn plan(program: &Program, resolution: &Resolution) -> Result<RewritePlan> {
    let mut plan = RewritePlan::default();

    for site in &resolution.use_sites {
        plan.files
            .entry(site.file)
            .or_default()
            .push(Mutation::BlankValue { value: site.value });
        plan.use_site_mutations += 1;
    }

    for def in resolution.definitions.values() {
        match blank_body(program, def)? {
            Some(body) => {
                plan.files
                    .entry(def.location.file)
                    .or_default()
                    .push(Mutation::BlankBody {
                        decl: def.location.decl,
                        body,
                    });
                plan.definitions_blanked += 1;
            }
            None => plan.definitions_unchanged += 1,
        }
    }
    Ok(plan)
}

/// Sentinel body for a definition, or `None` when it already has it.
fn blank_body(program: &Program, def: &DefinitionSite) -> Result<Option<Vec<Stmt>>> {
    let file = &program.packages[def.location.file.package].files[def.location.file.file];
    let Some(Decl::Func(func)) = file.decls.get(def.location.decl) else {
        return Err(Error::rewrite(&file.path, format!("`{}` is not a function declaration", def.name)));
    };
    let Some(current) = &func.body else {
        return Err(Error::rewrite(&file.path, format!("`{}` has no body", def.name)));
    };

    let results = program
        .object(def.object)
        .and_then(|obj| obj.ty.as_signature())
        .map(|sig| sig.results.clone())
        .ok_or_else(|| Error::rewrite(&file.path, format!("`{}` has no function type", def.name)))?;

    let declared = declared_results(&func.ty.results);
    let body = sentinel_body(program, &results, &declared);

    if render_stmts(&current.stmts) == render_stmts(&body) {
        log::debug!("`{}` in {} is already blank", def.name, file.path.display());
        return Ok(None);
    }
    Ok(Some(body))
}

/// One declared type expression per result value.
fn declared_results(fields: &[Field]) -> Vec<&Expr> {
    fields
        .iter()
        .flat_map(|f| std::iter::repeat(&f.ty).take(f.names.len().max(1)))
        .collect()
}

/// `return z1, ..., zn`, or an empty body for a function without results.
pub fn sentinel_body(program: &Program, results: &[Type], declared: &[&Expr]) -> Vec<Stmt> {
    if results.is_empty() {
        return Vec::new();
    }
    let zeros = results
        .iter()
        .enumerate()
        .map(|(i, ty)| zero_value(program, ty, declared.get(i).copied()))
        .collect();
    vec![Stmt::new(StmtKind::Return { results: zeros })]
}

/// Zero value expression of `ty`. `declared` is the result's type as
/// written, used to spell composite zero values.
pub fn zero_value(program: &Program, ty: &Type, declared: Option<&Expr>) -> Expr {
    match ty {
        Type::Basic { basic } => basic_zero(*basic),
        Type::Named(named) => match program.underlying(named) {
            Some(Type::Struct { .. } | Type::Array { .. }) => composite_zero(declared),
            Some(underlying) => zero_value(program, underlying, declared),
            None => Expr::nil(),
        },
        Type::Struct { .. } | Type::Array { .. } => composite_zero(declared),
        Type::TypeParam { name, .. } => synthetic(ExprKind::Raw {
            text: format!("*new({})", name),
        }),
        Type::Pointer { .. }
        | Type::Slice { .. }
        | Type::Map { .. }
        | Type::Chan { .. }
        | Type::Signature(_)
        | Type::Interface { .. }
        | Type::Tuple { .. } => Expr::nil(),
    }
}

fn basic_zero(basic: BasicKind) -> Expr {
    match basic {
        BasicKind::Bool | BasicKind::UntypedBool => Expr::ident(NodeId::SYNTHETIC, "false"),
        BasicKind::String | BasicKind::UntypedString => synthetic(ExprKind::Lit {
            value: "\"\"".to_string(),
        }),
        BasicKind::UnsafePointer | BasicKind::UntypedNil => Expr::nil(),
        _ => synthetic(ExprKind::Lit {
            value: "0".to_string(),
        }),
    }
}

fn composite_zero(declared: Option<&Expr>) -> Expr {
    match declared {
        Some(declared) => synthetic(ExprKind::Composite {
            ty: Some(Box::new(declared.clone())),
            elts: Vec::new(),
            multiline: false,
            blank_before: Vec::new(),
            comments: Vec::new(),
        }),
        None => Expr::nil(),
    }
}

fn synthetic(kind: ExprKind) -> Expr {
    Expr::new(NodeId::SYNTHETIC, kind)
}

/// Apply every planned mutation and hand each modified file to the
/// serializer exactly once. Returns the paths written.
pub fn apply(
    program: &mut Program,
    mut plan: RewritePlan,
    serializer: &dyn Serializer,
) -> Result<Vec<PathBuf>> {
    let mut work: Vec<(&mut SourceFile, Vec<Mutation>)> = Vec::new();
    for (pkg_idx, pkg) in program.packages.iter_mut().enumerate() {
        for (file_idx, file) in pkg.files.iter_mut().enumerate() {
            let key = FileKey {
                package: pkg_idx,
                file: file_idx,
            };
            if let Some(mutations) = plan.files.remove(&key) {
                work.push((file, mutations));
            }
        }
    }

    let mut written: Vec<PathBuf> = work
        .into_par_iter()
        .map(|(file, mutations)| rewrite_file(file, &mutations, serializer))
        .collect::<Result<_>>()?;
    written.sort();
    Ok(written)
}

fn rewrite_file(
    file: &mut SourceFile,
    mutations: &[Mutation],
    serializer: &dyn Serializer,
) -> Result<PathBuf> {
    let _phase = set_phase(RunPhase::Rewrite);
    let _file = set_current_file(&file.path);

    let mut modified = file.clone();
    apply_mutations(&mut modified, mutations)?;

    {
        let _phase = set_phase(RunPhase::Serialize);
        serializer.write(&modified)?;
    }
    *file = modified;
    Ok(file.path.clone())
}

/// Apply mutations to one file tree. Fails if a target is missing.
pub fn apply_mutations(file: &mut SourceFile, mutations: &[Mutation]) -> Result<()> {
    let mut blanker = ValueBlanker {
        pending: HashSet::new(),
    };

    for mutation in mutations {
        match mutation {
            Mutation::BlankValue { value } => {
                blanker.pending.insert(*value);
            }
            Mutation::BlankBody { decl, body } => match file.decls.get_mut(*decl) {
                Some(Decl::Func(func)) => match &mut func.body {
                    Some(block) => *block = Block::new(body.clone()),
                    None => {
                        return Err(Error::rewrite(
                            &file.path,
                            format!("`{}` has no body", func.name.name),
                        ))
                    }
                },
                _ => {
                    return Err(Error::rewrite(
                        &file.path,
                        format!("declaration #{} is not a function", decl),
                    ))
                }
            },
        }
    }

    if !blanker.pending.is_empty() {
        for decl in &mut file.decls {
            if let Decl::Func(func) = decl {
                if let Some(body) = &mut func.body {
                    blanker.visit_block_mut(body);
                }
            }
        }
    }

    if let Some(missing) = blanker.pending.iter().min() {
        return Err(Error::rewrite(
            &file.path,
            format!("matched value node {} not found", missing.0),
        ));
    }
    Ok(())
}

struct ValueBlanker {
    pending: HashSet<NodeId>,
}

impl VisitMut for ValueBlanker {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if self.pending.remove(&expr.id) {
            *expr = Expr::nil();
            return;
        }
        walk_expr_mut(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::render_expr;
    use crate::types::{FunctionSignature, NamedRef};

    fn program_with_named(name: &str, underlying: Type) -> Program {
        let mut program = Program::default();
        program
            .named
            .insert(("example.com/p".into(), name.into()), underlying);
        program
    }

    #[test]
    fn test_zero_values_by_kind() {
        let program = Program::default();
        let zero = |ty: Type| render_expr(&zero_value(&program, &ty, None));
        assert_eq!(zero(Type::error()), "nil");
        assert_eq!(zero(Type::pointer(Type::named("x", "Y"))), "nil");
        assert_eq!(zero(Type::basic(BasicKind::Int64)), "0");
        assert_eq!(zero(Type::basic(BasicKind::String)), "\"\"");
        assert_eq!(zero(Type::basic(BasicKind::Bool)), "false");
        assert_eq!(zero(Type::Signature(FunctionSignature::default())), "nil");
    }

    #[test]
    fn test_named_struct_zero_uses_declared_spelling() {
        let program = program_with_named("Status", Type::Struct { fields: Vec::new() });
        let declared = Expr::new(
            NodeId(5),
            ExprKind::Selector {
                x: Box::new(Expr::ident(NodeId(6), "p")),
                sel: crate::ast::Ident::new(NodeId(7), "Status"),
            },
        );
        let ty = Type::Named(NamedRef::new("example.com/p", "Status"));
        assert_eq!(render_expr(&zero_value(&program, &ty, Some(&declared))), "p.Status{}");
    }

    #[test]
    fn test_named_basic_zero_follows_underlying() {
        let program = program_with_named("Mode", Type::basic(BasicKind::String));
        let ty = Type::Named(NamedRef::new("example.com/p", "Mode"));
        assert_eq!(render_expr(&zero_value(&program, &ty, None)), "\"\"");
    }

    #[test]
    fn test_sentinel_body_without_results_is_empty() {
        assert!(sentinel_body(&Program::default(), &[], &[]).is_empty());
    }

    #[test]
    fn test_sentinel_body_returns_each_result() {
        let body = sentinel_body(
            &Program::default(),
            &[Type::basic(BasicKind::Int), Type::error()],
            &[],
        );
        assert_eq!(render_stmts(&body), "return 0, nil");
    }
}
