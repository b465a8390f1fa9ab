//! Syntax tree of the Go sources being rewritten.
//!
//! The tree is produced by the semantic model provider and covers the
//! subset of Go the rewrite needs to see through: function declarations,
//! composite literals, function literals and the statements that can
//! contain them. Everything else travels as raw source text.
//!
//! Every expression and identifier carries a [`NodeId`] that keys the
//! type and binding tables in [`crate::program::TypesInfo`].
//!
//! Traversal follows the `syn::visit` layout: [`Visit`] for read-only
//! walks, [`VisitMut`] for in-place edits, each with free `walk_*`
//! functions that the trait defaults call.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Program-wide identifier of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id carried by nodes the rewriter synthesises. Never present in any
    /// type or binding table.
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);

    pub fn is_synthetic(self) -> bool {
        self == Self::SYNTHETIC
    }
}

/// First and last source line of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub end_line: u32,
}

impl Span {
    pub fn new(line: u32, end_line: u32) -> Self {
        Self { line, end_line }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    /// Comment lines preceding the package clause (license, build tags).
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub imports: Vec<ImportSpec>,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
    #[serde(default)]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decl {
    Func(FuncDecl),
    /// `var`, `const`, `type` declarations, kept verbatim.
    Other(RawDecl),
}

impl Decl {
    pub fn span(&self) -> Option<Span> {
        match self {
            Decl::Func(f) => f.span,
            Decl::Other(r) => r.span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDecl {
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub doc: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub recv: Option<Field>,
    pub name: Ident,
    #[serde(rename = "type")]
    pub ty: FuncType,
    #[serde(default)]
    pub body: Option<Block>,
}

impl FuncDecl {
    /// The single declared result type expression, if there is exactly one.
    pub fn sole_result(&self) -> Option<&Expr> {
        match self.ty.results.as_slice() {
            [field] if field.names.len() <= 1 => Some(&field.ty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuncType {
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub results: Vec<Field>,
}

impl FuncType {
    /// Number of result values, counting each name of a grouped field.
    pub fn result_count(&self) -> usize {
        self.results.iter().map(|f| f.names.len().max(1)).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub names: Vec<Ident>,
    #[serde(rename = "type")]
    pub ty: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
}

impl Ident {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Comments attached to a statement or a composite element. Each entry
/// is the comment's source text, markers included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comments {
    /// Comment lines directly above the node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leading: Vec<String>,
    /// Comment following the node on its last line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing: Option<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_none()
    }

    /// Source lines taken by the leading comments.
    pub fn leading_lines(&self) -> u32 {
        self.leading.iter().map(|c| c.lines().count().max(1) as u32).sum()
    }
}

/// Comments of the composite element at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementComments {
    pub index: usize,
    #[serde(flatten)]
    pub comments: Comments,
}

/// Comments of element `index`, if it has any.
pub fn element_comments(list: &[ElementComments], index: usize) -> Option<&Comments> {
    list.iter().find(|c| c.index == index).map(|c| &c.comments)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    /// Comment lines after the last statement, before the closing brace.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub closing: Vec<String>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            stmts,
            closing: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default, skip_serializing_if = "Comments::is_empty")]
    pub comments: Comments,
    #[serde(flatten)]
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            span: None,
            comments: Comments::default(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StmtKind {
    Expr {
        expr: Expr,
    },
    Return {
        #[serde(default)]
        results: Vec<Expr>,
    },
    Assign {
        lhs: Vec<Expr>,
        op: String,
        rhs: Vec<Expr>,
    },
    If {
        #[serde(default)]
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        #[serde(default)]
        els: Option<Box<Stmt>>,
    },
    /// `for` / `range` loop; the header between `for` and `{` is raw.
    For {
        header: String,
        body: Block,
    },
    Block {
        block: Block,
    },
    /// Statement the tree does not model, kept verbatim. Continuation
    /// lines carry indentation relative to the first line.
    Raw {
        text: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: ExprKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    Ident {
        name: String,
    },
    /// `x.sel`; `sel` carries its own id for binding lookups.
    Selector {
        x: Box<Expr>,
        sel: Ident,
    },
    /// `*x` as a pointer type or dereference.
    Star {
        x: Box<Expr>,
    },
    Unary {
        op: String,
        x: Box<Expr>,
    },
    Binary {
        op: String,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    Call {
        fun: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        ellipsis: bool,
    },
    Composite {
        #[serde(default, rename = "type")]
        ty: Option<Box<Expr>>,
        #[serde(default)]
        elts: Vec<Expr>,
        /// The literal spanned several lines in the source.
        #[serde(default)]
        multiline: bool,
        /// Indices of elements preceded by a blank line in the source.
        /// The blank line goes above the element's leading comments.
        #[serde(default)]
        blank_before: Vec<usize>,
        /// Comments of the elements that have any. Leading comments at
        /// index `elts.len()` sit before the closing brace.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        comments: Vec<ElementComments>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    FuncLit {
        #[serde(rename = "type")]
        ty: FuncType,
        body: Block,
    },
    FuncType {
        #[serde(rename = "type")]
        ty: FuncType,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Paren {
        x: Box<Expr>,
    },
    /// Basic literal: number, string, rune.
    Lit {
        value: String,
    },
    /// Expression the tree does not model, kept verbatim.
    Raw {
        text: String,
    },
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    pub fn ident(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, ExprKind::Ident { name: name.into() })
    }

    /// The untyped `nil` the rewriter substitutes for blanked functions.
    pub fn nil() -> Self {
        Self::ident(NodeId::SYNTHETIC, "nil")
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    /// Matches `pkg.Name` where `pkg` is a bare identifier.
    pub fn as_qualified(&self) -> Option<(&str, &str)> {
        match &self.kind {
            ExprKind::Selector { x, sel } => x.as_ident().map(|q| (q, sel.name.as_str())),
            _ => None,
        }
    }

    pub fn is_func_lit(&self) -> bool {
        matches!(self.kind, ExprKind::FuncLit { .. })
    }
}

/// Read-only traversal over the tree.
pub trait Visit<'ast> {
    fn visit_decl(&mut self, decl: &'ast Decl) {
        walk_decl(self, decl);
    }

    fn visit_func_decl(&mut self, func: &'ast FuncDecl) {
        walk_func_decl(self, func);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_decl<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, decl: &'ast Decl) {
    if let Decl::Func(func) = decl {
        v.visit_func_decl(func);
    }
}

pub fn walk_func_decl<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, func: &'ast FuncDecl) {
    if let Some(body) = &func.body {
        v.visit_block(body);
    }
}

pub fn walk_block<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, block: &'ast Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, stmt: &'ast Stmt) {
    match &stmt.kind {
        StmtKind::Expr { expr } => v.visit_expr(expr),
        StmtKind::Return { results } => results.iter().for_each(|e| v.visit_expr(e)),
        StmtKind::Assign { lhs, rhs, .. } => {
            lhs.iter().chain(rhs).for_each(|e| v.visit_expr(e));
        }
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(cond);
            v.visit_block(then);
            if let Some(els) = els {
                v.visit_stmt(els);
            }
        }
        StmtKind::For { body, .. } => v.visit_block(body),
        StmtKind::Block { block } => v.visit_block(block),
        StmtKind::Raw { .. } => {}
    }
}

pub fn walk_expr<'ast, V: Visit<'ast> + ?Sized>(v: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Selector { x, .. }
        | ExprKind::Star { x }
        | ExprKind::Unary { x, .. }
        | ExprKind::Paren { x } => v.visit_expr(x),
        ExprKind::Binary { x, y, .. } => {
            v.visit_expr(x);
            v.visit_expr(y);
        }
        ExprKind::Call { fun, args, .. } => {
            v.visit_expr(fun);
            args.iter().for_each(|a| v.visit_expr(a));
        }
        ExprKind::Composite { ty, elts, .. } => {
            if let Some(ty) = ty {
                v.visit_expr(ty);
            }
            elts.iter().for_each(|e| v.visit_expr(e));
        }
        ExprKind::KeyValue { key, value } => {
            v.visit_expr(key);
            v.visit_expr(value);
        }
        ExprKind::FuncLit { body, .. } => v.visit_block(body),
        ExprKind::Index { x, index } => {
            v.visit_expr(x);
            v.visit_expr(index);
        }
        ExprKind::Ident { .. }
        | ExprKind::FuncType { .. }
        | ExprKind::Lit { .. }
        | ExprKind::Raw { .. } => {}
    }
}

/// In-place traversal over the tree.
pub trait VisitMut {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Expr { expr } => v.visit_expr_mut(expr),
        StmtKind::Return { results } => results.iter_mut().for_each(|e| v.visit_expr_mut(e)),
        StmtKind::Assign { lhs, rhs, .. } => {
            lhs.iter_mut().chain(rhs.iter_mut()).for_each(|e| v.visit_expr_mut(e));
        }
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(cond);
            v.visit_block_mut(then);
            if let Some(els) = els {
                v.visit_stmt_mut(els);
            }
        }
        StmtKind::For { body, .. } => v.visit_block_mut(body),
        StmtKind::Block { block } => v.visit_block_mut(block),
        StmtKind::Raw { .. } => {}
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Selector { x, .. }
        | ExprKind::Star { x }
        | ExprKind::Unary { x, .. }
        | ExprKind::Paren { x } => v.visit_expr_mut(x),
        ExprKind::Binary { x, y, .. } => {
            v.visit_expr_mut(x);
            v.visit_expr_mut(y);
        }
        ExprKind::Call { fun, args, .. } => {
            v.visit_expr_mut(fun);
            args.iter_mut().for_each(|a| v.visit_expr_mut(a));
        }
        ExprKind::Composite { ty, elts, .. } => {
            if let Some(ty) = ty {
                v.visit_expr_mut(ty);
            }
            elts.iter_mut().for_each(|e| v.visit_expr_mut(e));
        }
        ExprKind::KeyValue { key, value } => {
            v.visit_expr_mut(key);
            v.visit_expr_mut(value);
        }
        ExprKind::FuncLit { body, .. } => v.visit_block_mut(body),
        ExprKind::Index { x, index } => {
            v.visit_expr_mut(x);
            v.visit_expr_mut(index);
        }
        ExprKind::Ident { .. }
        | ExprKind::FuncType { .. }
        | ExprKind::Lit { .. }
        | ExprKind::Raw { .. } => {}
    }
}
