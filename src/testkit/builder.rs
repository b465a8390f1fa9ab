//! Fluent construction of typed programs for tests.

use crate::ast::{
    Block, Comments, Decl, ElementComments, Expr, ExprKind, Field, FuncDecl, FuncType, Ident,
    ImportSpec, NodeId, SourceFile, Span, Stmt, StmtKind,
};
use crate::program::{Object, ObjectId, ObjectKind, Package, Program};
use crate::registry::{DESCRIPTOR_REFERENCE, OPERATION_REFERENCE};
use crate::types::{FunctionSignature, Type};
use std::path::PathBuf;

/// Module path every builder-made program lives under.
pub const MODULE: &str = "example.com/terraform-provider";

const SCHEMA: &str = "github.com/hashicorp/terraform-plugin-sdk/v2/helper/schema";

fn pluginsdk_path() -> String {
    format!("{}/internal/tf/pluginsdk", MODULE)
}

fn sdk_path() -> String {
    format!("{}/internal/sdk", MODULE)
}

/// `func(ctx context.Context, d *pluginsdk.ResourceData, meta interface{}) error`
pub fn descriptor_signature() -> FunctionSignature {
    FunctionSignature::new(
        vec![
            Type::named("context", "Context"),
            Type::pointer(Type::named(SCHEMA, "ResourceData")),
            Type::empty_interface(),
        ],
        vec![Type::error()],
    )
}

/// `func(ctx context.Context, metadata sdk.ResourceMetaData) error`
pub fn operation_signature() -> FunctionSignature {
    FunctionSignature::new(
        vec![
            Type::named("context", "Context"),
            Type::named(sdk_path(), "ResourceMetaData"),
        ],
        vec![Type::error()],
    )
}

pub fn return_stmt(results: Vec<Expr>) -> Stmt {
    Stmt::new(StmtKind::Return { results })
}

pub fn raw_stmt(text: &str) -> Stmt {
    Stmt::new(StmtKind::Raw {
        text: text.to_string(),
    })
}

fn composite_comments(expr: &mut Expr) -> Option<&mut Vec<ElementComments>> {
    match &mut expr.kind {
        ExprKind::Unary { x, .. } => composite_comments(x),
        ExprKind::Composite { comments, .. } => Some(comments),
        _ => None,
    }
}

pub struct ProgramBuilder {
    program: Program,
    next_node: u32,
    next_object: u64,
    next_line: u32,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    /// A program holding the two reference SDK packages.
    pub fn new() -> Self {
        let mut builder = Self {
            program: Program::default(),
            next_node: 1,
            next_object: 1,
            next_line: 1,
        };
        let pluginsdk = builder.package(&pluginsdk_path(), "pluginsdk");
        builder.reference_type(pluginsdk, DESCRIPTOR_REFERENCE, descriptor_signature());
        let sdk = builder.package(&sdk_path(), "sdk");
        builder.reference_type(sdk, OPERATION_REFERENCE, operation_signature());
        builder
    }

    pub fn build(self) -> Program {
        self.program
    }

    pub fn node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    fn object_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        id
    }

    fn span(&mut self, lines: u32) -> Span {
        let span = Span::new(self.next_line, self.next_line + lines);
        self.next_line += lines + 2;
        span
    }

    // ---- packages and files ----

    pub fn package(&mut self, path: &str, name: &str) -> usize {
        self.program.packages.push(Package {
            path: path.to_string(),
            name: name.to_string(),
            files: Vec::new(),
            info: Default::default(),
            errors: Vec::new(),
        });
        self.program.packages.len() - 1
    }

    pub fn service_package(&mut self, name: &str) -> usize {
        self.package(&format!("{}/internal/services/{}", MODULE, name), name)
    }

    /// Add a file; its path is the package directory relative to the
    /// module root joined with `file_name`.
    pub fn add_file(&mut self, pkg: usize, file_name: &str) -> usize {
        let package = &mut self.program.packages[pkg];
        let dir = package
            .path
            .strip_prefix(MODULE)
            .unwrap_or(&package.path)
            .trim_start_matches('/');
        package.files.push(SourceFile {
            path: PathBuf::from(dir).join(file_name),
            package: package.name.clone(),
            header: Vec::new(),
            imports: Vec::new(),
            decls: Vec::new(),
        });
        package.files.len() - 1
    }

    pub fn file(&self, pkg: usize, file: usize) -> &SourceFile {
        &self.program.packages[pkg].files[file]
    }

    pub fn add_import(&mut self, pkg: usize, file: usize, path: &str) {
        self.program.packages[pkg].files[file].imports.push(ImportSpec {
            name: None,
            path: path.to_string(),
            span: None,
        });
    }

    pub fn push_decl(&mut self, pkg: usize, file: usize, decl: Decl) -> usize {
        let decls = &mut self.program.packages[pkg].files[file].decls;
        decls.push(decl);
        decls.len() - 1
    }

    pub fn func_mut(&mut self, pkg: usize, file: usize, decl: usize) -> &mut FuncDecl {
        match &mut self.program.packages[pkg].files[file].decls[decl] {
            Decl::Func(func) => func,
            Decl::Other(_) => panic!("declaration {} is not a function", decl),
        }
    }

    /// Attach comments to element `index` of the literal returned by the
    /// descriptor or operation declaration `decl`.
    pub fn comment_element(
        &mut self,
        pkg: usize,
        file: usize,
        decl: usize,
        index: usize,
        comments: Comments,
    ) {
        let func = self.func_mut(pkg, file, decl);
        let returned = func
            .body
            .as_mut()
            .and_then(|body| body.stmts.first_mut())
            .and_then(|stmt| match &mut stmt.kind {
                StmtKind::Return { results } => results.first_mut(),
                _ => None,
            })
            .and_then(composite_comments);
        match returned {
            Some(list) => list.push(ElementComments { index, comments }),
            None => panic!("declaration {} does not return a composite literal", decl),
        }
    }

    // ---- objects and bindings ----

    /// Register an object without any declaration in the program.
    pub fn declare_object(&mut self, pkg: usize, name: &str, kind: ObjectKind, ty: Type) -> ObjectId {
        let id = self.object_id();
        let package = self.program.packages[pkg].path.clone();
        self.program.objects.insert(
            id,
            Object {
                name: name.to_string(),
                kind,
                package,
                ty,
                alias: false,
            },
        );
        id
    }

    fn reference_type(&mut self, pkg: usize, name: &str, sig: FunctionSignature) {
        let path = self.program.packages[pkg].path.clone();
        let object = self.declare_object(pkg, name, ObjectKind::TypeName, Type::named(&path, name));
        let ident = self.node();
        self.program.packages[pkg].info.defs.insert(ident, object);
        self.program
            .named
            .insert((path, name.to_string()), Type::Signature(sig));
    }

    /// An identifier expression bound to `object`.
    pub fn reference(&mut self, pkg: usize, object: ObjectId) -> Expr {
        let name = self.program.objects[&object].name.clone();
        let expr = self.ident_expr(&name);
        self.program.packages[pkg].info.uses.insert(expr.id, object);
        expr
    }

    /// An identifier expression with a recorded type but no binding.
    pub fn typed_ident(&mut self, pkg: usize, name: &str, ty: Type) -> Expr {
        let expr = self.ident_expr(name);
        self.set_type(pkg, &expr, ty);
        expr
    }

    pub fn set_type(&mut self, pkg: usize, expr: &Expr, ty: Type) {
        self.program.packages[pkg].info.types.insert(expr.id, ty);
    }

    // ---- syntax ----

    pub fn ident(&mut self, name: &str) -> Ident {
        Ident::new(self.node(), name)
    }

    pub fn ident_expr(&mut self, name: &str) -> Expr {
        Expr::ident(self.node(), name)
    }

    pub fn qualified(&mut self, x: &str, sel: &str) -> Expr {
        let x = self.ident_expr(x);
        let sel = self.ident(sel);
        Expr::new(
            self.node(),
            ExprKind::Selector {
                x: Box::new(x),
                sel,
            },
        )
    }

    pub fn star(&mut self, x: Expr) -> Expr {
        Expr::new(self.node(), ExprKind::Star { x: Box::new(x) })
    }

    pub fn address_of(&mut self, x: Expr) -> Expr {
        Expr::new(
            self.node(),
            ExprKind::Unary {
                op: "&".to_string(),
                x: Box::new(x),
            },
        )
    }

    pub fn raw_expr(&mut self, text: &str) -> Expr {
        Expr::new(
            self.node(),
            ExprKind::Raw {
                text: text.to_string(),
            },
        )
    }

    pub fn key_value(&mut self, key: &str, value: Expr) -> Expr {
        let key = self.ident_expr(key);
        Expr::new(
            self.node(),
            ExprKind::KeyValue {
                key: Box::new(key),
                value: Box::new(value),
            },
        )
    }

    /// A multi-line composite literal.
    pub fn composite(&mut self, ty: Expr, elts: Vec<Expr>) -> Expr {
        Expr::new(
            self.node(),
            ExprKind::Composite {
                ty: Some(Box::new(ty)),
                elts,
                multiline: true,
                blank_before: Vec::new(),
                comments: Vec::new(),
            },
        )
    }

    /// A parameter or result field whose type is written as `ty`.
    pub fn field(&mut self, name: Option<&str>, ty: &str) -> Field {
        let names = name.map(|n| vec![self.ident(n)]).unwrap_or_default();
        Field {
            names,
            ty: self.raw_expr(ty),
        }
    }

    fn descriptor_params(&mut self) -> FuncType {
        FuncType {
            params: vec![
                self.field(Some("ctx"), "context.Context"),
                self.field(Some("d"), "*pluginsdk.ResourceData"),
                self.field(Some("meta"), "interface{}"),
            ],
            results: vec![self.field(None, "error")],
        }
    }

    fn operation_params(&mut self) -> FuncType {
        FuncType {
            params: vec![
                self.field(Some("ctx"), "context.Context"),
                self.field(Some("metadata"), "sdk.ResourceMetaData"),
            ],
            results: vec![self.field(None, "error")],
        }
    }

    /// `func name() <results> { body }` with unnamed results.
    pub fn func_decl(&mut self, name: &str, results: Vec<Expr>, body: Vec<Stmt>) -> FuncDecl {
        let span = self.span(body.len() as u32 + 1);
        FuncDecl {
            span: Some(span),
            doc: Vec::new(),
            recv: None,
            name: self.ident(name),
            ty: FuncType {
                params: Vec::new(),
                results: results
                    .into_iter()
                    .map(|ty| Field {
                        names: Vec::new(),
                        ty,
                    })
                    .collect(),
            },
            body: Some(Block::new(body)),
        }
    }

    /// Declare a function and bind its name to a new `Func` object.
    pub fn declare_func(
        &mut self,
        pkg: usize,
        file: usize,
        name: &str,
        ty: FuncType,
        sig: FunctionSignature,
        body: Vec<Stmt>,
    ) -> ObjectId {
        let object = self.declare_object(pkg, name, ObjectKind::Func, Type::Signature(sig));
        let span = self.span(body.len() as u32 + 1);
        let ident = self.ident(name);
        self.program.packages[pkg].info.defs.insert(ident.id, object);
        self.push_decl(
            pkg,
            file,
            Decl::Func(FuncDecl {
                span: Some(span),
                doc: Vec::new(),
                recv: None,
                name: ident,
                ty,
                body: Some(Block::new(body)),
            }),
        );
        object
    }

    /// A function with the descriptor-convention signature and a
    /// non-trivial body.
    pub fn declare_lifecycle_func(&mut self, pkg: usize, file: usize, name: &str) -> ObjectId {
        let ty = self.descriptor_params();
        let body = vec![
            raw_stmt("client := meta.(*clients.Client).Compute.FooClient"),
            raw_stmt("if err := client.Do(ctx, d.Id()); err != nil {\n\treturn err\n}"),
            return_stmt(vec![Expr::nil()]),
        ];
        self.declare_func(pkg, file, name, ty, descriptor_signature(), body)
    }

    /// An inline function literal typed with the descriptor signature.
    pub fn descriptor_literal(&mut self, pkg: usize, body: Vec<Stmt>) -> Expr {
        let ty = self.descriptor_params();
        let lit = Expr::new(
            self.node(),
            ExprKind::FuncLit {
                ty,
                body: Block::new(body),
            },
        );
        self.set_type(pkg, &lit, Type::Signature(descriptor_signature()));
        lit
    }

    /// An inline function literal typed with the operation signature.
    pub fn operation_literal(&mut self, pkg: usize, body: Vec<Stmt>) -> Expr {
        let ty = self.operation_params();
        let lit = Expr::new(
            self.node(),
            ExprKind::FuncLit {
                ty,
                body: Block::new(body),
            },
        );
        self.set_type(pkg, &lit, Type::Signature(operation_signature()));
        lit
    }

    /// `func name() *pluginsdk.Resource { return &pluginsdk.Resource{...} }`
    pub fn descriptor_resource(
        &mut self,
        pkg: usize,
        file: usize,
        name: &str,
        elements: Vec<(&str, Expr)>,
    ) -> usize {
        let resource = self.qualified("pluginsdk", "Resource");
        let result = self.star(resource);
        let body = self.descriptor_body(elements);
        let func = self.func_decl(name, vec![result], body);
        self.push_decl(pkg, file, Decl::Func(func))
    }

    fn descriptor_body(&mut self, elements: Vec<(&str, Expr)>) -> Vec<Stmt> {
        let elts = elements
            .into_iter()
            .map(|(key, value)| self.key_value(key, value))
            .collect();
        let ty = self.qualified("pluginsdk", "Resource");
        let lit = self.composite(ty, elts);
        let ret = self.address_of(lit);
        vec![return_stmt(vec![ret])]
    }

    /// `func (r Recv) Name() sdk.ResourceFunc { return sdk.ResourceFunc{...} }`
    pub fn operation_method(
        &mut self,
        pkg: usize,
        file: usize,
        recv: &str,
        name: &str,
        func_value: Expr,
    ) -> usize {
        let result = self.qualified("sdk", "ResourceFunc");
        let timeout = self.raw_expr("30 * time.Minute");
        let timeout = self.key_value("Timeout", timeout);
        let func = self.key_value("Func", func_value);
        let ty = self.qualified("sdk", "ResourceFunc");
        let lit = self.composite(ty, vec![timeout, func]);
        let mut decl = self.func_decl(name, vec![result], vec![return_stmt(vec![lit])]);
        decl.recv = Some(self.field(Some("r"), recv));
        self.push_decl(pkg, file, Decl::Func(decl))
    }
}
