//! Canonical source rendering.
//!
//! Output follows gofmt conventions for the constructs the tree models:
//! tab indentation, a blank line between top-level declarations, author
//! blank lines between statements kept (collapsed to one), one element
//! per line in multi-line composite literals with keys aligned within a
//! run of single-line elements. Raw text is emitted verbatim, re-indented
//! to its new depth.
//!
//! Comments ride on statements and composite elements. A leading comment
//! line ends the alignment section above it, and trailing comments line
//! up across consecutive single-line rows.

use crate::ast::{
    element_comments, Block, Comments, Decl, ElementComments, Expr, ExprKind, Field, FuncDecl,
    FuncType, ImportSpec, SourceFile, Span, Stmt, StmtKind,
};

/// Render a whole file.
pub fn render_file(file: &SourceFile) -> String {
    let mut p = Printer::default();
    p.file(file);
    p.out
}

pub fn render_expr(expr: &Expr) -> String {
    let mut p = Printer::default();
    p.expr(expr);
    p.out
}

pub fn render_stmt(stmt: &Stmt) -> String {
    let mut p = Printer::default();
    p.stmt(stmt);
    p.out
}

/// Render a block's statements, one per line, without braces.
pub fn render_stmts(stmts: &[Stmt]) -> String {
    stmts.iter().map(render_stmt).collect::<Vec<_>>().join("\n")
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn at_indent(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
        }
    }

    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    /// Write possibly multi-line raw text at the current position; lines
    /// after the first are placed at the current indentation.
    fn write_raw(&mut self, text: &str) {
        let mut lines = text.lines();
        if let Some(first) = lines.next() {
            self.write(first.trim_end());
        }
        for line in lines {
            self.newline();
            let line = line.trim_end();
            if !line.is_empty() {
                self.write_indent();
                self.write(line);
            }
        }
    }

    fn file(&mut self, file: &SourceFile) {
        for line in &file.header {
            self.write(line);
            self.newline();
        }
        if !file.header.is_empty() {
            self.newline();
        }
        self.write("package ");
        self.write(&file.package);
        self.newline();
        self.imports(&file.imports);
        for decl in &file.decls {
            self.newline();
            self.decl(decl);
            self.newline();
        }
    }

    fn imports(&mut self, imports: &[ImportSpec]) {
        match imports {
            [] => {}
            [single] => {
                self.newline();
                self.write("import ");
                self.import_spec(single);
                self.newline();
            }
            many => {
                self.newline();
                self.write("import (");
                self.newline();
                let mut prev: Option<Span> = None;
                for spec in many {
                    if has_gap(prev, spec.span) {
                        self.newline();
                    }
                    self.write("\t");
                    self.import_spec(spec);
                    self.newline();
                    prev = spec.span;
                }
                self.write(")");
                self.newline();
            }
        }
    }

    fn import_spec(&mut self, spec: &ImportSpec) {
        if let Some(name) = &spec.name {
            self.write(name);
            self.write(" ");
        }
        self.write("\"");
        self.write(&spec.path);
        self.write("\"");
    }

    /// Comment lines, each on its own line at the current indentation.
    fn doc(&mut self, doc: &[String]) {
        for line in doc {
            self.write_indent();
            self.write_raw(line);
            self.newline();
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(func) => self.func_decl(func),
            Decl::Other(raw) => {
                self.doc(&raw.doc);
                self.write_raw(&raw.text);
            }
        }
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.doc(&func.doc);
        self.write("func ");
        if let Some(recv) = &func.recv {
            self.write("(");
            self.field(recv);
            self.write(") ");
        }
        self.write(&func.name.name);
        self.signature(&func.ty);
        if let Some(body) = &func.body {
            self.write(" ");
            self.block(body);
        }
    }

    fn signature(&mut self, ty: &FuncType) {
        self.write("(");
        self.fields(&ty.params);
        self.write(")");
        match ty.results.as_slice() {
            [] => {}
            [single] if single.names.is_empty() => {
                self.write(" ");
                self.expr(&single.ty);
            }
            results => {
                self.write(" (");
                self.fields(results);
                self.write(")");
            }
        }
    }

    fn fields(&mut self, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.field(field);
        }
    }

    fn field(&mut self, field: &Field) {
        if !field.names.is_empty() {
            let names: Vec<&str> = field.names.iter().map(|n| n.name.as_str()).collect();
            self.write(&names.join(", "));
            self.write(" ");
        }
        self.expr(&field.ty);
    }

    fn block(&mut self, block: &Block) {
        self.write("{");
        self.newline();
        self.indent += 1;
        let mut prev: Option<Span> = None;
        let rows: Vec<Row> = block
            .stmts
            .iter()
            .map(|stmt| {
                // The gap is measured to the first leading comment line.
                let start = stmt.span.map(|span| Span {
                    line: span.line.saturating_sub(stmt.comments.leading_lines()),
                    end_line: span.end_line,
                });
                let gap = has_gap(prev, start);
                prev = stmt.span;
                let mut p = Printer::at_indent(self.indent);
                p.stmt(stmt);
                Row {
                    text: p.out,
                    gap,
                    comments: Some(&stmt.comments),
                }
            })
            .collect();
        self.rows(&rows);
        self.doc(&block.closing);
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    /// One line item per row, with its comments.
    fn rows(&mut self, rows: &[Row]) {
        let columns = trailing_columns(rows);
        for (i, row) in rows.iter().enumerate() {
            if i > 0 && row.gap {
                self.newline();
            }
            self.doc(row.leading());
            self.write_indent();
            self.write(&row.text);
            if let Some(comment) = row.trailing() {
                let pad = columns[i].saturating_sub(last_line_width(&row.text)).max(1);
                self.write(&" ".repeat(pad));
                self.write(comment);
            }
            self.newline();
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr { expr } => self.expr(expr),
            StmtKind::Return { results } => {
                self.write("return");
                if !results.is_empty() {
                    self.write(" ");
                    self.expr_list(results);
                }
            }
            StmtKind::Assign { lhs, op, rhs } => {
                self.expr_list(lhs);
                self.write(" ");
                self.write(op);
                self.write(" ");
                self.expr_list(rhs);
            }
            StmtKind::If { .. } => self.if_stmt(stmt),
            StmtKind::For { header, body } => {
                self.write("for ");
                if !header.is_empty() {
                    self.write(header);
                    self.write(" ");
                }
                self.block(body);
            }
            StmtKind::Block { block } => self.block(block),
            StmtKind::Raw { text } => self.write_raw(text),
        }
    }

    fn if_stmt(&mut self, stmt: &Stmt) {
        let StmtKind::If {
            init,
            cond,
            then,
            els,
        } = &stmt.kind
        else {
            return self.stmt(stmt);
        };
        self.write("if ");
        if let Some(init) = init {
            self.stmt(init);
            self.write("; ");
        }
        self.expr(cond);
        self.write(" ");
        self.block(then);
        if let Some(els) = els {
            self.write(" else ");
            self.stmt(els);
        }
    }

    fn expr_list(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(expr);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident { name } => self.write(name),
            ExprKind::Selector { x, sel } => {
                self.expr(x);
                self.write(".");
                self.write(&sel.name);
            }
            ExprKind::Star { x } => {
                self.write("*");
                self.expr(x);
            }
            ExprKind::Unary { op, x } => {
                self.write(op);
                self.expr(x);
            }
            ExprKind::Binary { op, x, y } => {
                self.expr(x);
                self.write(" ");
                self.write(op);
                self.write(" ");
                self.expr(y);
            }
            ExprKind::Call {
                fun,
                args,
                ellipsis,
            } => {
                self.expr(fun);
                self.write("(");
                self.expr_list(args);
                if *ellipsis {
                    self.write("...");
                }
                self.write(")");
            }
            ExprKind::Composite {
                ty,
                elts,
                multiline,
                blank_before,
                comments,
            } => {
                if let Some(ty) = ty {
                    self.expr(ty);
                }
                if *multiline && (!elts.is_empty() || !comments.is_empty()) {
                    self.composite_lines(elts, blank_before, comments);
                } else {
                    self.write("{");
                    self.expr_list(elts);
                    self.write("}");
                }
            }
            ExprKind::KeyValue { key, value } => {
                self.expr(key);
                self.write(": ");
                self.expr(value);
            }
            ExprKind::FuncLit { ty, body } => {
                self.write("func");
                self.signature(ty);
                self.write(" ");
                self.block(body);
            }
            ExprKind::FuncType { ty } => {
                self.write("func");
                self.signature(ty);
            }
            ExprKind::Index { x, index } => {
                self.expr(x);
                self.write("[");
                self.expr(index);
                self.write("]");
            }
            ExprKind::Paren { x } => {
                self.write("(");
                self.expr(x);
                self.write(")");
            }
            ExprKind::Lit { value } => self.write(value),
            ExprKind::Raw { text } => self.write_raw(text),
        }
    }

    fn composite_lines(
        &mut self,
        elts: &[Expr],
        blank_before: &[usize],
        comments: &[ElementComments],
    ) {
        self.write("{");
        self.newline();
        self.indent += 1;

        let rendered: Vec<Element> = elts
            .iter()
            .map(|elt| Element::render(elt, self.indent))
            .collect();
        let rows: Vec<Row> = (0..elts.len())
            .map(|i| Row {
                text: String::new(),
                gap: blank_before.contains(&i),
                comments: element_comments(comments, i),
            })
            .collect();
        let detached: Vec<bool> = rows.iter().map(Row::detached).collect();
        let widths = key_widths(&rendered, &detached);

        let rows: Vec<Row> = rows
            .into_iter()
            .zip(&rendered)
            .enumerate()
            .map(|(i, (row, elt))| {
                let text = match &elt.key {
                    Some(key) => {
                        let pad = widths[i].saturating_sub(key.len()) + 1;
                        format!("{}:{}{},", key, " ".repeat(pad), elt.value)
                    }
                    None => format!("{},", elt.value),
                };
                Row { text, ..row }
            })
            .collect();
        self.rows(&rows);

        if let Some(closing) = element_comments(comments, elts.len()) {
            if !elts.is_empty() && blank_before.contains(&elts.len()) {
                self.newline();
            }
            self.doc(&closing.leading);
        }

        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }
}

/// A composite element rendered at its final indentation.
struct Element {
    key: Option<String>,
    value: String,
}

impl Element {
    fn render(elt: &Expr, indent: usize) -> Self {
        let sub = |e: &Expr| {
            let mut p = Printer::at_indent(indent);
            p.expr(e);
            p.out
        };
        match &elt.kind {
            ExprKind::KeyValue { key, value } => Self {
                key: Some(sub(key)),
                value: sub(value),
            },
            _ => Self {
                key: None,
                value: sub(elt),
            },
        }
    }

    fn aligns(&self) -> bool {
        self.key.is_some() && !self.value.contains('\n')
    }
}

/// A statement or composite element rendered at its final indentation,
/// without its comments.
struct Row<'a> {
    text: String,
    /// A blank line separates it from the row above.
    gap: bool,
    comments: Option<&'a Comments>,
}

impl Row<'_> {
    fn leading(&self) -> &[String] {
        self.comments.map_or(Default::default(), |c| c.leading.as_slice())
    }

    fn trailing(&self) -> Option<&str> {
        self.comments.and_then(|c| c.trailing.as_deref())
    }

    /// Starts a new alignment section.
    fn detached(&self) -> bool {
        self.gap || !self.leading().is_empty()
    }
}

/// Column of each row's trailing comment: one past the widest row of the
/// run of consecutive single-line commented rows it belongs to. Zero for
/// rows outside any run.
fn trailing_columns(rows: &[Row]) -> Vec<usize> {
    let aligns = |row: &Row| row.trailing().is_some() && !row.text.contains('\n');
    let mut columns = vec![0; rows.len()];
    let mut start = 0;
    while start < rows.len() {
        if !aligns(&rows[start]) {
            start += 1;
            continue;
        }
        let mut end = start + 1;
        while end < rows.len() && aligns(&rows[end]) && !rows[end].detached() {
            end += 1;
        }
        let column = rows[start..end]
            .iter()
            .map(|row| last_line_width(&row.text))
            .max()
            .unwrap_or(0)
            + 1;
        columns[start..end].iter_mut().for_each(|c| *c = column);
        start = end;
    }
    columns
}

fn last_line_width(text: &str) -> usize {
    text.rsplit('\n').next().map_or(0, |line| line.chars().count())
}

/// Alignment width for each element: the widest key of the run of
/// consecutive single-line keyed elements it belongs to. A detached
/// element starts a new run.
fn key_widths(elts: &[Element], detached: &[bool]) -> Vec<usize> {
    let mut widths = vec![0; elts.len()];
    let mut start = 0;
    while start < elts.len() {
        if !elts[start].aligns() {
            widths[start] = elts[start].key.as_ref().map_or(0, String::len);
            start += 1;
            continue;
        }
        let mut end = start + 1;
        while end < elts.len() && elts[end].aligns() && !detached[end] {
            end += 1;
        }
        let width = elts[start..end]
            .iter()
            .filter_map(|e| e.key.as_ref().map(String::len))
            .max()
            .unwrap_or(0);
        widths[start..end].iter_mut().for_each(|w| *w = width);
        start = end;
    }
    widths
}

fn has_gap(prev: Option<Span>, next: Option<Span>) -> bool {
    match (prev, next) {
        (Some(prev), Some(next)) => next.line > prev.end_line + 1,
        _ => false,
    }
}
