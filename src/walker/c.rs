//! C walker, grounded on the member-access/call-extraction style of
//! the teacher's C++ walker, generalized to emit [`Occurrence`]
//! records against the shared contract of spec §4.4.3, plus the
//! C-specific label/goto and preprocessor handlers of §4.4.3.

use tree_sitter::{Language, Node};

use crate::model::{Occurrence, OccurrenceContext};
use crate::parse::NodeKindIds;

use super::{named_children, process_children, WalkerContext};

const NODE_KINDS: &[&str] = &[
    "function_definition",
    "declaration",
    "call_expression",
    "field_expression",
    "if_statement",
    "while_statement",
    "do_statement",
    "for_statement",
    "switch_statement",
    "case_statement",
    "return_statement",
    "labeled_statement",
    "goto_statement",
    "preproc_def",
    "preproc_function_def",
    "preproc_ifdef",
    "preproc_if",
    "comment",
    "string_literal",
    "identifier",
    "pointer_declarator",
    "function_declarator",
    "parameter_declaration",
    "init_declarator",
    "primitive_type",
    "struct_specifier",
    "union_specifier",
    "enum_specifier",
    "sized_type_specifier",
    "type_identifier",
];

pub fn language() -> Language {
    tree_sitter_c::LANGUAGE.into()
}

pub fn node_kind_ids() -> NodeKindIds {
    NodeKindIds::build(&language(), NODE_KINDS)
}

pub fn walk(ctx: &mut WalkerContext, root: Node) {
    ctx.emit_filename();
    visit_node(ctx, root);
}

fn visit_node(ctx: &mut WalkerContext, node: Node) {
    let sym = node.kind_id();
    let ids = ctx.ids;

    if sym == ids.get("function_definition") {
        handle_function_definition(ctx, node);
    } else if sym == ids.get("declaration") {
        handle_declaration(ctx, node);
    } else if sym == ids.get("labeled_statement") {
        handle_labeled_statement(ctx, node);
    } else if sym == ids.get("goto_statement") {
        handle_goto_statement(ctx, node);
    } else if sym == ids.get("preproc_def") {
        handle_preproc_def(ctx, node);
    } else if sym == ids.get("preproc_function_def") {
        handle_preproc_function_def(ctx, node);
    } else if sym == ids.get("preproc_ifdef") {
        handle_preproc_conditional(ctx, node, "ifdef");
    } else if sym == ids.get("preproc_if") {
        handle_preproc_conditional(ctx, node, "if");
    } else if sym == ids.get("comment") {
        ctx.emit_cleaned_words(node, OccurrenceContext::Comment);
    } else if sym == ids.get("string_literal") {
        ctx.emit_cleaned_words(node, OccurrenceContext::String);
    } else if sym == ids.get("if_statement")
        || sym == ids.get("while_statement")
        || sym == ids.get("do_statement")
        || sym == ids.get("for_statement")
        || sym == ids.get("switch_statement")
        || sym == ids.get("case_statement")
        || sym == ids.get("return_statement")
    {
        handle_control_flow(ctx, node);
    } else if sym == ids.get("call_expression") {
        handle_call_statement(ctx, node);
    } else if sym == ids.get("field_expression") {
        handle_field_expression(ctx, node);
    } else {
        process_children(node, |child| visit_node(ctx, child));
    }
}

/// Expression-position recursion: extracts references (calls, field
/// access) rather than definitions, per spec §4.4.2.
fn visit_expression(ctx: &mut WalkerContext, node: Node) {
    let ids = ctx.ids;
    let sym = node.kind_id();

    if sym == ids.get("call_expression") {
        handle_call_expression(ctx, node, None);
    } else if sym == ids.get("field_expression") {
        handle_field_expression(ctx, node);
    } else {
        process_children(node, |child| visit_expression(ctx, child));
    }
}

fn handle_function_definition(ctx: &mut WalkerContext, node: Node) {
    let Some(declarator) = node.child_by_field_name("declarator") else {
        return;
    };
    let Some((name_node, fn_declarator)) = function_name(declarator) else {
        return;
    };

    let name = ctx.text(name_node).to_owned();
    let return_type = declared_type(ctx, node.child_by_field_name("type"), declarator);
    let location = ctx.location(node);
    let line = ctx.line(node);

    let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Function, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    if let Some(ty) = return_type {
        occurrence = occurrence.with_type(ty);
    }
    ctx.emit(occurrence);

    if let Some(params) = fn_declarator.child_by_field_name("parameters") {
        for param in named_children(params) {
            if param.kind() == "parameter_declaration" {
                handle_parameter(ctx, param);
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        process_children(body, |child| visit_node(ctx, child));
    }
}

/// Walks down through `pointer_declarator`/`function_declarator`
/// wrappers to find the identifier naming the function, and returns
/// both the identifier and the innermost `function_declarator` (which
/// carries the parameter list).
fn function_name<'a>(declarator: Node<'a>) -> Option<(Node<'a>, Node<'a>)> {
    match declarator.kind() {
        "function_declarator" => {
            let inner = declarator.child_by_field_name("declarator")?;
            let name = identifier_of(inner)?;
            Some((name, declarator))
        }
        "pointer_declarator" => {
            let inner = declarator.child_by_field_name("declarator")?;
            function_name(inner)
        }
        _ => None,
    }
}

fn identifier_of(node: Node) -> Option<Node> {
    match node.kind() {
        "identifier" => Some(node),
        "pointer_declarator" => identifier_of(node.child_by_field_name("declarator")?),
        _ => None,
    }
}

fn handle_parameter(ctx: &mut WalkerContext, param: Node) {
    let Some(declarator) = param.child_by_field_name("declarator") else {
        return;
    };
    let Some(name_node) = identifier_of(declarator) else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let ty = declared_type(ctx, param.child_by_field_name("type"), declarator);
    let location = ctx.location(param);
    let line = ctx.line(param);

    let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Argument, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    if let Some(ty) = ty {
        occurrence = occurrence.with_type(ty);
    }
    ctx.emit(occurrence);
}

/// Combine a base type node (`primitive_type`, `type_identifier`,
/// `struct_specifier`, ...) with the pointer nesting found by walking
/// `declarator`, producing e.g. `char *` for `char *p`.
fn declared_type(ctx: &WalkerContext, type_node: Option<Node>, declarator: Node) -> Option<String> {
    let base = type_node.map(|n| base_type_text(ctx, n))?;
    let stars = count_pointer_stars(declarator);
    if stars == 0 {
        Some(base)
    } else {
        Some(format!("{base} {}", "*".repeat(stars)))
    }
}

fn base_type_text(ctx: &WalkerContext, node: Node) -> String {
    match node.kind() {
        "primitive_type" | "type_identifier" | "sized_type_specifier" => ctx.text(node).to_owned(),
        "struct_specifier" => "struct".to_owned(),
        "union_specifier" => "union".to_owned(),
        "enum_specifier" => "enum".to_owned(),
        other => {
            ctx.report_grammar_drift(node, other);
            ctx.text(node).to_owned()
        }
    }
}

fn count_pointer_stars(mut node: Node) -> usize {
    let mut stars = 0;
    while node.kind() == "pointer_declarator" {
        stars += 1;
        match node.child_by_field_name("declarator") {
            Some(inner) => node = inner,
            None => break,
        }
    }
    stars
}

fn handle_declaration(ctx: &mut WalkerContext, node: Node) {
    let Some(type_node) = node.child_by_field_name("type") else {
        process_children(node, |child| visit_node(ctx, child));
        return;
    };

    let mut cursor = node.walk();
    for child in node.children_by_field_name("declarator", &mut cursor) {
        let (declarator, init_value) = match child.kind() {
            "init_declarator" => (
                child.child_by_field_name("declarator").unwrap_or(child),
                child.child_by_field_name("value"),
            ),
            _ => (child, None),
        };

        let Some(name_node) = identifier_of(declarator) else {
            continue;
        };
        let name = ctx.text(name_node).to_owned();
        if name == "_" {
            continue;
        }
        let ty = declared_type(ctx, Some(type_node), declarator);
        let location = ctx.location(node);
        let line = ctx.line(node);

        let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone())
            .as_definition(location);
        if let Some(ty) = ty {
            occurrence = occurrence.with_type(ty);
        }
        ctx.emit(occurrence);

        if let Some(value) = init_value {
            visit_expression(ctx, value);
        }
    }
}

/// `if`/`while`/`do`/`for`/`switch`/`case`/`return` (spec §4.4.3):
/// recurse into condition/value children via [`visit_expression`] and
/// body children via [`visit_node`]; emit no occurrences of their own.
fn handle_control_flow(ctx: &mut WalkerContext, node: Node) {
    for child in named_children(node) {
        if is_statement_kind(child.kind()) {
            visit_node(ctx, child);
        } else {
            visit_expression(ctx, child);
        }
    }
}

fn is_statement_kind(kind: &str) -> bool {
    kind.ends_with("_statement") || kind == "compound_statement"
}

fn handle_labeled_statement(ctx: &mut WalkerContext, node: Node) {
    let Some(label) = node.child_by_field_name("label") else {
        return;
    };
    let name = ctx.text(label).to_owned();
    let location = ctx.location(label);
    let line = ctx.line(label);

    let occurrence = Occurrence::new(name, line, OccurrenceContext::Label, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    ctx.emit(occurrence);

    if let Some(stmt) = node.child_by_field_name("statement") {
        visit_node(ctx, stmt);
    }
}

fn handle_goto_statement(ctx: &mut WalkerContext, node: Node) {
    let Some(label) = named_children(node).into_iter().find(|n| n.kind() == "statement_identifier" || n.kind() == "identifier") else {
        return;
    };
    let name = ctx.text(label).to_owned();
    let line = ctx.line(node);
    ctx.emit(Occurrence::new(name, line, OccurrenceContext::Goto, ctx.directory.clone(), ctx.filename.clone()));
}

/// `#define X` / function-like `#define X(a,b)` (spec §4.4.3).
fn handle_preproc_def(ctx: &mut WalkerContext, node: Node) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let location = ctx.location(node);
    let line = ctx.line(node);
    let occurrence = Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location)
        .with_clue("macro");
    ctx.emit(occurrence);
}

fn handle_preproc_function_def(ctx: &mut WalkerContext, node: Node) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let location = ctx.location(node);
    let line = ctx.line(node);
    let occurrence = Occurrence::new(name.clone(), line, OccurrenceContext::Function, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location)
        .with_clue("macro");
    ctx.emit(occurrence);

    if let Some(params) = node.child_by_field_name("parameters") {
        for param in named_children(params) {
            if param.kind() == "identifier" {
                let param_name = ctx.text(param).to_owned();
                let param_line = ctx.line(param);
                let arg = Occurrence::new(param_name, param_line, OccurrenceContext::Argument, ctx.directory.clone(), ctx.filename.clone())
                    .with_clue(name.clone());
                ctx.emit(arg);
            }
        }
    }
}

fn handle_preproc_conditional(ctx: &mut WalkerContext, node: Node, directive: &str) {
    for child in named_children(node) {
        if child.kind() == "identifier" {
            let name = ctx.text(child).to_owned();
            let line = ctx.line(child);
            let occurrence = Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone())
                .with_clue(directive);
            ctx.emit(occurrence);
        }
    }
    process_children(node, |child| visit_node(ctx, child));
}

fn called_name(node: Node, ctx: &WalkerContext) -> Option<(String, Option<String>)> {
    let function = node.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some((ctx.text(function).to_owned(), None)),
        "field_expression" => {
            let field = function.child_by_field_name("field")?;
            let argument = function.child_by_field_name("argument")?;
            let parent = if argument.kind() == "call_expression" {
                None
            } else {
                Some(ctx.text(argument).to_owned())
            };
            Some((ctx.text(field).to_owned(), parent))
        }
        _ => None,
    }
}

fn handle_call_statement(ctx: &mut WalkerContext, node: Node) {
    handle_call_expression(ctx, node, None);
}

fn handle_call_expression(ctx: &mut WalkerContext, node: Node, _receiver_hint: Option<&str>) {
    let Some((name, parent)) = called_name(node, ctx) else {
        process_children(node, |child| visit_expression(ctx, child));
        return;
    };
    let line = ctx.line(node);

    if let Some(parent_text) = &parent {
        let prop = Occurrence::new(name.clone(), line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
            .with_parent(parent_text.clone());
        ctx.emit(prop);
    }

    let mut call = Occurrence::new(name.clone(), line, OccurrenceContext::Call, ctx.directory.clone(), ctx.filename.clone());
    if let Some(parent_text) = parent {
        call = call.with_parent(parent_text);
    }
    ctx.emit(call);

    if let Some(args) = node.child_by_field_name("arguments") {
        for arg in named_children(args) {
            if arg.kind() == "identifier" {
                let text = ctx.text(arg).to_owned();
                if ctx.filter.accept(&text) {
                    let arg_line = ctx.line(arg);
                    let occurrence = Occurrence::new(text, arg_line, OccurrenceContext::Argument, ctx.directory.clone(), ctx.filename.clone())
                        .with_clue(name.clone());
                    ctx.emit(occurrence);
                }
            } else {
                visit_expression(ctx, arg);
            }
        }
    }
}

/// `a.b` / `a->b` (spec §4.4.3 "Member access"): emits a property
/// occurrence on `b` with `parent = a`. Nested accesses (`a.b.c`) use
/// the immediate parent (`b` for `c`), recursing into the inner
/// access so it gets its own occurrence too.
fn handle_field_expression(ctx: &mut WalkerContext, node: Node) {
    let Some(field) = node.child_by_field_name("field") else {
        return;
    };
    let Some(argument) = node.child_by_field_name("argument") else {
        return;
    };
    let parent = immediate_parent_name(ctx, argument);
    let name = ctx.text(field).to_owned();
    let line = ctx.line(node);
    let occurrence = Occurrence::new(name, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
        .with_parent(parent);
    ctx.emit(occurrence);

    if matches!(argument.kind(), "field_expression" | "call_expression") {
        visit_expression(ctx, argument);
    }
}

fn immediate_parent_name(ctx: &WalkerContext, node: Node) -> String {
    match node.kind() {
        "field_expression" => node
            .child_by_field_name("field")
            .map(|f| ctx.text(f).to_owned())
            .unwrap_or_default(),
        _ => ctx.text(node).to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::OccurrenceBuffer;
    use crate::config::Stopwords;
    use crate::filter::{FilterConfig, SymbolFilter};
    use std::collections::HashSet;
    use tree_sitter::Parser;

    fn walk_source(source: &str) -> Vec<Occurrence> {
        let language = language();
        let ids = node_kind_ids();
        let mut parser = Parser::new();
        parser.set_language(&language).unwrap();
        let tree = parser.parse(source, None).unwrap();

        let keywords = HashSet::new();
        let stopwords = Stopwords::default();
        let filter = SymbolFilter::new(&keywords, &stopwords, FilterConfig::default());
        let mut buffer = OccurrenceBuffer::with_default_max();
        {
            let mut ctx = WalkerContext::new(
                source.as_bytes(),
                "./".to_owned(),
                "a.c".to_owned(),
                &mut buffer,
                &filter,
                &ids,
                false,
            );
            walk(&mut ctx, tree.root_node());
        }
        buffer.drain()
    }

    #[test]
    fn scenario_a_goto_cleanup() {
        let source = "int f(char *p) {\n    char *b = malloc(10);\n    if (!b) goto cleanup;\n    return 0;\ncleanup:\n    free(b);\n    return 1;\n}\n";
        let occs = walk_source(source);

        let f = occs.iter().find(|o| o.symbol == "f" && o.context == OccurrenceContext::Function).unwrap();
        assert!(f.definition);
        assert_eq!(f.r#type.as_deref(), Some("int"));

        let p = occs.iter().find(|o| o.symbol == "p" && o.context == OccurrenceContext::Argument).unwrap();
        assert_eq!(p.r#type.as_deref(), Some("char *"));

        let b = occs.iter().find(|o| o.symbol == "b" && o.context == OccurrenceContext::Variable).unwrap();
        assert_eq!(b.r#type.as_deref(), Some("char *"));

        assert!(occs.iter().any(|o| o.symbol == "malloc" && o.context == OccurrenceContext::Call));
        assert!(!occs.iter().any(|o| o.symbol == "10"));

        let goto = occs.iter().find(|o| o.context == OccurrenceContext::Goto).unwrap();
        assert_eq!(goto.symbol, "cleanup");

        let label = occs.iter().find(|o| o.context == OccurrenceContext::Label).unwrap();
        assert_eq!(label.symbol, "cleanup");
        assert!(label.definition);

        assert!(occs.iter().any(|o| o.symbol == "free" && o.context == OccurrenceContext::Call));
        let free_arg = occs
            .iter()
            .find(|o| o.symbol == "b" && o.context == OccurrenceContext::Argument)
            .unwrap();
        assert_eq!(free_arg.clue.as_deref(), Some("free"));
    }

    #[test]
    fn scenario_e_function_like_macro() {
        let source = "#define MIN(a,b) ((a)<(b)?(a):(b))\n";
        let occs = walk_source(source);

        let min = occs.iter().find(|o| o.symbol == "MIN").unwrap();
        assert_eq!(min.context, OccurrenceContext::Function);
        assert_eq!(min.clue.as_deref(), Some("macro"));
        assert!(min.definition);

        let args: Vec<&Occurrence> = occs
            .iter()
            .filter(|o| o.context == OccurrenceContext::Argument)
            .collect();
        assert!(args.iter().any(|o| o.symbol == "a" && o.clue.as_deref() == Some("MIN")));
        assert!(args.iter().any(|o| o.symbol == "b" && o.clue.as_deref() == Some("MIN")));
    }

    #[test]
    fn call_on_call_result_leaves_parent_empty() {
        let source = "void f(void) {\n    make_thing().run();\n}\n";
        let occs = walk_source(source);

        let run_call = occs
            .iter()
            .find(|o| o.symbol == "run" && o.context == OccurrenceContext::Call)
            .unwrap();
        assert_eq!(run_call.parent, None);
        assert!(!occs.iter().any(|o| o.symbol == "run" && o.context == OccurrenceContext::Property));
    }
}
