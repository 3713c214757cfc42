//! Go walker. New relative to the teacher (which has no Go backend),
//! grounded on the same dispatch/handler discipline as
//! [`super::c`]/[`super::typescript`] and on spec §4.4.3's Go-specific
//! contracts: goroutines, defers, channel send/receive/select, and
//! methods-set-parent-to-receiver-type.

use tree_sitter::{Language, Node};

use crate::model::{Occurrence, OccurrenceContext};
use crate::parse::NodeKindIds;

use super::{named_children, process_children, WalkerContext};

const NODE_KINDS: &[&str] = &[
    "source_file",
    "package_clause",
    "function_declaration",
    "method_declaration",
    "import_declaration",
    "import_spec",
    "var_declaration",
    "const_declaration",
    "short_var_declaration",
    "type_declaration",
    "type_spec",
    "struct_type",
    "interface_type",
    "call_expression",
    "selector_expression",
    "go_statement",
    "defer_statement",
    "send_statement",
    "select_statement",
    "communication_case",
    "expression_case",
    "for_statement",
    "if_statement",
    "return_statement",
    "comment",
    "interpreted_string_literal",
    "raw_string_literal",
    "unary_expression",
    "identifier",
    "field_identifier",
    "blank_identifier",
    "pointer_type",
    "channel_type",
];

pub fn language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

pub fn node_kind_ids() -> NodeKindIds {
    NodeKindIds::build(&language(), NODE_KINDS)
}

pub fn walk(ctx: &mut WalkerContext, root: Node) {
    ctx.emit_filename();
    let package = package_name(ctx, root);
    visit_node(ctx, root, package.as_deref());
}

fn package_name(ctx: &WalkerContext, root: Node) -> Option<String> {
    named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_clause")
        .and_then(|clause| named_children(clause).into_iter().find(|n| n.kind() == "package_identifier" || n.kind() == "identifier"))
        .map(|n| ctx.text(n).to_owned())
}

fn visit_node(ctx: &mut WalkerContext, node: Node, package: Option<&str>) {
    let sym = node.kind_id();
    let ids = ctx.ids;

    if sym == ids.get("function_declaration") {
        handle_function_declaration(ctx, node, package);
    } else if sym == ids.get("method_declaration") {
        handle_method_declaration(ctx, node, package);
    } else if sym == ids.get("import_declaration") {
        handle_import_declaration(ctx, node);
    } else if sym == ids.get("var_declaration") || sym == ids.get("const_declaration") {
        handle_var_declaration(ctx, node, sym == ids.get("const_declaration"));
    } else if sym == ids.get("short_var_declaration") {
        handle_short_var_declaration(ctx, node, None);
    } else if sym == ids.get("type_declaration") {
        handle_type_declaration(ctx, node);
    } else if sym == ids.get("go_statement") {
        handle_wrapped_call(ctx, node, "go", package);
    } else if sym == ids.get("defer_statement") {
        handle_wrapped_call(ctx, node, "defer", package);
    } else if sym == ids.get("send_statement") {
        handle_send_statement(ctx, node);
    } else if sym == ids.get("select_statement") {
        handle_select_statement(ctx, node, package);
    } else if sym == ids.get("comment") {
        ctx.emit_cleaned_words(node, OccurrenceContext::Comment);
    } else if sym == ids.get("interpreted_string_literal") || sym == ids.get("raw_string_literal") {
        ctx.emit_cleaned_words(node, OccurrenceContext::String);
    } else if sym == ids.get("call_expression") {
        handle_call_expression(ctx, node, package);
    } else if sym == ids.get("selector_expression") {
        handle_selector_expression(ctx, node, "");
    } else {
        process_children(node, |child| visit_node(ctx, child, package));
    }
}

fn visit_expression(ctx: &mut WalkerContext, node: Node, package: Option<&str>) {
    let ids = ctx.ids;
    let sym = node.kind_id();
    if sym == ids.get("call_expression") {
        handle_call_expression(ctx, node, package);
    } else if sym == ids.get("selector_expression") {
        handle_selector_expression(ctx, node, "");
    } else {
        process_children(node, |child| visit_expression(ctx, child, package));
    }
}

fn handle_function_declaration(ctx: &mut WalkerContext, node: Node, package: Option<&str>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let location = ctx.location(node);
    let line = ctx.line(node);

    let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Function, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    occurrence = apply_export_scope(occurrence, &occurrence.symbol.clone());
    if let Some(pkg) = package {
        occurrence = occurrence.with_namespace(pkg);
    }
    ctx.emit(occurrence);

    emit_parameters(ctx, node.child_by_field_name("parameters"));
    if let Some(body) = node.child_by_field_name("body") {
        process_children(body, |child| visit_node(ctx, child, package));
    }
}

fn handle_method_declaration(ctx: &mut WalkerContext, node: Node, package: Option<&str>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let receiver_type = node
        .child_by_field_name("receiver")
        .and_then(|r| named_children(r).into_iter().find(|n| n.kind() == "parameter_declaration"))
        .and_then(|p| p.child_by_field_name("type"))
        .map(|t| receiver_type_name(ctx, t));

    let location = ctx.location(node);
    let line = ctx.line(node);

    let mut occurrence = Occurrence::new(name.clone(), line, OccurrenceContext::Function, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    occurrence = apply_export_scope(occurrence, &name);
    if let Some(pkg) = package {
        occurrence = occurrence.with_namespace(pkg);
    }
    // §3.2 invariant 4 exception: a method declaration sets `parent` to
    // its receiver type so "methods of T" queries work.
    if let Some(receiver) = receiver_type {
        occurrence = occurrence.with_parent(receiver);
    }
    ctx.emit(occurrence);

    emit_parameters(ctx, node.child_by_field_name("parameters"));
    if let Some(body) = node.child_by_field_name("body") {
        process_children(body, |child| visit_node(ctx, child, package));
    }
}

fn receiver_type_name(ctx: &WalkerContext, node: Node) -> String {
    match node.kind() {
        "pointer_type" => node
            .named_child(0)
            .map(|inner| receiver_type_name(ctx, inner))
            .unwrap_or_default(),
        _ => ctx.text(node).to_owned(),
    }
}

fn apply_export_scope(occurrence: Occurrence, name: &str) -> Occurrence {
    let scope = if name.chars().next().map(char::is_uppercase).unwrap_or(false) {
        "public"
    } else {
        "private"
    };
    occurrence.with_scope(scope)
}

fn emit_parameters(ctx: &mut WalkerContext, params: Option<Node>) {
    let Some(params) = params else {
        return;
    };
    for param in named_children(params) {
        if param.kind() != "parameter_declaration" {
            continue;
        }
        let ty = param.child_by_field_name("type").map(|t| extract_type(ctx, t));
        let names: Vec<Node> = named_children(param)
            .into_iter()
            .filter(|n| n.kind() == "identifier")
            .collect();
        let location = ctx.location(param);
        let line = ctx.line(param);
        for name_node in names {
            let name = ctx.text(name_node).to_owned();
            let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Argument, ctx.directory.clone(), ctx.filename.clone())
                .as_definition(location);
            if let Some(ty) = &ty {
                occurrence = occurrence.with_type(ty.clone());
            }
            ctx.emit(occurrence);
        }
    }
}

/// Type extraction (spec §4.4.4): channel/slice/map/function/struct/
/// interface types under a size bound render as literal text;
/// otherwise a compact placeholder.
fn extract_type(ctx: &WalkerContext, node: Node) -> String {
    const SIZE_BOUND: usize = 48;
    match node.kind() {
        "type_identifier" | "qualified_type" => ctx.text(node).to_owned(),
        "pointer_type" => node
            .named_child(0)
            .map(|inner| format!("*{}", extract_type(ctx, inner)))
            .unwrap_or_else(|| "*".to_owned()),
        "struct_type" => "struct".to_owned(),
        "interface_type" => "interface".to_owned(),
        "channel_type" | "slice_type" | "map_type" | "function_type" | "array_type" => {
            let text = ctx.text(node);
            if text.len() <= SIZE_BOUND {
                text.to_owned()
            } else {
                match node.kind() {
                    "slice_type" => "[]slice".to_owned(),
                    "map_type" => "map".to_owned(),
                    "channel_type" => "chan".to_owned(),
                    "function_type" => "func".to_owned(),
                    _ => "array".to_owned(),
                }
            }
        }
        other => {
            ctx.report_grammar_drift(node, other);
            ctx.text(node).to_owned()
        }
    }
}

fn handle_import_declaration(ctx: &mut WalkerContext, node: Node) {
    for spec in named_children(node) {
        if spec.kind() != "import_spec" {
            continue;
        }
        let Some(path_node) = spec.child_by_field_name("path") else {
            continue;
        };
        let raw_path = ctx.text(path_node).trim_matches('"').to_owned();
        let line = ctx.line(spec);
        let mut occurrence = Occurrence::new(raw_path, line, OccurrenceContext::Import, ctx.directory.clone(), ctx.filename.clone());

        if let Some(name_node) = spec.child_by_field_name("name") {
            let clue = match name_node.kind() {
                "blank_identifier" => "blank",
                "dot" => "dot",
                _ => "alias",
            };
            occurrence = occurrence.with_clue(clue);
        }
        ctx.emit(occurrence);
    }
}

fn handle_var_declaration(ctx: &mut WalkerContext, node: Node, is_const: bool) {
    for spec in named_children(node) {
        if spec.kind() != "var_spec" && spec.kind() != "const_spec" {
            continue;
        }
        let ty = spec.child_by_field_name("type").map(|t| extract_type(ctx, t));
        let names: Vec<Node> = named_children(spec)
            .into_iter()
            .filter(|n| n.kind() == "identifier")
            .collect();
        let line = ctx.line(spec);
        let location = ctx.location(spec);

        for name_node in &names {
            let name = ctx.text(*name_node).to_owned();
            if name == "_" {
                continue;
            }
            let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone())
                .as_definition(location);
            if let Some(ty) = &ty {
                occurrence = occurrence.with_type(ty.clone());
            }
            if is_const {
                occurrence = occurrence.with_modifier("const");
            }
            ctx.emit(occurrence);
        }

        if let Some(value) = spec.child_by_field_name("value") {
            visit_expression(ctx, value, None);
        }
    }
}

/// Go `:=` with inferred types: per spec §4.4.3, attempt to infer the
/// type from the RHS only when it is a composite literal or
/// address-of a composite literal; otherwise leave `type` null.
fn handle_short_var_declaration(ctx: &mut WalkerContext, node: Node, clue: Option<&str>) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    let right = node.child_by_field_name("right");
    let inferred_type = right.and_then(|r| infer_composite_type(ctx, r));

    let line = ctx.line(node);
    let location = ctx.location(node);
    for name_node in named_children(left) {
        if name_node.kind() != "identifier" {
            continue;
        }
        let name = ctx.text(name_node).to_owned();
        if name == "_" {
            continue;
        }
        let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone())
            .as_definition(location);
        if let Some(ty) = &inferred_type {
            occurrence = occurrence.with_type(ty.clone());
        }
        if let Some(clue) = clue {
            occurrence = occurrence.with_clue(clue);
        }
        ctx.emit(occurrence);
    }

    if let Some(right) = right {
        visit_expression(ctx, right, None);
    }
}

fn infer_composite_type(ctx: &WalkerContext, node: Node) -> Option<String> {
    match node.kind() {
        "composite_literal" => node.child_by_field_name("type").map(|t| extract_type(ctx, t)),
        "unary_expression" if ctx.text(node).starts_with('&') => {
            node.named_child(0).and_then(|inner| infer_composite_type(ctx, inner))
        }
        _ => None,
    }
}

fn handle_type_declaration(ctx: &mut WalkerContext, node: Node) {
    for spec in named_children(node) {
        if spec.kind() != "type_spec" {
            continue;
        }
        let Some(name_node) = spec.child_by_field_name("name") else {
            continue;
        };
        let Some(type_node) = spec.child_by_field_name("type") else {
            continue;
        };
        let name = ctx.text(name_node).to_owned();
        let context = match type_node.kind() {
            "struct_type" => OccurrenceContext::Type,
            "interface_type" => OccurrenceContext::Type,
            _ => OccurrenceContext::Type,
        };
        let location = ctx.location(spec);
        let line = ctx.line(spec);
        let mut occurrence = Occurrence::new(name, line, context, ctx.directory.clone(), ctx.filename.clone()).as_definition(location);
        occurrence = apply_export_scope(occurrence, &occurrence.symbol.clone());
        ctx.emit(occurrence);

        if type_node.kind() == "struct_type" {
            emit_struct_fields(ctx, type_node);
        } else if type_node.kind() == "interface_type" {
            emit_interface_methods(ctx, type_node);
        }
    }
}

fn emit_struct_fields(ctx: &mut WalkerContext, struct_type: Node) {
    for field in named_children(struct_type) {
        if field.kind() != "field_declaration" {
            continue;
        }
        let ty = field.child_by_field_name("type").map(|t| extract_type(ctx, t));
        let line = ctx.line(field);
        for name_node in named_children(field) {
            if name_node.kind() != "field_identifier" {
                continue;
            }
            let name = ctx.text(name_node).to_owned();
            let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone());
            if let Some(ty) = &ty {
                occurrence = occurrence.with_type(ty.clone());
            }
            ctx.emit(occurrence);
        }
    }
}

fn emit_interface_methods(ctx: &mut WalkerContext, interface_type: Node) {
    for spec in named_children(interface_type) {
        if spec.kind() != "method_spec" {
            continue;
        }
        let Some(name_node) = spec.child_by_field_name("name") else {
            continue;
        };
        let name = ctx.text(name_node).to_owned();
        let line = ctx.line(spec);
        ctx.emit(Occurrence::new(name, line, OccurrenceContext::Function, ctx.directory.clone(), ctx.filename.clone()));
    }
}

/// `go f()` / `defer f()` (spec §4.4.3): the wrapped call's occurrence
/// gets `clue = go` / `clue = defer`.
fn handle_wrapped_call(ctx: &mut WalkerContext, node: Node, clue: &'static str, package: Option<&str>) {
    if let Some(inner) = named_children(node).into_iter().find(|n| n.kind() == "call_expression") {
        handle_call_expression_with_clue(ctx, inner, Some(clue), package);
    }
}

fn called_name(ctx: &WalkerContext, node: Node) -> Option<(String, Option<String>)> {
    let function = node.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some((ctx.text(function).to_owned(), None)),
        "selector_expression" => {
            let field = function.child_by_field_name("field")?;
            let operand = function.child_by_field_name("operand")?;
            let parent = if operand.kind() == "call_expression" {
                None
            } else {
                Some(ctx.text(operand).to_owned())
            };
            Some((ctx.text(field).to_owned(), parent))
        }
        _ => None,
    }
}

fn handle_call_expression(ctx: &mut WalkerContext, node: Node, package: Option<&str>) {
    handle_call_expression_with_clue(ctx, node, None, package);
}

/// Per `SPEC_FULL.md` §D.1: Go is call-only with `parent` set to the
/// receiver's textual form; no separate property occurrence is
/// emitted for `w.handle(v)`.
fn handle_call_expression_with_clue(ctx: &mut WalkerContext, node: Node, clue: Option<&str>, package: Option<&str>) {
    let Some((name, parent)) = called_name(ctx, node) else {
        process_children(node, |child| visit_expression(ctx, child, package));
        return;
    };
    let line = ctx.line(node);

    let mut call = Occurrence::new(name.clone(), line, OccurrenceContext::Call, ctx.directory.clone(), ctx.filename.clone());
    if let Some(parent) = &parent {
        call = call.with_parent(parent.clone());
    }
    if let Some(clue) = clue {
        call = call.with_clue(clue);
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
                visit_expression(ctx, arg, package);
            }
        }
    }
}

fn handle_selector_expression(ctx: &mut WalkerContext, node: Node, clue: &str) {
    let Some(field) = node.child_by_field_name("field") else {
        return;
    };
    let Some(operand) = node.child_by_field_name("operand") else {
        return;
    };
    let name = ctx.text(field).to_owned();
    let parent = ctx.text(operand).to_owned();
    let line = ctx.line(node);
    let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
        .with_parent(parent);
    if !clue.is_empty() {
        occurrence = occurrence.with_clue(clue);
    }
    ctx.emit(occurrence);
}

/// `ch <- x` (spec §4.4.3): emits `ch` with `clue = send`.
fn handle_send_statement(ctx: &mut WalkerContext, node: Node) {
    let Some(channel) = node.child_by_field_name("channel") else {
        return;
    };
    emit_channel_reference(ctx, channel, "send");
    if let Some(value) = node.child_by_field_name("value") {
        visit_expression(ctx, value, None);
    }
}

fn emit_channel_reference(ctx: &mut WalkerContext, node: Node, clue: &'static str) {
    match node.kind() {
        "selector_expression" => handle_selector_expression(ctx, node, clue),
        "identifier" => {
            let name = ctx.text(node).to_owned();
            let line = ctx.line(node);
            ctx.emit(
                Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone())
                    .with_clue(clue),
            );
        }
        _ => {}
    }
}

/// `select { case v := <-ch: ...; case <-done: ...; }` (spec §4.4.3):
/// `case v := <-ch` emits `v` with `clue = select`; the channel
/// operand of every receive is emitted via [`emit_channel_reference`]
/// with `clue = receive`.
fn handle_select_statement(ctx: &mut WalkerContext, node: Node, package: Option<&str>) {
    for case in named_children(node) {
        if case.kind() != "communication_case" {
            continue;
        }
        handle_communication_case(ctx, case, package);
    }
}

fn handle_communication_case(ctx: &mut WalkerContext, node: Node, package: Option<&str>) {
    for child in named_children(node) {
        match child.kind() {
            "short_var_declaration" => handle_short_var_declaration(ctx, child, Some("select")),
            "send_statement" => handle_send_statement(ctx, child),
            "unary_expression" if is_receive(ctx, child) => {
                if let Some(operand) = child.named_child(0) {
                    emit_channel_reference(ctx, operand, "receive");
                }
            }
            _ => visit_node(ctx, child, package),
        }
    }
}

fn is_receive(ctx: &WalkerContext, node: Node) -> bool {
    ctx.text(node).trim_start().starts_with("<-")
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
                "./go/".to_owned(),
                "worker.go".to_owned(),
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
    fn scenario_b_select_with_channel_receive() {
        let source = "package worker\n\ntype Worker struct {\n\tin chan int\n}\n\nfunc (w *Worker) handle(v int) {}\n\nfunc (w *Worker) Loop(done <-chan bool) {\n\tfor {\n\t\tselect {\n\t\tcase v := <-w.in:\n\t\t\tw.handle(v)\n\t\tcase <-done:\n\t\t\treturn\n\t\t}\n\t}\n}\n";
        let occs = walk_source(source);

        let loop_fn = occs
            .iter()
            .find(|o| o.symbol == "Loop" && o.context == OccurrenceContext::Function)
            .unwrap();
        assert!(loop_fn.definition);
        assert_eq!(loop_fn.parent.as_deref(), Some("Worker"));
        assert_eq!(loop_fn.scope.as_deref(), Some("public"));
        assert_eq!(loop_fn.namespace.as_deref(), Some("worker"));

        let done_param = occs
            .iter()
            .find(|o| o.symbol == "done" && o.context == OccurrenceContext::Argument)
            .unwrap();
        assert_eq!(done_param.r#type.as_deref(), Some("<-chan bool"));

        let v_select = occs
            .iter()
            .find(|o| o.symbol == "v" && o.context == OccurrenceContext::Variable)
            .unwrap();
        assert_eq!(v_select.clue.as_deref(), Some("select"));
        assert!(v_select.definition);

        let handle_call = occs
            .iter()
            .find(|o| o.symbol == "handle" && o.context == OccurrenceContext::Call)
            .unwrap();
        assert_eq!(handle_call.parent.as_deref(), Some("w"));
        assert!(!occs
            .iter()
            .any(|o| o.symbol == "handle" && o.context == OccurrenceContext::Property));

        let v_arg = occs
            .iter()
            .find(|o| o.symbol == "v" && o.context == OccurrenceContext::Argument)
            .unwrap();
        assert_eq!(v_arg.clue.as_deref(), Some("handle"));
    }

    #[test]
    fn call_on_call_result_leaves_parent_empty() {
        let source = "package worker\n\nfunc run() {\n\tfoo().Bar()\n}\n";
        let occs = walk_source(source);

        let bar_call = occs
            .iter()
            .find(|o| o.symbol == "Bar" && o.context == OccurrenceContext::Call)
            .unwrap();
        assert_eq!(bar_call.parent, None);
    }
}
