//! Shared TypeScript/JavaScript walker core (spec §4.4.3, Scenario D).
//! `typescript.rs`/`javascript.rs` each supply the `tree_sitter`
//! grammar and the node-kind list; the dispatch and handlers here are
//! identical across both since the TSX-only grammar differences don't
//! touch the symbols this indexer cares about.

use tree_sitter::Node;

use crate::model::{Occurrence, OccurrenceContext};

use super::{named_children, process_children, WalkerContext};

pub const NODE_KINDS: &[&str] = &[
    "program",
    "class_declaration",
    "class_body",
    "method_definition",
    "public_field_definition",
    "function_declaration",
    "arrow_function",
    "formal_parameters",
    "required_parameter",
    "optional_parameter",
    "identifier",
    "property_identifier",
    "private_property_identifier",
    "member_expression",
    "call_expression",
    "arguments",
    "comment",
    "string",
    "template_string",
    "import_statement",
    "import_clause",
    "variable_declaration",
    "variable_declarator",
    "lexical_declaration",
    "type_annotation",
    "this",
];

pub fn walk(ctx: &mut WalkerContext, root: Node) {
    ctx.emit_filename();
    visit_node(ctx, root, None);
}

fn visit_node(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let ids = ctx.ids;
    let sym = node.kind_id();

    if sym == ids.get("class_declaration") {
        handle_class_declaration(ctx, node);
    } else if sym == ids.get("method_definition") {
        handle_method_definition(ctx, node, class_name);
    } else if sym == ids.get("public_field_definition") {
        handle_field_definition(ctx, node, class_name);
    } else if sym == ids.get("function_declaration") {
        handle_function_declaration(ctx, node);
    } else if sym == ids.get("import_statement") {
        handle_import_statement(ctx, node);
    } else if sym == ids.get("variable_declaration") || sym == ids.get("lexical_declaration") {
        handle_variable_declaration(ctx, node);
    } else if sym == ids.get("comment") {
        ctx.emit_cleaned_words(node, OccurrenceContext::Comment);
    } else if sym == ids.get("string") || sym == ids.get("template_string") {
        ctx.emit_cleaned_words(node, OccurrenceContext::String);
    } else if sym == ids.get("call_expression") {
        handle_call_expression(ctx, node);
    } else if sym == ids.get("member_expression") {
        handle_member_expression(ctx, node);
    } else {
        process_children(node, |child| visit_node(ctx, child, class_name));
    }
}

fn visit_expression(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let ids = ctx.ids;
    let sym = node.kind_id();
    if sym == ids.get("call_expression") {
        handle_call_expression(ctx, node);
    } else if sym == ids.get("member_expression") {
        handle_member_expression(ctx, node);
    } else if sym == ids.get("arrow_function") {
        handle_function_like(ctx, node, None, class_name);
    } else {
        process_children(node, |child| visit_expression(ctx, child, class_name));
    }
}

fn handle_class_declaration(ctx: &mut WalkerContext, node: Node) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let location = ctx.location(node);
    let line = ctx.line(node);
    ctx.emit(
        Occurrence::new(name.clone(), line, OccurrenceContext::Type, ctx.directory.clone(), ctx.filename.clone())
            .as_definition(location),
    );

    if let Some(body) = node.child_by_field_name("body") {
        process_children(body, |child| visit_node(ctx, child, Some(&name)));
    }
}

fn field_name(ctx: &WalkerContext, node: Node) -> Option<(String, bool)> {
    match node.kind() {
        "property_identifier" => Some((ctx.text(node).to_owned(), false)),
        "private_property_identifier" => Some((ctx.text(node).to_owned(), true)),
        _ => None,
    }
}

fn handle_method_definition(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let Some((name, is_private)) = field_name(ctx, name_node) else {
        return;
    };
    handle_function_like_named(ctx, node, name, is_private, class_name);
}

fn handle_function_declaration(ctx: &mut WalkerContext, node: Node) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    handle_function_like_named(ctx, node, name, false, None);
}

fn handle_function_like(ctx: &mut WalkerContext, node: Node, name: Option<String>, class_name: Option<&str>) {
    let name = name.unwrap_or_else(|| "<anonymous>".to_owned());
    handle_function_like_named(ctx, node, name, false, class_name);
}

fn handle_function_like_named(ctx: &mut WalkerContext, node: Node, name: String, is_private: bool, class_name: Option<&str>) {
    let is_async = ctx.text(node).trim_start().starts_with("async");
    let return_type = node.child_by_field_name("return_type").map(|t| extract_type(ctx, t));
    let location = ctx.location(node);
    let line = ctx.line(node);

    let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Function, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    if let Some(class_name) = class_name {
        occurrence = occurrence.with_parent(class_name);
    }
    if is_async {
        occurrence = occurrence.with_modifier("async");
    }
    if is_private {
        occurrence = occurrence.with_modifier("private");
    }
    if let Some(ty) = return_type {
        occurrence = occurrence.with_type(ty);
    }
    ctx.emit(occurrence);

    if let Some(params) = node.child_by_field_name("parameters") {
        emit_parameters(ctx, params);
    }
    if let Some(body) = node.child_by_field_name("body") {
        process_children(body, |child| visit_node(ctx, child, class_name));
    }
}

/// `#b` private class fields (spec §4.4.3, Scenario D): emitted with
/// `modifier = private`.
fn handle_field_definition(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let Some(prop) = named_children(node).into_iter().find(|n| field_name(ctx, *n).is_some()) else {
        return;
    };
    let Some((name, is_private)) = field_name(ctx, prop) else {
        return;
    };
    let ty = node.child_by_field_name("type").map(|t| extract_type(ctx, t));
    let location = ctx.location(node);
    let line = ctx.line(node);

    let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    if let Some(class_name) = class_name {
        occurrence = occurrence.with_parent(class_name);
    }
    if is_private {
        occurrence = occurrence.with_modifier("private");
    }
    if let Some(ty) = ty {
        occurrence = occurrence.with_type(ty);
    }
    ctx.emit(occurrence);

    if let Some(value) = node.child_by_field_name("value") {
        visit_expression(ctx, value, class_name);
    }
}

fn emit_parameters(ctx: &mut WalkerContext, params: Node) {
    for param in named_children(params) {
        let (name_node, type_node) = match param.kind() {
            "identifier" => (Some(param), None),
            "required_parameter" | "optional_parameter" => {
                (param.child_by_field_name("pattern"), param.child_by_field_name("type"))
            }
            _ => continue,
        };
        let Some(name_node) = name_node else { continue };
        if name_node.kind() != "identifier" {
            continue;
        }
        let text = ctx.text(name_node).to_owned();
        let line = ctx.line(param);
        let location = ctx.location(param);
        let mut occurrence = Occurrence::new(text, line, OccurrenceContext::Argument, ctx.directory.clone(), ctx.filename.clone())
            .as_definition(location);
        if let Some(ty) = type_node {
            occurrence = occurrence.with_type(extract_type(ctx, ty));
        }
        ctx.emit(occurrence);
    }
}

fn extract_type(ctx: &WalkerContext, node: Node) -> String {
    ctx.text(node).trim_start_matches(':').trim().to_owned()
}

fn handle_import_statement(ctx: &mut WalkerContext, node: Node) {
    let Some(source) = node.child_by_field_name("source") else {
        return;
    };
    let raw = ctx.text(source).trim_matches(|c| c == '"' || c == '\'').to_owned();
    let line = ctx.line(node);
    ctx.emit(Occurrence::new(raw, line, OccurrenceContext::Import, ctx.directory.clone(), ctx.filename.clone()));
}

fn handle_variable_declaration(ctx: &mut WalkerContext, node: Node) {
    for declarator in named_children(node) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() == "identifier" {
            let name = ctx.text(name_node).to_owned();
            let ty = declarator.child_by_field_name("type").map(|t| extract_type(ctx, t));
            let line = ctx.line(declarator);
            let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone());
            if let Some(ty) = ty {
                occurrence = occurrence.with_type(ty);
            }
            ctx.emit(occurrence);
        }
        if let Some(value) = declarator.child_by_field_name("value") {
            visit_expression(ctx, value, None);
        }
    }
}

/// Member calls (`a.b()` / `this.#b()`) emit both a `property` on `b`
/// and a `call` (spec `SPEC_FULL.md` §D.1).
fn handle_call_expression(ctx: &mut WalkerContext, node: Node) {
    let Some(function) = node.child_by_field_name("function") else {
        return;
    };
    let line = ctx.line(node);

    let (name, parent) = match function.kind() {
        "identifier" => (ctx.text(function).to_owned(), None),
        "member_expression" => {
            let Some(prop) = function.child_by_field_name("property") else {
                return;
            };
            let Some(object) = function.child_by_field_name("object") else {
                return;
            };
            let Some((prop_name, _)) = field_name(ctx, prop) else {
                return;
            };
            let parent_name = if object.kind() == "call_expression" {
                None
            } else {
                Some(immediate_parent_name(ctx, object))
            };
            if let Some(parent_name) = &parent_name {
                ctx.emit(
                    Occurrence::new(prop_name.clone(), line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
                        .with_parent(parent_name.clone()),
                );
            }
            if matches!(object.kind(), "member_expression" | "call_expression") {
                visit_expression(ctx, object, None);
            }
            (prop_name, parent_name)
        }
        _ => {
            process_children(node, |child| visit_expression(ctx, child, None));
            return;
        }
    };

    let mut call = Occurrence::new(name.clone(), line, OccurrenceContext::Call, ctx.directory.clone(), ctx.filename.clone());
    if let Some(parent) = parent {
        call = call.with_parent(parent);
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
                visit_expression(ctx, arg, None);
            }
        }
    }
}

fn handle_member_expression(ctx: &mut WalkerContext, node: Node) {
    let Some(prop) = node.child_by_field_name("property") else {
        return;
    };
    let Some(object) = node.child_by_field_name("object") else {
        return;
    };
    let Some((name, _)) = field_name(ctx, prop) else {
        return;
    };
    let parent = immediate_parent_name(ctx, object);
    let line = ctx.line(node);
    ctx.emit(
        Occurrence::new(name, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
            .with_parent(parent),
    );
    if matches!(object.kind(), "member_expression" | "call_expression") {
        visit_expression(ctx, object, None);
    }
}

fn immediate_parent_name(ctx: &WalkerContext, node: Node) -> String {
    if node.kind() == "member_expression" {
        if let Some(prop) = node.child_by_field_name("property") {
            if let Some((name, _)) = field_name(ctx, prop) {
                return name;
            }
        }
    }
    if node.kind() == "this" {
        return "this".to_owned();
    }
    ctx.text(node).to_owned()
}

#[cfg(test)]
pub(crate) fn test_walk(source: &str, filename: &str, language: tree_sitter::Language, ids: &crate::parse::NodeKindIds) -> Vec<Occurrence> {
    use crate::buffer::OccurrenceBuffer;
    use crate::config::Stopwords;
    use crate::filter::{FilterConfig, SymbolFilter};
    use std::collections::HashSet;
    use tree_sitter::Parser;

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
            "./ts/".to_owned(),
            filename.to_owned(),
            &mut buffer,
            &filter,
            ids,
            false,
        );
        walk(&mut ctx, tree.root_node());
    }
    buffer.drain()
}
