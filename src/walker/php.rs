//! PHP walker (spec §4.4.3, `SPEC_FULL.md` §D.1): lighter than the C/Go/
//! TS walkers since PHP contributes no dedicated scenario, but follows
//! the same dispatch discipline and the TypeScript member-call policy
//! for `$obj->method()`.

use tree_sitter::{Language, Node};

use crate::model::{Occurrence, OccurrenceContext};
use crate::parse::NodeKindIds;

use super::{named_children, process_children, WalkerContext};

const NODE_KINDS: &[&str] = &[
    "program",
    "class_declaration",
    "function_definition",
    "method_declaration",
    "property_declaration",
    "property_element",
    "formal_parameters",
    "simple_parameter",
    "variable_name",
    "name",
    "member_access_expression",
    "function_call_expression",
    "member_call_expression",
    "scoped_call_expression",
    "arguments",
    "comment",
    "string",
    "namespace_use_declaration",
    "assignment_expression",
];

pub fn language() -> Language {
    tree_sitter_php::LANGUAGE_PHP.into()
}

pub fn node_kind_ids() -> NodeKindIds {
    NodeKindIds::build(&language(), NODE_KINDS)
}

pub fn walk(ctx: &mut WalkerContext, root: Node) {
    ctx.emit_filename();
    visit_node(ctx, root, None);
}

fn visit_node(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let ids = ctx.ids;
    let sym = node.kind_id();

    if sym == ids.get("class_declaration") {
        handle_class_declaration(ctx, node);
    } else if sym == ids.get("method_declaration") {
        handle_function_like(ctx, node, class_name);
    } else if sym == ids.get("function_definition") {
        handle_function_like(ctx, node, None);
    } else if sym == ids.get("property_declaration") {
        handle_property_declaration(ctx, node, class_name);
    } else if sym == ids.get("namespace_use_declaration") {
        handle_use_declaration(ctx, node);
    } else if sym == ids.get("comment") {
        ctx.emit_cleaned_words(node, OccurrenceContext::Comment);
    } else if sym == ids.get("string") {
        ctx.emit_cleaned_words(node, OccurrenceContext::String);
    } else if sym == ids.get("member_call_expression") || sym == ids.get("function_call_expression") {
        handle_call(ctx, node);
    } else if sym == ids.get("member_access_expression") {
        handle_member_access(ctx, node);
    } else {
        process_children(node, |child| visit_node(ctx, child, class_name));
    }
}

fn visit_expression(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let ids = ctx.ids;
    let sym = node.kind_id();
    if sym == ids.get("member_call_expression") || sym == ids.get("function_call_expression") {
        handle_call(ctx, node);
    } else if sym == ids.get("member_access_expression") {
        handle_member_access(ctx, node);
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

fn handle_function_like(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let location = ctx.location(node);
    let line = ctx.line(node);
    let return_type = node.child_by_field_name("return_type").map(|t| ctx.text(t).to_owned());

    let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Function, ctx.directory.clone(), ctx.filename.clone())
        .as_definition(location);
    if let Some(class_name) = class_name {
        occurrence = occurrence.with_parent(class_name);
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

fn emit_parameters(ctx: &mut WalkerContext, params: Node) {
    for param in named_children(params) {
        if param.kind() != "simple_parameter" {
            continue;
        }
        let Some(name_node) = param.child_by_field_name("name") else {
            continue;
        };
        let text = ctx.text(name_node).trim_start_matches('$').to_owned();
        let ty = param.child_by_field_name("type").map(|t| ctx.text(t).to_owned());
        let line = ctx.line(param);
        let location = ctx.location(param);
        let mut occurrence = Occurrence::new(text, line, OccurrenceContext::Argument, ctx.directory.clone(), ctx.filename.clone())
            .as_definition(location);
        if let Some(ty) = ty {
            occurrence = occurrence.with_type(ty);
        }
        ctx.emit(occurrence);
    }
}

fn handle_property_declaration(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let ty = named_children(node).into_iter().find(|n| n.kind() != "property_element" && n.kind() != "visibility_modifier").map(|t| ctx.text(t).to_owned());
    for element in named_children(node) {
        if element.kind() != "property_element" {
            continue;
        }
        let Some(name_node) = element.named_child(0) else {
            continue;
        };
        let text = ctx.text(name_node).trim_start_matches('$').to_owned();
        let line = ctx.line(element);
        let location = ctx.location(element);
        let mut occurrence = Occurrence::new(text, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
            .as_definition(location);
        if let Some(class_name) = class_name {
            occurrence = occurrence.with_parent(class_name);
        }
        if let Some(ty) = &ty {
            occurrence = occurrence.with_type(ty.clone());
        }
        ctx.emit(occurrence);
    }
}

fn handle_use_declaration(ctx: &mut WalkerContext, node: Node) {
    let line = ctx.line(node);
    let text = ctx.text(node);
    let name = text
        .trim_start_matches("use")
        .trim()
        .trim_end_matches(';')
        .to_owned();
    ctx.emit(Occurrence::new(name, line, OccurrenceContext::Import, ctx.directory.clone(), ctx.filename.clone()));
}

/// `$obj->method()` (spec `SPEC_FULL.md` §D.1): emits both a
/// `property` occurrence on `method` and a `call`, matching the
/// TypeScript policy rather than Go's call-only one.
fn handle_call(ctx: &mut WalkerContext, node: Node) {
    let Some(function) = node.child_by_field_name("function") else {
        process_children(node, |child| visit_expression(ctx, child, None));
        return;
    };
    let line = ctx.line(node);

    let (name, parent) = match function.kind() {
        "name" => (ctx.text(function).to_owned(), None),
        "member_access_expression" => {
            let Some(prop) = function.child_by_field_name("name") else {
                return;
            };
            let Some(object) = function.child_by_field_name("object") else {
                return;
            };
            let prop_name = ctx.text(prop).to_owned();
            let parent_name = if matches!(object.kind(), "function_call_expression" | "member_call_expression") {
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
            if arg.kind() == "variable_name" {
                let text = ctx.text(arg).trim_start_matches('$').to_owned();
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

fn handle_member_access(ctx: &mut WalkerContext, node: Node) {
    let Some(prop) = node.child_by_field_name("name") else {
        return;
    };
    let Some(object) = node.child_by_field_name("object") else {
        return;
    };
    let name = ctx.text(prop).to_owned();
    let parent = immediate_parent_name(ctx, object);
    let line = ctx.line(node);
    ctx.emit(
        Occurrence::new(name, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
            .with_parent(parent),
    );
}

fn immediate_parent_name(ctx: &WalkerContext, node: Node) -> String {
    if node.kind() == "member_access_expression" {
        if let Some(prop) = node.child_by_field_name("name") {
            return ctx.text(prop).to_owned();
        }
    }
    ctx.text(node).trim_start_matches('$').to_owned()
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
                "./php/".to_owned(),
                "widget.php".to_owned(),
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
    fn member_call_emits_property_and_call() {
        let source = "<?php\nclass Widget {\n    public function bump() {\n        $this->store->save(42);\n    }\n}\n";
        let occs = walk_source(source);

        let property = occs
            .iter()
            .find(|o| o.symbol == "save" && o.context == OccurrenceContext::Property)
            .unwrap();
        assert_eq!(property.parent.as_deref(), Some("store"));

        let call = occs
            .iter()
            .find(|o| o.symbol == "save" && o.context == OccurrenceContext::Call)
            .unwrap();
        assert_eq!(call.parent.as_deref(), Some("store"));
    }

    #[test]
    fn call_on_call_result_leaves_parent_empty() {
        let source = "<?php\nfunction run() {\n    makeThing()->start();\n}\n";
        let occs = walk_source(source);

        let start_call = occs
            .iter()
            .find(|o| o.symbol == "start" && o.context == OccurrenceContext::Call)
            .unwrap();
        assert_eq!(start_call.parent, None);
        assert!(!occs.iter().any(|o| o.symbol == "start" && o.context == OccurrenceContext::Property));
    }
}
