//! Python walker, grounded on the same dispatch discipline as
//! [`super::c`]. Covers decorators, `async def`, class bodies, and
//! attribute calls (spec §4.4.3, Scenario C).

use tree_sitter::{Language, Node};

use crate::model::{Occurrence, OccurrenceContext};
use crate::parse::NodeKindIds;

use super::{named_children, process_children, WalkerContext};

const NODE_KINDS: &[&str] = &[
    "module",
    "class_definition",
    "function_definition",
    "decorated_definition",
    "decorator",
    "parameters",
    "parameter",
    "default_parameter",
    "typed_parameter",
    "typed_default_parameter",
    "identifier",
    "attribute",
    "call",
    "argument_list",
    "comment",
    "string",
    "import_statement",
    "import_from_statement",
    "assignment",
    "expression_statement",
    "return_statement",
    "raise_statement",
    "try_statement",
    "except_clause",
    "global_statement",
    "lambda",
];

pub fn language() -> Language {
    tree_sitter_python::LANGUAGE.into()
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

    if sym == ids.get("class_definition") {
        handle_class_definition(ctx, node);
    } else if sym == ids.get("decorated_definition") {
        handle_decorated_definition(ctx, node, class_name);
    } else if sym == ids.get("function_definition") {
        handle_function_definition(ctx, node, &[], class_name);
    } else if sym == ids.get("import_statement") || sym == ids.get("import_from_statement") {
        handle_import(ctx, node);
    } else if sym == ids.get("comment") {
        ctx.emit_cleaned_words(node, OccurrenceContext::Comment);
    } else if sym == ids.get("string") {
        ctx.emit_cleaned_words(node, OccurrenceContext::String);
    } else if sym == ids.get("assignment") {
        handle_assignment(ctx, node);
    } else if sym == ids.get("call") {
        handle_call(ctx, node);
    } else if sym == ids.get("attribute") {
        handle_attribute(ctx, node);
    } else {
        process_children(node, |child| visit_node(ctx, child, class_name));
    }
}

fn visit_expression(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let ids = ctx.ids;
    let sym = node.kind_id();
    if sym == ids.get("call") {
        handle_call(ctx, node);
    } else if sym == ids.get("attribute") {
        handle_attribute(ctx, node);
    } else {
        process_children(node, |child| visit_expression(ctx, child, class_name));
    }
}

fn handle_class_definition(ctx: &mut WalkerContext, node: Node) {
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

/// `@staticmethod` / `@x.y(...)` stacks above a `def` (spec §4.4.3):
/// all decorators join comma-separated into `clue` on the definition.
fn handle_decorated_definition(ctx: &mut WalkerContext, node: Node, class_name: Option<&str>) {
    let decorators: Vec<String> = named_children(node)
        .into_iter()
        .filter(|n| n.kind() == "decorator")
        .map(|d| decorator_text(ctx, d))
        .collect();

    let Some(def) = named_children(node)
        .into_iter()
        .find(|n| n.kind() == "function_definition" || n.kind() == "class_definition")
    else {
        return;
    };

    if def.kind() == "class_definition" {
        handle_class_definition(ctx, def);
    } else {
        handle_function_definition(ctx, def, &decorators, class_name);
    }
}

fn decorator_text(ctx: &WalkerContext, node: Node) -> String {
    let text = ctx.text(node);
    format!("@{}", text.trim_start_matches('@'))
}

fn handle_function_definition(ctx: &mut WalkerContext, node: Node, decorators: &[String], class_name: Option<&str>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = ctx.text(name_node).to_owned();
    let is_async = named_children(node)
        .into_iter()
        .next()
        .map(|first| ctx.text(first) == "async")
        .unwrap_or(false)
        || ctx.text(node).trim_start().starts_with("async ");

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
    if !decorators.is_empty() {
        occurrence = occurrence.with_clue(decorators.join(","));
    }
    if let Some(ty) = &return_type {
        occurrence = occurrence.with_type(ty.clone());
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
        let (name_node, type_node) = match param.kind() {
            "identifier" => (Some(param), None),
            "typed_parameter" => (param.named_child(0), param.child_by_field_name("type")),
            "default_parameter" => (param.child_by_field_name("name"), None),
            "typed_default_parameter" => (param.child_by_field_name("name"), param.child_by_field_name("type")),
            _ => continue,
        };
        let Some(name_node) = name_node else { continue };
        if name_node.kind() != "identifier" {
            continue;
        }
        let text = ctx.text(name_node).to_owned();
        if text == "self" || text == "cls" {
            continue;
        }
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

/// Type extraction (spec §4.4.4): a type annotation's text is emitted
/// literally for simple/subscript/attribute forms.
fn extract_type(ctx: &WalkerContext, node: Node) -> String {
    ctx.text(node).to_owned()
}

fn handle_import(ctx: &mut WalkerContext, node: Node) {
    for child in named_children(node) {
        match child.kind() {
            "dotted_name" => emit_import(ctx, child, ctx.text(child).to_owned()),
            "aliased_import" => {
                if let Some(name) = child.child_by_field_name("name") {
                    emit_import(ctx, child, ctx.text(name).to_owned());
                }
            }
            "relative_import" | "wildcard_import" => emit_import(ctx, child, ctx.text(child).to_owned()),
            _ => {}
        }
    }
}

fn emit_import(ctx: &mut WalkerContext, node: Node, name: String) {
    let line = ctx.line(node);
    ctx.emit(Occurrence::new(name, line, OccurrenceContext::Import, ctx.directory.clone(), ctx.filename.clone()));
}

fn handle_assignment(ctx: &mut WalkerContext, node: Node) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    let annotation_type = node.child_by_field_name("type").map(|t| extract_type(ctx, t));
    if left.kind() == "identifier" {
        let name = ctx.text(left).to_owned();
        let line = ctx.line(left);
        let mut occurrence = Occurrence::new(name, line, OccurrenceContext::Variable, ctx.directory.clone(), ctx.filename.clone());
        if let Some(ty) = &annotation_type {
            occurrence = occurrence.with_type(ty.clone());
        }
        ctx.emit(occurrence);
    }
    if let Some(right) = node.child_by_field_name("right") {
        visit_expression(ctx, right, None);
    }
}

/// Attribute calls (`self.handle(x)`) emit both a `property` on the
/// attribute and a `call` (spec `SPEC_FULL.md` §D.1: Python follows
/// the TypeScript policy, not the Go one).
fn handle_call(ctx: &mut WalkerContext, node: Node) {
    let Some(function) = node.child_by_field_name("function") else {
        return;
    };
    let line = ctx.line(node);

    let (name, parent) = match function.kind() {
        "identifier" => (ctx.text(function).to_owned(), None),
        "attribute" => {
            let Some(attr) = function.child_by_field_name("attribute") else {
                return;
            };
            let Some(object) = function.child_by_field_name("object") else {
                return;
            };
            let attr_name = ctx.text(attr).to_owned();
            let parent_name = if object.kind() == "call" {
                None
            } else {
                Some(immediate_parent_name(ctx, object))
            };
            if let Some(parent_name) = &parent_name {
                ctx.emit(
                    Occurrence::new(attr_name.clone(), line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
                        .with_parent(parent_name.clone()),
                );
            }
            if matches!(object.kind(), "attribute" | "call") {
                visit_expression(ctx, object, None);
            }
            (attr_name, parent_name)
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

/// Bare attribute access outside a call (e.g. `a.b.c` on its own):
/// emits `c` with `parent = b`, the immediate parent (spec §4.4.3).
fn handle_attribute(ctx: &mut WalkerContext, node: Node) {
    let Some(attr) = node.child_by_field_name("attribute") else {
        return;
    };
    let Some(object) = node.child_by_field_name("object") else {
        return;
    };
    let name = ctx.text(attr).to_owned();
    let parent = immediate_parent_name(ctx, object);
    let line = ctx.line(node);
    ctx.emit(
        Occurrence::new(name, line, OccurrenceContext::Property, ctx.directory.clone(), ctx.filename.clone())
            .with_parent(parent),
    );
    if matches!(object.kind(), "attribute" | "call") {
        visit_expression(ctx, object, None);
    }
}

fn immediate_parent_name(ctx: &WalkerContext, node: Node) -> String {
    if node.kind() == "attribute" {
        if let Some(attr) = node.child_by_field_name("attribute") {
            return ctx.text(attr).to_owned();
        }
    }
    ctx.text(node).to_owned()
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
                "./py/".to_owned(),
                "s.py".to_owned(),
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
    fn scenario_c_decorated_async_method() {
        let source = "class S:\n    @staticmethod\n    async def run(x: int) -> str:\n        return str(x)\n";
        let occs = walk_source(source);

        let class = occs.iter().find(|o| o.symbol == "S" && o.context == OccurrenceContext::Type).unwrap();
        assert!(class.definition);

        let run = occs.iter().find(|o| o.symbol == "run" && o.context == OccurrenceContext::Function).unwrap();
        assert!(run.definition);
        assert_eq!(run.parent.as_deref(), Some("S"));
        assert_eq!(run.modifier.as_deref(), Some("async"));
        assert_eq!(run.clue.as_deref(), Some("@staticmethod"));
        assert_eq!(run.r#type.as_deref(), Some("str"));

        let x_param = occs.iter().find(|o| o.symbol == "x" && o.context == OccurrenceContext::Argument && o.clue.is_none()).unwrap();
        assert_eq!(x_param.r#type.as_deref(), Some("int"));

        let str_call = occs.iter().find(|o| o.symbol == "str" && o.context == OccurrenceContext::Call).unwrap();
        assert!(str_call.parent.is_none());

        let x_arg = occs.iter().find(|o| o.symbol == "x" && o.context == OccurrenceContext::Argument && o.clue.as_deref() == Some("str")).unwrap();
        assert_eq!(x_arg.clue.as_deref(), Some("str"));
    }

    #[test]
    fn call_on_call_result_leaves_parent_empty() {
        let source = "def run():\n    make_thing().start()\n";
        let occs = walk_source(source);

        let start_call = occs
            .iter()
            .find(|o| o.symbol == "start" && o.context == OccurrenceContext::Call)
            .unwrap();
        assert_eq!(start_call.parent, None);
        assert!(!occs.iter().any(|o| o.symbol == "start" && o.context == OccurrenceContext::Property));
    }
}
