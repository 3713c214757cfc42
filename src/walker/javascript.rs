//! JavaScript entry point: supplies the grammar to [`super::ecma`],
//! which owns the actual dispatch.

use tree_sitter::{Language, Node};

use crate::parse::NodeKindIds;

use super::ecma;
use super::WalkerContext;

pub fn language() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

pub fn node_kind_ids() -> NodeKindIds {
    NodeKindIds::build(&language(), ecma::NODE_KINDS)
}

pub fn walk(ctx: &mut WalkerContext, root: Node) {
    ecma::walk(ctx, root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OccurrenceContext;

    #[test]
    fn member_call_emits_property_and_call() {
        let source = "class Widget {\n  bump() {\n    this.store.save(42);\n  }\n}\n";
        let occs = ecma::test_walk(source, "widget.js", language(), &node_kind_ids());

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

        assert!(occs
            .iter()
            .any(|o| o.symbol == "store" && o.context == OccurrenceContext::Property && o.parent.as_deref() == Some("this")));
    }

    #[test]
    fn call_on_call_result_leaves_parent_empty() {
        let source = "function run() {\n  makeThing().start();\n}\n";
        let occs = ecma::test_walk(source, "run.js", language(), &node_kind_ids());

        let start_call = occs
            .iter()
            .find(|o| o.symbol == "start" && o.context == OccurrenceContext::Call)
            .unwrap();
        assert_eq!(start_call.parent, None);
        assert!(!occs
            .iter()
            .any(|o| o.symbol == "start" && o.context == OccurrenceContext::Property));
    }
}
