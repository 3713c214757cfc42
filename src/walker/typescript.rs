//! TypeScript entry point: supplies the grammar to [`super::ecma`],
//! which owns the actual dispatch (spec §4.4.3, Scenario D).

use tree_sitter::{Language, Node};

use crate::parse::NodeKindIds;

use super::ecma;
use super::WalkerContext;

pub fn language() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
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
    fn scenario_d_private_field_access() {
        let source = "class Widget {\n  #b: number = 0;\n\n  bump(): void {\n    this.#b = this.#b + 1;\n  }\n}\n";
        let occs = ecma::test_walk(source, "widget.ts", language(), &node_kind_ids());

        let field = occs
            .iter()
            .find(|o| o.symbol == "#b" && o.context == OccurrenceContext::Property && o.definition)
            .unwrap();
        assert_eq!(field.parent.as_deref(), Some("Widget"));
        assert_eq!(field.modifier.as_deref(), Some("private"));
        assert_eq!(field.r#type.as_deref(), Some("number"));

        let bump = occs
            .iter()
            .find(|o| o.symbol == "bump" && o.context == OccurrenceContext::Function)
            .unwrap();
        assert_eq!(bump.parent.as_deref(), Some("Widget"));
        assert_eq!(bump.r#type.as_deref(), Some("void"));

        let access = occs
            .iter()
            .filter(|o| o.symbol == "#b" && o.context == OccurrenceContext::Property && !o.definition)
            .count();
        assert!(access >= 1);
        assert!(occs
            .iter()
            .any(|o| o.symbol == "#b" && o.context == OccurrenceContext::Property && o.parent.as_deref() == Some("this")));
    }
}
