//! Property tests for the tokenizer.

use docdrift_lib::element::{Block, Element, Parameter};
use docdrift_lib::tokenize::{Tokenizer, tokenize};
use proptest::prelude::*;

fn sentence() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,8}( [a-z]{1,8}){0,5}\\."
}

proptest! {
    #[test]
    fn every_paragraph_becomes_one_block(paragraphs in prop::collection::vec(sentence(), 1..8)) {
        let body = paragraphs.join("\n\n");
        let elements = tokenize(&body).unwrap();

        let expected: Vec<Element> = paragraphs
            .iter()
            .map(|text| Element::from(Block::paragraph(text.as_str())))
            .collect();
        prop_assert_eq!(elements, expected);
    }

    #[test]
    fn parameter_directive_yields_one_parameter_per_row(names in prop::collection::vec("[a-z][a-z_]{0,10}", 1..6)) {
        let mut data = serde_json::Map::new();
        data.insert("h-0".into(), "Property".into());
        data.insert("h-1".into(), "Type".into());
        for (row, name) in names.iter().enumerate() {
            data.insert(format!("{row}-0"), name.as_str().into());
            data.insert(format!("{row}-1"), "string".into());
        }
        let payload = serde_json::json!({"data": data, "cols": 2, "rows": names.len()});
        let body = format!("[block:parameters]\n{payload}\n[/block]\n");

        let elements = tokenize(&body).unwrap();
        let expected: Vec<Element> = names
            .iter()
            .map(|name| Element::from(Parameter::new(name.as_str(), "string", "", "")))
            .collect();
        prop_assert_eq!(elements, expected);
    }

    #[test]
    fn arbitrary_input_never_panics_and_stays_fused(body in "\\PC{0,200}") {
        let mut tokens = Tokenizer::new(&body);
        let mut failed = false;
        for item in tokens.by_ref() {
            prop_assert!(!failed, "element yielded after an error");
            failed = item.is_err();
        }
        prop_assert!(tokens.next().is_none());
    }
}
