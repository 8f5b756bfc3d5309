extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod error;
pub mod grammar;
pub mod parser;
pub mod pipeline;

pub use error::{GrammarFormatError, SyntaxError};
pub use grammar::Grammar;
pub use parser::{ParserConfig, PredictiveParser, SentenceParse};
pub use pipeline::{Analysis, PipelineOptions, RunSummary};

fn error_to_json(e: GrammarFormatError) -> String {
    serde_json::json!({ "error": e.to_string() }).to_string()
}

#[wasm_bindgen]
pub fn first_follow_to_json(grammar: &str) -> String {
    match Analysis::from_source(grammar, PipelineOptions::default()) {
        Ok(a) => a
            .grammar
            .to_non_terminal_output_vec(&a.first, &a.follow)
            .to_json(),
        Err(e) => error_to_json(e),
    }
}

#[wasm_bindgen]
pub fn ll1_table_to_json(grammar: &str) -> String {
    match Analysis::from_source(grammar, PipelineOptions::default()) {
        Ok(a) => a.table.to_output(&a.grammar).to_json(),
        Err(e) => error_to_json(e),
    }
}

/// `sentences` holds one whitespace-separated sentence per line.
#[wasm_bindgen]
pub fn parse_to_json(grammar: &str, sentences: &str) -> String {
    match Analysis::from_source(grammar, PipelineOptions::default()) {
        Ok(a) => a.parse_sentences(sentences).to_json(),
        Err(e) => error_to_json(e),
    }
}

#[cfg(test)]
mod end_to_end_tests {
    use serde_json::Value;

    const LEFT_RECURSIVE: &str = "E -> E + T | T
T -> T * F | F
F -> ( E ) | id";

    #[test]
    fn first_follow_json() {
        let json: Value = serde_json::from_str(&crate::first_follow_to_json(LEFT_RECURSIVE)).unwrap();
        let rows = json["data"].as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["name"], "E");
        assert_eq!(rows[0]["first"], serde_json::json!(["(", "id"]));
        assert_eq!(rows[0]["follow"], serde_json::json!(["$", ")"]));
    }

    #[test]
    fn table_json() {
        let json: Value = serde_json::from_str(&crate::ll1_table_to_json(LEFT_RECURSIVE)).unwrap();
        assert_eq!(
            json["terminals"],
            serde_json::json!(["+", "*", "(", ")", "id", "$"])
        );
    }

    #[test]
    fn parse_json() {
        let json: Value =
            serde_json::from_str(&crate::parse_to_json(LEFT_RECURSIVE, "id * ( id + id )\nid id")).unwrap();
        let sentences = json["sentences"].as_array().unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0]["parse"]["outcome"], "Accept");
        assert_eq!(sentences[0]["parse"]["errors"], 0);
        assert!(sentences[1]["parse"]["errors"].as_u64().unwrap() > 0);
    }

    #[test]
    fn format_error_json() {
        let json: Value = serde_json::from_str(&crate::first_follow_to_json("S -> a -> b")).unwrap();
        assert_eq!(json["error"], "Line 1: too many \"->\"");
        let json: Value = serde_json::from_str(&crate::parse_to_json("| a", "a")).unwrap();
        assert_eq!(json["error"], "Line 1: cannot find left side");
    }
}
