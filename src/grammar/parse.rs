use log::debug;

use crate::error::GrammarFormatError;
use crate::Grammar;

use super::grammar::{concat_production, END_MARK_IDX};

/// How the right-hand sides of a grammar source are split into symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Symbols separated by whitespace: `E -> T E'`.
    #[default]
    Words,
    /// Every non-whitespace character is a symbol: `S->aB|e`.
    Chars,
}

/// One non-terminal definition: `head -> alt | alt | ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub head: String,
    pub alternatives: Vec<Vec<String>>,
}

impl Record {
    pub fn new(line: usize, head: &str, alternatives: &[&[&str]]) -> Self {
        Self {
            line,
            head: head.to_string(),
            alternatives: alternatives
                .iter()
                .map(|alt| alt.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }
}

impl Grammar {
    pub fn parse(grammar: &str) -> Result<Self, GrammarFormatError> {
        Self::parse_with_dialect(grammar, Dialect::Words)
    }

    pub fn parse_with_dialect(grammar: &str, dialect: Dialect) -> Result<Self, GrammarFormatError> {
        Self::from_records(split_records(grammar, dialect)?)
    }

    /// Builds a grammar from records. Every head is registered as a non-terminal
    /// before any right-hand side is read, so a symbol is a terminal exactly when
    /// no record defines it. The first record's head is the start symbol.
    pub fn from_records(records: Vec<Record>) -> Result<Self, GrammarFormatError> {
        let mut g = Self::new();

        for record in &records {
            if let Some(idx) = g.get_symbol_index(&record.head) {
                if !g.is_non_terminal(idx) {
                    return Err(GrammarFormatError::ReservedLeftSide {
                        line: record.line,
                        head: record.head.clone(),
                    });
                }
            }
            g.add_non_terminal(&record.head);
        }

        for record in records {
            let left = g.symbol_table[&record.head];
            for right in record.alternatives {
                let mut symbols = Vec::with_capacity(right.len());
                for s in right {
                    let idx = match g.get_symbol_index(&s) {
                        Some(END_MARK_IDX) => {
                            return Err(GrammarFormatError::ReservedRightSide { line: record.line })
                        }
                        Some(idx) => idx,
                        None => g.add_terminal(s),
                    };
                    symbols.push(idx);
                }
                g.add_production(left, concat_production(&symbols, &[]));
            }
        }

        if g.start_symbol.is_none() {
            return Err(GrammarFormatError::Empty);
        }
        debug!(
            "loaded grammar with {} non-terminals and {} terminals",
            g.non_terminal_iter().count(),
            g.terminal_iter().count()
        );

        Ok(g)
    }
}

/// Splits grammar source into records. A line starting with `|` continues the
/// previous record; blank lines are skipped.
pub fn split_records(grammar: &str, dialect: Dialect) -> Result<Vec<Record>, GrammarFormatError> {
    let mut records: Vec<Record> = Vec::new();

    for (i, line) in grammar.lines().enumerate() {
        let line_no = i + 1;
        if line.chars().all(|c| c.is_whitespace()) {
            continue;
        }
        let parts: Vec<&str> = line.split("->").collect();
        if parts.len() > 2 {
            return Err(GrammarFormatError::TooManyArrows { line: line_no });
        }
        let rights = if parts.len() == 2 {
            let left_str = parts[0].trim();
            if left_str.is_empty() {
                return Err(GrammarFormatError::EmptyLeftSide { line: line_no });
            } else if left_str.split_whitespace().count() != 1 {
                return Err(GrammarFormatError::LeftSideContainsWhitespace { line: line_no });
            } else if dialect == Dialect::Chars && left_str.chars().count() != 1 {
                return Err(GrammarFormatError::LeftSideTooLong { line: line_no });
            }
            records.push(Record {
                line: line_no,
                head: left_str.to_string(),
                alternatives: Vec::new(),
            });
            parts[1]
        } else {
            match (parts[0].trim().strip_prefix('|'), records.last()) {
                (Some(rest), Some(_)) => rest,
                _ => return Err(GrammarFormatError::MissingLeftSide { line: line_no }),
            }
        };

        // `records` is non-empty here: either pushed above or checked as a continuation.
        if let Some(record) = records.last_mut() {
            record
                .alternatives
                .extend(rights.split('|').map(|right| split_symbols(right, dialect)));
        }
    }

    Ok(records)
}

fn split_symbols(right: &str, dialect: Dialect) -> Vec<String> {
    match dialect {
        Dialect::Words => right.split_whitespace().map(|s| s.to_string()).collect(),
        Dialect::Chars => right
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{EPSILON, EPSILON_IDX};

    #[test]
    fn simple_parse() {
        let g = Grammar::parse("S -> a").unwrap();

        let s = g.symbol_table.get("S").unwrap().clone();
        let a = g.symbol_table.get("a").unwrap().clone();

        assert_eq!(g.get_symbol_name(s), "S");
        assert_eq!(g.get_symbol_name(a), "a");
        assert!(g.is_non_terminal(s));
        assert!(g.is_terminal(a));
        assert_eq!(g.productions(s)[0], vec![a]);
        assert_eq!(g.start_symbol(), Some(s));
    }

    #[test]
    fn simple_parse_with_space_and_newline() {
        let g = Grammar::parse("  S -> a \n | b c").unwrap();

        let s = g.symbol_table["S"];
        let a = g.symbol_table["a"];
        let b = g.symbol_table["b"];
        let c = g.symbol_table["c"];

        assert_eq!(g.productions(s), &[vec![a], vec![b, c]]);
    }

    #[test]
    fn classification_by_head_not_spelling() {
        let g = Grammar::parse("s -> X y\nX -> z").unwrap();
        assert!(g.is_non_terminal(g.symbol_table["s"]));
        assert!(g.is_non_terminal(g.symbol_table["X"]));
        assert!(g.is_terminal(g.symbol_table["y"]));
        assert!(g.is_terminal(g.symbol_table["z"]));
    }

    #[test]
    fn forward_reference_is_non_terminal() {
        let g = Grammar::parse("S -> A b\nA -> c").unwrap();
        assert!(g.is_non_terminal(g.symbol_table["A"]));
    }

    #[test]
    fn epsilon_spellings() {
        let g = Grammar::parse("S -> a | e | ε |").unwrap();
        let s = g.symbol_table["S"];
        assert_eq!(
            g.productions_by_name("S").unwrap(),
            vec![vec!["a"], vec![EPSILON], vec![EPSILON], vec![EPSILON]]
        );
        assert_eq!(g.productions(s)[1], vec![EPSILON_IDX]);
        assert_eq!(g.get_symbol_index("ϵ"), Some(EPSILON_IDX));
    }

    #[test]
    fn repeated_head_appends() {
        let g = Grammar::parse("S -> a\nS -> b").unwrap();
        assert_eq!(g.productions_by_name("S").unwrap(), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn chars_dialect() {
        let g = Grammar::parse_with_dialect("S->aB|e\nB->b", Dialect::Chars).unwrap();
        assert_eq!(
            g.productions_by_name("S").unwrap(),
            vec![vec!["a", "B"], vec![EPSILON]]
        );
        assert!(g.is_non_terminal(g.symbol_table["B"]));
    }

    #[test]
    fn end_mark_in_body() {
        assert_eq!(
            Grammar::parse("S -> a\nA -> a $ b").unwrap_err(),
            GrammarFormatError::ReservedRightSide { line: 2 }
        );
        assert_eq!(
            Grammar::parse("S -> a\n | $").unwrap_err(),
            GrammarFormatError::ReservedRightSide { line: 1 }
        );
    }

    #[test]
    fn empty_parse() {
        assert_eq!(Grammar::parse("  \n  ").unwrap_err(), GrammarFormatError::Empty);
    }

    #[test]
    #[should_panic]
    fn two_rightarrows_parse() {
        let _g = Grammar::parse("S -> a -> b").unwrap();
    }

    #[test]
    #[should_panic]
    fn no_left_parse() {
        let _g = Grammar::parse("-> a").unwrap();
    }

    #[test]
    #[should_panic]
    fn no_previous_left_parse() {
        let _g = Grammar::parse("| a b\n S -> a").unwrap();
    }

    #[test]
    #[should_panic]
    fn left_contain_space() {
        let _g = Grammar::parse("S a S -> x").unwrap();
    }

    #[test]
    fn errors_carry_line_numbers() {
        assert_eq!(
            Grammar::parse("S -> a\n\nfoo bar").unwrap_err(),
            GrammarFormatError::MissingLeftSide { line: 3 }
        );
        assert_eq!(
            Grammar::parse("e -> a").unwrap_err(),
            GrammarFormatError::ReservedLeftSide {
                line: 1,
                head: "e".to_string()
            }
        );
        assert_eq!(
            Grammar::parse_with_dialect("AB->a", Dialect::Chars).unwrap_err(),
            GrammarFormatError::LeftSideTooLong { line: 1 }
        );
    }

    #[test]
    fn from_records() {
        let g = Grammar::from_records(vec![
            Record::new(1, "A", &[&["a"], &["a", "b"]]),
        ])
        .unwrap();
        assert_eq!(
            g.productions_by_name("A").unwrap(),
            vec![vec!["a"], vec!["a", "b"]]
        );
    }

    #[test]
    fn from_records_reports_record_line() {
        let err = Grammar::from_records(vec![
            Record::new(1, "S", &[&["a"]]),
            Record::new(4, "$", &[&["b"]]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            GrammarFormatError::ReservedLeftSide {
                line: 4,
                head: "$".to_string()
            }
        );
        assert_eq!(err.to_string(), "Line 4: `$` is reserved and cannot be a left side");
    }
}
