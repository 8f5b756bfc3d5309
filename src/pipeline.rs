//! The whole LL(1) run: load, left factor, eliminate left recursion, FIRST,
//! FOLLOW, table, then parse any number of sentences against the result.

use log::info;
use serde::Serialize;

use crate::error::GrammarFormatError;
use crate::grammar::{Dialect, FirstSets, FollowSets, Grammar, ParseTable, Transformed};
use crate::parser::{Outcome, ParserConfig, PredictiveParser, SentenceParse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub dialect: Dialect,
    pub left_factor: bool,
    pub eliminate_left_recursion: bool,
    pub parser: ParserConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Words,
            left_factor: true,
            eliminate_left_recursion: true,
            parser: ParserConfig::default(),
        }
    }
}

/// Every stage of one run. `factored` and `recursion_free` are `None` when the
/// stage was disabled.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub original: Grammar,
    pub factored: Option<Transformed>,
    pub recursion_free: Option<Transformed>,
    pub grammar: Grammar,
    pub first: FirstSets,
    pub follow: FollowSets,
    pub table: ParseTable,
    options: PipelineOptions,
}

impl Analysis {
    pub fn from_source(source: &str, options: PipelineOptions) -> Result<Self, GrammarFormatError> {
        let g = Grammar::parse_with_dialect(source, options.dialect)?;
        Ok(Self::run(g, options))
    }

    pub fn run(original: Grammar, options: PipelineOptions) -> Self {
        let mut grammar = original.clone();

        let factored = if options.left_factor {
            let t = grammar.left_factor();
            info!("left factoring: {} rewrites", t.events.len());
            grammar = t.grammar.clone();
            Some(t)
        } else {
            None
        };

        let recursion_free = if options.eliminate_left_recursion {
            let t = grammar.eliminate_left_recursion();
            info!("left recursion elimination: {} rewrites", t.events.len());
            grammar = t.grammar.clone();
            Some(t)
        } else {
            None
        };

        let first = grammar.calculate_first();
        let follow = grammar.calculate_follow(&first);
        let table = grammar.generate_ll1_parsing_table(&first, &follow);
        if !table.is_ll1() {
            info!(
                "grammar is not LL(1): {} conflicts, first alternative kept",
                table.conflicts().len()
            );
        }

        Self {
            original,
            factored,
            recursion_free,
            grammar,
            first,
            follow,
            table,
            options,
        }
    }

    pub fn parser(&self) -> PredictiveParser<'_> {
        PredictiveParser::with_config(&self.grammar, &self.table, &self.follow, self.options.parser)
    }

    /// Conflicts of the table, one per line under a heading. `None` for an LL(1) grammar.
    pub fn conflict_report(&self) -> Option<String> {
        if self.table.is_ll1() {
            return None;
        }
        Some(format!(
            "Conflicts (first alternative kept):\n{}",
            self.table.conflicts_to_plaintext(&self.grammar)
        ))
    }

    /// Splits one sentence into tokens the same way the grammar source was split.
    pub fn tokenize(&self, sentence: &str) -> Vec<String> {
        match self.options.dialect {
            Dialect::Words => sentence.split_whitespace().map(String::from).collect(),
            Dialect::Chars => sentence
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(String::from)
                .collect(),
        }
    }

    /// Parses every non-blank line of `text` as an independent sentence.
    pub fn parse_sentences(&self, text: &str) -> RunSummary {
        let parser = self.parser();
        let sentences = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| SentenceResult {
                sentence: line.trim().to_string(),
                parse: parser.parse(&self.tokenize(line)),
            })
            .collect();
        RunSummary { sentences }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SentenceResult {
    pub sentence: String,
    pub parse: SentenceParse,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub sentences: Vec<SentenceResult>,
}

impl RunSummary {
    pub fn total_errors(&self) -> usize {
        self.sentences.iter().map(|s| s.parse.errors).sum()
    }

    pub fn accepted_count(&self) -> usize {
        self.sentences.iter().filter(|s| s.parse.accepted()).count()
    }

    pub fn to_plaintext(&self) -> String {
        let mut lines: Vec<String> = self
            .sentences
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let verdict = match s.parse.outcome {
                    Outcome::Accept if s.parse.errors == 0 => "accepted".to_string(),
                    Outcome::Accept => "recovered".to_string(),
                    Outcome::Exhausted(reason) => format!("failed ({:?})", reason),
                };
                format!(
                    "#{} {}: {}, {} errors",
                    i + 1,
                    s.sentence,
                    verdict,
                    s.parse.errors
                )
            })
            .collect();
        lines.push(format!(
            "{} of {} sentences accepted, {} errors in total",
            self.accepted_count(),
            self.sentences.len(),
            self.total_errors()
        ));
        lines.join("\n")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
