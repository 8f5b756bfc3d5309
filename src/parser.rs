//! Table-driven predictive parser with panic-mode recovery.
//!
//! Recovery policy:
//! - terminal on top of the stack that does not match the input: the input token is
//!   skipped (the end-marker cannot be skipped, which ends the sentence);
//! - non-terminal `A` with no table entry for the input token: input tokens are
//!   discarded until one in FOLLOW(A) shows up, then `A` is popped unexpanded.
//!
//! The end-marker is never matched: `$` on the stack meeting `$` in the input is
//! the Accept step, so a trace ends with `Accept` rather than `Match $`.

use log::debug;
use serde::Serialize;

use crate::error::SyntaxError;
use crate::grammar::{FollowSets, Grammar, ParseTable, END_MARK, END_MARK_IDX, EPSILON_IDX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    /// Upper bound on steps per sentence. `None` picks a bound from the grammar
    /// and input size.
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStack {
    symbols: Vec<usize>,
}

impl ParserStack {
    pub fn new(start_symbol: usize) -> Self {
        Self {
            symbols: vec![END_MARK_IDX, start_symbol],
        }
    }

    pub fn push(&mut self, symbol: usize) {
        self.symbols.push(symbol);
    }

    /// Pushes `production` right to left so its first symbol ends on top.
    /// Epsilon pushes nothing.
    pub fn push_production(&mut self, production: &[usize]) {
        for &symbol in production.iter().rev() {
            if symbol != EPSILON_IDX {
                self.push(symbol);
            }
        }
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.symbols.pop()
    }

    pub fn top(&self) -> Option<usize> {
        self.symbols.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Bottom to top.
    pub fn to_names<'a>(&self, g: &'a Grammar) -> Vec<&'a str> {
        self.symbols.iter().map(|&s| g.get_symbol_name(s)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Action {
    Match {
        terminal: String,
    },
    Expand {
        non_terminal: String,
        production: Vec<String>,
    },
    Error {
        error: SyntaxError,
    },
    /// Skipped one input token after a terminal mismatch.
    Skip {
        token: String,
    },
    /// Discarded `skipped` until `sync` and popped `non_terminal`.
    Recover {
        non_terminal: String,
        skipped: Vec<String>,
        sync: String,
    },
    Accept,
}

impl Action {
    pub fn label(&self) -> String {
        match self {
            Action::Match { terminal } => format!("Match {}", terminal),
            Action::Expand {
                non_terminal,
                production,
            } => format!("Expand {} -> {}", non_terminal, production.join(" ")),
            Action::Error { error } => format!("Error: {}", error),
            Action::Skip { token } => format!("Recover: skip {}", token),
            Action::Recover {
                non_terminal,
                skipped,
                sync,
            } => {
                if skipped.is_empty() {
                    format!("Recover: pop {} at {}", non_terminal, sync)
                } else {
                    format!(
                        "Recover: skip {} to {}, pop {}",
                        skipped.join(" "),
                        sync,
                        non_terminal
                    )
                }
            }
            Action::Accept => "Accept".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub step: usize,
    /// Bottom to top.
    pub stack: Vec<String>,
    pub input: Vec<String>,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Exhausted {
    /// The stack ran out while input remained. `$` is never popped, so this only
    /// happens for a grammar without a start symbol.
    StackEmpty,
    /// The input reached the end-marker while the stack still expected a terminal.
    InputEmpty,
    /// No token in FOLLOW of the failing non-terminal before the end-marker.
    RecoveryFailed,
    /// The step budget ran out.
    StepLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Accept,
    Exhausted(Exhausted),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceParse {
    pub outcome: Outcome,
    pub errors: usize,
    pub trace: Vec<TraceEntry>,
}

impl SentenceParse {
    /// Reached Accept without raising any error.
    pub fn accepted(&self) -> bool {
        self.outcome == Outcome::Accept && self.errors == 0
    }

    pub fn matched_terminals(&self) -> Vec<&str> {
        self.trace
            .iter()
            .filter_map(|entry| match &entry.action {
                Action::Match { terminal } => Some(terminal.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = vec![vec![
            "Step".to_string(),
            "Stack".to_string(),
            "Input".to_string(),
            "Action".to_string(),
        ]];
        for entry in &self.trace {
            output.push(vec![
                entry.step.to_string(),
                entry.stack.join(" "),
                entry.input.join(" "),
                entry.action.label(),
            ]);
        }

        let width: Vec<usize> = (0..4)
            .map(|j| {
                output
                    .iter()
                    .map(|line| line[j].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| {
                        if i == 3 {
                            s.clone()
                        } else {
                            format!("{:>width$}", s, width = width[i])
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Stack and remaining input at the start of a step.
struct Snapshot {
    stack: Vec<String>,
    input: Vec<String>,
}

impl Snapshot {
    fn record(&self, trace: &mut Vec<TraceEntry>, action: Action) {
        trace.push(TraceEntry {
            step: trace.len(),
            stack: self.stack.clone(),
            input: self.input.clone(),
            action,
        });
    }
}

struct Token<'a> {
    name: &'a str,
    terminal: Option<usize>,
}

pub struct PredictiveParser<'a> {
    grammar: &'a Grammar,
    table: &'a ParseTable,
    follow: &'a FollowSets,
    config: ParserConfig,
}

impl<'a> PredictiveParser<'a> {
    pub fn new(grammar: &'a Grammar, table: &'a ParseTable, follow: &'a FollowSets) -> Self {
        Self::with_config(grammar, table, follow, ParserConfig::default())
    }

    pub fn with_config(
        grammar: &'a Grammar,
        table: &'a ParseTable,
        follow: &'a FollowSets,
        config: ParserConfig,
    ) -> Self {
        Self {
            grammar,
            table,
            follow,
            config,
        }
    }

    fn tokenize<'t, S: AsRef<str>>(&self, tokens: &'t [S]) -> Vec<Token<'t>> {
        let mut input: Vec<Token<'t>> = Vec::new();
        for token in tokens {
            let name = token.as_ref();
            if name == END_MARK {
                break;
            }
            let terminal = self
                .grammar
                .get_symbol_index(name)
                .filter(|&i| self.grammar.is_terminal(i));
            input.push(Token { name, terminal });
        }
        input.push(Token {
            name: END_MARK,
            terminal: Some(END_MARK_IDX),
        });
        input
    }

    fn step_budget(&self, input_len: usize) -> usize {
        self.config
            .max_steps
            .unwrap_or(64 * (input_len + 1) * (self.grammar.symbols.len() + 1))
    }

    /// Parses one sentence. Anything after the first end-marker is ignored, and an
    /// end-marker is appended when missing.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> SentenceParse {
        let input = self.tokenize(tokens);
        let budget = self.step_budget(input.len());
        let g = self.grammar;

        let mut trace: Vec<TraceEntry> = Vec::new();
        let mut errors = 0;
        let mut pos = 0;
        let mut stack = match g.start_symbol() {
            Some(start) => ParserStack::new(start),
            None => ParserStack::default(),
        };

        let outcome = loop {
            if trace.len() >= budget {
                break Outcome::Exhausted(Exhausted::StepLimit);
            }

            let current = &input[pos];
            let snapshot = Snapshot {
                stack: stack.to_names(g).into_iter().map(String::from).collect(),
                input: input[pos..].iter().map(|t| t.name.to_string()).collect(),
            };
            let mut record = |action: Action| snapshot.record(&mut trace, action);

            let top = match stack.top() {
                Some(top) => top,
                None if current.terminal == Some(END_MARK_IDX) => {
                    record(Action::Accept);
                    break Outcome::Accept;
                }
                None => break Outcome::Exhausted(Exhausted::StackEmpty),
            };

            if top == END_MARK_IDX && current.terminal == Some(END_MARK_IDX) {
                record(Action::Accept);
                break Outcome::Accept;
            }

            if g.is_terminal(top) {
                if current.terminal == Some(top) {
                    record(Action::Match {
                        terminal: current.name.to_string(),
                    });
                    stack.pop();
                    pos += 1;
                    continue;
                }

                let error = SyntaxError::Mismatch {
                    expected: g.get_symbol_name(top).to_string(),
                    found: current.name.to_string(),
                };
                debug!("{}", error);
                record(Action::Error { error });
                errors += 1;

                if current.terminal == Some(END_MARK_IDX) {
                    break Outcome::Exhausted(Exhausted::InputEmpty);
                }
                record(Action::Skip {
                    token: current.name.to_string(),
                });
                pos += 1;
                continue;
            }

            let entry = current.terminal.and_then(|t| self.table.get(top, t));
            if let Some(entry) = entry {
                let production = &g.productions(top)[entry.production];
                record(Action::Expand {
                    non_terminal: g.get_symbol_name(top).to_string(),
                    production: g
                        .production_to_vec_str(production)
                        .into_iter()
                        .map(String::from)
                        .collect(),
                });
                stack.pop();
                stack.push_production(production);
                continue;
            }

            let error = SyntaxError::NoEntry {
                non_terminal: g.get_symbol_name(top).to_string(),
                found: current.name.to_string(),
            };
            debug!("{}", error);
            record(Action::Error { error });
            errors += 1;

            let sync = input[pos..].iter().position(|t| {
                t.terminal
                    .map_or(false, |terminal| self.follow.contains(top, terminal))
            });
            match sync {
                Some(offset) => {
                    record(Action::Recover {
                        non_terminal: g.get_symbol_name(top).to_string(),
                        skipped: input[pos..pos + offset]
                            .iter()
                            .map(|t| t.name.to_string())
                            .collect(),
                        sync: input[pos + offset].name.to_string(),
                    });
                    pos += offset;
                    stack.pop();
                }
                None => break Outcome::Exhausted(Exhausted::RecoveryFailed),
            }
        };

        debug!(
            "sentence finished with {:?} after {} steps and {} errors",
            outcome,
            trace.len(),
            errors
        );

        SentenceParse {
            outcome,
            errors,
            trace,
        }
    }
}

/// Parses `tokens` against `table`, recovering with `follow` as synchronizing sets.
pub fn parse_sentence<S: AsRef<str>>(
    table: &ParseTable,
    grammar: &Grammar,
    follow: &FollowSets,
    tokens: &[S],
) -> SentenceParse {
    PredictiveParser::new(grammar, table, follow).parse(tokens)
}
