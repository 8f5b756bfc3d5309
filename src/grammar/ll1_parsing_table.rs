use crowbook_text_processing::escape::tex as escape_tex;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::Grammar;

use super::{
    grammar::{is_epsilon_production, END_MARK_IDX, EPSILON_IDX},
    pretty_print::ProductionOutput,
    FirstSets, FollowSets,
};

/// Selected alternative for one cell. `epsilon` marks a literal `A -> ε`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub production: usize,
    pub epsilon: bool,
}

/// Two alternatives of `non_terminal` predicted on the same `terminal`.
/// `kept` is the one left in the table, `rejected` the one that lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableConflict {
    pub non_terminal: usize,
    pub terminal: usize,
    pub kept: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseTable {
    cells: BTreeMap<(usize, usize), TableEntry>,
    conflicts: Vec<TableConflict>,
}

impl ParseTable {
    pub fn get(&self, non_terminal: usize, terminal: usize) -> Option<TableEntry> {
        self.cells.get(&(non_terminal, terminal)).copied()
    }

    pub fn conflicts(&self) -> &[TableConflict] {
        &self.conflicts
    }

    pub fn conflicting_cells(&self) -> BTreeSet<(usize, usize)> {
        self.conflicts
            .iter()
            .map(|c| (c.non_terminal, c.terminal))
            .collect()
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First write wins. A later write of a different alternative is recorded as a
    /// conflict and discarded.
    fn insert(&mut self, non_terminal: usize, terminal: usize, entry: TableEntry) {
        match self.cells.get(&(non_terminal, terminal)) {
            None => {
                self.cells.insert((non_terminal, terminal), entry);
            }
            Some(existing) if existing.production == entry.production => {}
            Some(existing) => {
                let conflict = TableConflict {
                    non_terminal,
                    terminal,
                    kept: existing.production,
                    rejected: entry.production,
                };
                if !self.conflicts.contains(&conflict) {
                    self.conflicts.push(conflict);
                }
            }
        }
    }
}

impl Grammar {
    /// Builds the LL(1) table: `A -> P` goes to `[A, t]` for every terminal `t` in
    /// FIRST(P), and for every `t` in FOLLOW(A) when P can derive epsilon.
    pub fn generate_ll1_parsing_table(&self, first: &FirstSets, follow: &FollowSets) -> ParseTable {
        let mut table = ParseTable::default();

        for nt in self.non_terminal_iter() {
            for (i, production) in nt.productions.iter().enumerate() {
                let entry = TableEntry {
                    production: i,
                    epsilon: is_epsilon_production(production),
                };
                let production_first = self.calculate_first_for_production(first, production);

                for &t in production_first.iter().filter(|&&t| t != EPSILON_IDX) {
                    table.insert(nt.index, t, entry);
                }

                if production_first.contains(&EPSILON_IDX) {
                    if let Some(follow) = follow.get(nt.index) {
                        for &t in follow {
                            table.insert(nt.index, t, entry);
                        }
                    }
                }
            }
        }

        for conflict in &table.conflicts {
            warn!(
                "LL(1) conflict at [{}, {}]: keeping {}, dropping {}",
                self.get_symbol_name(conflict.non_terminal),
                self.get_symbol_name(conflict.terminal),
                self.production_to_vec_str(&self.productions(conflict.non_terminal)[conflict.kept])
                    .join(" "),
                self.production_to_vec_str(
                    &self.productions(conflict.non_terminal)[conflict.rejected]
                )
                .join(" "),
            );
        }
        debug!(
            "LL(1) table has {} cells and {} conflicts",
            table.len(),
            table.conflicts.len()
        );

        table
    }
}

/// Printable form of a [`ParseTable`]. A cell lists every alternative that
/// competed for it, the one kept first.
#[derive(Debug, Serialize)]
pub struct LL1ParsingTable<'a> {
    terminals: Vec<&'a str>,
    rows: Vec<(&'a str, Vec<ProductionOutput<'a>>)>,
}

impl LL1ParsingTable<'_> {
    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|&t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(
                row.iter()
                    .map(|productions| productions.to_plaintext(left.chars().count(), false)),
            );
            output.push(line);
        }

        let width: Vec<usize> = (0..output[0].len())
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
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|&t| format!("\\text{{{}}}", escape_tex(t))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        let terminal_set: HashSet<&str> = self.terminals.iter().cloned().collect();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![format!("{}", escape_tex(*left))];
            line.extend(row.iter().map(|productions| {
                let cell = productions.to_latex_with_terminals(&terminal_set);
                if productions.rights.len() > 1 {
                    format!("{{\\color{{red}}{}}}", cell)
                } else {
                    cell
                }
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl ParseTable {
    pub fn to_output<'a>(&self, g: &'a Grammar) -> LL1ParsingTable<'a> {
        let mut columns: Vec<usize> = g.terminal_iter().map(|(i, _)| i).collect();
        columns.push(END_MARK_IDX);
        let terminals: Vec<&str> = columns.iter().map(|&i| g.get_symbol_name(i)).collect();

        let mut rows: Vec<(&str, Vec<ProductionOutput>)> = Vec::new();
        for nt in g.non_terminal_iter() {
            let left = nt.name.as_str();
            let row = columns
                .iter()
                .map(|&t| {
                    let mut rights = Vec::new();
                    if let Some(entry) = self.get(nt.index, t) {
                        rights.push(g.production_to_vec_str(&nt.productions[entry.production]));
                        for conflict in self
                            .conflicts
                            .iter()
                            .filter(|c| c.non_terminal == nt.index && c.terminal == t)
                        {
                            rights.push(
                                g.production_to_vec_str(&nt.productions[conflict.rejected]),
                            );
                        }
                    }
                    ProductionOutput { left, rights }
                })
                .collect();
            rows.push((left, row));
        }

        LL1ParsingTable { terminals, rows }
    }

    /// One line per conflict, e.g. `[A, a]: A -> a | A -> a A'`.
    pub fn conflicts_to_plaintext(&self, g: &Grammar) -> String {
        self.conflicts
            .iter()
            .map(|c| {
                let left = g.get_symbol_name(c.non_terminal);
                let productions = g.productions(c.non_terminal);
                format!(
                    "[{}, {}]: {} -> {} | {} -> {}",
                    left,
                    g.get_symbol_name(c.terminal),
                    left,
                    g.production_to_vec_str(&productions[c.kept]).join(" "),
                    left,
                    g.production_to_vec_str(&productions[c.rejected]).join(" "),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
