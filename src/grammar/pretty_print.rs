use std::collections::{BTreeSet, HashSet};

use crowbook_text_processing::escape;
use serde::Serialize;

use super::{grammar::EPSILON_IDX, FirstSets, FollowSets, Grammar, EPSILON};

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    pub rights: Vec<Vec<&'a str>>,
}

impl ProductionOutput<'_> {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool) -> String {
        self.render_latex(and_sign, None)
    }

    /// Like [`ProductionOutput::to_latex`], with terminals set in `\text{}`.
    pub fn to_latex_with_terminals(&self, terminal_set: &HashSet<&str>) -> String {
        self.render_latex(false, Some(terminal_set))
    }

    fn render_latex(&self, and_sign: bool, terminal_set: Option<&HashSet<&str>>) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|s| match terminal_set {
                        Some(set) if set.contains(s) => format!("\\text{{{}}}", escape::tex(*s)),
                        _ => escape::tex(*s).to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        let output = left + &right;
        output.replace(EPSILON, "\\epsilon")
    }
}

#[derive(Serialize)]
pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
}

impl ProductionOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.chars().count())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.productions.iter().map(|s| s.to_latex(true)))
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .non_terminal_iter()
            .map(|non_terminal| ProductionOutput {
                left: non_terminal.name.as_str(),
                rights: non_terminal
                    .productions
                    .iter()
                    .map(|production| self.production_to_vec_str(production))
                    .collect(),
            })
            .collect();
        ProductionOutputVec { productions }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<&'a str>,
    follow: Vec<&'a str>,
}

impl NonTerminalOutput<'_> {
    fn to_plaintext(&self, name_width: usize) -> String {
        format!(
            "{:>width$} | {} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", "),
            width = name_width
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[&str]) -> String {
            a.iter()
                .map(|s| escape::tex(*s))
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl NonTerminalOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let width = self
            .data
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0);
        self.data
            .iter()
            .map(|s| s.to_plaintext(width))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    /// FIRST and FOLLOW of every non-terminal, sorted, epsilon listed last.
    pub fn to_non_terminal_output_vec(
        &self,
        first: &FirstSets,
        follow: &FollowSets,
    ) -> NonTerminalOutputVec {
        let mut data = Vec::new();
        for non_terminal in self.non_terminal_iter() {
            let nullable = first.nullable(non_terminal.index);
            let mut t = NonTerminalOutput {
                name: non_terminal.name.as_str(),
                nullable,
                first: self.sorted_names(first.get(non_terminal.index)),
                follow: self.sorted_names(follow.get(non_terminal.index)),
            };
            if nullable {
                t.first.push(EPSILON);
            }
            data.push(t);
        }
        NonTerminalOutputVec { data }
    }

    fn sorted_names(&self, set: Option<&BTreeSet<usize>>) -> Vec<&str> {
        let mut v: Vec<&str> = set
            .into_iter()
            .flatten()
            .filter(|&&idx| idx != EPSILON_IDX)
            .map(|&idx| self.get_symbol_name(idx))
            .collect();
        v.sort();
        v
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;

    #[test]
    fn productions_plaintext() {
        let g = Grammar::parse("S -> a B | e\nB -> b").unwrap();
        assert_eq!(
            g.to_production_output_vec().to_plaintext(),
            "S -> a B\n   | ε\nB -> b"
        );
    }

    #[test]
    fn productions_latex() {
        let g = Grammar::parse("S -> a | e").unwrap();
        let latex = g.to_production_output_vec().to_latex();
        assert!(latex.contains("S & \\rightarrow &a \\mid \\epsilon"));
    }

    #[test]
    fn first_follow_json() {
        let g = Grammar::parse("S -> A a | b\nA -> e | c").unwrap();
        let first = g.calculate_first();
        let follow = g.calculate_follow(&first);
        let out = g.to_non_terminal_output_vec(&first, &follow);
        let json: serde_json::Value = serde_json::from_str(&out.to_json()).unwrap();
        assert_eq!(json["data"][0]["name"], "S");
        assert_eq!(json["data"][0]["first"], serde_json::json!(["a", "b", "c"]));
        assert_eq!(json["data"][1]["nullable"], true);
        assert_eq!(json["data"][1]["first"], serde_json::json!(["c", "ε"]));
        assert_eq!(json["data"][1]["follow"], serde_json::json!(["a"]));
        assert_eq!(out.to_plaintext(), "S | false | a, b, c | $\nA | true | c, ε | a");
    }
}
