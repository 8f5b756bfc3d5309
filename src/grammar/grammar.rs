use std::collections::HashMap;

use super::{END_MARK, EPSILON, EPSILON_ALIASES};

pub const EPSILON_IDX: usize = 0;
pub const END_MARK_IDX: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    pub productions: Vec<Vec<usize>>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            productions: Vec::new(),
        }
    }
}

/// A grammar symbol. Whether a name is a terminal or a non-terminal is decided
/// once, when the symbol is registered, and never re-derived from its spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Epsilon,
    EndMark,
    Terminal(String),
    NonTerminal(NonTerminal),
}

impl Symbol {
    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn mut_non_terminal(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    /// Terminals are matched against input tokens; the end-marker counts as one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_) | Symbol::EndMark)
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    pub symbols: Vec<Symbol>,
    pub symbol_table: HashMap<String, usize>,
    pub start_symbol: Option<usize>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub fn new() -> Self {
        let mut g = Self {
            symbols: vec![Symbol::Epsilon, Symbol::EndMark],
            symbol_table: HashMap::new(),
            start_symbol: None,
        };

        g.symbol_table.insert(EPSILON.to_string(), EPSILON_IDX);
        for alias in EPSILON_ALIASES {
            g.symbol_table.insert(alias.to_string(), EPSILON_IDX);
        }
        g.symbol_table.insert(END_MARK.to_string(), END_MARK_IDX);

        g
    }

    /// Terminals in registration order, end-marker excluded.
    pub fn terminal_iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.symbols.iter().enumerate().filter_map(|(i, s)| {
            if let Symbol::Terminal(name) = s {
                Some((i, name.as_str()))
            } else {
                None
            }
        })
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.symbols.iter().filter_map(|s| s.non_terminal())
    }

    pub fn non_terminal_indices(&self) -> Vec<usize> {
        self.non_terminal_iter().map(|nt| nt.index).collect()
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_table.get(name).cloned()
    }

    /// Registers `name` as a non-terminal, or returns its index if it already is one.
    pub fn add_non_terminal(&mut self, name: &str) -> usize {
        if let Some(idx) = self.get_symbol_index(name) {
            if self.is_non_terminal(idx) {
                return idx;
            }
        }
        let idx = self.symbols.len();
        self.symbols
            .push(Symbol::NonTerminal(NonTerminal::new(idx, name.to_string())));
        self.symbol_table.insert(name.to_string(), idx);
        if self.start_symbol.is_none() {
            self.start_symbol = Some(idx);
        }
        idx
    }

    pub fn add_terminal(&mut self, name: String) -> usize {
        if let Some(idx) = self.get_symbol_index(&name) {
            return idx;
        }
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Terminal(name.clone()));
        self.symbol_table.insert(name, idx);
        idx
    }

    /// Appends an alternative to `left`. Does nothing if `left` is not a non-terminal.
    pub fn add_production(&mut self, left: usize, right: Vec<usize>) {
        if let Some(nt) = self.symbols.get_mut(left).and_then(|s| s.mut_non_terminal()) {
            nt.productions.push(right);
        }
    }

    /// Replaces every alternative of `left`.
    pub fn set_productions(&mut self, left: usize, productions: Vec<Vec<usize>>) {
        if let Some(nt) = self.symbols.get_mut(left).and_then(|s| s.mut_non_terminal()) {
            nt.productions = productions;
        }
    }

    pub fn productions(&self, left: usize) -> &[Vec<usize>] {
        self.symbols
            .get(left)
            .and_then(|s| s.non_terminal())
            .map(|nt| nt.productions.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_terminal(&self, idx: usize) -> bool {
        self.symbols.get(idx).map_or(false, |s| s.is_terminal())
    }

    pub fn is_non_terminal(&self, idx: usize) -> bool {
        matches!(self.symbols.get(idx), Some(Symbol::NonTerminal(_)))
    }

    pub fn start_symbol(&self) -> Option<usize> {
        self.start_symbol
    }

    /// Declares the start symbol. Returns `None` (and changes nothing) if `name`
    /// is not a registered non-terminal.
    pub fn set_start_symbol(&mut self, name: &str) -> Option<usize> {
        let idx = self.get_symbol_index(name).filter(|&i| self.is_non_terminal(i))?;
        self.start_symbol = Some(idx);
        Some(idx)
    }

    pub fn get_symbol_name(&self, index: usize) -> &str {
        match &self.symbols[index] {
            Symbol::Epsilon => EPSILON,
            Symbol::EndMark => END_MARK,
            Symbol::NonTerminal(e) => e.name.as_str(),
            Symbol::Terminal(e) => e.as_str(),
        }
    }

    /// A name derived from `name` by appending primes, disjoint from every name
    /// registered so far. Callers register the result right away, which keeps
    /// later allocations disjoint from it too.
    pub fn get_symbol_prime_name(&self, mut name: String) -> String {
        while self.symbol_table.contains_key(&name) {
            name.push('\'');
        }
        name
    }

    /// Allocates and registers a fresh non-terminal named after `base`.
    pub fn add_fresh_non_terminal(&mut self, base: &str) -> usize {
        let name = self.get_symbol_prime_name(base.to_string());
        self.add_non_terminal(&name)
    }

    pub fn production_to_vec_str(&self, production: &[usize]) -> Vec<&str> {
        production
            .iter()
            .map(|idx| self.get_symbol_name(*idx))
            .collect()
    }

    /// Alternatives of the non-terminal called `name`, spelled out.
    pub fn productions_by_name(&self, name: &str) -> Option<Vec<Vec<&str>>> {
        let idx = self.get_symbol_index(name).filter(|&i| self.is_non_terminal(i))?;
        Some(
            self.productions(idx)
                .iter()
                .map(|p| self.production_to_vec_str(p))
                .collect(),
        )
    }
}

/// Concatenates two symbol sequences, dropping epsilons. An empty result is `[ε]`.
pub fn concat_production(prefix: &[usize], suffix: &[usize]) -> Vec<usize> {
    let joined: Vec<usize> = prefix
        .iter()
        .chain(suffix.iter())
        .cloned()
        .filter(|&s| s != EPSILON_IDX)
        .collect();
    if joined.is_empty() {
        vec![EPSILON_IDX]
    } else {
        joined
    }
}

pub fn is_epsilon_production(production: &[usize]) -> bool {
    production.iter().all(|&s| s == EPSILON_IDX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_symbols() {
        let g = Grammar::new();
        assert_eq!(g.get_symbol_index("e"), Some(EPSILON_IDX));
        assert_eq!(g.get_symbol_index("ε"), Some(EPSILON_IDX));
        assert_eq!(g.get_symbol_index("$"), Some(END_MARK_IDX));
        assert!(g.is_terminal(END_MARK_IDX));
        assert!(!g.is_terminal(EPSILON_IDX));
        assert!(!g.is_non_terminal(EPSILON_IDX));
        assert_eq!(g.start_symbol(), None);
    }

    #[test]
    fn first_non_terminal_is_start() {
        let mut g = Grammar::new();
        let s = g.add_non_terminal("S");
        let a = g.add_non_terminal("A");
        assert_eq!(g.start_symbol(), Some(s));
        assert_eq!(g.set_start_symbol("A"), Some(a));
        assert_eq!(g.start_symbol(), Some(a));
        let x = g.add_terminal("x".to_string());
        assert_eq!(g.set_start_symbol("x"), None);
        assert_eq!(g.start_symbol(), Some(a));
        assert!(g.is_terminal(x));
    }

    #[test]
    fn fresh_names_are_disjoint() {
        let mut g = Grammar::new();
        g.add_non_terminal("A");
        g.add_terminal("A'".to_string());
        let fresh = g.add_fresh_non_terminal("A");
        assert_eq!(g.get_symbol_name(fresh), "A''");
        let again = g.add_fresh_non_terminal("A");
        assert_eq!(g.get_symbol_name(again), "A'''");
    }

    #[test]
    fn concat_drops_epsilon() {
        assert_eq!(concat_production(&[EPSILON_IDX], &[5, 6]), vec![5, 6]);
        assert_eq!(concat_production(&[EPSILON_IDX], &[]), vec![EPSILON_IDX]);
        assert_eq!(concat_production(&[3], &[EPSILON_IDX]), vec![3]);
        assert!(is_epsilon_production(&[EPSILON_IDX]));
        assert!(!is_epsilon_production(&[3]));
    }
}
