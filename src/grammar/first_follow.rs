use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, trace};

use super::{
    grammar::{Symbol, END_MARK_IDX, EPSILON_IDX},
    Grammar,
};

/// FIRST set of every non-terminal. Members are symbol indices and may include epsilon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSets {
    sets: BTreeMap<usize, BTreeSet<usize>>,
}

impl FirstSets {
    pub fn get(&self, non_terminal: usize) -> Option<&BTreeSet<usize>> {
        self.sets.get(&non_terminal)
    }

    pub fn nullable(&self, non_terminal: usize) -> bool {
        self.get(non_terminal)
            .map_or(false, |set| set.contains(&EPSILON_IDX))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<usize>)> {
        self.sets.iter().map(|(k, v)| (*k, v))
    }
}

/// FOLLOW set of every non-terminal. May include the end-marker, never epsilon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSets {
    sets: BTreeMap<usize, BTreeSet<usize>>,
}

impl FollowSets {
    pub fn get(&self, non_terminal: usize) -> Option<&BTreeSet<usize>> {
        self.sets.get(&non_terminal)
    }

    pub fn contains(&self, non_terminal: usize, terminal: usize) -> bool {
        self.get(non_terminal)
            .map_or(false, |set| set.contains(&terminal))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<usize>)> {
        self.sets.iter().map(|(k, v)| (*k, v))
    }
}

/// FIRST of one non-terminal, plus the in-progress non-terminals the walk ran into.
struct PartialFirst {
    set: BTreeSet<usize>,
    cut_at: BTreeSet<usize>,
}

impl Grammar {
    pub fn calculate_first(&self) -> FirstSets {
        let mut cache: HashMap<usize, BTreeSet<usize>> = HashMap::new();
        let mut sets = BTreeMap::new();
        for nt in self.non_terminal_indices() {
            let first = self.first_of_non_terminal(nt, &mut Vec::new(), &mut cache);
            sets.insert(nt, first.set);
        }
        FirstSets { sets }
    }

    /// Walks each alternative left to right: a terminal is added and ends the walk,
    /// a non-terminal contributes its FIRST minus epsilon and ends the walk unless
    /// it derives epsilon. An alternative that is consumed entirely adds epsilon.
    ///
    /// Reaching a non-terminal already being computed (the non-terminal itself, or
    /// an ancestor through a residual cycle) ends that alternative without epsilon.
    /// This keeps the recursion finite but leaves FIRST incomplete on such cycles.
    /// Results that never hit an ancestor are exact and cached.
    fn first_of_non_terminal(
        &self,
        nt: usize,
        in_progress: &mut Vec<usize>,
        cache: &mut HashMap<usize, BTreeSet<usize>>,
    ) -> PartialFirst {
        if let Some(set) = cache.get(&nt) {
            return PartialFirst {
                set: set.clone(),
                cut_at: BTreeSet::new(),
            };
        }

        in_progress.push(nt);
        let mut first = BTreeSet::new();
        let mut cut_at = BTreeSet::new();

        for production in self.productions(nt) {
            let mut derives_epsilon = true;
            for &symbol in production {
                if symbol == EPSILON_IDX {
                    continue;
                }
                if in_progress.contains(&symbol) {
                    trace!(
                        "FIRST({}): cycle through {}",
                        self.get_symbol_name(nt),
                        self.get_symbol_name(symbol)
                    );
                    cut_at.insert(symbol);
                    derives_epsilon = false;
                    break;
                }
                match &self.symbols[symbol] {
                    Symbol::NonTerminal(_) => {
                        let inner = self.first_of_non_terminal(symbol, in_progress, cache);
                        first.extend(inner.set.iter().filter(|&&s| s != EPSILON_IDX));
                        cut_at.extend(inner.cut_at);
                        if !inner.set.contains(&EPSILON_IDX) {
                            derives_epsilon = false;
                            break;
                        }
                    }
                    _ => {
                        first.insert(symbol);
                        derives_epsilon = false;
                        break;
                    }
                }
            }
            if derives_epsilon {
                first.insert(EPSILON_IDX);
            }
        }

        in_progress.pop();
        cut_at.remove(&nt);
        if cut_at.is_empty() {
            cache.insert(nt, first.clone());
        }

        PartialFirst { set: first, cut_at }
    }

    /// FIRST of a symbol sequence under already computed FIRST sets.
    /// Contains epsilon when the whole sequence can derive it.
    pub fn calculate_first_for_production(
        &self,
        first: &FirstSets,
        production: &[usize],
    ) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        for &symbol in production {
            if symbol == EPSILON_IDX {
                continue;
            }
            if self.is_non_terminal(symbol) {
                let empty = BTreeSet::new();
                let set = first.get(symbol).unwrap_or(&empty);
                result.extend(set.iter().filter(|&&s| s != EPSILON_IDX));
                if !set.contains(&EPSILON_IDX) {
                    return result;
                }
            } else {
                result.insert(symbol);
                return result;
            }
        }
        result.insert(EPSILON_IDX);
        result
    }

    /// Fixed-point FOLLOW computation, seeded with the end-marker on the start symbol.
    pub fn calculate_follow(&self, first: &FirstSets) -> FollowSets {
        let mut sets: BTreeMap<usize, BTreeSet<usize>> = self
            .non_terminal_indices()
            .into_iter()
            .map(|nt| (nt, BTreeSet::new()))
            .collect();
        if let Some(start) = self.start_symbol {
            sets.entry(start).or_default().insert(END_MARK_IDX);
        }

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;
            for left in self.non_terminal_iter() {
                for production in &left.productions {
                    for (i, &b) in production.iter().enumerate() {
                        if !self.is_non_terminal(b) {
                            continue;
                        }

                        let rest = self.calculate_first_for_production(first, &production[i + 1..]);
                        let mut additions: Vec<usize> = rest
                            .iter()
                            .cloned()
                            .filter(|&s| s != EPSILON_IDX)
                            .collect();
                        if rest.contains(&EPSILON_IDX) {
                            if let Some(left_follow) = sets.get(&left.index) {
                                additions.extend(left_follow.iter().cloned());
                            }
                        }

                        let follow = sets.entry(b).or_default();
                        for s in additions {
                            changed |= follow.insert(s);
                        }
                    }
                }
            }
        }
        debug!("FOLLOW sets stable after {} passes", passes);

        FollowSets { sets }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::grammar::{END_MARK, EPSILON};
    use crate::Grammar;

    fn names<'a>(g: &'a Grammar, set: &BTreeSet<usize>) -> Vec<&'a str> {
        let mut v: Vec<&str> = set.iter().map(|&i| g.get_symbol_name(i)).collect();
        v.sort();
        v
    }

    fn first_of<'a>(g: &'a Grammar, nt: &str) -> Vec<&'a str> {
        let first = g.calculate_first();
        names(g, first.get(g.symbol_table[nt]).unwrap())
    }

    fn follow_of<'a>(g: &'a Grammar, nt: &str) -> Vec<&'a str> {
        let first = g.calculate_first();
        let follow = g.calculate_follow(&first);
        names(g, follow.get(g.symbol_table[nt]).unwrap())
    }

    const EXPRESSION: &str = "E -> T E'
E' -> + T E' | e
T -> F T'
T' -> * F T' | e
F -> ( E ) | id";

    #[test]
    fn epsilon_chaining_first() {
        let g = Grammar::parse("S -> A a | b\nA -> e | c").unwrap();
        assert_eq!(first_of(&g, "S"), vec!["a", "b", "c"]);
        assert_eq!(first_of(&g, "A"), vec!["c", EPSILON]);
        assert_eq!(follow_of(&g, "S"), vec![END_MARK]);
        assert_eq!(follow_of(&g, "A"), vec!["a"]);
    }

    #[test]
    fn all_nullable_alternative_derives_epsilon() {
        let g = Grammar::parse("S -> A B\nA -> a | e\nB -> b | e").unwrap();
        assert_eq!(first_of(&g, "S"), vec!["a", "b", EPSILON]);
        let first = g.calculate_first();
        assert!(first.nullable(g.symbol_table["S"]));
        assert_eq!(follow_of(&g, "A"), vec!["$", "b"]);
        assert_eq!(follow_of(&g, "B"), vec!["$"]);
    }

    #[test]
    fn expression_grammar_sets() {
        let g = Grammar::parse(EXPRESSION).unwrap();
        assert_eq!(first_of(&g, "E"), vec!["(", "id"]);
        assert_eq!(first_of(&g, "E'"), vec!["+", EPSILON]);
        assert_eq!(first_of(&g, "T'"), vec!["*", EPSILON]);
        assert_eq!(first_of(&g, "F"), vec!["(", "id"]);

        assert_eq!(follow_of(&g, "E"), vec!["$", ")"]);
        assert_eq!(follow_of(&g, "E'"), vec!["$", ")"]);
        assert_eq!(follow_of(&g, "T"), vec!["$", ")", "+"]);
        assert_eq!(follow_of(&g, "T'"), vec!["$", ")", "+"]);
        assert_eq!(follow_of(&g, "F"), vec!["$", ")", "*", "+"]);
    }

    #[test]
    fn follow_never_contains_epsilon() {
        let g = Grammar::parse("S -> A B C\nA -> a | e\nB -> e\nC -> c | e").unwrap();
        let first = g.calculate_first();
        let follow = g.calculate_follow(&first);
        for (_, set) in follow.iter() {
            assert!(!set.contains(&crate::grammar::EPSILON_IDX));
        }
        assert_eq!(follow_of(&g, "A"), vec!["$", "c"]);
    }

    #[test]
    fn follow_scans_past_nullable_to_terminal() {
        let g = Grammar::parse("S -> A B c\nA -> a\nB -> b | e").unwrap();
        assert_eq!(follow_of(&g, "A"), vec!["b", "c"]);
        assert_eq!(follow_of(&g, "B"), vec!["c"]);
    }

    #[test]
    fn self_reference_guard() {
        // Left recursion left in place: the recursive alternative contributes nothing.
        let g = Grammar::parse("A -> A a | b").unwrap();
        assert_eq!(first_of(&g, "A"), vec!["b"]);
    }

    #[test]
    fn non_productive_cycle_terminates() {
        let g = Grammar::parse("A -> B\nB -> A").unwrap();
        assert!(first_of(&g, "A").is_empty());
        assert!(first_of(&g, "B").is_empty());
        assert_eq!(follow_of(&g, "B"), vec!["$"]);
    }

    #[test]
    fn sequence_first() {
        let g = Grammar::parse(EXPRESSION).unwrap();
        let first = g.calculate_first();
        let seq = [g.symbol_table["T'"], g.symbol_table["E'"]];
        assert_eq!(
            names(&g, &g.calculate_first_for_production(&first, &seq)),
            vec!["*", "+", EPSILON]
        );
        let seq = [g.symbol_table["T'"], g.symbol_table[")"]];
        assert_eq!(
            names(&g, &g.calculate_first_for_production(&first, &seq)),
            vec![")", "*"]
        );
    }
}
