use log::debug;

use super::{
    grammar::{concat_production, EPSILON_IDX},
    Grammar, TransformEvent, Transformed,
};

/// Number of leading positions where `a` and `b` hold the same symbol.
/// Epsilon never counts as a shared symbol.
fn common_prefix_len(a: &[usize], b: &[usize]) -> usize {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| x == y && **x != EPSILON_IDX)
        .count()
}

impl Grammar {
    /// Pulls shared prefixes of alternatives out into fresh non-terminals.
    ///
    /// Each non-terminal present on entry is handled on its own: the first pair of
    /// alternatives found sharing a prefix is replaced by `prefix A'`, the two suffixes
    /// become the alternatives of `A'` (an empty suffix becoming `ε`), and the scan
    /// restarts. Non-terminals created here are not scanned again in the same call.
    pub fn left_factor(&self) -> Transformed {
        let mut g = self.clone();
        let mut events = Vec::new();

        for nt in self.non_terminal_indices() {
            let name = self.get_symbol_name(nt).to_string();
            let mut productions = g.productions(nt).to_vec();

            'scan: loop {
                for i in 0..productions.len() {
                    for j in i + 1..productions.len() {
                        let k = common_prefix_len(&productions[i], &productions[j]);
                        if k == 0 {
                            continue;
                        }

                        let fresh = g.add_fresh_non_terminal(&name);
                        let second = productions.remove(j);
                        let first = productions.remove(i);

                        g.set_productions(
                            fresh,
                            vec![
                                concat_production(&first[k..], &[]),
                                concat_production(&second[k..], &[]),
                            ],
                        );

                        let mut factored = first[..k].to_vec();
                        factored.push(fresh);

                        let event = TransformEvent::Factored {
                            non_terminal: name.clone(),
                            prefix: g
                                .production_to_vec_str(&first[..k])
                                .into_iter()
                                .map(String::from)
                                .collect(),
                            fresh: g.get_symbol_name(fresh).to_string(),
                        };
                        debug!("{}", event);
                        events.push(event);

                        productions.push(factored);
                        continue 'scan;
                    }
                }
                break;
            }

            g.set_productions(nt, productions);
        }

        Transformed {
            grammar: g,
            changed: !events.is_empty(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::EPSILON;
    use crate::Grammar;

    #[test]
    fn shared_prefix() {
        let t = Grammar::parse("A -> a b | a c").unwrap().left_factor();
        assert!(t.changed);
        assert_eq!(t.grammar.productions_by_name("A").unwrap(), vec![vec!["a", "A'"]]);
        assert_eq!(
            t.grammar.productions_by_name("A'").unwrap(),
            vec![vec!["b"], vec!["c"]]
        );
    }

    #[test]
    fn empty_suffix_becomes_epsilon() {
        let t = Grammar::parse("A -> a | a b").unwrap().left_factor();
        assert_eq!(t.grammar.productions_by_name("A").unwrap(), vec![vec!["a", "A'"]]);
        assert_eq!(
            t.grammar.productions_by_name("A'").unwrap(),
            vec![vec![EPSILON], vec!["b"]]
        );
    }

    #[test]
    fn dangling_else() {
        let t = Grammar::parse("S -> if E then S | if E then S else S | a\nE -> b")
            .unwrap()
            .left_factor();
        assert_eq!(
            t.grammar.productions_by_name("S").unwrap(),
            vec![vec!["a"], vec!["if", "E", "then", "S", "S'"]]
        );
        assert_eq!(
            t.grammar.productions_by_name("S'").unwrap(),
            vec![vec![EPSILON], vec!["else", "S"]]
        );
        assert_eq!(t.events.len(), 1);
    }

    #[test]
    fn rescan_after_rewrite() {
        let t = Grammar::parse("A -> a b c | a b d | a x").unwrap().left_factor();
        assert_eq!(t.grammar.productions_by_name("A").unwrap(), vec![vec!["a", "A''"]]);
        assert_eq!(
            t.grammar.productions_by_name("A'").unwrap(),
            vec![vec!["c"], vec!["d"]]
        );
        assert_eq!(
            t.grammar.productions_by_name("A''").unwrap(),
            vec![vec!["x"], vec!["b", "A'"]]
        );
        assert_eq!(t.events.len(), 2);
    }

    #[test]
    fn fresh_name_avoids_existing() {
        let t = Grammar::parse("A -> a b | a c\nA' -> d").unwrap().left_factor();
        assert_eq!(t.grammar.productions_by_name("A").unwrap(), vec![vec!["a", "A''"]]);
        assert_eq!(t.grammar.productions_by_name("A'").unwrap(), vec![vec!["d"]]);
    }

    #[test]
    fn nothing_to_factor() {
        let g = Grammar::parse("E -> T E'\nE' -> + T E' | e\nT -> id").unwrap();
        let t = g.left_factor();
        assert!(!t.changed);
        assert!(t.events.is_empty());
        assert_eq!(
            t.grammar.productions_by_name("E'").unwrap(),
            g.productions_by_name("E'").unwrap()
        );
    }

    #[test]
    fn idempotent() {
        for source in [
            "A -> a b c | a b d | a x",
            "A -> a | a",
            "S -> if E then S | if E then S else S | a\nE -> b",
            "A -> B c | B d | e\nB -> b | b b",
        ] {
            let once = Grammar::parse(source).unwrap().left_factor();
            assert!(once.changed, "{}", source);
            let twice = once.grammar.left_factor();
            assert!(!twice.changed, "{}", source);
        }
    }

    #[test]
    fn original_is_untouched() {
        let g = Grammar::parse("A -> a b | a c").unwrap();
        let _ = g.left_factor();
        assert_eq!(
            g.productions_by_name("A").unwrap(),
            vec![vec!["a", "b"], vec!["a", "c"]]
        );
        assert!(g.get_symbol_index("A'").is_none());
    }
}
