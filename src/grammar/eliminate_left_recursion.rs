use log::debug;

use super::{
    grammar::{concat_production, EPSILON_IDX},
    Grammar, TransformEvent, Transformed,
};

impl Grammar {
    /// Removes indirect and direct left recursion.
    ///
    /// Non-terminals are processed in registration order. Before `A_i` is handled,
    /// every alternative starting with an already processed non-terminal `A_j` is
    /// expanded one level with the alternatives of `A_j`. Then `A_i -> A_i α | β`
    /// becomes `A_i -> β A_i'` and `A_i' -> α A_i' | ε`. A fresh `A_i'` joins the
    /// processed list right after `A_i`, so later substitutions see it.
    ///
    /// `changed` reports whether any left recursion was found.
    pub fn eliminate_left_recursion(&self) -> Transformed {
        let mut g = self.clone();
        let mut events = Vec::new();
        let mut had_recursion = false;
        let mut done: Vec<usize> = Vec::new();

        for ai in self.non_terminal_indices() {
            let name = self.get_symbol_name(ai).to_string();

            for &aj in &done {
                let old_productions = g.productions(ai).to_vec();
                if !old_productions.iter().any(|p| p.first() == Some(&aj)) {
                    continue;
                }

                let mut productions = Vec::new();
                for production in old_productions {
                    if production.first() == Some(&aj) {
                        for delta in g.productions(aj) {
                            productions.push(concat_production(delta, &production[1..]));
                        }
                    } else {
                        productions.push(production);
                    }
                }
                g.set_productions(ai, productions);

                let event = TransformEvent::Substituted {
                    non_terminal: name.clone(),
                    replaced: g.get_symbol_name(aj).to_string(),
                };
                debug!("{}", event);
                events.push(event);
            }

            let mut recursive_productions: Vec<Vec<usize>> = Vec::new();
            let mut other_productions: Vec<Vec<usize>> = Vec::new();
            let mut dropped_cycle = false;
            for production in g.productions(ai) {
                if production.first() == Some(&ai) {
                    if production.len() == 1 {
                        dropped_cycle = true;
                    } else {
                        recursive_productions.push(production[1..].to_vec());
                    }
                } else {
                    other_productions.push(production.clone());
                }
            }

            if dropped_cycle {
                had_recursion = true;
                let event = TransformEvent::DroppedCycle {
                    non_terminal: name.clone(),
                };
                debug!("{}", event);
                events.push(event);
            }

            if recursive_productions.is_empty() {
                if dropped_cycle {
                    g.set_productions(ai, other_productions);
                }
                done.push(ai);
                continue;
            }
            had_recursion = true;

            let nt_prime_idx = g.add_fresh_non_terminal(&name);

            let mut productions: Vec<Vec<usize>> = other_productions
                .iter()
                .map(|beta| concat_production(beta, &[nt_prime_idx]))
                .collect();
            if productions.is_empty() {
                productions.push(vec![nt_prime_idx]);
            }

            let mut prime_productions: Vec<Vec<usize>> = recursive_productions
                .iter()
                .map(|alpha| concat_production(alpha, &[nt_prime_idx]))
                .collect();
            prime_productions.push(vec![EPSILON_IDX]);

            g.set_productions(ai, productions);
            g.set_productions(nt_prime_idx, prime_productions);

            let event = TransformEvent::DirectRecursionRemoved {
                non_terminal: name,
                fresh: g.get_symbol_name(nt_prime_idx).to_string(),
            };
            debug!("{}", event);
            events.push(event);

            done.push(ai);
            done.push(nt_prime_idx);
        }

        Transformed {
            grammar: g,
            changed: had_recursion,
            events,
        }
    }

    /// True if some alternative of some non-terminal starts with that non-terminal.
    pub fn has_direct_left_recursion(&self) -> bool {
        self.non_terminal_iter().any(|nt| {
            nt.productions
                .iter()
                .any(|p| p.first() == Some(&nt.index))
        })
    }
}
