pub mod eliminate_left_recursion;
pub mod first_follow;
pub mod grammar;
pub mod left_factoring;
pub mod ll1_parsing_table;
pub mod parse;
pub mod pretty_print;
pub mod transform;

pub use first_follow::{FirstSets, FollowSets};
pub use grammar::{Grammar, NonTerminal, Symbol, END_MARK_IDX, EPSILON_IDX};
pub use ll1_parsing_table::{ParseTable, TableConflict, TableEntry};
pub use parse::{Dialect, Record};
pub use transform::{TransformEvent, Transformed};

pub const EPSILON: &str = "ε";
pub const END_MARK: &str = "$";

/// Spellings accepted for epsilon in grammar sources, besides [`EPSILON`].
pub const EPSILON_ALIASES: [&str; 2] = ["e", "ϵ"];
