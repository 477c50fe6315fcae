//! Module-to-chain dispatch.
//!
//! Rules are scanned in declaration order and the first whose matcher
//! accepts the module id (and whose exclusion does not) handles it.
//! Identity rules get no precedence over pattern rules.

mod matcher;
mod table;

pub use matcher::{Matcher, normalize_id};
pub use table::{Rule, RuleTable};
