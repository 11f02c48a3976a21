//! Selector query language
//!
//! A selector is a comma-separated list of `key@value` clauses, e.g.
//! `res@android:id/button1,text@$OK|Accept`. A value starting with `$` is a
//! regular expression that must match the whole attribute; anything else is
//! compared literally. Values are taken verbatim (no trimming).

pub mod matcher;
pub mod parser;

pub use matcher::{find_first, Match};
pub use parser::{parse, Criterion, Key, ParseError, Selector};
