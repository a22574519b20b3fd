//! Pure per-value predicates over `(Cell, FieldRule)` — the validity
//! rule family, one function per rule kind, each independently testable.

pub mod checkers;

pub use checkers::*;
