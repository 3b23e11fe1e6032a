//! Rulemap – a rule mapper / analogy engine for General Game Playing rulesets.
//!
//! Rulemap finds structural correspondences between two game descriptions
//! written in GDL/KIF, for transfer of learned knowledge between agents. It
//! runs a best-first search over partial bijective mappings of predicates:
//! * A [`construct::Symbol`] is an interned name (a simple `u32`).
//! * A [`construct::Term`] is a constant, variable, or nested function term.
//! * A [`construct::Sentence`] is a logical atom: predicate plus arguments.
//! * A [`construct::Rule`] couples a head sentence with a conjunctive body.
//! * A [`construct::Predicate`] is a name/arity pair, the unit the mapper
//!   pairs up across rulesets.
//! * A [`construct::PositionIndex`] addresses one argument slot inside a
//!   possibly nested sentence, so corresponding places can be compared.
//!
//! Symbols are owned and deduplicated by a "keeper" structure (see the
//! `construct` module), with a bidirectional map so reports can turn a
//! mapping back into names.
//!
//! ## Modules
//! * [`construct`] – Fundamental building blocks: symbols and their keeper,
//!   terms, sentences, rules, predicates, position indexes.
//! * [`kif`] – The pest-based parser for the KIF/GDL surface syntax.
//!   Grammar details live in `kif.pest`.
//! * [`typing`] – Argument-place profiles backing the type-compatibility
//!   heuristics of the scoring.
//! * [`mapper`] – The partial mapping with commit points and unrolling, and
//!   the best-first search driver.
//! * [`interface`] – A thread-per-job runner with cooperative cancellation
//!   and timeouts.
//! * [`error`] – The crate-wide error type.
//!
//! ## Search
//! The driver repeatedly commits the highest-scoring legal rule-to-rule
//! match, extending the predicate bijection, and unrolls a commit point when
//! some rule has no legal extension left, suppressing the unrolled choice at
//! that decision level. GDL keywords (`role`, `init`, `true`, `next`,
//! `legal`, `does`, `goal`, `terminal`) are reserved and only ever map to
//! themselves.
//!
//! ## Quick Start
//! ```
//! use rulemap::kif;
//! use rulemap::mapper::{MapStatus, Mapper, MapperSettings};
//! let source = kif::parse_ruleset("(<= (next (lit ?b)) (does robot (push ?b)))").unwrap();
//! let target = kif::parse_ruleset("(<= (next (lamp ?s)) (does player (flip ?s)))").unwrap();
//! let mapper = Mapper::new(&source, &target, MapperSettings::default());
//! let outcome = mapper.map();
//! assert_eq!(outcome.status, MapStatus::Complete);
//! ```
//!
//! ## Status & Roadmap
//! This is exploratory code grown out of transfer-learning experiments; the
//! scoring weights are heuristics, not calibrated constants. Expect API
//! changes while the public surface is being refined.

pub mod construct;
pub mod error;
pub mod interface;
pub mod kif;
pub mod mapper;
pub mod typing;
