//! Argument-place type profiles.
//!
//! The mapper never sees the meaning of a predicate, only its usage. For
//! every predicate and every [`PositionIndex`] into it, a [`PlaceProfile`]
//! records what a whole ruleset has put into that place: the constants, the
//! function symbols with their arities, and whether variables occur. Two
//! places from different rulesets are compared by shape first (a place that
//! only ever holds function terms cannot correspond to one that never does)
//! and then by a graded affinity, which is what the scoring feeds on.

use std::collections::{HashMap, HashSet};

use crate::construct::{OtherHasher, PositionIndex, Predicate, Ruleset, SymbolKeeper, Term};

// ------------- PlaceProfile -------------
#[derive(Debug, Default)]
pub struct PlaceProfile {
    constants: HashSet<String, OtherHasher>,
    functions: HashMap<String, usize, OtherHasher>,
    has_variable: bool,
}

impl PlaceProfile {
    fn observe(&mut self, term: &Term, symbols: &SymbolKeeper) {
        match term {
            Term::Constant(c) => {
                if let Some(name) = symbols.resolve(*c) {
                    self.constants.insert(name.to_owned());
                }
            }
            Term::Variable(_) => self.has_variable = true,
            Term::Function { name, args } => {
                if let Some(name) = symbols.resolve(*name) {
                    self.functions.insert(name.to_owned(), args.len());
                }
            }
        }
    }
    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }
    pub fn has_variable(&self) -> bool {
        self.has_variable
    }
    pub fn constants(&self) -> &HashSet<String, OtherHasher> {
        &self.constants
    }
    /// Shape agreement: a pure function place is incompatible with a place
    /// that holds neither functions nor variables, and vice versa.
    pub fn compatible(&self, other: &Self) -> bool {
        if self.has_functions() && !other.has_functions() && !other.has_variable {
            return false;
        }
        if other.has_functions() && !self.has_functions() && !self.has_variable {
            return false;
        }
        true
    }
    /// Graded similarity in `[0, 1]`: overlap of observed constants, arity
    /// agreement between observed function symbols, variable agreement.
    /// Places where nothing was observed on either side score a neutral 0.5.
    pub fn affinity(&self, other: &Self) -> f64 {
        let mut score = 0.0;
        let mut parts = 0.0;
        if !self.constants.is_empty() || !other.constants.is_empty() {
            parts += 1.0;
            let shared = self.constants.intersection(&other.constants).count() as f64;
            let union = self.constants.union(&other.constants).count() as f64;
            score += shared / union;
        }
        if self.has_functions() || other.has_functions() {
            parts += 1.0;
            let ours: HashSet<usize, OtherHasher> = self.functions.values().copied().collect();
            let theirs: HashSet<usize, OtherHasher> = other.functions.values().copied().collect();
            let shared = ours.intersection(&theirs).count() as f64;
            let union = ours.union(&theirs).count() as f64;
            score += shared / union;
        }
        if self.has_variable || other.has_variable {
            parts += 1.0;
            if self.has_variable && other.has_variable {
                score += 1.0;
            }
        }
        if parts == 0.0 { 0.5 } else { score / parts }
    }
}

// ------------- TypeProfiles -------------
/// The place profiles of one ruleset, computed once and then looked up by
/// the mapper for every candidate sentence pair.
#[derive(Debug)]
pub struct TypeProfiles {
    places: HashMap<(Predicate, PositionIndex), PlaceProfile, OtherHasher>,
}

impl TypeProfiles {
    pub fn of(ruleset: &Ruleset) -> Self {
        let mut places: HashMap<(Predicate, PositionIndex), PlaceProfile, OtherHasher> =
            HashMap::default();
        for rule in ruleset.rules() {
            for sentence in rule.sentences() {
                let predicate = sentence.predicate();
                for position in PositionIndex::positions(sentence) {
                    if let Some(term) = position.resolve(sentence) {
                        places
                            .entry((predicate, position))
                            .or_default()
                            .observe(term, ruleset.symbols());
                    }
                }
            }
        }
        Self { places }
    }
    pub fn place(&self, predicate: Predicate, position: &PositionIndex) -> Option<&PlaceProfile> {
        self.places.get(&(predicate, position.clone()))
    }
    pub fn len(&self) -> usize {
        self.places.len()
    }
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}
