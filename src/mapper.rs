//! The analogy engine: a best-first search over partial bijective mappings
//! between the predicates of two rulesets.
//!
//! The search repeatedly picks the highest-scoring candidate rule-to-rule
//! match, commits it (extending the [`PartialMap`] with the predicate pairs
//! the match induces), and unrolls when an unmatched rule has no legal
//! extension left. Unrolling pops the newest [`CommitPoint`] and suppresses
//! the popped choice at the decision level that becomes current, so the same
//! dead end is not walked into twice.
//!
//! Scoring favours sentence pairs whose argument places look alike (see
//! [`crate::typing`]) and penalises commitments in proportion to the number
//! of predicate pairs they would newly introduce, so the most constrained
//! extension wins ties.

use bimap::BiMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::construct::{Literal, OtherHasher, PositionIndex, Predicate, Ruleset, Sentence};
use crate::error::{Result, RulemapError};
use crate::interface::CancelToken;
use crate::typing::TypeProfiles;

// ------------- Settings -------------
/// Knobs of the search, read from `rulemap.toml` and `RULEMAP_`-prefixed
/// environment variables by the command line binary.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MapperSettings {
    /// Upper bound on committed plus unrolled steps before the search gives
    /// up and reports the best mapping seen so far.
    pub max_steps: usize,
    /// Penalty per predicate pair a commitment would newly introduce.
    pub dof_weight: f64,
    /// Weight of the place-profile affinity in a sentence pair's score.
    pub affinity_weight: f64,
    /// Base reward per aligned sentence pair.
    pub sentence_weight: f64,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            dof_weight: 0.25,
            affinity_weight: 1.0,
            sentence_weight: 1.0,
        }
    }
}

// ------------- PartialMap -------------
/// One decision level of the search: which rule pair was chosen, which
/// predicate pairs that commit introduced, how much score it added, and the
/// choices already tried and rejected at this level.
#[derive(Debug)]
pub struct CommitPoint {
    choice: (usize, usize),
    added: Vec<(Predicate, Predicate)>,
    delta: f64,
    suppressed: HashSet<(usize, usize), OtherHasher>,
}

/// A tentative assignment of source predicates to target predicates,
/// bijective by construction, together with a running score and the trail of
/// commit points needed to unroll it.
#[derive(Debug, Default)]
pub struct PartialMap {
    bindings: BiMap<Predicate, Predicate>,
    score: f64,
    trail: Vec<CommitPoint>,
    root_suppressed: HashSet<(usize, usize), OtherHasher>,
}

impl PartialMap {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn score(&self) -> f64 {
        self.score
    }
    pub fn depth(&self) -> usize {
        self.trail.len()
    }
    pub fn len(&self) -> usize {
        self.bindings.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
    pub fn target_of(&self, source: Predicate) -> Option<Predicate> {
        self.bindings.get_by_left(&source).copied()
    }
    pub fn source_of(&self, target: Predicate) -> Option<Predicate> {
        self.bindings.get_by_right(&target).copied()
    }
    pub fn contains(&self, source: Predicate, target: Predicate) -> bool {
        self.bindings.get_by_left(&source) == Some(&target)
    }
    /// Whether source ↔ target could be added without breaking bijectivity.
    pub fn admits(&self, source: Predicate, target: Predicate) -> bool {
        match (
            self.bindings.get_by_left(&source),
            self.bindings.get_by_right(&target),
        ) {
            (None, None) => true,
            (Some(t), Some(s)) => *t == target && *s == source,
            _ => false,
        }
    }
    /// Whether the choice has already been tried and rejected at the current
    /// decision level.
    pub fn suppressed(&self, choice: (usize, usize)) -> bool {
        match self.trail.last() {
            Some(frame) => frame.suppressed.contains(&choice),
            None => self.root_suppressed.contains(&choice),
        }
    }
    /// Extends the bijection with the given pairs and pushes a commit point.
    /// Pairs already present are kept as they are; a conflicting pair leaves
    /// the map untouched and errors.
    pub fn commit(
        &mut self,
        choice: (usize, usize),
        pairs: &[(Predicate, Predicate)],
        delta: f64,
    ) -> Result<()> {
        let mut added = Vec::new();
        for (source, target) in pairs {
            if self.contains(*source, *target) {
                continue;
            }
            if !self.admits(*source, *target) {
                for (source, _) in added.iter().rev() {
                    self.bindings.remove_by_left(source);
                }
                return Err(RulemapError::Invariant(format!(
                    "conflicting predicate pair in commit of rule match {choice:?}"
                )));
            }
            self.bindings.insert(*source, *target);
            added.push((*source, *target));
        }
        self.score += delta;
        self.trail.push(CommitPoint {
            choice,
            added,
            delta,
            suppressed: HashSet::default(),
        });
        Ok(())
    }
    /// Pops the newest commit point, restores bindings and score, and
    /// suppresses the popped choice at the level that becomes current.
    /// Returns the unrolled choice, or None when there is nothing to unroll.
    pub fn unroll(&mut self) -> Option<(usize, usize)> {
        let frame = self.trail.pop()?;
        for (source, _) in frame.added.iter().rev() {
            self.bindings.remove_by_left(source);
        }
        self.score -= frame.delta;
        match self.trail.last_mut() {
            Some(parent) => {
                parent.suppressed.insert(frame.choice);
            }
            None => {
                self.root_suppressed.insert(frame.choice);
            }
        }
        Some(frame.choice)
    }
    /// The current bindings, sorted by source predicate for determinism.
    pub fn bindings(&self) -> Vec<(Predicate, Predicate)> {
        let mut bindings: Vec<(Predicate, Predicate)> =
            self.bindings.iter().map(|(s, t)| (*s, *t)).collect();
        bindings.sort();
        bindings
    }
}

// ------------- Outcome -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStatus {
    /// Every source rule found a match.
    Complete,
    /// The search exhausted its alternatives with some rules unmapped.
    Partial,
    /// The step budget ran out.
    StepLimited,
    /// The cancellation token fired.
    Cancelled,
}

/// What the search driver hands back: the best mapping it saw, by matched
/// rules first and score second.
#[derive(Clone, Debug)]
pub struct MapOutcome {
    pub status: MapStatus,
    pub bindings: Vec<(Predicate, Predicate)>,
    pub score: f64,
    pub matched_rules: usize,
    pub total_rules: usize,
    pub steps: usize,
}

impl MapOutcome {
    /// Renders the outcome with the names of both rulesets' keepers.
    pub fn report(&self, source: &Ruleset, target: &Ruleset) -> MapReport {
        MapReport {
            status: self.status,
            score: self.score,
            matched_rules: self.matched_rules,
            total_rules: self.total_rules,
            steps: self.steps,
            correspondences: self
                .bindings
                .iter()
                .map(|(s, t)| Correspondence {
                    source: s.render(source.symbols()),
                    target: t.render(target.symbols()),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Correspondence {
    pub source: String,
    pub target: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MapReport {
    pub status: MapStatus,
    pub score: f64,
    pub matched_rules: usize,
    pub total_rules: usize,
    pub steps: usize,
    pub correspondences: Vec<Correspondence>,
}

// ------------- Mapper -------------
#[derive(Clone, Debug)]
struct Candidate {
    source_rule: usize,
    target_rule: usize,
    pairs: Vec<(Predicate, Predicate)>,
    score: f64,
}

pub struct Mapper<'a> {
    source: &'a Ruleset,
    target: &'a Ruleset,
    source_types: TypeProfiles,
    target_types: TypeProfiles,
    settings: MapperSettings,
}

impl<'a> Mapper<'a> {
    pub fn new(source: &'a Ruleset, target: &'a Ruleset, settings: MapperSettings) -> Self {
        Self {
            source,
            target,
            source_types: TypeProfiles::of(source),
            target_types: TypeProfiles::of(target),
            settings,
        }
    }

    /// Runs the search to completion with a token nobody cancels.
    pub fn map(&self) -> MapOutcome {
        self.run(&CancelToken::new())
    }

    /// The best-first search driver.
    pub fn run(&self, cancel: &CancelToken) -> MapOutcome {
        let total_rules = self.source.rules().len();
        let mut map = PartialMap::new();
        let mut matched: Vec<Option<usize>> = vec![None; total_rules];
        let mut used_targets: HashSet<usize, OtherHasher> = HashSet::default();
        let mut unmappable: HashSet<usize, OtherHasher> = HashSet::default();
        let mut steps = 0usize;
        // best snapshot so far: matched rules first, score second
        let mut best: Option<(usize, f64, Vec<(Predicate, Predicate)>)> = None;

        let status = loop {
            if cancel.is_cancelled() {
                break MapStatus::Cancelled;
            }
            if steps >= self.settings.max_steps {
                break MapStatus::StepLimited;
            }

            // Gather the legal candidates of every unmatched source rule,
            // noting the first rule that has none (a dead end).
            let mut candidates: Vec<Candidate> = Vec::new();
            let mut starved: Option<usize> = None;
            for source_rule in 0..total_rules {
                if matched[source_rule].is_some() || unmappable.contains(&source_rule) {
                    continue;
                }
                let before = candidates.len();
                for target_rule in 0..self.target.rules().len() {
                    if used_targets.contains(&target_rule) {
                        continue;
                    }
                    if map.suppressed((source_rule, target_rule)) {
                        continue;
                    }
                    if let Some(candidate) = self.align_rules(&map, source_rule, target_rule) {
                        candidates.push(candidate);
                    }
                }
                if candidates.len() == before && starved.is_none() {
                    starved = Some(source_rule);
                }
            }

            if let Some(source_rule) = starved {
                match map.unroll() {
                    Some((rolled_source, rolled_target)) => {
                        debug!(
                            source_rule = rolled_source,
                            target_rule = rolled_target,
                            depth = map.depth(),
                            "unroll"
                        );
                        matched[rolled_source] = None;
                        used_targets.remove(&rolled_target);
                        steps += 1;
                        continue;
                    }
                    None => {
                        warn!(
                            source_rule,
                            rule = %self.source.rules()[source_rule].render(self.source.symbols()),
                            "rule has no match under any alternative; leaving it unmapped"
                        );
                        unmappable.insert(source_rule);
                        continue;
                    }
                }
            }
            if candidates.is_empty() {
                break if unmappable.is_empty() && matched.iter().all(Option::is_some) {
                    MapStatus::Complete
                } else {
                    MapStatus::Partial
                };
            }

            candidates.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.pairs.len().cmp(&b.pairs.len()))
                    .then((a.source_rule, a.target_rule).cmp(&(b.source_rule, b.target_rule)))
            });
            let candidate = &candidates[0];
            let choice = (candidate.source_rule, candidate.target_rule);
            if let Err(e) = map.commit(choice, &candidate.pairs, candidate.score) {
                // candidate generation is supposed to keep this impossible
                warn!(error = %e, "stopping on inconsistent candidate");
                break MapStatus::Partial;
            }
            matched[candidate.source_rule] = Some(candidate.target_rule);
            used_targets.insert(candidate.target_rule);
            steps += 1;
            debug!(
                source_rule = candidate.source_rule,
                target_rule = candidate.target_rule,
                score = candidate.score,
                new_pairs = candidate.pairs.len(),
                depth = map.depth(),
                "commit"
            );

            let matched_count = matched.iter().filter(|m| m.is_some()).count();
            let better = match &best {
                Some((best_count, best_score, _)) => {
                    matched_count > *best_count
                        || (matched_count == *best_count && map.score() > *best_score)
                }
                None => true,
            };
            if better {
                best = Some((matched_count, map.score(), map.bindings()));
            }
        };

        // A complete final map outranks any snapshot from an abandoned branch.
        let (matched_rules, score, bindings) = if status == MapStatus::Complete {
            (
                matched.iter().filter(|m| m.is_some()).count(),
                map.score(),
                map.bindings(),
            )
        } else {
            best.unwrap_or((0, 0.0, Vec::new()))
        };
        let outcome = MapOutcome {
            status,
            bindings,
            score,
            matched_rules,
            total_rules,
            steps,
        };
        info!(
            status = ?outcome.status,
            score = outcome.score,
            matched_rules = outcome.matched_rules,
            total_rules = outcome.total_rules,
            steps = outcome.steps,
            "mapping finished"
        );
        outcome
    }

    /// Tries to align a source rule with a target rule under the current
    /// mapping. Heads align first; body literals are then paired greedily by
    /// best sentence score with matching negation polarity, and `distinct`
    /// constraints pair among themselves. The returned candidate lists only
    /// the predicate pairs the match would newly introduce.
    fn align_rules(
        &self,
        map: &PartialMap,
        source_rule: usize,
        target_rule: usize,
    ) -> Option<Candidate> {
        let r = &self.source.rules()[source_rule];
        let s = &self.target.rules()[target_rule];
        if r.body().len() != s.body().len() {
            return None;
        }
        let mut pairs: Vec<(Predicate, Predicate)> = Vec::new();
        let mut score = self.align_sentences(map, &mut pairs, r.head(), s.head())?;

        let mut used = vec![false; s.body().len()];
        for literal in r.body() {
            match literal {
                Literal::Distinct(_, _) => {
                    let slot = s.body().iter().enumerate().find(|(j, other)| {
                        !used[*j] && matches!(other, Literal::Distinct(_, _))
                    });
                    let (j, _) = slot?;
                    used[j] = true;
                }
                Literal::Atom { sentence, negated } => {
                    let mut best: Option<(usize, f64, Vec<(Predicate, Predicate)>)> = None;
                    for (j, other) in s.body().iter().enumerate() {
                        if used[j] {
                            continue;
                        }
                        let Literal::Atom {
                            sentence: other_sentence,
                            negated: other_negated,
                        } = other
                        else {
                            continue;
                        };
                        if negated != other_negated {
                            continue;
                        }
                        let mut trial = pairs.clone();
                        let Some(pair_score) =
                            self.align_sentences(map, &mut trial, sentence, other_sentence)
                        else {
                            continue;
                        };
                        let better = match &best {
                            Some((_, best_score, _)) => pair_score > *best_score,
                            None => true,
                        };
                        if better {
                            best = Some((j, pair_score, trial));
                        }
                    }
                    let (j, pair_score, trial) = best?;
                    used[j] = true;
                    score += pair_score;
                    pairs = trial;
                }
            }
        }

        let score = score - self.settings.dof_weight * pairs.len() as f64;
        Some(Candidate {
            source_rule,
            target_rule,
            pairs,
            score,
        })
    }

    /// Scores one sentence pair under the current mapping and the pairs the
    /// enclosing rule match has collected so far. On success the induced
    /// predicate pair, if new, is appended to `pending`. Returns None when
    /// the pair is illegal: arity or reservedness mismatch, bijectivity
    /// conflict, or incompatible place profiles.
    fn align_sentences(
        &self,
        map: &PartialMap,
        pending: &mut Vec<(Predicate, Predicate)>,
        a: &Sentence,
        b: &Sentence,
    ) -> Option<f64> {
        let sp = a.predicate();
        let tp = b.predicate();
        if sp.arity != tp.arity {
            return None;
        }
        let source_reserved = self.source.is_reserved(sp);
        let target_reserved = self.target.is_reserved(tp);
        if source_reserved != target_reserved {
            return None;
        }
        if source_reserved
            && self.source.symbols().resolve(sp.name) != self.target.symbols().resolve(tp.name)
        {
            return None;
        }
        if !map.admits(sp, tp) {
            return None;
        }
        for (s, t) in pending.iter() {
            if (*s == sp) != (*t == tp) {
                return None;
            }
        }

        let mut affinity = 0.0;
        let mut places = 0.0;
        for position in PositionIndex::positions(a) {
            let (Some(source_place), Some(target_place)) = (
                self.source_types.place(sp, &position),
                self.target_types.place(tp, &position),
            ) else {
                continue;
            };
            if !source_place.compatible(target_place) {
                return None;
            }
            affinity += source_place.affinity(target_place);
            places += 1.0;
        }
        let affinity = if places > 0.0 { affinity / places } else { 0.5 };
        let score = self.settings.sentence_weight + self.settings.affinity_weight * affinity;
        if !map.contains(sp, tp) && !pending.contains(&(sp, tp)) {
            pending.push((sp, tp));
        }
        Some(score)
    }
}
