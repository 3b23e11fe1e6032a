// used to keep the one-to-one mapping between interned names and their symbols
use bimap::BiMap;

// other keepers use HashMap or HashSet with a fast hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

// custom made ordering for predicates
use std::cmp::Ordering;

// used to print out readable forms of a construct
use std::fmt;

// ------------- Symbol -------------
pub type Symbol = u32;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub const GENESIS: Symbol = 0;

/// GDL keywords whose predicates are reserved: they carry the game-independent
/// machinery of a ruleset and may only ever correspond to themselves.
pub const GDL_KEYWORDS: [&str; 8] = [
    "role", "init", "true", "next", "legal", "does", "goal", "terminal",
];

/// Interns names so that the rest of the engine can work with cheap copyable
/// symbols. The bimap allows lookups in both directions, which the report
/// rendering needs when turning a mapping back into names.
#[derive(Debug)]
pub struct SymbolKeeper {
    kept: BiMap<String, Symbol>,
    lower_bound: Symbol,
}

impl SymbolKeeper {
    pub fn new() -> Self {
        Self {
            kept: BiMap::new(),
            lower_bound: GENESIS,
        }
    }
    pub fn keep(&mut self, name: &str) -> (Symbol, bool) {
        match self.kept.get_by_left(name) {
            Some(symbol) => (*symbol, true),
            None => {
                self.lower_bound += 1;
                self.kept.insert(name.to_owned(), self.lower_bound);
                (self.lower_bound, false)
            }
        }
    }
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.kept.get_by_left(name).copied()
    }
    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        self.kept.get_by_right(&symbol).map(|s| s.as_str())
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

impl Default for SymbolKeeper {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Term -------------
/// An argument inside a sentence: a constant, a variable, or a nested
/// function term such as `(cell ?x ?y b)` inside `(true (cell ?x ?y b))`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Constant(Symbol),
    Variable(Symbol),
    Function { name: Symbol, args: Vec<Term> },
}

impl Term {
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Constant(_) => true,
            Term::Variable(_) => false,
            Term::Function { args, .. } => args.iter().all(Term::is_ground),
        }
    }
    pub fn collect_variables(&self, buf: &mut Vec<Symbol>) {
        match self {
            Term::Constant(_) => (),
            Term::Variable(v) => buf.push(*v),
            Term::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(buf);
                }
            }
        }
    }
    pub fn render(&self, symbols: &SymbolKeeper) -> String {
        match self {
            Term::Constant(c) => symbols.resolve(*c).unwrap_or("?").to_owned(),
            Term::Variable(v) => format!("?{}", symbols.resolve(*v).unwrap_or("?")),
            Term::Function { name, args } => {
                let mut s = String::from("(");
                s += symbols.resolve(*name).unwrap_or("?");
                for arg in args {
                    s += " ";
                    s += &arg.render(symbols);
                }
                s + ")"
            }
        }
    }
}

// ------------- Sentence -------------
/// A logical atom: a predicate name applied to zero or more arguments.
/// Zero arguments make a bare proposition such as `terminal`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sentence {
    name: Symbol,
    args: Vec<Term>,
}

impl Sentence {
    pub fn new(name: Symbol, args: Vec<Term>) -> Self {
        Self { name, args }
    }
    pub fn name(&self) -> Symbol {
        self.name
    }
    pub fn args(&self) -> &[Term] {
        &self.args
    }
    pub fn arity(&self) -> usize {
        self.args.len()
    }
    pub fn predicate(&self) -> Predicate {
        Predicate {
            name: self.name,
            arity: self.args.len(),
        }
    }
    pub fn render(&self, symbols: &SymbolKeeper) -> String {
        if self.args.is_empty() {
            return symbols.resolve(self.name).unwrap_or("?").to_owned();
        }
        let mut s = String::from("(");
        s += symbols.resolve(self.name).unwrap_or("?");
        for arg in &self.args {
            s += " ";
            s += &arg.render(symbols);
        }
        s + ")"
    }
}

// ------------- Literal -------------
/// A body element of a rule. Negation and `distinct` constraints are only
/// legal in bodies, which the parser enforces.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Atom { sentence: Sentence, negated: bool },
    Distinct(Term, Term),
}

impl Literal {
    pub fn sentence(&self) -> Option<&Sentence> {
        match self {
            Literal::Atom { sentence, .. } => Some(sentence),
            Literal::Distinct(_, _) => None,
        }
    }
    pub fn render(&self, symbols: &SymbolKeeper) -> String {
        match self {
            Literal::Atom { sentence, negated: false } => sentence.render(symbols),
            Literal::Atom { sentence, negated: true } => {
                format!("(not {})", sentence.render(symbols))
            }
            Literal::Distinct(a, b) => {
                format!("(distinct {} {})", a.render(symbols), b.render(symbols))
            }
        }
    }
}

// ------------- Rule -------------
/// A head sentence with a conjunctive body. A fact is a rule with an
/// empty body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rule {
    head: Sentence,
    body: Vec<Literal>,
}

impl Rule {
    pub fn new(head: Sentence, body: Vec<Literal>) -> Self {
        Self { head, body }
    }
    pub fn head(&self) -> &Sentence {
        &self.head
    }
    pub fn body(&self) -> &[Literal] {
        &self.body
    }
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
    /// Every sentence of the rule, head first.
    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        std::iter::once(&self.head).chain(self.body.iter().filter_map(Literal::sentence))
    }
    pub fn render(&self, symbols: &SymbolKeeper) -> String {
        if self.is_fact() {
            return self.head.render(symbols);
        }
        let mut s = format!("(<= {}", self.head.render(symbols));
        for literal in &self.body {
            s += " ";
            s += &literal.render(symbols);
        }
        s + ")"
    }
}

// ------------- Predicate -------------
/// A relation as it is talked about by the mapper: a name together with an
/// arity, so `(goal ?p 100)` and a hypothetical `(goal ?p)` stay distinct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub name: Symbol,
    pub arity: usize,
}

impl Predicate {
    pub fn render(&self, symbols: &SymbolKeeper) -> String {
        format!("{}/{}", symbols.resolve(self.name).unwrap_or("?"), self.arity)
    }
}

impl Ord for Predicate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.name, self.arity).cmp(&(other.name, other.arity))
    }
}

impl PartialOrd for Predicate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ------------- Ruleset -------------
/// The parsed rules of one game description together with the keeper that
/// interned their symbols.
#[derive(Debug)]
pub struct Ruleset {
    rules: Vec<Rule>,
    symbols: SymbolKeeper,
}

impl Ruleset {
    pub fn new(rules: Vec<Rule>, symbols: SymbolKeeper) -> Self {
        Self { rules, symbols }
    }
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
    pub fn symbols(&self) -> &SymbolKeeper {
        &self.symbols
    }
    pub fn len(&self) -> usize {
        self.rules.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
    /// The candidate predicates of the ruleset, in first-seen order without
    /// duplicates.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut seen = std::collections::HashSet::<Predicate, OtherHasher>::default();
        let mut predicates = Vec::new();
        for rule in &self.rules {
            for sentence in rule.sentences() {
                let predicate = sentence.predicate();
                if seen.insert(predicate) {
                    predicates.push(predicate);
                }
            }
        }
        predicates
    }
    /// Reserved predicates carry the GDL keywords and may only map to the
    /// identically named predicate on the other side.
    pub fn is_reserved(&self, predicate: Predicate) -> bool {
        match self.symbols.resolve(predicate.name) {
            Some(name) => GDL_KEYWORDS.contains(&name),
            None => false,
        }
    }
}

// ------------- PositionIndex -------------
/// Addresses one argument slot inside a (possibly nested) sentence: the first
/// offset indexes the sentence's arguments, each further offset descends into
/// a function term.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionIndex(Vec<usize>);

impl PositionIndex {
    pub fn new(path: Vec<usize>) -> Self {
        Self(path)
    }
    pub fn path(&self) -> &[usize] {
        &self.0
    }
    /// The term sitting at this position, or None when the sentence does not
    /// have the addressed shape.
    pub fn resolve<'a>(&self, sentence: &'a Sentence) -> Option<&'a Term> {
        let (first, rest) = self.0.split_first()?;
        let mut term = sentence.args().get(*first)?;
        for offset in rest {
            match term {
                Term::Function { args, .. } => term = args.get(*offset)?,
                _ => return None,
            }
        }
        Some(term)
    }
    /// Every position of the sentence, outer slots before the slots nested
    /// inside their function terms. Each returned index resolves against the
    /// sentence it was enumerated from.
    pub fn positions(sentence: &Sentence) -> Vec<PositionIndex> {
        fn descend(term: &Term, path: &mut Vec<usize>, into: &mut Vec<PositionIndex>) {
            if let Term::Function { args, .. } = term {
                for (offset, arg) in args.iter().enumerate() {
                    path.push(offset);
                    into.push(PositionIndex(path.clone()));
                    descend(arg, path, into);
                    path.pop();
                }
            }
        }
        let mut positions = Vec::new();
        let mut path = Vec::new();
        for (offset, arg) in sentence.args().iter().enumerate() {
            path.push(offset);
            positions.push(PositionIndex(path.clone()));
            descend(arg, &mut path, &mut positions);
            path.pop();
        }
        positions
    }
}

impl fmt::Display for PositionIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for offset in &self.0 {
            s += &(offset.to_string() + ".");
        }
        s.pop();
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SymbolKeeper, Sentence) {
        let mut symbols = SymbolKeeper::new();
        let (next, _) = symbols.keep("next");
        let (cell, _) = symbols.keep("cell");
        let (x, _) = symbols.keep("x");
        let (m, _) = symbols.keep("m");
        let sentence = Sentence::new(
            next,
            vec![Term::Function {
                name: cell,
                args: vec![Term::Variable(m), Term::Constant(x)],
            }],
        );
        (symbols, sentence)
    }

    #[test]
    fn symbols_are_interned_once() {
        let mut symbols = SymbolKeeper::new();
        let (a, previously_kept) = symbols.keep("cell");
        assert!(!previously_kept);
        let (b, previously_kept) = symbols.keep("cell");
        assert!(previously_kept);
        assert_eq!(a, b);
        assert_eq!(symbols.resolve(a), Some("cell"));
    }

    #[test]
    fn position_index_resolves_nested_slots() {
        let (symbols, sentence) = sample();
        let outer = PositionIndex::new(vec![0]);
        let inner = PositionIndex::new(vec![0, 1]);
        assert!(matches!(outer.resolve(&sentence), Some(Term::Function { .. })));
        let x = symbols.get("x").unwrap();
        assert_eq!(inner.resolve(&sentence), Some(&Term::Constant(x)));
        assert_eq!(PositionIndex::new(vec![1]).resolve(&sentence), None);
        assert_eq!(PositionIndex::new(vec![0, 0, 0]).resolve(&sentence), None);
    }

    #[test]
    fn positions_enumerate_every_slot() {
        let (_, sentence) = sample();
        let positions = PositionIndex::positions(&sentence);
        assert_eq!(
            positions,
            vec![
                PositionIndex::new(vec![0]),
                PositionIndex::new(vec![0, 0]),
                PositionIndex::new(vec![0, 1]),
            ]
        );
        // every enumerated index resolves against the sentence it came from
        for position in &positions {
            assert!(position.resolve(&sentence).is_some());
        }
        assert_eq!(positions[2].to_string(), "0.1");
    }

    #[test]
    fn rendering_reads_like_kif() {
        let (symbols, sentence) = sample();
        assert_eq!(sentence.render(&symbols), "(next (cell ?m x))");
    }
}
