//! Parser for game descriptions in the KIF/GDL surface syntax.
//!
//! The grammar lives in `kif.pest`. Parsing interns every encountered name
//! into the ruleset's [`SymbolKeeper`] and produces [`construct::Rule`]s,
//! where a top-level bare sentence becomes a fact (a rule with an empty
//! body). Negation and `distinct` are only accepted in rule bodies; the
//! structural words `not` and `distinct` are rejected as predicate names.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::construct;
use crate::construct::{Literal, Sentence, Ruleset, SymbolKeeper, Term};
use crate::error::{Result, RulemapError};

#[derive(Parser)]
#[grammar = "kif.pest"]
struct KifParser;

/// Words that structure the language and therefore cannot name a predicate.
const STRUCTURAL: [&str; 3] = ["not", "distinct", "<="];

/// Parses a complete game description. Empty input yields an empty ruleset.
pub fn parse_ruleset(input: &str) -> Result<Ruleset> {
    let mut parsed = KifParser::parse(Rule::ruleset, input).map_err(|e| {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((line, col)) => (line, col),
            pest::error::LineColLocation::Span((line, col), _) => (line, col),
        };
        RulemapError::Parse {
            message: e.variant.message().into_owned(),
            line: Some(line),
            col: Some(col),
        }
    })?;
    let ruleset = parsed
        .next()
        .ok_or_else(|| RulemapError::Invariant("parser produced no ruleset".into()))?;

    let mut symbols = SymbolKeeper::new();
    let mut rules = Vec::new();
    for item in ruleset.into_inner() {
        match item.as_rule() {
            Rule::implication => rules.push(build_implication(item, &mut symbols)?),
            Rule::fact => {
                let sentence = item
                    .into_inner()
                    .next()
                    .ok_or_else(|| RulemapError::Invariant("empty fact".into()))?;
                let head = build_sentence(sentence, &mut symbols)?;
                rules.push(construct::Rule::new(head, Vec::new()));
            }
            Rule::EOI => (),
            other => {
                return Err(RulemapError::Invariant(format!(
                    "unexpected top level rule {other:?}"
                )));
            }
        }
    }
    Ok(Ruleset::new(rules, symbols))
}

fn build_implication(pair: Pair<Rule>, symbols: &mut SymbolKeeper) -> Result<construct::Rule> {
    let mut inner = pair.into_inner();
    let head = inner
        .next()
        .ok_or_else(|| RulemapError::Invariant("implication without head".into()))?;
    let head = build_sentence(head, symbols)?;
    let mut body = Vec::new();
    for literal in inner {
        body.push(build_literal(literal, symbols)?);
    }
    Ok(construct::Rule::new(head, body))
}

fn build_literal(pair: Pair<Rule>, symbols: &mut SymbolKeeper) -> Result<Literal> {
    match pair.as_rule() {
        Rule::negation => {
            // the first inner pair is the keyword token
            let sentence = pair
                .into_inner()
                .find(|p| matches!(p.as_rule(), Rule::compound | Rule::proposition))
                .ok_or_else(|| RulemapError::Invariant("negation without sentence".into()))?;
            Ok(Literal::Atom {
                sentence: build_sentence(sentence, symbols)?,
                negated: true,
            })
        }
        Rule::distinct => {
            let mut inner = pair.into_inner().filter(|p| {
                matches!(p.as_rule(), Rule::variable | Rule::function | Rule::constant)
            });
            let left = inner
                .next()
                .ok_or_else(|| RulemapError::Invariant("distinct without terms".into()))?;
            let right = inner
                .next()
                .ok_or_else(|| RulemapError::Invariant("distinct with one term".into()))?;
            Ok(Literal::Distinct(
                build_term(left, symbols)?,
                build_term(right, symbols)?,
            ))
        }
        Rule::compound | Rule::proposition => Ok(Literal::Atom {
            sentence: build_sentence(pair, symbols)?,
            negated: false,
        }),
        other => Err(RulemapError::Invariant(format!(
            "unexpected literal rule {other:?}"
        ))),
    }
}

fn build_sentence(pair: Pair<Rule>, symbols: &mut SymbolKeeper) -> Result<Sentence> {
    let (line, col) = pair.as_span().start_pos().line_col();
    match pair.as_rule() {
        Rule::proposition => {
            let name = checked_name(pair.as_str(), line, col)?;
            let (name, _) = symbols.keep(name);
            Ok(Sentence::new(name, Vec::new()))
        }
        Rule::compound => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .ok_or_else(|| RulemapError::Invariant("compound without name".into()))?;
            let name = checked_name(name.as_str(), line, col)?;
            let (name, _) = symbols.keep(name);
            let mut args = Vec::new();
            for term in inner {
                args.push(build_term(term, symbols)?);
            }
            Ok(Sentence::new(name, args))
        }
        other => Err(RulemapError::Invariant(format!(
            "unexpected sentence rule {other:?}"
        ))),
    }
}

fn build_term(pair: Pair<Rule>, symbols: &mut SymbolKeeper) -> Result<Term> {
    match pair.as_rule() {
        Rule::variable => {
            let name = pair.as_str().trim_start_matches('?');
            let (name, _) = symbols.keep(name);
            Ok(Term::Variable(name))
        }
        Rule::constant => {
            let (name, _) = symbols.keep(pair.as_str());
            Ok(Term::Constant(name))
        }
        Rule::function => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .ok_or_else(|| RulemapError::Invariant("function without name".into()))?;
            let (name, _) = symbols.keep(name.as_str());
            let mut args = Vec::new();
            for term in inner {
                args.push(build_term(term, symbols)?);
            }
            Ok(Term::Function { name, args })
        }
        other => Err(RulemapError::Invariant(format!(
            "unexpected term rule {other:?}"
        ))),
    }
}

fn checked_name(name: &str, line: usize, col: usize) -> Result<&str> {
    if STRUCTURAL.contains(&name) {
        return Err(RulemapError::Parse {
            message: format!("'{name}' cannot be used as a predicate name here"),
            line: Some(line),
            col: Some(col),
        });
    }
    Ok(name)
}
