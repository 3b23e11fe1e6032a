use rulemap::construct::{Literal, Term};
use rulemap::error::RulemapError;
use rulemap::kif::parse_ruleset;

#[test]
fn parses_facts_and_implications() {
    let ruleset = parse_ruleset(
        "; a tiny fragment of a game description
         (role white)
         (init (button off))
         (<= (legal ?p (press ?b)) (role ?p) (true (button ?b)) (not (jammed ?b)) (distinct ?b off))",
    )
    .expect("fragment parses");
    assert_eq!(ruleset.rules().len(), 3);
    assert!(ruleset.rules()[0].is_fact());
    assert!(ruleset.rules()[1].is_fact());
    assert!(!ruleset.rules()[2].is_fact());

    let legal = ruleset.rules()[2].head().predicate();
    assert_eq!(legal.arity, 2);
    assert_eq!(ruleset.symbols().resolve(legal.name), Some("legal"));

    let body = ruleset.rules()[2].body();
    assert_eq!(body.len(), 4);
    assert!(matches!(&body[2], Literal::Atom { negated: true, .. }));
    assert!(matches!(
        &body[3],
        Literal::Distinct(Term::Variable(_), Term::Constant(_))
    ));

    let mut variables = Vec::new();
    for term in ruleset.rules()[2].head().args() {
        term.collect_variables(&mut variables);
    }
    assert_eq!(variables.len(), 2);
}

#[test]
fn nested_function_terms_keep_their_shape() {
    let ruleset = parse_ruleset("(next (cell 1 (pair 2 3)))").unwrap();
    let head = ruleset.rules()[0].head();
    assert!(head.args()[0].is_ground());
    let Term::Function { args, .. } = &head.args()[0] else {
        panic!("expected a function term");
    };
    assert!(matches!(&args[1], Term::Function { args, .. } if args.len() == 2));
}

#[test]
fn predicates_are_collected_once_with_reservedness() {
    let ruleset = parse_ruleset(
        "(role white)
         (role black)
         (<= (wins ?p) (role ?p))",
    )
    .unwrap();
    let predicates = ruleset.predicates();
    assert_eq!(predicates.len(), 2);
    assert_eq!(ruleset.symbols().resolve(predicates[0].name), Some("role"));
    assert!(ruleset.is_reserved(predicates[0]));
    assert_eq!(ruleset.symbols().resolve(predicates[1].name), Some("wins"));
    assert!(!ruleset.is_reserved(predicates[1]));
}

#[test]
fn keyword_prefixes_are_ordinary_predicates() {
    let ruleset = parse_ruleset("(notify a) (<= p (distinctive ?x ?y))").unwrap();
    let head = ruleset.rules()[0].head();
    assert_eq!(ruleset.symbols().resolve(head.name()), Some("notify"));
    assert_eq!(head.arity(), 1);
    assert!(matches!(
        &ruleset.rules()[1].body()[0],
        Literal::Atom { negated: false, .. }
    ));
}

#[test]
fn empty_and_comment_only_input_parse_to_empty_rulesets() {
    assert!(parse_ruleset("").unwrap().is_empty());
    assert!(parse_ruleset("; nothing here\n; at all").unwrap().is_empty());
}

#[test]
fn parse_errors_carry_a_location() {
    let err = parse_ruleset("(role white").unwrap_err();
    match err {
        RulemapError::Parse { line, .. } => assert_eq!(line, Some(1)),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn structural_words_cannot_name_predicates() {
    let err = parse_ruleset("(<= (not p) (q a))").unwrap_err();
    match err {
        RulemapError::Parse { message, .. } => {
            assert!(message.contains("cannot be used as a predicate name"));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}
