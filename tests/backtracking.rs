use rulemap::kif::parse_ruleset;
use rulemap::mapper::{MapStatus, Mapper, MapperSettings};

// Both source rules need m/1 in their body, but each target rule uses a
// different body predicate. Whatever the search commits first, the second
// rule dead-ends, so it has to unroll, suppress the choice, try the
// alternative, dead-end again, and finally settle for a partial mapping.
const SOURCE: &str = "
(<= (p ?x) (m ?x))
(<= (q ?x) (m ?x))
";

const TARGET: &str = "
(<= (u ?x) (w ?x))
(<= (v ?x) (z ?x))
";

#[test]
fn conflicting_rules_force_unrolling_and_end_partial() {
    let source = parse_ruleset(SOURCE).unwrap();
    let target = parse_ruleset(TARGET).unwrap();
    let mapper = Mapper::new(&source, &target, MapperSettings::default());
    let outcome = mapper.map();

    assert_eq!(outcome.status, MapStatus::Partial);
    assert_eq!(outcome.matched_rules, 1);
    assert_eq!(outcome.total_rules, 2);
    // commits plus unrolls: strictly more steps than the one surviving match
    assert!(outcome.steps > 1, "expected backtracking, got {} steps", outcome.steps);
    // the surviving match binds a head predicate and the shared body predicate
    assert_eq!(outcome.bindings.len(), 2);
}

#[test]
fn the_partial_outcome_is_still_consistent() {
    let source = parse_ruleset(SOURCE).unwrap();
    let target = parse_ruleset(TARGET).unwrap();
    let mapper = Mapper::new(&source, &target, MapperSettings::default());
    let outcome = mapper.map();

    let report = outcome.report(&source, &target);
    let m_binding: Vec<_> = report
        .correspondences
        .iter()
        .filter(|c| c.source == "m/1")
        .collect();
    assert_eq!(m_binding.len(), 1);
    assert!(m_binding[0].target == "w/1" || m_binding[0].target == "z/1");
}
