use std::time::Duration;

use rulemap::interface::{JobOptions, MapperInterface};
use rulemap::kif::parse_ruleset;
use rulemap::mapper::MapStatus;

const GAME: &str = "
(role white)
(<= (next (lit ?x)) (does ?p (toggle ?x)) (wired ?x ?y))
(wired a b)
";

// Every source rule needs m/1 in its body while each target rule uses its
// own body predicate, so the search has to try and unroll rule after rule.
// Plenty of steps for cancellation to land well before the search ends.
fn contended_pair() -> (String, String) {
    let mut source = String::new();
    let mut target = String::new();
    for i in 0..40 {
        source.push_str(&format!("(<= (p{i} ?x) (m ?x))\n"));
        target.push_str(&format!("(<= (q{i} ?x) (w{i} ?x))\n"));
    }
    (source, target)
}

#[test]
fn a_submitted_job_delivers_its_outcome() {
    let interface = MapperInterface::new();
    let source = parse_ruleset(GAME).unwrap();
    let target = parse_ruleset(GAME).unwrap();
    let handle = interface
        .submit(source, target, JobOptions::default())
        .expect("job accepted");
    let id = handle.id;
    let outcome = handle.wait().expect("job delivers an outcome");
    assert_eq!(outcome.status, MapStatus::Complete);
    // a finished worker has already removed itself from the registry
    assert_eq!(interface.active_jobs().unwrap(), 0);
    interface.forget(id).unwrap();
    assert!(!interface.cancel(id).unwrap());
}

#[test]
fn active_jobs_can_be_cancelled_by_id() {
    let interface = MapperInterface::new();
    let (source, target) = contended_pair();
    let handle = interface
        .submit(
            parse_ruleset(&source).unwrap(),
            parse_ruleset(&target).unwrap(),
            JobOptions::default(),
        )
        .expect("job accepted");
    assert_eq!(interface.active_jobs().unwrap(), 1);
    assert!(interface.cancel(handle.id).unwrap());
    assert_eq!(interface.active_jobs().unwrap(), 0);
    let outcome = handle.wait().expect("job delivers an outcome");
    assert_eq!(outcome.status, MapStatus::Cancelled);
}

#[test]
fn a_timed_out_job_is_cancelled_by_the_watchdog() {
    let interface = MapperInterface::new();
    let (source, target) = contended_pair();
    let options = JobOptions {
        timeout: Some(Duration::from_millis(20)),
        ..JobOptions::default()
    };
    let handle = interface
        .submit(
            parse_ruleset(&source).unwrap(),
            parse_ruleset(&target).unwrap(),
            options,
        )
        .expect("job accepted");
    let outcome = handle.wait().expect("job delivers an outcome");
    assert_eq!(outcome.status, MapStatus::Cancelled);
    assert_eq!(interface.active_jobs().unwrap(), 0);
}

#[test]
fn distinct_jobs_get_distinct_ids() {
    let interface = MapperInterface::new();
    let a = interface
        .submit(
            parse_ruleset(GAME).unwrap(),
            parse_ruleset(GAME).unwrap(),
            JobOptions::default(),
        )
        .unwrap();
    let b = interface
        .submit(
            parse_ruleset(GAME).unwrap(),
            parse_ruleset(GAME).unwrap(),
            JobOptions::default(),
        )
        .unwrap();
    assert_ne!(a.id, b.id);
    assert!(a.wait().is_some());
    assert!(b.wait().is_some());
}
