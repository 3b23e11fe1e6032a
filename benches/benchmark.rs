use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rulemap::kif::parse_ruleset;
use rulemap::mapper::{Mapper, MapperSettings};

const GAME: &str = "
(role white)
(role black)
(init (step 1))
(<= (legal ?p (press ?b)) (role ?p) (true (button ?b)))
(<= (next (step ?n)) (true (step ?m)) (succ ?m ?n))
(<= (next (button ?b)) (does ?p (press ?b)) (not (broken ?b)))
(<= terminal (true (step 5)))
(<= (goal ?p 100) (role ?p) (true (button on)))
(succ 1 2)
(succ 2 3)
(succ 3 4)
(succ 4 5)
";

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("parse ruleset", |b| {
        b.iter(|| parse_ruleset(black_box(GAME)).unwrap())
    });

    let source = parse_ruleset(GAME).unwrap();
    let target = parse_ruleset(GAME).unwrap();
    c.bench_function("map identical rulesets", |b| {
        b.iter(|| {
            let mapper = Mapper::new(black_box(&source), black_box(&target), MapperSettings::default());
            mapper.map()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
