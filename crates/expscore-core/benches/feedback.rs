use criterion::{black_box, criterion_group, criterion_main, Criterion};

use expscore_core::feedback::FeedbackRules;
use expscore_core::loader::parse_experiment_str;

const EXPERIMENT_JSON: &str = r#"{
    "status": "success",
    "data": {
        "experiment_id": "bench",
        "title": "Benchmark",
        "total_score": 18,
        "questions": [
            {"question_id": 1, "type": "choice", "score": 5, "feedback": "Correct"},
            {"question_id": 2, "type": "blank", "score": 5, "feedback": "Incorrect"},
            {"question_id": 3, "type": "code", "score": 10, "feedback": "Passed 7/9 test cases"}
        ]
    }
}"#;

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let rules = FeedbackRules::default();

    for (name, text) in [
        ("correct", "Correct"),
        ("incorrect", "Incorrect"),
        ("partial", "Passed 7/9 test cases"),
        ("unrecognized", "Evaluation error: container exited with code 137"),
    ] {
        group.bench_function(name, |b| b.iter(|| rules.classify(black_box(Some(text)))));
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_experiment_envelope", |b| {
        b.iter(|| parse_experiment_str(black_box(EXPERIMENT_JSON)).unwrap())
    });
}

criterion_group!(benches, bench_classify, bench_parse);
criterion_main!(benches);
