use criterion::{black_box, criterion_group, criterion_main, Criterion};
use linrex_core::{Regex, Replacer, Value, translate};

const TEXT: &str = "GET /api/users/42 HTTP/1.1 😃 Host: example.com; POST /api/orders/7 HTTP/2 жж";

fn bench_exec(c: &mut Criterion) {
    let mut pattern = Regex::new(r"/api/(?<kind>\w+)/(?<id>\d+)").unwrap();

    c.bench_function("exec_named_groups", |b| {
        b.iter(|| black_box(pattern.exec(black_box(TEXT)).unwrap().map(|m| m.index())))
    });
}

fn bench_exec_global_walk(c: &mut Criterion) {
    let mut pattern = Regex::with_flags(r"\w+", "g").unwrap();

    c.bench_function("exec_global_walk", |b| {
        b.iter(|| {
            let mut count = 0;
            while pattern.exec(black_box(TEXT)).unwrap().is_some() {
                count += 1;
            }
            black_box(count)
        })
    });
}

fn bench_match_all(c: &mut Criterion) {
    let mut pattern = Regex::with_flags(r"\d+", "g").unwrap();
    let input = "abc 123 def 456 ghi 789 jkl 012 mno 345 pqr 678 stu 901";

    c.bench_function("match_all_numbers", |b| {
        b.iter(|| black_box(pattern.match_(black_box(input)).unwrap()))
    });
}

fn bench_set(c: &mut Criterion) {
    let mut pattern = Regex::set(
        [r"GET\s+(\S+)", r"POST\s+(\S+)", r"HTTP/(\d(?:\.\d)?)", r"Host:\s*(\S+)"],
        "g",
    )
    .unwrap();

    c.bench_function("set_exec_walk", |b| {
        b.iter(|| {
            let mut members = Vec::new();
            while let Some(m) = pattern.exec(black_box(TEXT)).unwrap() {
                members.push(m.pattern_index());
            }
            black_box(members)
        })
    });
}

fn bench_replace_template(c: &mut Criterion) {
    let mut pattern = Regex::with_flags(r"(\w+)/(\d+)", "g").unwrap();

    c.bench_function("replace_template", |b| {
        b.iter(|| black_box(pattern.replace(black_box(TEXT), "$2:$1").unwrap()))
    });
}

fn bench_replace_callback(c: &mut Criterion) {
    let mut pattern = Regex::with_flags(r"\d+", "g").unwrap();

    c.bench_function("replace_callback", |b| {
        b.iter(|| {
            let replacer = Replacer::callback(|m| Ok(Value::from(format!("<{}>", m.index()))));
            black_box(pattern.replace(black_box(TEXT), replacer).unwrap())
        })
    });
}

fn bench_translate(c: &mut Criterion) {
    let source = r"(?<year>\d{4})-(?<month>\d{2})/\u{1F603}[^/]+";

    c.bench_function("translate", |b| {
        b.iter(|| black_box(translate(black_box(source))))
    });
}

criterion_group!(
    benches,
    bench_exec,
    bench_exec_global_walk,
    bench_match_all,
    bench_set,
    bench_replace_template,
    bench_replace_callback,
    bench_translate
);
criterion_main!(benches);
