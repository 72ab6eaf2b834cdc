use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlweave::{Dialect, Frame, QueryBuilder, Row, Series, cast_frame, qb};

fn bench_select_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/select_conditions");
    let session = QueryBuilder::new(Dialect::Postgres);

    for n in [1, 5, 10, 50] {
        let conditions: Vec<String> = (0..n).map(|i| format!("col{i} >= {i}")).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &conditions, |b, conds| {
            b.iter(|| {
                let plan = qb::select("t")
                    .filters(conds.iter().map(String::as_str))
                    .build(&session)
                    .unwrap();
                black_box(plan);
            });
        });
    }

    group.finish();
}

fn bench_insert_bulk(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/insert_bulk");

    for dialect in [Dialect::Mysql, Dialect::Mssql] {
        for n in [10, 100, 2500] {
            let rows: Vec<Row> = (0..n)
                .map(|i| Row::new().set("id", i as i64).set("name", format!("user{i}")))
                .collect();
            let session = QueryBuilder::new(dialect);
            let id = BenchmarkId::new(dialect.name(), n);
            group.bench_with_input(id, &rows, |b, rows| {
                b.iter(|| black_box(session.insert_bulk("users", rows.iter().cloned()).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_cast_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("coerce/cast_frame");

    for n in [100, 1000] {
        let frame = Frame::from_series(vec![
            Series::new("id", (0..n).map(|i| i.to_string())),
            Series::new("seen", (0..n).map(|i| format!("2024-01-{:02} 10:00:00", i % 28 + 1))),
            Series::new("flag", (0..n).map(|i| if i % 2 == 0 { "yes" } else { "no" })),
        ])
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &frame, |b, frame| {
            b.iter(|| black_box(cast_frame(frame.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select_conditions, bench_insert_bulk, bench_cast_frame);
criterion_main!(benches);
