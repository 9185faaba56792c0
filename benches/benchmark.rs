use criterion::{Criterion, criterion_group, criterion_main};
use pprof::criterion::{Output, PProfProfiler};
use rml2csv::builder::{Options, build_csv};
use std::{fmt::Write, time::Duration};
use tempfile::tempdir;

const MAPPING: &str = r#"
@prefix rml: <http://w3id.org/rml/> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .

<http://ex.com/map#Person> rml:subjectMap [
        rml:template "http://ex.com/person/{ID}" ;
        rml:class foaf:Person
    ] ;
    rml:predicateObjectMap [
        rml:predicate foaf:name ;
        rml:objectMap [ rml:reference "Name" ]
    ] , [
        rml:predicate foaf:mbox ;
        rml:objectMap [ rml:template "mailto:{Email}" ]
    ] .
"#;

fn people(count: usize) -> String {
    let mut nq = String::new();
    for i in 0..count {
        writeln!(
            nq,
            "<http://ex.com/person/{i}> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://xmlns.com/foaf/0.1/Person> .\n\
             <http://ex.com/person/{i}> <http://xmlns.com/foaf/0.1/name> \"Person {i}\" .\n\
             <http://ex.com/person/{i}> <http://xmlns.com/foaf/0.1/mbox> <mailto:p{i}@ex.com> ."
        )
        .unwrap();
    }
    nq
}

fn generate(c: &mut Criterion) {
    let tmp_dir = tempdir().unwrap();
    let source_rdf = tmp_dir.path().join("people.nq");
    let mapping = tmp_dir.path().join("mapping.ttl");
    std::fs::write(&source_rdf, people(50_000)).unwrap();
    std::fs::write(&mapping, MAPPING).unwrap();
    let options = Options {
        output_path: tmp_dir.path().join("output.csv"),
        ..Options::default()
    };

    let mut group = c.benchmark_group("create CSV from NQ file");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(30));
    group.bench_function("csv create", |b| {
        b.iter(|| build_csv(&source_rdf, &mapping, &options).unwrap());
    });
    group.finish();

    let _ = tmp_dir.close();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Protobuf))
        .warm_up_time(Duration::from_millis(1));
    targets = generate
}
criterion_main!(benches);
