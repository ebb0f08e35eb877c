use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use frankenterm_charset::{CodepageId, ConversionTableSet, Glyph, PortableHost, catalog, resolve};

fn koi8u() -> CodepageId {
    CodepageId::builtin(catalog::names().position(|n| n == "KOI8-U").unwrap_or(0))
}

fn corpus() -> Vec<u8> {
    (0..4096_u32).map(|i| (i * 31 % 256) as u8).collect()
}

fn bench_build(c: &mut Criterion) {
    let host = PortableHost::default();
    let mut group = c.benchmark_group("build");
    group.bench_function("builtin_line", |b| {
        b.iter(|| ConversionTableSet::build(&host, CodepageId::ANSI, black_box(koi8u()), false));
    });
    group.bench_function("host_line", |b| {
        b.iter(|| {
            ConversionTableSet::build(&host, CodepageId::os(1251), black_box(CodepageId::os(1251)), false)
        });
    });
    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let host = PortableHost::default();
    let line = koi8u();
    let tables = ConversionTableSet::build(&host, CodepageId::ANSI, line, false);
    let bytes = corpus();
    let chars = tables.decode(&host, line, &bytes);

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("decode_line", |b| {
        let mut out = vec!['\0'; bytes.len()];
        b.iter(|| tables.decode_into(&host, line, black_box(&bytes), &mut out));
    });
    group.bench_function("encode_line", |b| {
        let mut out = vec![0u8; chars.len()];
        b.iter(|| tables.encode_into(&host, line, black_box(&chars), &mut out));
    });
    group.bench_function("class_of", |b| {
        b.iter(|| {
            bytes
                .iter()
                .map(|&byte| tables.class_of(Glyph::font(black_box(byte))))
                .filter(|class| *class == frankenterm_charset::WordClass::Word)
                .count()
        });
    });
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let host = PortableHost::default();
    c.bench_function("resolve_fuzzy", |b| {
        b.iter(|| resolve(&host, black_box("iso8859-15")));
    });
}

criterion_group!(benches, bench_build, bench_convert, bench_resolve);
criterion_main!(benches);
