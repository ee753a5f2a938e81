use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dtx_codec::{parse_text, parse_text_with, ParseConfig};

fn song_text(entries: usize) -> String {
    let mut text = String::from("; generated song list\n");
    for i in 0..entries {
        text.push_str(&format!(
            "(song_{i}\n   (name \"Song number {i}\")\n   (tracks\n      {{drum 0 1.5}}\n      {{bass 1 2.0}})\n   ('vocal parts' 3)\n   ($difficulty -1))\n"
        ));
    }
    text
}

#[allow(clippy::unwrap_used)]
fn bench_dta_parse_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("dta_parse_render");

    for &entries in &[16usize, 256, 4096] {
        let text = song_text(entries);
        let tree = parse_text(&text).unwrap();
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_function(format!("parse_{entries}"), |b| {
            b.iter(|| parse_text(&text).unwrap())
        });
        group.bench_function(format!("parse_directives_{entries}"), |b| {
            let config = ParseConfig::with_directives();
            b.iter(|| parse_text_with(&text, &config).unwrap())
        });
        group.bench_function(format!("render_{entries}"), |b| b.iter(|| tree.to_dta()));
    }

    group.finish();
}

criterion_group!(benches, bench_dta_parse_render);
criterion_main!(benches);
