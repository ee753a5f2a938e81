use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use dtx_codec::{decode_binary, encode_to_vec, ArrayKind, DataArray, DtbVersion, EncodeConfig, Node};
use std::io::Cursor;

/// A song-list shaped tree with `entries` records.
fn song_list(entries: usize) -> DataArray {
    let mut root = DataArray::array();
    for i in 0..entries {
        let song = root.push_array(ArrayKind::Array);
        song.push(Node::symbol(format!("song_{i}")));
        let name = song.push_array(ArrayKind::Array);
        name.push(Node::symbol("name"));
        name.push(Node::string(format!("Song number {i}")));
        let tracks = song.push_array(ArrayKind::Array);
        tracks.push(Node::symbol("tracks"));
        for t in 0..4 {
            let track = tracks.push_array(ArrayKind::Command);
            track.push(Node::symbol("track"));
            track.push(Node::int(t));
            track.push(Node::float(t as f32 * 0.5));
        }
        song.push(Node::variable("difficulty"));
    }
    root
}

#[allow(clippy::unwrap_used)]
fn bench_dtb_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("dtb_encode_decode");

    for &entries in &[16usize, 256, 4096] {
        let tree = song_list(entries);
        for (version, encrypt) in [(DtbVersion::V1, false), (DtbVersion::V3, false), (DtbVersion::V3, true)] {
            let config = EncodeConfig {
                encrypt,
                ..EncodeConfig::new(version)
            };
            let bytes = encode_to_vec(&tree, &config).unwrap();
            let label = format!("{version}_{}_{entries}", if encrypt { "enc" } else { "plain" });
            group.throughput(Throughput::Bytes(bytes.len() as u64));

            group.bench_function(format!("encode_{label}"), |b| {
                b.iter(|| encode_to_vec(&tree, &config).unwrap())
            });
            group.bench_function(format!("decode_{label}"), |b| {
                b.iter_batched(
                    || Cursor::new(bytes.clone()),
                    |mut cursor| decode_binary(&mut cursor).unwrap(),
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_dtb_encode_decode);
criterion_main!(benches);
