use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use markup_stream::{HtmlStream, StreamConfig};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(count: usize) -> String {
    let block = r#"<div class="box"><span>hello &amp; welcome</span><img src=x></div>"#;
    let mut out = String::with_capacity(block.len() * count);
    for _ in 0..count {
        out.push_str(block);
    }
    out
}

fn make_deep_nesting(depth: usize) -> String {
    let mut out = String::with_capacity(depth * 11);
    for _ in 0..depth {
        out.push_str("<b>");
    }
    out.push('x');
    for _ in 0..depth {
        out.push_str("</b>");
    }
    out
}

fn stream_chunks(input: &str, chunk_size: usize) -> usize {
    let mut stream: HtmlStream = HtmlStream::default();
    stream.begin_stream().expect("stream should begin");
    for chunk in input.as_bytes().chunks(chunk_size) {
        stream.write_bytes(chunk).expect("stream should accept bytes");
    }
    stream.end_stream().expect("stream should end");
    stream.tree().node_count()
}

fn bench_stream_whole_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_stream_whole_small", |b| {
        b.iter(|| black_box(stream_chunks(black_box(&input), input.len().max(1))));
    });
}

fn bench_stream_whole_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_stream_whole_large", |b| {
        b.iter(|| black_box(stream_chunks(black_box(&input), input.len().max(1))));
    });
}

fn bench_stream_small_chunks_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_stream_64b_chunks_large", |b| {
        b.iter(|| black_box(stream_chunks(black_box(&input), 64)));
    });
}

fn bench_serialize_open_tree(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_serialize_open_tree", |b| {
        b.iter_batched(
            || {
                let mut stream: HtmlStream = HtmlStream::default();
                stream.begin_stream().expect("stream should begin");
                stream.write_chunk("<main>").expect("stream should accept chunks");
                stream.write_chunk(&input).expect("stream should accept chunks");
                stream
            },
            |stream| black_box(stream.current_serialization().len()),
            BatchSize::LargeInput,
        );
    });
}

fn bench_deep_nesting(c: &mut Criterion) {
    let input = make_deep_nesting(10_000);
    c.bench_function("bench_deep_nesting", |b| {
        b.iter(|| black_box(stream_chunks(black_box(&input), 4096)));
    });
}

criterion_group!(
    benches,
    bench_stream_whole_small,
    bench_stream_whole_large,
    bench_stream_small_chunks_large,
    bench_serialize_open_tree,
    bench_deep_nesting
);
criterion_main!(benches);
