use criterion::{Criterion, black_box, criterion_group, criterion_main};
use livesub::streaming::frame::{AudioFrame, Hypothesis};
use livesub::streaming::merger::StableTextMerger;
use livesub::streaming::segmenter::{Segmenter, SegmenterConfig};

/// One minute of alternating speech and silence in 100ms frames.
fn synthetic_frames() -> Vec<AudioFrame> {
    let frame_len = 1600;
    let mut frames = Vec::new();
    let mut seq = 0u64;
    for _ in 0..15 {
        for _ in 0..30 {
            frames.push(AudioFrame::new(seq, vec![3000i16; frame_len]));
            seq += 1;
        }
        for _ in 0..10 {
            frames.push(AudioFrame::new(seq, vec![0i16; frame_len]));
            seq += 1;
        }
    }
    frames
}

fn bench_segmenter(c: &mut Criterion) {
    let frames = synthetic_frames();
    c.bench_function("segmenter_one_minute", |b| {
        b.iter(|| {
            let mut segmenter = Segmenter::new(SegmenterConfig::default());
            let mut windows = 0usize;
            for frame in &frames {
                windows += segmenter.process(black_box(frame)).len();
            }
            black_box(windows)
        })
    });
}

fn bench_merger(c: &mut Criterion) {
    let base = "the quick brown fox jumps over the lazy dog again and again";
    let words: Vec<&str> = base.split(' ').collect();
    c.bench_function("merger_growing_hypotheses", |b| {
        b.iter(|| {
            let mut merger = StableTextMerger::new();
            for (i, _) in words.iter().enumerate() {
                let hyp = Hypothesis {
                    phrase_id: 1,
                    seq: i as u32,
                    text: words[..=i].join(" "),
                    terminal: false,
                };
                black_box(merger.process(hyp));
            }
            black_box(merger.process(Hypothesis {
                phrase_id: 1,
                seq: words.len() as u32,
                text: base.to_string(),
                terminal: true,
            }))
        })
    });
}

criterion_group!(benches, bench_segmenter, bench_merger);
criterion_main!(benches);
