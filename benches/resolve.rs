use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use railvox::audio::reverb::Convolver;
use railvox::phrase::{AnnouncementState, ElementType, PhraseElement, PhraseNode, slug, to_vox};
use std::hint::black_box;

/// A departure announcement repeated `sections` times.
fn announcement(sections: usize) -> (PhraseNode, AnnouncementState) {
    let mut root = PhraseElement::new(ElementType::Phrase).with_attr("ref", "departure");
    for _ in 0..sections {
        root = root
            .with_child("The ")
            .with_child(PhraseElement::new(ElementType::Time).with_attr("context", "main"))
            .with_child(" ")
            .with_child(PhraseElement::new(ElementType::Service).with_attr("context", "provider"))
            .with_child(" service to ")
            .with_child(PhraseElement::new(ElementType::Station).with_attr("context", "destination"))
            .with_child(", calling at ")
            .with_child(
                PhraseElement::new(ElementType::Stationlist).with_attr("context", "calling"),
            )
            .with_child(". We are sorry for ")
            .with_child(PhraseElement::new(ElementType::Excuse))
            .with_child(".");
    }

    let state = AnnouncementState::new()
        .with_time("main", "09:05")
        .with_service("provider", "Southern Railway")
        .with_station("destination", "EUS")
        .with_station_list("calling", &["CRE", "SOT", "STA", "MKC", "WFJ"])
        .with_excuse("a fault with the signalling");

    (PhraseNode::Element(root), state)
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for sections in [1, 10, 100] {
        let (phrase, state) = announcement(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &sections, |b, _| {
            b.iter(|| to_vox(black_box(&phrase), black_box(&state)))
        });
    }
    group.finish();
}

fn bench_slug(c: &mut Criterion) {
    c.bench_function("slug", |b| {
        b.iter(|| slug(black_box("Delays to services caused by a fault with the signalling")))
    });
}

fn bench_reverb(c: &mut Criterion) {
    let impulse: Vec<f32> = (0..44100).map(|i| (-(i as f32) / 8000.0).exp()).collect();
    let mut convolver = Convolver::new(&impulse, 512);
    c.bench_function("reverb_one_second", |b| {
        b.iter(|| {
            let mut acc = 0.0f32;
            for i in 0..44100 {
                acc += convolver.process(black_box(if i % 100 == 0 { 1.0 } else { 0.0 }));
            }
            acc
        })
    });
}

criterion_group!(benches, bench_resolve, bench_slug, bench_reverb);
criterion_main!(benches);
