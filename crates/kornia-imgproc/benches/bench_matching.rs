use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use kornia_image::Image;
use kornia_imgproc::features::{match_descriptors, OrbConfig, OrbDetector};

fn random_descriptors(rng: &mut StdRng, n: usize) -> Vec<[u8; 32]> {
    (0..n).map(|_| rng.random::<[u8; 32]>()).collect()
}

fn bench_match_descriptors(c: &mut Criterion) {
    let mut group = c.benchmark_group("MatchDescriptors");
    let mut rng = StdRng::seed_from_u64(0);

    for n in [100, 300, 500] {
        let query = random_descriptors(&mut rng, n);
        let train = random_descriptors(&mut rng, n);

        group.bench_with_input(
            BenchmarkId::new("bf_hamming_cross_check", n),
            &(query, train),
            |b, (q, t)| {
                b.iter(|| black_box(match_descriptors(q, t, None, true, None)));
            },
        );
    }

    group.finish();
}

fn bench_orb_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("OrbDetectAndCompute");
    let mut rng = StdRng::seed_from_u64(1);

    let (width, height) = (800, 600);
    let blocks: Vec<u8> = (0..(width / 16 + 1) * (height / 16 + 1))
        .map(|_| rng.random::<u8>())
        .collect();
    let data = (0..width * height)
        .map(|i| blocks[(i / width / 16) * (width / 16 + 1) + (i % width) / 16])
        .collect();
    let image = Image::<u8, 1>::new([width, height].into(), data).unwrap();

    let orb = OrbDetector::new(OrbConfig::default().with_n_features(300));

    group.bench_with_input(
        BenchmarkId::new("orb_300", format!("{width}x{height}")),
        &image,
        |b, i| {
            b.iter(|| black_box(orb.detect_and_compute(i)).unwrap());
        },
    );

    group.finish();
}

criterion_group!(benches, bench_match_descriptors, bench_orb_detect);
criterion_main!(benches);
