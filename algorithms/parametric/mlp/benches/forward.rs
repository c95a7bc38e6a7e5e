use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mlp::{Mlp, TrainingConfig};
use ndarray::Array2;

fn bench_predict_proba(c: &mut Criterion) {
    let model = Mlp::<f32>::new(784, 10, TrainingConfig::default()).unwrap();
    let single = Array2::from_elem((1, 784), 0.5_f32);
    let batch = Array2::from_elem((256, 784), 0.5_f32);

    c.bench_function("predict_proba/1", |b| {
        b.iter(|| model.predict_proba(black_box(single.view())).unwrap())
    });
    c.bench_function("predict_proba/256", |b| {
        b.iter(|| model.predict_proba(black_box(batch.view())).unwrap())
    });
}

criterion_group!(benches, bench_predict_proba);
criterion_main!(benches);
