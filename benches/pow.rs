use criterion::{criterion_group, criterion_main, Criterion};
use hashlink_ledger::{Block, PowSettings, TXInput, TXOutput, Transaction};

fn bench_pow(c: &mut Criterion) {
    let transactions: Vec<Transaction> = (0..10u8)
        .map(|i| {
            Transaction::from_parts(
                vec![TXInput::new(&[i; 32], 0, &format!("alice-{i}"))],
                vec![TXOutput::new(u64::from(i) + 1, "bob")],
            )
            .unwrap()
        })
        .collect();
    let settings = PowSettings::new(12, i64::MAX).unwrap();

    c.bench_function("mine_block_difficulty_12", |b| {
        b.iter(|| Block::new_block(vec![0; 32], &transactions, settings).unwrap());
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
