// Digest, signing, and key recovery benchmarks.
//
// Covers transaction serialization and digest at several operation counts,
// canonical secp256k1 signing of a digest, full transaction signing, and
// public-key recovery from a signature.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use graphene_protocol::chain::{AssetAmount, ChainId, ObjectId};
use graphene_protocol::crypto::{sha256, Signer};
use graphene_protocol::operations::{Operation, TransferOperationBuilder};
use graphene_protocol::transaction::{sign_transaction, Transaction, TransactionBuilder};

fn transfer(i: u64) -> Operation {
    TransferOperationBuilder::new()
        .fee(AssetAmount::new(264_174, ObjectId::asset(0)))
        .from(ObjectId::account(28_828))
        .to(ObjectId::account(18 + i))
        .amount(AssetAmount::new(1_000 + i, ObjectId::asset(0)))
        .build()
        .expect("valid transfer")
        .into()
}

fn transaction(ops: u64) -> Transaction {
    TransactionBuilder::new(ChainId::from_bytes([0x40; 32]))
        .reference_block(0x4567, 0xDDCC_BBAA)
        .expiration(1_500_000_030)
        .operations((0..ops).map(transfer))
        .build()
}

fn bench_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/digest");

    for size in [1u64, 10, 100] {
        let tx = transaction(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tx, |b, tx| {
            b.iter(|| tx.digest());
        });
    }

    group.finish();
}

fn bench_sign_digest(c: &mut Criterion) {
    let signer = Signer::generate();
    let digest = sha256(b"transfer 1 BTS from 1.2.28828 to 1.2.18");

    c.bench_function("secp256k1/sign_digest", |b| {
        b.iter(|| signer.sign(&digest).unwrap());
    });
}

fn bench_sign_transaction(c: &mut Criterion) {
    let signer = Signer::generate();

    c.bench_function("secp256k1/sign_transaction", |b| {
        b.iter(|| {
            let mut tx = transaction(1);
            sign_transaction(&mut tx, &signer).unwrap();
        });
    });
}

fn bench_recover(c: &mut Criterion) {
    let signer = Signer::generate();
    let digest = sha256(b"recover me");
    let signature = signer.sign(&digest).unwrap();

    c.bench_function("secp256k1/recover", |b| {
        b.iter(|| signature.recover(&digest).unwrap());
    });
}

criterion_group!(
    benches,
    bench_digest,
    bench_sign_digest,
    bench_sign_transaction,
    bench_recover,
);
criterion_main!(benches);
