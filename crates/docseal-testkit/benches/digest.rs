//! Digest and signature throughput.

use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use docseal_core::{ContentHasher, Ed25519Signer, KeyPair, Sha256Hasher, SignatureService};

const SIZES: [usize; 4] = [1024, 64 * 1024, 1024 * 1024, 16 * 1024 * 1024];

fn bench_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest");

    for size in SIZES {
        let content = vec![0x25u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("in_memory", size), &content, |b, content| {
            b.iter(|| Sha256Hasher.digest(black_box(content)));
        });

        group.bench_with_input(BenchmarkId::new("streamed", size), &content, |b, content| {
            b.iter(|| {
                let mut reader = Cursor::new(black_box(content.as_slice()));
                Sha256Hasher.digest_reader(&mut reader)
            });
        });
    }

    group.finish();
}

fn bench_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    let keypair = KeyPair::from_seed(&[0x42; 32]);
    let public_key = keypair.public_key();
    let digest = Sha256Hasher.digest(b"%PDF-1.7 benchmark");

    group.bench_function("sign", |b| {
        b.iter(|| Ed25519Signer.sign(black_box(&digest), &keypair));
    });

    if let Ok(record) = Ed25519Signer.sign(&digest, &keypair) {
        group.bench_function("verify", |b| {
            b.iter(|| Ed25519Signer.verify(black_box(&digest), &record, &public_key));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_digest, bench_signature);
criterion_main!(benches);
