use citadel_crypto::{CryptoSuite, FieldEnvelope, FileStreamCodec, SodiumSuite};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

fn field_envelope_seal_open(c: &mut Criterion) {
    let suite = SodiumSuite;
    let ak = suite.random_key();
    let plaintext = b"72.1";

    c.bench_function("field envelope seal", |b| {
        b.iter(|| {
            let dk = suite.random_key();
            let ef_nonce = suite.random_nonce();
            let edk_nonce = suite.random_nonce();
            let ef = suite.encrypt_secret(&dk, plaintext, &ef_nonce).unwrap();
            let edk = suite.encrypt_secret(&ak, &*dk.0, &edk_nonce).unwrap();
            FieldEnvelope {
                edk,
                edk_nonce,
                ef,
                ef_nonce,
            }
            .encode()
        })
    });

    let dk = suite.random_key();
    let ef_nonce = suite.random_nonce();
    let edk_nonce = suite.random_nonce();
    let ef = suite.encrypt_secret(&dk, plaintext, &ef_nonce).unwrap();
    let edk = suite.encrypt_secret(&ak, &*dk.0, &edk_nonce).unwrap();
    let wire = FieldEnvelope {
        edk,
        edk_nonce,
        ef,
        ef_nonce,
    }
    .encode();

    c.bench_function("field envelope open", |b| {
        b.iter(|| {
            let envelope = FieldEnvelope::decode(&wire).unwrap();
            let dk_bytes = suite
                .decrypt_secret(&ak, &envelope.edk, &envelope.edk_nonce)
                .unwrap();
            let mut dk_arr = [0u8; 32];
            dk_arr.copy_from_slice(&dk_bytes);
            let dk = citadel_crypto::SymmetricKey::from(dk_arr);
            suite
                .decrypt_secret(&dk, &envelope.ef, &envelope.ef_nonce)
                .unwrap()
        })
    });
}

fn file_chunk_seal_open(c: &mut Criterion) {
    let suite = SodiumSuite;
    let ak = suite.random_key();
    let plaintext = vec![0x42u8; citadel_crypto::CHUNK_SIZE * 4];

    let mut group = c.benchmark_group("file stream");
    group.throughput(Throughput::Bytes(plaintext.len() as u64));

    group.bench_function("encrypt", |b| {
        b.iter(|| {
            let mut sink = Vec::new();
            FileStreamCodec::encrypt(
                &suite,
                &ak,
                &mut std::io::Cursor::new(&plaintext),
                &mut sink,
            )
            .unwrap();
            sink
        })
    });

    let mut ciphertext = Vec::new();
    FileStreamCodec::encrypt(
        &suite,
        &ak,
        &mut std::io::Cursor::new(&plaintext),
        &mut ciphertext,
    )
    .unwrap();

    group.bench_function("decrypt", |b| {
        b.iter(|| {
            let mut recovered = Vec::new();
            FileStreamCodec::decrypt(
                &suite,
                &ak,
                &mut std::io::Cursor::new(&ciphertext),
                &mut recovered,
            )
            .unwrap();
            recovered
        })
    });

    group.finish();
}

criterion_group!(benches, field_envelope_seal_open, file_chunk_seal_open);
criterion_main!(benches);
