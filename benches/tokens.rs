use gatekeep::Credentials;
use gatekeep::Crypto;
use gatekeep::Policy;

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        signing_ordinary_token,
        signing_remember_token,
        verifying_valid_token,
        verifying_forged_token,
        choosing_presented_token,
}

fn crypto() -> Crypto {
    Crypto::new(b"correct horse battery staple", "https://forum.test")
}

fn signing_ordinary_token(c: &mut criterion::Criterion) {
    let crypto = crypto();
    let policy = Policy::default();
    c.bench_function("sign an ordinary token", |b| {
        b.iter(|| crypto.generate(42, false, &policy))
    });
}

fn signing_remember_token(c: &mut criterion::Criterion) {
    let crypto = crypto();
    let policy = Policy::default();
    c.bench_function("sign a remember-me token", |b| {
        b.iter(|| crypto.generate(42, true, &policy))
    });
}

fn verifying_valid_token(c: &mut criterion::Criterion) {
    let crypto = crypto();
    let token = crypto.generate(42, false, &Policy::default()).unwrap();
    c.bench_function("verify a valid token", |b| b.iter(|| crypto.verify(&token)));
}

fn verifying_forged_token(c: &mut criterion::Criterion) {
    let crypto = crypto();
    let token = Crypto::new(b"another secret", "https://forum.test")
        .generate(42, false, &Policy::default())
        .unwrap();
    c.bench_function("reject a forged token", |b| b.iter(|| crypto.verify(&token)));
}

fn choosing_presented_token(c: &mut criterion::Criterion) {
    let credentials = Credentials::default()
        .with_cookie("stale.cookie.token")
        .with_bearer("fresh.bearer.token")
        .with_sid("sid");
    c.bench_function("choose between bearer and cookie", |b| {
        b.iter(|| credentials.token().map(str::len))
    });
}
