use criterion::{black_box, criterion_group, criterion_main, Criterion};

use async_trait::async_trait;
use std::sync::Arc;
use upstream::backend::{self, BlockingConnector, Connector, Params};
use upstream::policy::Policy;
use upstream::pool::ServerPool;
use upstream::provider::Provider;
use upstream::providers::blocking::BlockingProvider;
use upstream::providers::suspendable::SuspendableProvider;
use upstream::server::ServerSpec;

fn criterion_benchmark(c: &mut Criterion) {
    let provider = blocking_provider(10);
    c.bench_function("blocking connect, 10 servers", |b| {
        b.iter(|| black_box(provider.connect().expect("Failed to connect")))
    });

    // Half of the rotation is penalized, so each pass skips servers.
    let provider = blocking_provider(10);
    for server in provider.pool().servers().iter().step_by(2) {
        provider.invalidate(server, None);
    }
    c.bench_function("blocking connect, 5 of 10 servers penalized", |b| {
        b.iter(|| black_box(provider.connect().expect("Failed to connect")))
    });

    let rt = tokio::runtime::Runtime::new().unwrap();
    let provider = Arc::new(suspendable_provider(10));
    c.bench_function("concurrently connect 100", |b| {
        b.to_async(&rt)
            .iter(|| concurrent_connects(provider.clone(), black_box(100)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

struct TestConnection {}

struct TestConnector {}

impl BlockingConnector for TestConnector {
    type Connection = TestConnection;

    fn connect(&self, _params: &Params) -> Result<Self::Connection, backend::Error> {
        Ok(TestConnection {})
    }
}

#[async_trait]
impl Connector for TestConnector {
    type Connection = TestConnection;

    async fn connect(&self, _params: &Params) -> Result<Self::Connection, backend::Error> {
        Ok(TestConnection {})
    }
}

fn pool(count: usize) -> ServerPool {
    let servers = (0..count).map(|i| ServerSpec::new(format!("db{i}")));
    ServerPool::new("bench", servers, Params::new(), Policy::default())
}

fn blocking_provider(count: usize) -> BlockingProvider<TestConnection> {
    pool(count).into_blocking(Arc::new(TestConnector {}))
}

fn suspendable_provider(count: usize) -> SuspendableProvider<TestConnection> {
    pool(count).into_suspendable(Arc::new(TestConnector {}))
}

async fn concurrent_connects(provider: Arc<SuspendableProvider<TestConnection>>, count: usize) {
    let futs: Vec<_> = (0..count)
        .map(|_| {
            tokio::task::spawn({
                let provider = provider.clone();
                async move {
                    let handle = provider.connect().await.expect("Failed to connect");
                    tokio::time::sleep(tokio::time::Duration::from_micros(50)).await;
                    drop(handle);
                }
            })
        })
        .collect();
    futures::future::try_join_all(futs)
        .await
        .expect("Failed to connect");
}
