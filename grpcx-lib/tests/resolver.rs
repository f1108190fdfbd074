use grpcx::load_balancing::{
    multi_addr_balancer, FixedAddressResolver, Op, Resolver, RoundRobinBalancer, Update, Watcher,
};
use grpcx::config::parse_config;
use grpcx::GrpcxError;
use std::sync::Arc;
use std::time::Duration;

type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::test]
async fn test_watcher_lifecycle() -> TestResult {
    let resolver = FixedAddressResolver::new(["10.0.0.1", "10.0.0.2"]);
    let watcher = resolver.resolve("backend")?;

    let first = watcher.next().await?;
    assert_eq!(first, vec![Update::add("10.0.0.1"), Update::add("10.0.0.2")]);

    resolver.add("10.0.0.3").await?;
    assert_eq!(watcher.next().await?, vec![Update::add("10.0.0.3")]);

    let dup = resolver.add("10.0.0.1").await;
    assert!(matches!(dup, Err(GrpcxError::DuplicateAddress(ref a)) if a == "10.0.0.1"));
    assert_eq!(resolver.addresses(), vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

    watcher.close();
    assert!(watcher.is_closed());
    assert!(matches!(watcher.next().await, Err(GrpcxError::WatcherClosed)));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_add_sends_nothing() -> TestResult {
    let resolver = FixedAddressResolver::new(["10.0.0.1"]);
    let watcher = resolver.resolve("backend")?;
    watcher.next().await?;

    assert!(resolver.add("10.0.0.1").await.is_err());
    let pending = tokio::time::timeout(Duration::from_millis(50), watcher.next()).await;
    assert!(pending.is_err(), "no batch expected after a rejected add");
    Ok(())
}

#[tokio::test]
async fn test_close_discards_buffered_batch() -> TestResult {
    let resolver = FixedAddressResolver::new(["10.0.0.1"]);
    let watcher = resolver.resolve("backend")?;

    watcher.close();
    assert!(matches!(watcher.next().await, Err(GrpcxError::WatcherClosed)));
    assert!(matches!(watcher.next().await, Err(GrpcxError::WatcherClosed)));
    Ok(())
}

#[tokio::test]
async fn test_close_wakes_pending_next() -> TestResult {
    let resolver = FixedAddressResolver::new(Vec::<String>::new());
    let watcher = Arc::new(resolver.resolve("backend")?);
    assert!(watcher.next().await?.is_empty());

    let pending = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.next().await })
    };
    tokio::task::yield_now().await;
    watcher.close();

    let result = tokio::time::timeout(Duration::from_secs(1), pending).await??;
    assert!(matches!(result, Err(GrpcxError::WatcherClosed)));
    Ok(())
}

#[tokio::test]
async fn test_remove() -> TestResult {
    let resolver = FixedAddressResolver::new(["10.0.0.1", "10.0.0.2"]);
    let watcher = resolver.resolve("backend")?;
    watcher.next().await?;

    resolver.remove("10.0.0.1").await?;
    let batch = watcher.next().await?;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].op, Op::Delete);
    assert_eq!(batch[0].addr, "10.0.0.1");

    let unknown = resolver.remove("10.0.0.9").await;
    assert!(matches!(unknown, Err(GrpcxError::UnknownAddress(_))));
    assert_eq!(resolver.addresses(), vec!["10.0.0.2"]);
    Ok(())
}

#[tokio::test]
async fn test_every_open_watcher_receives_updates() -> TestResult {
    let resolver = FixedAddressResolver::new(["a"]);
    let first = resolver.resolve("backend")?;
    let second = resolver.resolve("backend")?;
    first.next().await?;
    second.next().await?;
    assert_eq!(resolver.watcher_count(), 2);

    resolver.add("b").await?;
    assert_eq!(first.next().await?, vec![Update::add("b")]);
    assert_eq!(second.next().await?, vec![Update::add("b")]);

    second.close();
    resolver.add("c").await?;
    assert_eq!(resolver.watcher_count(), 1);
    assert_eq!(first.next().await?, vec![Update::add("c")]);

    // a late watcher starts from the current set
    let late = resolver.resolve("backend")?;
    assert_eq!(late.next().await?, vec![Update::add("a"), Update::add("b"), Update::add("c")]);
    Ok(())
}

#[tokio::test]
async fn test_add_waits_for_buffer_slot() -> TestResult {
    let resolver = Arc::new(FixedAddressResolver::new(["a"]));
    let watcher = resolver.resolve("backend")?;

    // initial batch still buffered, so this add has to wait
    let adding = {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move { resolver.add("b").await })
    };
    tokio::task::yield_now().await;
    assert!(!adding.is_finished());
    assert_eq!(resolver.addresses(), vec!["a", "b"]);

    assert_eq!(watcher.next().await?, vec![Update::add("a")]);
    tokio::time::timeout(Duration::from_secs(1), adding).await???;
    assert_eq!(watcher.next().await?, vec![Update::add("b")]);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_changes_arrive_in_order() -> TestResult {
    let resolver = Arc::new(FixedAddressResolver::new(["a"]));
    let watcher = resolver.resolve("backend")?;

    // initial batch still buffered: the add blocks delivering, the remove queues behind it
    let adding = {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move { resolver.add("b").await })
    };
    tokio::task::yield_now().await;
    let removing = {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move { resolver.remove("b").await })
    };
    tokio::task::yield_now().await;
    assert!(!adding.is_finished());
    assert!(!removing.is_finished());

    assert_eq!(watcher.next().await?, vec![Update::add("a")]);
    assert_eq!(watcher.next().await?, vec![Update::add("b")]);
    assert_eq!(watcher.next().await?, vec![Update::delete("b")]);

    tokio::time::timeout(Duration::from_secs(1), adding).await???;
    tokio::time::timeout(Duration::from_secs(1), removing).await???;
    assert_eq!(resolver.addresses(), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn test_balancer_follows_watcher() -> TestResult {
    let resolver = Arc::new(FixedAddressResolver::new(["a", "b"]));
    let watcher = Arc::new(resolver.resolve("backend")?);
    let balancer = Arc::new(RoundRobinBalancer::new());

    let task = {
        let balancer = Arc::clone(&balancer);
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { balancer.run(watcher.as_ref()).await })
    };

    resolver.add("c").await?;
    resolver.remove("a").await?;
    watcher.close();
    tokio::time::timeout(Duration::from_secs(1), task).await???;

    // "c" was taken off the queue before remove() could send, so it is applied;
    // the delete may still have been buffered when the watcher closed
    let members = balancer.members();
    assert!(members.contains(&"b".to_string()));
    assert!(members.contains(&"c".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_multi_addr_balancer() -> TestResult {
    let lb = multi_addr_balancer(["10.0.0.1:9000", "10.0.0.2:9000"]).await?;

    let picks: Vec<String> = (0..4).filter_map(|_| lb.pick()).collect();
    assert_eq!(picks, vec!["10.0.0.1:9000", "10.0.0.2:9000", "10.0.0.1:9000", "10.0.0.2:9000"]);

    lb.resolver().add("10.0.0.3:9000").await?;
    let mut seen = false;
    for _ in 0..100 {
        if lb.balancer().members().len() == 3 {
            seen = true;
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(seen, "balancer should pick up the added address");

    lb.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_resolver_from_discovery_config() -> TestResult {
    let config = parse_config(
        r#"
[discovery]
addresses = ["10.0.0.1:9000", "10.0.0.2:9000"]
"#,
    )?;
    let resolver = FixedAddressResolver::from_config(&config.discovery);
    let watcher = resolver.resolve("backend")?;
    assert_eq!(
        watcher.next().await?,
        vec![Update::add("10.0.0.1:9000"), Update::add("10.0.0.2:9000")]
    );
    Ok(())
}

#[tokio::test]
async fn test_dropped_balancer_closes_watcher() -> TestResult {
    let lb = multi_addr_balancer(["10.0.0.1:9000"]).await?;
    let resolver = Arc::clone(lb.resolver());
    assert_eq!(resolver.watcher_count(), 1);

    drop(lb);
    assert_eq!(resolver.watcher_count(), 0);

    // nothing left to deliver to, so these complete without a reader
    for addr in ["10.0.0.2:9000", "10.0.0.3:9000"] {
        tokio::time::timeout(Duration::from_secs(1), resolver.add(addr)).await??;
    }
    assert_eq!(resolver.addresses().len(), 3);
    Ok(())
}
