//! Concurrency and throughput checks against a live server

use client::Connection;
use server::config::ServerConfig;
use server::network::Server;
use shared::Priority;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

async fn start_server() -> Arc<Server> {
    let config = ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        max_clients: 256,
        ..ServerConfig::default()
    };
    let server = Arc::new(Server::bind(config).await.unwrap());
    let running = Arc::clone(&server);
    tokio::spawn(async move { running.run().await });
    server
}

async fn logged_in(addr: SocketAddr, username: &str) -> (Connection, String) {
    let mut conn = Connection::connect(addr).await.unwrap();
    assert!(conn.create_account(username, "Secret1").await.unwrap().success);
    let token = conn.login(username, "Secret1").await.unwrap().unwrap();
    (conn, token)
}

/// Many connections race to register the same username
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_single_winner() {
    let server = start_server().await;
    let addr = server.local_addr();

    let handles: Vec<_> = (0..50)
        .map(|_| {
            tokio::spawn(async move {
                let mut conn = Connection::connect(addr).await.unwrap();
                conn.create_account("contested", "Secret1")
                    .await
                    .unwrap()
                    .success
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(server.dispatcher().store().len().await, 1);
    server.shutdown().await;
}

/// Each account gets dense ids and sees only its own items
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accounts_stay_isolated() {
    let server = start_server().await;
    let addr = server.local_addr();
    let per_account = 20;

    let handles: Vec<_> = (0..16)
        .map(|n| {
            tokio::spawn(async move {
                let username = format!("user{}", n);
                let (mut conn, token) = logged_in(addr, &username).await;

                let mut ids = Vec::new();
                for i in 0..per_account {
                    let title = format!("{} item {}", n, i);
                    let id = conn
                        .create_todo(&token, &title, Priority::Low, &username, None)
                        .await
                        .unwrap()
                        .unwrap();
                    ids.push(id);
                }

                let listing = conn.list_todos(&token).await.unwrap().data.unwrap();
                (username, ids, listing)
            })
        })
        .collect();

    for handle in handles {
        let (username, ids, listing) = handle.await.unwrap();
        assert_eq!(ids, (1..=per_account as u32).collect::<Vec<_>>());
        assert_eq!(listing.matches("[id=").count(), per_account);
        assert_eq!(
            listing.matches(&format!("description={},", username)).count(),
            per_account,
            "{} saw foreign items",
            username
        );
    }

    server.shutdown().await;
}

/// Listings taken while another session deletes are always whole snapshots
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn delete_racing_list_is_consistent() {
    let server = start_server().await;
    let addr = server.local_addr();
    let items = 40u32;

    let (mut writer, writer_token) = logged_in(addr, "racer").await;
    for i in 0..items {
        writer
            .create_todo(&writer_token, &format!("Item {}", i), Priority::Medium, "", None)
            .await
            .unwrap()
            .unwrap();
    }

    let mut reader = Connection::connect(addr).await.unwrap();
    let reader_token = reader.login("racer", "Secret1").await.unwrap().unwrap();

    let deleter = tokio::spawn(async move {
        for id in 1..=items {
            assert!(writer.delete_todo(&writer_token, id).await.unwrap().success);
        }
    });

    let mut previous: Option<HashSet<u32>> = None;
    loop {
        let listing = reader.list_todos(&reader_token).await.unwrap().data.unwrap();
        let ids: HashSet<u32> = listing
            .split("[id=")
            .skip(1)
            .map(|record| {
                assert!(record.ends_with(']'), "partial record: {}", record);
                record.split(',').next().unwrap().parse().unwrap()
            })
            .collect();

        // Deletes run in id order, so every snapshot is a suffix of the ids
        if let Some(&lowest) = ids.iter().min() {
            assert_eq!(ids.len() as u32, items - lowest + 1);
        }
        if let Some(previous) = &previous {
            assert!(ids.is_subset(previous));
        }

        let done = ids.is_empty();
        previous = Some(ids);
        if done {
            break;
        }
    }

    deleter.await.unwrap();
    server.shutdown().await;
}

/// Sequential request throughput on one connection
#[tokio::test]
async fn benchmark_ping_round_trips() {
    let server = start_server().await;
    let mut conn = Connection::connect(server.local_addr()).await.unwrap();

    let iterations = 2_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert!(conn.ping(None).await.unwrap().success);
    }

    let duration = start.elapsed();
    println!(
        "Ping round trips: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Loopback round trips should stay well under 10 seconds total
    assert!(duration.as_secs() < 10);
    server.shutdown().await;
}
