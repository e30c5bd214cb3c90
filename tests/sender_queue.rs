//! Sender queue behavior across threads
//!
//! The queue's two mutation sources in production are the engine-callback
//! thread and the network sender task; these tests drive it from real
//! threads and tasks.

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use coedit::backend::session::SenderQueue;
use coedit::shared::{Command, OutboundMessage};

fn tile(x: i32, y: i32, body: &'static [u8]) -> OutboundMessage {
    OutboundMessage::tile(
        format!("part=0 zoom=1 x={} y={} width=256 height=256", x, y),
        Bytes::from_static(body),
    )
}

#[test]
fn concurrent_producers_never_duplicate_a_tile() {
    let queue = Arc::new(SenderQueue::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || {
                // All threads hammer the same two tiles.
                for _ in 0..100 {
                    queue.enqueue(tile(0, 0, b"a"));
                    queue.enqueue(tile(0, 1, b"b"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Whatever interleaving happened, at most one message per tile key
    // survives.
    assert!(queue.size() <= 2);
}

#[test]
fn producer_and_consumer_hand_off_every_surviving_message() {
    let queue = Arc::new(SenderQueue::new());

    let producer = {
        let queue = queue.clone();
        thread::spawn(move || {
            for i in 0..500 {
                queue.enqueue(OutboundMessage::text(
                    Command::Comment,
                    format!("{{\"n\":{}}}", i),
                ));
            }
        })
    };

    let consumer = {
        let queue = queue.clone();
        thread::spawn(move || {
            let mut received = 0usize;
            while received < 500 {
                if queue.dequeue().is_some() {
                    received += 1;
                } else {
                    thread::yield_now();
                }
            }
            received
        })
    };

    producer.join().unwrap();
    assert_eq!(consumer.join().unwrap(), 500);
    assert_eq!(queue.size(), 0);
}

#[test]
fn stop_wins_over_concurrent_producers() {
    let queue = Arc::new(SenderQueue::new());
    queue.enqueue(OutboundMessage::text(Command::Comment, "{\"n\":0}"));
    queue.stop();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let queue = queue.clone();
            thread::spawn(move || {
                queue.enqueue(OutboundMessage::text(
                    Command::Comment,
                    format!("{{\"n\":{}}}", i),
                ))
            })
        })
        .collect();
    for handle in handles {
        // Every enqueue reports the retained length, not growth.
        assert_eq!(handle.join().unwrap(), 1);
    }

    assert_eq!(queue.size(), 1);
    assert!(queue.dequeue().is_none());
}

#[tokio::test]
async fn sender_task_wakes_on_enqueue_and_exits_on_stop() {
    let queue = Arc::new(SenderQueue::new());

    let drainer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            let mut received = Vec::new();
            loop {
                while let Some(msg) = queue.dequeue() {
                    received.push(msg.first_line());
                }
                if queue.is_stopping() {
                    return received;
                }
                queue.wait().await;
            }
        })
    };

    queue.enqueue(OutboundMessage::text(Command::Comment, "{\"n\":1}"));
    tokio::task::yield_now().await;
    queue.enqueue(OutboundMessage::text(Command::Comment, "{\"n\":2}"));
    tokio::task::yield_now().await;
    queue.stop();

    let received = drainer.await.unwrap();
    // The drainer saw whatever was delivered before the stop and then
    // terminated; stop is not drain-then-stop, so anything still queued
    // at that instant stays undelivered.
    assert!(received.len() <= 2);
    for (i, line) in received.iter().enumerate() {
        assert_eq!(line, &format!("comment: {{\"n\":{}}}", i + 1));
    }
}
