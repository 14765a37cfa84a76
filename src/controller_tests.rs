// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `controller.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::annotations::{CONTROLLER_CLASS_ANNOTATION, MANAGED_ANNOTATION};
    use crate::errors::WriteError;
    use crate::reconcilers::writer::AnnotationWriter;
    use crate::test_support::{identity, service, FakeWriter, TEST_ARN, TEST_CLASS};
    use futures::stream;
    use std::time::Instant;

    type WatchItem = Result<watcher::Event<Service>, watcher::Error>;

    const LONG_RESYNC: Duration = Duration::from_secs(3600);

    fn context(writer: &Arc<FakeWriter>) -> Arc<Context> {
        let writer: Arc<dyn AnnotationWriter> = writer.clone();
        Arc::new(Context::new(identity(), writer))
    }

    fn claimed_service() -> Service {
        service("ns", "svc-a", &[(CONTROLLER_CLASS_ANNOTATION, TEST_CLASS)])
    }

    /// Events followed by a stream that never ends, like a live watch.
    fn live(events: Vec<WatchItem>) -> impl Stream<Item = WatchItem> {
        stream::iter(events).chain(stream::pending())
    }

    #[tokio::test]
    async fn test_initial_list_is_reconciled() {
        let writer = Arc::new(FakeWriter::new());
        let ready = Arc::new(AtomicBool::new(false));
        let events = live(vec![
            Ok(watcher::Event::Init),
            Ok(watcher::Event::InitApply(claimed_service())),
            Ok(watcher::Event::InitApply(service("ns", "svc-b", &[]))),
            Ok(watcher::Event::InitDone),
        ]);

        run_loop(
            context(&writer),
            events,
            LONG_RESYNC,
            ready.clone(),
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await;

        let calls = writer.calls();
        assert_eq!(calls.len(), 1, "only the claimed Service is written");
        assert_eq!(calls[0].annotation, MANAGED_ANNOTATION);
        assert_eq!(calls[0].value, TEST_ARN);
        assert!(!ready.load(Ordering::SeqCst), "not ready after shutdown");
    }

    #[tokio::test]
    async fn test_ready_after_initial_list() {
        let writer = Arc::new(FakeWriter::new());
        let ready = Arc::new(AtomicBool::new(false));
        let observed = ready.clone();
        let events = live(vec![Ok(watcher::Event::Init), Ok(watcher::Event::InitDone)]);

        let shutdown = async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(observed.load(Ordering::SeqCst), "ready once the list is synced");
        };

        run_loop(context(&writer), events, LONG_RESYNC, ready, shutdown).await;
    }

    #[tokio::test]
    async fn test_resync_repairs_failed_write() {
        let writer = Arc::new(FakeWriter::new());
        writer.push_result(Err(WriteError::Transient {
            resource: "ns/svc-a".to_string(),
            reason: "HTTP 503: unavailable".to_string(),
        }));
        let events = live(vec![Ok(watcher::Event::Apply(claimed_service()))]);

        run_loop(
            context(&writer),
            events,
            Duration::from_millis(30),
            Arc::new(AtomicBool::new(false)),
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await;

        let calls = writer.calls();
        assert!(calls.len() >= 2, "resync should retry the write, got {calls:?}");
        assert!(calls.iter().all(|call| call.value == TEST_ARN));
    }

    #[tokio::test]
    async fn test_resync_leaves_converged_services_alone() {
        let writer = Arc::new(FakeWriter::new());
        let converged = service(
            "ns",
            "svc-a",
            &[
                (CONTROLLER_CLASS_ANNOTATION, TEST_CLASS),
                (MANAGED_ANNOTATION, TEST_ARN),
            ],
        );
        let events = live(vec![Ok(watcher::Event::Apply(converged))]);

        run_loop(
            context(&writer),
            events,
            Duration::from_millis(20),
            Arc::new(AtomicBool::new(false)),
            tokio::time::sleep(Duration::from_millis(120)),
        )
        .await;

        assert!(writer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_watch_errors_do_not_stop_the_loop() {
        let writer = Arc::new(FakeWriter::new());
        let events = live(vec![
            Err(watcher::Error::NoResourceVersion),
            Ok(watcher::Event::Apply(claimed_service())),
        ]);

        run_loop(
            context(&writer),
            events,
            LONG_RESYNC,
            Arc::new(AtomicBool::new(false)),
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await;

        assert_eq!(writer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_writes() {
        let writer = Arc::new(FakeWriter::with_delay(Duration::from_millis(150)));
        let events = live(vec![Ok(watcher::Event::Apply(claimed_service()))]);
        let start = Instant::now();

        run_loop(
            context(&writer),
            events,
            LONG_RESYNC,
            Arc::new(AtomicBool::new(false)),
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;

        assert!(start.elapsed() >= Duration::from_millis(150));
        assert_eq!(writer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_end_stops_the_loop() {
        let writer = Arc::new(FakeWriter::new());
        let items: Vec<WatchItem> = vec![Ok(watcher::Event::Apply(claimed_service()))];
        let events = stream::iter(items);

        run_loop(
            context(&writer),
            events,
            LONG_RESYNC,
            Arc::new(AtomicBool::new(false)),
            std::future::pending::<()>(),
        )
        .await;

        assert_eq!(writer.calls().len(), 1);
    }
}
