//! # Integration Tests
//!
//! 跨 crate 的端到端测试。
//!
//! 覆盖：
//! - HTTP 入口 -> 同步分发器 -> 处理器
//! - HTTP 入口 -> 队列分发器 -> 节流 worker -> 处理器
//! - 请求处理中的关闭行为

#[cfg(test)]
mod blocking_e2e {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use contracts::{CancellationToken, Item, Limits, ProcessError, Processor};
    use dispatcher::{BlockingDispatcher, ManualClock};
    use gateway::{router, AppState, BodyFormat};
    use tower::ServiceExt;

    /// Processor recording every batch it receives, advancing a manual clock per call
    struct RecordingProcessor {
        limits: Limits,
        clock: ManualClock,
        latency: Duration,
        batches: Arc<Mutex<Vec<Vec<Item>>>>,
    }

    impl Processor for RecordingProcessor {
        fn name(&self) -> &str {
            "recording"
        }

        fn limits(&self) -> Limits {
            self.limits
        }

        async fn process(
            &self,
            batch: &[Item],
            _cancel: &CancellationToken,
        ) -> Result<(), ProcessError> {
            self.batches.lock().unwrap().push(batch.to_vec());
            self.clock.advance(self.latency);
            Ok(())
        }
    }

    fn app(
        capacity: u64,
        period: Duration,
        latency: Duration,
    ) -> (axum::Router, Arc<Mutex<Vec<Vec<Item>>>>) {
        let clock = ManualClock::new();
        let batches = Arc::new(Mutex::new(Vec::new()));
        let processor = RecordingProcessor {
            limits: Limits::new(capacity, period),
            clock: clock.clone(),
            latency,
            batches: Arc::clone(&batches),
        };
        let dispatcher = BlockingDispatcher::with_clock(processor, clock);
        (router(AppState::new(dispatcher, BodyFormat::Items)), batches)
    }

    fn post(body: &'static str) -> Request<Body> {
        Request::post("/process")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    /// capacity=2, period=1s, 4 items, instant processor
    #[tokio::test]
    async fn test_two_full_batches_in_order() {
        let (app, batches) = app(2, Duration::from_secs(1), Duration::ZERO);

        let response = app.oneshot(post(r#"[{"n":1},{"n":2},{"n":3},{"n":4}]"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let batches = batches.lock().unwrap();
        let order: Vec<Vec<i64>> = batches
            .iter()
            .map(|b| b.iter().map(|i| i.payload()["n"].as_i64().unwrap()).collect())
            .collect();
        assert_eq!(order, vec![vec![1, 2], vec![3, 4]]);
    }

    /// capacity=2, period=1ms, 4 items, 1ms per call
    #[tokio::test]
    async fn test_slow_processor_returns_429_after_one_batch() {
        let (app, batches) = app(2, Duration::from_millis(1), Duration::from_millis(1));

        let response = app.oneshot(post("[1, 2, 3, 4]")).await.unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"blocked");
        assert!(batches.lock().unwrap().len() <= 1);
    }

    /// Malformed body never reaches the dispatcher
    #[tokio::test]
    async fn test_malformed_body_returns_400() {
        let (app, batches) = app(2, Duration::from_secs(1), Duration::ZERO);

        let response = app.oneshot(post(r#""invalid""#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!body.is_empty());
        assert!(batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_array_is_ok_without_processing() {
        let (app, batches) = app(0, Duration::from_secs(1), Duration::ZERO);

        let response = app.oneshot(post("[]")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(batches.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod queued_e2e {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use contracts::{CancellationToken, Item, Limits, ProcessError, Processor};
    use dispatcher::{DemoProcessor, QueueConfig, QueuedDispatcher, ShutdownPolicy};
    use gateway::{router, AppState, BodyFormat};
    use tokio::time::{sleep, Instant};
    use tower::ServiceExt;

    /// Processor recording (time, size) and failing chosen calls
    struct PacedRecorder {
        limits: Limits,
        fail_calls: Vec<usize>,
        sends: Mutex<Vec<(Instant, usize)>>,
    }

    impl PacedRecorder {
        fn new(capacity: u64, period: Duration, fail_calls: Vec<usize>) -> Arc<Self> {
            Arc::new(Self {
                limits: Limits::new(capacity, period),
                fail_calls,
                sends: Mutex::new(Vec::new()),
            })
        }

        fn sends(&self) -> Vec<(Instant, usize)> {
            self.sends.lock().unwrap().clone()
        }
    }

    impl Processor for PacedRecorder {
        fn name(&self) -> &str {
            "paced"
        }

        fn limits(&self) -> Limits {
            self.limits
        }

        async fn process(
            &self,
            batch: &[Item],
            _cancel: &CancellationToken,
        ) -> Result<(), ProcessError> {
            let call = {
                let mut sends = self.sends.lock().unwrap();
                sends.push((Instant::now(), batch.len()));
                sends.len()
            };
            if self.fail_calls.contains(&call) {
                return Err(ProcessError::rejected("paced", "mock failure"));
            }
            Ok(())
        }
    }

    fn post(body: &'static str) -> Request<Body> {
        Request::post("/process")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    /// capacity=2, period=50ms, one batch of 5, second sub-batch fails
    #[tokio::test(start_paused = true)]
    async fn test_batch_of_five_paced_as_2_2_1() {
        let period = Duration::from_millis(50);
        let processor = PacedRecorder::new(2, period, vec![2]);
        let (dispatcher, submitter) =
            QueuedDispatcher::new(Arc::clone(&processor), QueueConfig::default());
        let shutdown = CancellationToken::new();
        let handle = dispatcher.spawn(shutdown.clone());
        let app = router(AppState::new(submitter, BodyFormat::Counts));

        let response = app.oneshot(post("[1, 2, 3, 4, 5]")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        sleep(Duration::from_millis(500)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let sends = processor.sends();
        let sizes: Vec<usize> = sends.iter().map(|(_, size)| *size).collect();
        assert_eq!(sizes, vec![2, 2, 1], "failed sub-batch is not retried");
        for pair in sends.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= period);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submissions_all_delivered() {
        let processor = PacedRecorder::new(3, Duration::from_millis(20), Vec::new());
        let (dispatcher, submitter) =
            QueuedDispatcher::new(Arc::clone(&processor), QueueConfig::default());
        let shutdown = CancellationToken::new();
        let handle = dispatcher.spawn(shutdown.clone());
        let app = router(AppState::new(submitter, BodyFormat::Counts));

        let mut requests = Vec::new();
        for _ in 0..4 {
            let app = app.clone();
            requests.push(tokio::spawn(async move {
                app.oneshot(post("[1, 2, 3, 4, 5, 6, 7]")).await.unwrap().status()
            }));
        }
        for request in requests {
            assert_eq!(request.await.unwrap(), StatusCode::OK);
        }

        shutdown.cancel();
        let report = handle.await.unwrap();

        assert_eq!(report.batches_accepted, 4);
        let items: usize = processor.sends().iter().map(|(_, size)| size).sum();
        assert_eq!(items, 28);
        assert_eq!(processor.sends().len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_after_shutdown_is_500() {
        let processor = Arc::new(DemoProcessor::new("demo", 2, Duration::from_millis(10)));
        let config = QueueConfig {
            capacity: 0,
            shutdown: ShutdownPolicy::Abort,
        };
        let (dispatcher, submitter) = QueuedDispatcher::new(Arc::clone(&processor), config);
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        dispatcher.run(shutdown).await;

        let app = router(AppState::new(submitter, BodyFormat::Counts));
        let response = app.oneshot(post("[1, 2]")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(processor.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_route_reports_queue_activity() {
        let processor = Arc::new(DemoProcessor::new("demo", 2, Duration::from_millis(10)));
        let (dispatcher, submitter) =
            QueuedDispatcher::new(Arc::clone(&processor), QueueConfig::default());
        let shutdown = CancellationToken::new();
        let handle = dispatcher.spawn(shutdown.clone());
        let app = router(AppState::new(submitter, BodyFormat::Counts));

        let response = app.clone().oneshot(post("[1, 2, 3]")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        sleep(Duration::from_millis(100)).await;

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let metrics: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(metrics["mode"], "queued");
        assert_eq!(metrics["batches_accepted"], 1);
        assert_eq!(metrics["batches_sent"], 2);
        assert_eq!(metrics["items_sent"], 3);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
