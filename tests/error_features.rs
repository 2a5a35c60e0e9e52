//! Tests for error propagation and fault scheduling

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use sugars_push_stream::{
    Fault, FaultKind, FaultPolicy, Handlers, Stream, StreamConfig, StreamError,
};
use tokio::sync::mpsc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fault_channel() -> (StreamConfig, mpsc::UnboundedReceiver<Fault>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let config = StreamConfig::builder()
        .label("under-test")
        .on_fault(move |fault| {
            let _ = tx.send(fault.clone());
        })
        .build();
    (config, rx)
}

fn error_log() -> (Arc<Mutex<Vec<String>>>, impl Fn(&StreamError) + Send + Sync + 'static) {
    let errs = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errs);
    (errs, move |err: &StreamError| sink.lock().push(err.to_string()))
}

mod error_channel_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_calls_error_handler() {
        init_logging();
        let stream = Stream::<i32>::new();
        let (errs, push) = error_log();
        stream
            .subscribe(Handlers::new().on_next(|_: &i32| {}).on_error(push))
            .unwrap();

        stream.error(StreamError::msg("Oops"));
        assert_eq!(*errs.lock(), vec!["Oops".to_string()]);
    }

    #[test]
    fn test_every_listener_gets_the_same_error() {
        let stream = Stream::<i32>::new();
        let seen: Arc<Mutex<Vec<StreamError>>> = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let seen = Arc::clone(&seen);
            stream
                .subscribe(Handlers::<i32>::new().on_error(move |err| seen.lock().push(err.clone())))
                .unwrap();
        }

        let err = StreamError::msg("shared");
        stream.error(err.clone());
        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|e| e.ptr_eq(&err)));
    }

    #[test]
    fn test_foreign_errors_convert() {
        let stream = Stream::<i32>::new();
        let (errs, push) = error_log();
        stream.subscribe(Handlers::<i32>::new().on_error(push)).unwrap();

        stream.error(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert_eq!(*errs.lock(), vec!["missing".to_string()]);
    }

    #[test]
    fn test_errors_bubble_through_filter() {
        let stream = Stream::<i32>::new();
        let (errs, push) = error_log();
        stream
            .filter(|_| false)
            .subscribe(Handlers::<i32>::new().on_error(push))
            .unwrap();

        stream.error(StreamError::msg("Oops"));
        assert_eq!(*errs.lock(), vec!["Oops".to_string()]);
    }

    #[test]
    fn test_errors_bubble_through_map_chain() {
        let stream = Stream::<i32>::new();
        let (errs, push) = error_log();
        stream
            .map(|v| v + 1)
            .map(|v| v.to_string())
            .subscribe(Handlers::<String>::new().on_error(push))
            .unwrap();

        stream.error(StreamError::msg("deep"));
        assert_eq!(*errs.lock(), vec!["deep".to_string()]);
    }

    #[test]
    fn test_emits_error_if_filter_fails() {
        let stream = Stream::<&str>::new();
        let (errs, push) = error_log();
        stream
            .try_filter(|_| Err(StreamError::msg("Oops")))
            .subscribe(Handlers::<&str>::new().on_error(push))
            .unwrap();

        stream.next("test");
        assert_eq!(*errs.lock(), vec!["Oops".to_string()]);
    }

    #[test]
    fn test_failing_predicate_does_not_stop_sibling_delivery() {
        let stream = Stream::<i32>::new();
        let (errs, push) = error_log();
        stream
            .try_filter(|_| Err(StreamError::msg("Oops")))
            .subscribe(Handlers::<i32>::new().on_error(push))
            .unwrap();
        let vals = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&vals);
        stream
            .subscribe(Handlers::new().on_next(move |v: &i32| sink.lock().push(*v)))
            .unwrap();

        stream.next(1);
        stream.next(2);
        assert_eq!(*vals.lock(), vec![1, 2]);
        assert_eq!(errs.lock().len(), 2);
    }

    #[test]
    fn test_next_handler_failure_routes_to_error_channel() {
        let stream = Stream::<i32>::new();
        let (first_errs, push_first) = error_log();
        stream
            .subscribe(
                Handlers::new()
                    .try_on_next(|v: &i32| Err(StreamError::msg(format!("rejected {v}"))))
                    .on_error(push_first),
            )
            .unwrap();
        let vals = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&vals);
        let (second_errs, push_second) = error_log();
        stream
            .subscribe(
                Handlers::new()
                    .on_next(move |v: &i32| sink.lock().push(*v))
                    .on_error(push_second),
            )
            .unwrap();

        stream.next(1);
        assert_eq!(*first_errs.lock(), vec!["rejected 1".to_string()]);
        assert_eq!(*second_errs.lock(), vec!["rejected 1".to_string()]);
        assert_eq!(*vals.lock(), vec![1]);
    }
}

mod fault_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_error_without_listeners_is_scheduled_not_dropped() {
        init_logging();
        let (config, mut faults) = fault_channel();
        let stream = Stream::<i32>::with_config(config);
        let err = StreamError::msg("nobody home");

        stream.error(err.clone());
        assert!(faults.try_recv().is_err(), "fault must not be raised inline");

        let fault = faults.recv().await.expect("fault scheduled");
        assert_eq!(fault.kind(), FaultKind::Unhandled);
        assert_eq!(fault.stream_id(), stream.id());
        assert!(fault.error().ptr_eq(&err));
        assert!(fault.to_string().contains("(under-test)"));
    }

    #[tokio::test]
    async fn test_missing_error_handler_reraises() {
        let (config, mut faults) = fault_channel();
        let stream = Stream::<i32>::with_config(config);
        stream.subscribe(Handlers::new().on_next(|_: &i32| {})).unwrap();

        let err = StreamError::msg("Oops");
        stream.error(err.clone());

        let fault = faults.recv().await.expect("fault scheduled");
        assert_eq!(fault.kind(), FaultKind::Unhandled);
        assert!(fault.error().ptr_eq(&err));
    }

    #[tokio::test]
    async fn test_failing_error_handler_is_a_fault_and_not_rerouted() {
        let (config, mut faults) = fault_channel();
        let stream = Stream::<i32>::with_config(config);
        stream
            .subscribe(Handlers::<i32>::new().try_on_error(|_| Err(StreamError::msg("handler broke"))))
            .unwrap();
        let (errs, push) = error_log();
        stream.subscribe(Handlers::<i32>::new().on_error(push)).unwrap();

        stream.error(StreamError::msg("original"));

        let fault = faults.recv().await.expect("fault scheduled");
        assert_eq!(fault.kind(), FaultKind::HandlerFailed);
        assert_eq!(fault.error().to_string(), "handler broke");
        assert_eq!(*errs.lock(), vec!["original".to_string()]);
        assert!(faults.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_derived_stream_faults_use_source_config() {
        let (config, mut faults) = fault_channel();
        let stream = Stream::<i32>::with_config(config);
        let mapped = stream.map(|v| v * 2);

        stream.error(StreamError::msg("lost downstream"));

        let fault = faults.recv().await.expect("fault scheduled");
        assert_eq!(fault.kind(), FaultKind::Unhandled);
        assert_eq!(fault.stream_id(), mapped.id());
    }

    #[tokio::test]
    async fn test_log_policy_keeps_running() {
        init_logging();
        let config = StreamConfig::builder()
            .unhandled_error(FaultPolicy::Log)
            .build();
        let stream = Stream::<i32>::with_config(config);
        stream.error(StreamError::msg("logged only"));
        tokio::task::yield_now().await;

        let vals = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&vals);
        stream
            .subscribe(Handlers::new().on_next(move |v: &i32| sink.lock().push(*v)))
            .unwrap();
        stream.next(1);
        assert_eq!(*vals.lock(), vec![1]);
    }

    #[test]
    fn test_fault_survives_runtime_shutdown() {
        let (tx, rx) = std::sync::mpsc::channel();
        let config = StreamConfig::builder()
            .on_fault(move |fault| {
                let _ = tx.send(fault.error().to_string());
            })
            .build();
        let stream = Stream::<i32>::with_config(config);

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        rt.block_on(async { stream.error(StreamError::msg("nobody home")) });
        drop(rt);

        let seen = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("fault resolved after shutdown");
        assert_eq!(seen, "nobody home");
        assert!(rx.recv_timeout(std::time::Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_default_policy_exits_the_process() {
        const CHILD: &str = "SUGARS_PUSH_STREAM_EXIT_CHILD";
        if std::env::var_os(CHILD).is_some() {
            Stream::<i32>::new().error(StreamError::msg("default policy"));
            std::thread::sleep(std::time::Duration::from_secs(10));
            return;
        }

        let output = std::process::Command::new(std::env::current_exe().expect("test binary"))
            .args([
                "--exact",
                "fault_tests::test_default_policy_exits_the_process",
                "--nocapture",
                "--test-threads=1",
            ])
            .env(CHILD, "1")
            .output()
            .expect("spawn child");
        assert_eq!(output.status.code(), Some(101));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(stderr.matches("default policy; exiting").count(), 1, "{stderr}");
    }

    #[test]
    fn test_faults_without_runtime_run_on_another_thread() {
        let (tx, rx) = std::sync::mpsc::channel();
        let config = StreamConfig::builder()
            .on_fault(move |fault| {
                let _ = tx.send((std::thread::current().id(), fault.kind()));
            })
            .build();
        let stream = Stream::<i32>::with_config(config);

        stream.error(StreamError::msg("off-thread"));

        let (thread, kind) = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("fault scheduled");
        assert_ne!(thread, std::thread::current().id());
        assert_eq!(kind, FaultKind::Unhandled);
    }
}
