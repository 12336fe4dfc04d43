use arena_sim::adapters::outbound::{init_buffered_logger, init_noop_logger, InMemoryRecorder, MultiLogger};
use arena_sim::application::PipelineService;
use arena_sim::config::{AgentGroupConfig, ArenaConfig, Config};
use arena_sim::domains::logger::DomainLogger;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct BridgeCapture {
    messages: Arc<Mutex<Vec<String>>>,
    flushes: AtomicUsize,
}

impl BridgeCapture {
    fn new() -> Self {
        Self { messages: Arc::new(Mutex::new(Vec::new())), flushes: AtomicUsize::new(0) }
    }

    fn lines(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl DomainLogger for BridgeCapture {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.messages.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.messages.lock().unwrap().push(format!("ERR:{}", msg)); }
    fn flush(&self) { self.flushes.fetch_add(1, Ordering::SeqCst); }
}

#[tokio::test]
async fn test_buffered_and_noop_logger() {
    let capture = Arc::new(BridgeCapture::new());
    let bridge = capture.clone() as Arc<dyn DomainLogger>;

    let buffered = init_buffered_logger(bridge, 8);
    buffered.info("one");
    buffered.warn("two");
    buffered.error("three");

    buffered.drain().await;

    let msgs = capture.lines();
    assert!(msgs.iter().any(|m| m.contains("INFO:one")));
    assert!(msgs.iter().any(|m| m.contains("WARN:two")));
    assert!(msgs.iter().any(|m| m.contains("ERR:three")));

    let noop = init_noop_logger();
    noop.info("ignored");
    noop.error("ignored-err");
}

#[test]
fn test_multi_logger_forwards_to_every_sink() {
    let first = Arc::new(BridgeCapture::new());
    let second = Arc::new(BridgeCapture::new());
    let multi = MultiLogger::new(vec![first.clone() as Arc<dyn DomainLogger>, second.clone()]);
    multi.warn("careful");
    assert_eq!(first.lines(), vec!["WARN:careful".to_string()]);
    assert_eq!(second.lines(), vec!["WARN:careful".to_string()]);
}

#[tokio::test]
async fn test_pipeline_reports_through_injected_logger() {
    let capture = Arc::new(BridgeCapture::new());
    let mut config = Config::default();
    config.simulation.time_limit = 1;
    config.simulation.random_seed = 1;
    config.agents.insert("a".to_string(), AgentGroupConfig { number: 2, ..AgentGroupConfig::default() });

    let service = PipelineService::new(config.clone(), Arc::new(InMemoryRecorder::new()), capture.clone());
    service.run().await.unwrap();
    assert!(capture.lines().iter().any(|m| m.starts_with("INFO:experiment finished")));

    config.arena = ArenaConfig { kind: "circle".into(), radius: 0.1, ..ArenaConfig::default() };
    config.agents.get_mut("a").unwrap().number = 40;
    let capture = Arc::new(BridgeCapture::new());
    let service = PipelineService::new(config, Arc::new(InMemoryRecorder::new()), capture.clone());
    assert!(service.run().await.is_err());
    let lines = capture.lines();
    assert!(lines.iter().any(|m| m.starts_with("ERR:[agents]") && m.contains("Impossible to place")));
    assert!(lines.iter().any(|m| m.starts_with("ERR:experiment aborted")));
}

#[tokio::test]
async fn test_drain_delivers_final_error_before_returning() {
    let capture = Arc::new(BridgeCapture::new());
    let buffered = init_buffered_logger(capture.clone(), 64);

    for i in 0..20 {
        buffered.info(&format!("tick {}", i));
    }
    buffered.error("experiment aborted: stage agents failed");
    buffered.drain().await;

    let lines = capture.lines();
    assert_eq!(lines.len(), 21);
    assert_eq!(lines.last().map(String::as_str), Some("ERR:experiment aborted: stage agents failed"));
    assert_eq!(capture.flushes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_multi_logger_flushes_every_sink() {
    let first = Arc::new(BridgeCapture::new());
    let second = Arc::new(BridgeCapture::new());
    let multi = MultiLogger::new(vec![first.clone() as Arc<dyn DomainLogger>, second.clone()]);
    multi.flush();
    assert_eq!(first.flushes.load(Ordering::SeqCst), 1);
    assert_eq!(second.flushes.load(Ordering::SeqCst), 1);
}
