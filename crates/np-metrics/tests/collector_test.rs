use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use np_checks::{CheckRegistry, Probe};
use np_core::types::CheckResult;
use np_metrics::accounting::DumpFile;
use np_metrics::cpu::CpuSampler;
use np_metrics::throughput::ByteCounter;
use np_metrics::{MetricSources, MetricsCollector, MetricsError, SamplingPlan};

struct ScriptedCpu(std::vec::IntoIter<f32>);

impl CpuSampler for ScriptedCpu {
    fn begin(&mut self) {}

    fn finish(&mut self) -> f32 {
        self.0.next().unwrap_or(0.0)
    }
}

/// Grows by a fixed step on every read, so every delta equals `step`.
struct SteadyCounter {
    next: Mutex<u64>,
    step: u64,
}

impl ByteCounter for SteadyCounter {
    fn read(&self) -> Result<u64, MetricsError> {
        let mut next = self.next.lock().unwrap();
        let value = *next;
        *next += self.step;
        Ok(value)
    }
}

struct Verdict(bool);

impl Probe for Verdict {
    fn name(&self) -> &str {
        "Verdict"
    }

    fn run(&self) -> CheckResult {
        if self.0 {
            CheckResult::pass("Verdict")
        } else {
            CheckResult::fail("Verdict", "forced failure")
        }
    }
}

fn status_log(dir: &Path, name: &str, users: usize) -> PathBuf {
    let mut text = String::from("OpenVPN CLIENT LIST\nUpdated,Thu Jun 18 08:12:15 2015\n");
    text.push_str("Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since\n");
    for i in 0..users {
        text.push_str(&format!("user{i},203.0.113.{i}:5000,1,1,Thu Jun 18 07:00:01 2015\n"));
    }
    text.push_str("ROUTING TABLE\nGLOBAL STATS\nEND\n");
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn collector(dir: &Path, selfcheck: bool, status_files: Vec<PathBuf>) -> MetricsCollector {
    let uptime = dir.join("uptime");
    std::fs::write(&uptime, "183600.20 100.00\n").unwrap();
    let dump = dir.join("vnstat.dump");
    std::fs::write(&dump, "m;0;1380578400;500;500;0;0;1\n").unwrap();

    let mut registry = CheckRegistry::new();
    registry.register(Verdict(selfcheck)).unwrap();

    let sources = MetricSources {
        cpu: Box::new(ScriptedCpu(vec![10.0, 55.0, 30.0].into_iter())),
        rx_counter: Box::new(SteadyCounter {
            next: Mutex::new(0),
            step: 125_000,
        }),
        accounting: Box::new(DumpFile(dump)),
        uptime_file: uptime,
        status_files,
    };
    MetricsCollector::new(registry, sources, SamplingPlan::default())
}

#[tokio::test(start_paused = true)]
async fn snapshot_combines_every_metric() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        status_log(dir.path(), "udp.log", 3),
        status_log(dir.path(), "tcp.log", 5),
    ];
    let mut collector = collector(dir.path(), true, files);

    let started = tokio::time::Instant::now();
    let snapshot = collector.snapshot().await.unwrap();

    assert_eq!(snapshot.cpu, 55.0);
    assert_eq!(snapshot.uptime, "2d 3h");
    assert_eq!(snapshot.total_throughput, 1);
    assert_eq!(snapshot.throughput, 125_000);
    assert!(snapshot.selfcheck_ok);
    assert_eq!(snapshot.usercount, 8);
    // 3 x 0.5s of CPU windows plus 3 x 1s of throughput windows.
    assert_eq!(started.elapsed(), Duration::from_millis(4500));
}

#[tokio::test(start_paused = true)]
async fn failing_probe_clears_selfcheck_flag() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![status_log(dir.path(), "udp.log", 1)];
    let mut collector = collector(dir.path(), false, files);

    let snapshot = collector.snapshot().await.unwrap();
    assert!(!snapshot.selfcheck_ok);
    assert_eq!(snapshot.usercount, 1);
}

#[tokio::test(start_paused = true)]
async fn missing_status_file_fails_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![dir.path().join("never-written.log")];
    let mut collector = collector(dir.path(), true, files);

    let err = collector.snapshot().await.unwrap_err();
    assert!(matches!(err, MetricsError::Io { .. }));
}
