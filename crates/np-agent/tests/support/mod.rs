//! Fakes shared by the agent test binaries.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use np_agent::agent::Agent;
use np_agent::heartbeat::{HeartbeatClient, RetryPolicy};
use np_agent::transport::{Reply, Transport, TransportError};
use np_checks::CheckRegistry;
use np_core::config::NodeIdentity;
use np_metrics::accounting::DumpFile;
use np_metrics::cpu::CpuSampler;
use np_metrics::throughput::ByteCounter;
use np_metrics::{MetricSources, MetricsCollector, MetricsError, SamplingPlan};

pub struct FlatCpu;

impl CpuSampler for FlatCpu {
    fn begin(&mut self) {}

    fn finish(&mut self) -> f32 {
        5.0
    }
}

pub struct IdleLink;

impl ByteCounter for IdleLink {
    fn read(&self) -> Result<u64, MetricsError> {
        Ok(1_000)
    }
}

/// Answers every request the same way and keeps the forms it was sent.
pub struct FixedApi {
    reply: Result<String, ()>,
    pub forms: Mutex<Vec<Vec<(&'static str, String)>>>,
}

impl FixedApi {
    pub fn answering(body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body.to_string()),
            forms: Mutex::new(Vec::new()),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(()),
            forms: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.forms.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FixedApi {
    async fn post_form(
        &self,
        _url: &str,
        form: &[(&'static str, String)],
    ) -> Result<Reply, TransportError> {
        self.forms.lock().unwrap().push(form.to_vec());
        match &self.reply {
            Ok(body) => Ok(Reply {
                status: 200,
                body: body.clone(),
            }),
            Err(()) => Err(TransportError::Connect("connection refused".into())),
        }
    }
}

pub fn collector(dir: &Path) -> MetricsCollector {
    let uptime = dir.join("uptime");
    std::fs::write(&uptime, "90000.00 1.00\n").unwrap();
    let dump = dir.join("vnstat.dump");
    std::fs::write(&dump, "m;0;1380578400;2048;1024;0;0;1\n").unwrap();
    let status = dir.join("openvpn-status.log");
    std::fs::write(&status, "Updated,now\nalice,198.51.100.1:1194,1,1,now\nEND\n").unwrap();

    let sources = MetricSources {
        cpu: Box::new(FlatCpu),
        rx_counter: Box::new(IdleLink),
        accounting: Box::new(DumpFile(dump)),
        uptime_file: uptime,
        status_files: vec![status],
    };
    MetricsCollector::new(CheckRegistry::new(), sources, SamplingPlan::default())
}

pub fn agent(dir: &Path, api: Arc<FixedApi>, verbose: bool) -> Agent<Arc<FixedApi>> {
    let client = HeartbeatClient::new(api, "https://api.lokun.is", RetryPolicy::default());
    let identity = NodeIdentity {
        secret: "s3cret".into(),
        name: "vpn7".into(),
    };
    Agent::new(collector(dir), client, identity, verbose)
}
