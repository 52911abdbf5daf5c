use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct DispatchMetrics {
    pub registry: Registry,
    pub calls: IntCounterVec,
    pub rejected: IntCounterVec,
    pub device_status: IntCounterVec,
}

impl DispatchMetrics {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let calls = IntCounterVec::new(
            Opts::new("pas_dispatch_calls_total", "Method calls received"),
            &["device_type"],
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let rejected = IntCounterVec::new(
            Opts::new(
                "pas_dispatch_rejected_total",
                "Method calls rejected before reaching the device",
            ),
            &["reason"],
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let device_status = IntCounterVec::new(
            Opts::new(
                "pas_dispatch_device_status_total",
                "Status codes returned by the device communication interface",
            ),
            &["status"],
        )
        .map_err(|e| format!("metrics init error: {e}"))?;
        let _ = registry.register(Box::new(calls.clone()));
        let _ = registry.register(Box::new(rejected.clone()));
        let _ = registry.register(Box::new(device_status.clone()));
        Ok(Self {
            registry,
            calls,
            rejected,
            device_status,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
