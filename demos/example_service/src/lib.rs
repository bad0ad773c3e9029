//! Example service compiled from `contract/example_service.yaml`.
//!
//! `build.rs` generates the `ExampleService` trait, the
//! `ExampleServiceEndpoints` collection and one dispatch unit per method;
//! this crate only supplies the implementation.

use endpointgen::runtime::{
    AsyncResult, AuthHeader, BinaryResponseBody, CollectionParamDecoder, DecodeError, ParamDecoder,
    RequestBody,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

include!(concat!(env!("OUT_DIR"), "/example_service.rs"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Plain-text report that writes itself.
pub struct Report {
    lines: Vec<String>,
}

impl BinaryResponseBody for Report {
    fn write_to(&mut self, out: &mut dyn io::Write) -> io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn content_type(&self) -> &str {
        "text/plain; charset=utf-8"
    }
}

/// Two-digit hex byte, e.g. `ff`.
#[derive(Debug, Default)]
pub struct HexDecoder;

impl ParamDecoder<u8> for HexDecoder {
    fn decode(&self, value: &str) -> Result<u8, DecodeError> {
        u8::from_str_radix(value, 16)
            .map_err(|e| DecodeError::new("value", format!("'{value}' is not hex: {e}")))
    }
}

/// Comma-separated numbers, flattened across repeated values.
#[derive(Debug, Default)]
pub struct CsvDecoder;

impl CollectionParamDecoder<Vec<u32>> for CsvDecoder {
    fn decode(&self, values: &[&str]) -> Result<Vec<u32>, DecodeError> {
        values
            .iter()
            .flat_map(|v| v.split(','))
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.trim()
                    .parse()
                    .map_err(|e| DecodeError::new("value", format!("'{part}': {e}")))
            })
            .collect()
    }
}

/// Per-method invocation counters.
#[derive(Debug, Default)]
pub struct Calls {
    pub simple: AtomicUsize,
    pub ping: AtomicUsize,
    pub post: AtomicUsize,
    pub get_item: AtomicUsize,
}

/// Future gate used by tests to control when `pingAsync` resolves.
pub type PingGate = futures::channel::oneshot::Receiver<String>;

#[derive(Default)]
pub struct ExampleImpl {
    pub calls: Arc<Calls>,
    ping_gate: parking_lot::Mutex<Option<PingGate>>,
}

impl ExampleImpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `pingAsync` resolve with whatever is sent on `gate`.
    pub fn gate_ping(&self, gate: PingGate) {
        *self.ping_gate.lock() = Some(gate);
    }
}

impl ExampleService for ExampleImpl {
    fn simple(&self) {
        self.calls.simple.fetch_add(1, Ordering::SeqCst);
    }

    fn ping(&self) -> String {
        self.calls.ping.fetch_add(1, Ordering::SeqCst);
        "pong".to_string()
    }

    fn ping_async(&self) -> AsyncResult<String> {
        match self.ping_gate.lock().take() {
            Some(gate) => async move { Ok::<_, anyhow::Error>(gate.await?) }.boxed(),
            None => async { Ok("pong".to_string()) }.boxed(),
        }
    }

    fn void_async(&self) -> AsyncResult<()> {
        async { Ok(()) }.boxed()
    }

    fn return_primitive(&self) -> i32 {
        42
    }

    fn binary(&self) -> Box<dyn BinaryResponseBody> {
        Box::new(b"\x00\x01binary".to_vec())
    }

    fn named_binary(&self) -> Report {
        Report {
            lines: vec!["total: 3".to_string(), "failed: 0".to_string()],
        }
    }

    fn optional_binary(&self, present: bool) -> Option<Box<dyn BinaryResponseBody>> {
        present.then(|| Box::new(b"maybe".to_vec()) as Box<dyn BinaryResponseBody>)
    }

    fn post(&self, item: Item) -> Item {
        self.calls.post.fetch_add(1, Ordering::SeqCst);
        item
    }

    fn get_item(
        &self,
        item_id: u64,
        tags: Vec<String>,
        limit: Option<u32>,
        trace: Option<String>,
        auth: AuthHeader,
    ) -> Item {
        self.calls.get_item.fetch_add(1, Ordering::SeqCst);
        let mut name = format!("item-{item_id} for {}", auth.token());
        if let Some(trace) = trace {
            name.push_str(&format!(" [{trace}]"));
        }
        let limit = limit.map_or(tags.len(), |l| l as usize);
        Item {
            id: item_id,
            name,
            tags: tags.into_iter().take(limit).collect(),
        }
    }

    fn upload(&self, mut body: RequestBody) -> usize {
        let mut buf = Vec::new();
        body.read_to_end(&mut buf).unwrap_or(0)
    }

    fn mix_levels(
        &self,
        color: u8,
        levels: Vec<u32>,
        weights: Vec<u32>,
        span: Vec<u32>,
    ) -> String {
        format!("{color}|{levels:?}|{weights:?}|{span:?}")
    }
}
