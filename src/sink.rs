// Outbound channels for the two command streams
//
// The publisher only needs to know whether anyone is listening and how to
// push the newest message; zenoh provides both through its matching status.

use serde::Serialize;
use tracing::debug;
use zenoh::Wait;
use zenoh::pubsub::Publisher;

use crate::error::Result;

/// Destination for one kind of command message
pub trait CommandSink<T>: Send {
    /// Human readable channel name for logs
    fn name(&self) -> &str;

    /// True once at least one consumer is attached
    fn has_consumers(&self) -> Result<bool>;

    fn publish(&self, msg: &T) -> Result<()>;
}

/// JSON over a zenoh publisher declared with drop-on-congestion (newest sample wins)
pub struct ZenohSink {
    publisher: Publisher<'static>,
    name: String,
}

impl ZenohSink {
    pub fn new(publisher: Publisher<'static>) -> Self {
        let name = publisher.key_expr().to_string();
        Self { publisher, name }
    }
}

impl<T: Serialize> CommandSink<T> for ZenohSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_consumers(&self) -> Result<bool> {
        let status = self.publisher.matching_status().wait()?;
        Ok(status.matching())
    }

    fn publish(&self, msg: &T) -> Result<()> {
        let payload = serde_json::to_string(msg)?;
        debug!("{} <- {}", self.name, payload);
        self.publisher.put(payload).wait()?;
        Ok(())
    }
}
