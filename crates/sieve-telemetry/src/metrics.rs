//! Metric names and the instruments the MCP core records into

use std::time::Instant;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};

pub const MCP_TOOL_CALL_DURATION: &str = "mcp.tool_call.duration";
pub const MCP_TOOL_CALL_COUNT: &str = "mcp.tool_call.count";
pub const MCP_SEARCH_DURATION: &str = "mcp.search.duration";
pub const MCP_SEARCH_COUNT: &str = "mcp.search.count";

/// Record the time elapsed since `start` on a histogram, in seconds
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}

/// Instruments for forwarded tool calls and discovery searches
#[derive(Clone)]
pub struct McpMetrics {
    tool_call_count: Counter<u64>,
    tool_call_duration: Histogram<f64>,
    search_count: Counter<u64>,
    search_duration: Histogram<f64>,
}

impl McpMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            tool_call_count: meter
                .u64_counter(MCP_TOOL_CALL_COUNT)
                .with_description("Tool calls forwarded to upstream servers")
                .build(),
            tool_call_duration: meter
                .f64_histogram(MCP_TOOL_CALL_DURATION)
                .with_description("Duration of forwarded tool calls")
                .with_unit("s")
                .build(),
            search_count: meter
                .u64_counter(MCP_SEARCH_COUNT)
                .with_description("Discovery searches")
                .build(),
            search_duration: meter
                .f64_histogram(MCP_SEARCH_DURATION)
                .with_description("Duration of discovery searches, including the view swap")
                .with_unit("s")
                .build(),
        }
    }

    /// Record one forwarded call
    ///
    /// `outcome` is `success`, `tool_error` or an error type.
    pub fn record_tool_call(&self, server: &str, outcome: &'static str, start: Instant) {
        let attributes = [
            KeyValue::new("server", server.to_owned()),
            KeyValue::new("outcome", outcome),
        ];
        self.tool_call_count.add(1, &attributes);
        record_duration(&self.tool_call_duration, start, &attributes);
    }

    /// Record one discovery search
    pub fn record_search(&self, outcome: &'static str, start: Instant) {
        let attributes = [KeyValue::new("outcome", outcome)];
        self.search_count.add(1, &attributes);
        record_duration(&self.search_duration, start, &attributes);
    }
}

impl Default for McpMetrics {
    fn default() -> Self {
        Self::new(&crate::meter())
    }
}
