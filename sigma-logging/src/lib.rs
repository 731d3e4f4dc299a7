// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

/// Emits a structured trace event: an event name followed by a json object
///
/// ```
/// sigma_logging::sigma_trace!("chain.block_applied", {"block": 12});
/// ```
#[macro_export]
macro_rules! sigma_trace {
    ($evt:expr, $params:tt) => {
        tracing::trace!("sigma_trace:{}:{}", $evt, serde_json::json!($params));
    };
}
