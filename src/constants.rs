//! Names shared by every process that bootstraps or uses the trade monitor grid.

/// Kafka topic carrying raw trades.
pub const KAFKA_TOPIC_NAME_TRADES: &str = "trades";
/// Prefix for stream mappings so they never clash with a container of the same name.
pub const KAFKA_TOPIC_MAPPING_PREFIX: &str = "kf_";

pub const MAP_NAME_AGGREGATE_QUERY_RESULTS: &str = "AggregateQuery_results";
pub const MAP_NAME_ALERTS_MAX_VOLUME: &str = "alertsMaxVolume";
pub const MAP_NAME_JOB_CONTROL: &str = "jobControl";
pub const MAP_NAME_KAFKA_CONFIG: &str = "kafka_config";
pub const MAP_NAME_PYTHON_SENTIMENT: &str = "pythonSentiment";
pub const MAP_NAME_SYMBOLS: &str = "symbols";
pub const MAP_NAME_TRADES: &str = "trades";

/// Containers materialized eagerly so they are visible to every client from the outset.
pub const MAP_NAMES: &[&str] = &[
    MAP_NAME_AGGREGATE_QUERY_RESULTS,
    MAP_NAME_ALERTS_MAX_VOLUME,
    MAP_NAME_JOB_CONTROL,
    MAP_NAME_KAFKA_CONFIG,
    MAP_NAME_PYTHON_SENTIMENT,
    MAP_NAME_SYMBOLS,
    MAP_NAME_TRADES,
];

// Connection-config keys, named as the stream client expects them.
pub const BOOTSTRAP_SERVERS_CONFIG: &str = "bootstrap.servers";
pub const KEY_DESERIALIZER_CONFIG: &str = "key.deserializer";
pub const VALUE_DESERIALIZER_CONFIG: &str = "value.deserializer";
pub const STRING_DESERIALIZER: &str = "org.apache.kafka.common.serialization.StringDeserializer";

// Structured value type identifiers registered with the query engine.
pub const TYPE_NAME_SYMBOL_INFO: &str = "SymbolInfo";
pub const TYPE_NAME_TRADE: &str = "Trade";
pub const TYPE_NAME_AGGREGATE_RESULT: &str = "AggregateResult";
