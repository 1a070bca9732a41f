//! Metrics emitted over one generator run.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        $crate::metrics::counter!($def.name)
    };
    ($def:expr, $($labels:tt)*) => {
        $crate::metrics::counter!($def.name, $($labels)*)
    };
}

#[macro_export]
macro_rules! gauge {
    ($def:expr) => {
        $crate::metrics::gauge!($def.name)
    };
    ($def:expr, $($labels:tt)*) => {
        $crate::metrics::gauge!($def.name, $($labels)*)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        $crate::metrics::histogram!($def.name)
    };
}

pub const FETCH_DURATION: MetricDef = MetricDef {
    name: "onionoo.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch the onionoo details document in seconds",
};

pub const FETCH_NOT_MODIFIED: MetricDef = MetricDef {
    name: "onionoo.fetch.not_modified",
    metric_type: MetricType::Counter,
    description: "Runs that ended early because onionoo had no update",
};

pub const RELAYS: MetricDef = MetricDef {
    name: "relays.count",
    metric_type: MetricType::Gauge,
    description: "Number of relays in the snapshot",
};

pub const MALFORMED_RECORDS: MetricDef = MetricDef {
    name: "relays.malformed",
    metric_type: MetricType::Counter,
    description: "Relay fields dropped during normalization",
};

pub const DROPPED_KEYS: MetricDef = MetricDef {
    name: "index.dropped_keys",
    metric_type: MetricType::Counter,
    description: "Candidate bucket keys rejected by key validation",
};

pub const BUCKETS: MetricDef = MetricDef {
    name: "index.buckets",
    metric_type: MetricType::Gauge,
    description: "Number of buckets per category, tagged by category",
};

pub const RENDER_DURATION: MetricDef = MetricDef {
    name: "site.render.duration",
    metric_type: MetricType::Histogram,
    description: "Time to write the complete site in seconds",
};

pub const PAGES_WRITTEN: MetricDef = MetricDef {
    name: "site.pages",
    metric_type: MetricType::Counter,
    description: "HTML pages written",
};

pub const ALL_METRICS: &[MetricDef] = &[
    FETCH_DURATION,
    FETCH_NOT_MODIFIED,
    RELAYS,
    MALFORMED_RECORDS,
    DROPPED_KEYS,
    BUCKETS,
    RENDER_DURATION,
    PAGES_WRITTEN,
];

/// Registers the descriptions of every metric with the installed recorder.
pub fn describe_all() {
    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Gauge => metrics::describe_gauge!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}
