use lazy_static::lazy_static;
use prometheus::{exponential_buckets, Histogram, HistogramOpts, IntCounter, Opts, Registry};

lazy_static! {
    pub static ref RECORDS_DECODED: IntCounter = IntCounter::with_opts(
        Opts::new("records_decoded", "Records decoded from binary tree files")
            .namespace("chaintree"),
    )
    .unwrap();
    pub static ref INSERT_FAILURES: IntCounter = IntCounter::with_opts(
        Opts::new("insert_failures", "Rows that could not be inserted during a load")
            .namespace("chaintree"),
    )
    .unwrap();
    pub static ref CHAINS_RESOLVED: IntCounter = IntCounter::with_opts(
        Opts::new("chains_resolved", "Root paths successfully resolved").namespace("chaintree"),
    )
    .unwrap();
    pub static ref CHAIN_FAILURES: IntCounter = IntCounter::with_opts(
        Opts::new("chain_failures", "Root paths that hit a dangling or cyclic parent link")
            .namespace("chaintree"),
    )
    .unwrap();
    pub static ref LOAD_HIST: Histogram = Histogram::with_opts(
        HistogramOpts::new("load_time", "Complete time to load a tree file",)
            .namespace("chaintree")
            .buckets(exponential_buckets(0.001, 2.0, 17).unwrap()),
    )
    .unwrap();
    pub static ref CHAIN_LEN_HIST: Histogram = Histogram::with_opts(
        HistogramOpts::new("chain_length", "Number of nodes in resolved chains",)
            .namespace("chaintree")
            .buckets(exponential_buckets(1.0, 2.0, 10).unwrap()),
    )
    .unwrap();
}

pub(crate) fn register(registry: &Registry) -> crate::error::Result<()> {
    registry.register(Box::new(RECORDS_DECODED.clone()))?;
    registry.register(Box::new(INSERT_FAILURES.clone()))?;
    registry.register(Box::new(CHAINS_RESOLVED.clone()))?;
    registry.register(Box::new(CHAIN_FAILURES.clone()))?;
    registry.register(Box::new(LOAD_HIST.clone()))?;
    registry.register(Box::new(CHAIN_LEN_HIST.clone()))?;
    Ok(())
}
