pub mod fetcher;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod serializer;
pub mod sink;
pub mod warehouse;
