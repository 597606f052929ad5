//! End-to-end scenarios exercising the full insert/split/merge/query
//! pipeline across the façade API and every backend.

mod append_and_merge;
mod backend_parity;
mod calendar_bucketing;
mod large_dataset;
