pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;

pub use store::{fetch_records, records_on_date, FetchMode, RecordStore, StoreError};
