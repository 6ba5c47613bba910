/// Database model definitions.
pub mod models;
/// Quiz catalogue lookup abstraction and backends.
pub mod quiz_store;
/// Final ranking persistence.
pub mod results;
/// Storage abstraction layer shared by all backends.
pub mod storage;
