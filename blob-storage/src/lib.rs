pub mod local_store;
pub mod s3_store;
pub mod store;
