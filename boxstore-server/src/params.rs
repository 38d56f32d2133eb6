use clap::{Parser, ValueEnum};

#[derive(Parser)]
pub struct Args {
    #[clap(long, default_value = "127.0.0.1:8080")]
    pub(crate) http_addr: String,

    #[clap(long, value_enum, default_value_t = IndexBackend::Memory)]
    pub(crate) index_backend: IndexBackend,

    #[clap(long, value_enum, default_value_t = StorageBackend::Local)]
    pub(crate) storage_backend: StorageBackend,

    /// Directory holding the index database and locally stored blobs.
    #[clap(long, default_value = "boxstore_data")]
    pub(crate) data_dir: String,

    #[clap(long, default_value = "boxstore")]
    pub(crate) s3_bucket: String,

    /// Optional S3-compatible endpoint override (e.g. a local MinIO server).
    #[clap(long)]
    pub(crate) s3_endpoint: Option<String>,

    /// Pre-shared token identifying the administrator.
    #[clap(long, env = "BOXSTORE_ADMIN_TOKEN")]
    pub(crate) admin_token: String,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum IndexBackend {
    Memory,
    Rocks,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    Local,
    S3,
}
