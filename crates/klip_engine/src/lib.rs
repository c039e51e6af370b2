//! Klip sync engine: remote client, download store and the sync pipeline.
mod config;
mod persist;
mod pipeline;
mod remote;
mod report;
mod types;

pub use config::{default_config_path, load_config, ConfigError, SyncConfig, CONFIG_FILENAME};
pub use persist::{
    ensure_download_dir, is_already_synced, local_target, sweep_stale_parts, AtomicDownload,
    PersistError,
};
pub use pipeline::{ItemError, SyncError, SyncPipeline};
pub use remote::{ByteStream, Operation, RemoteClient, RemoteError, RemoteSettings, ReqwestRemoteClient};
pub use report::{ItemOutcome, ItemReport, SyncReport};
pub use types::{AckRequest, Article};
