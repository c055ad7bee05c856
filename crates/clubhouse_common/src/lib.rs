// --- File: crates/clubhouse_common/src/lib.rs ---

pub mod error; // Error taxonomy shared by every crate
pub mod http; // Axum response mapping and the outbound client builder
pub mod logging; // Tracing subscriber setup
pub mod models; // Club API read models
pub mod services; // Service traits for dependency injection
pub mod storage; // Persistent and session key/value storage

pub use error::{
    external_service_error, message_from_payload, ClubhouseError, HttpStatusCode, ServerPayload,
};

pub use http::{
    client::{create_client, USER_AGENT},
    handle_json_result, IntoHttpResponse,
};

pub use logging::{init, init_from_config, init_with_level};

pub use storage::{FileStore, KeyValueStore, MemoryStore, SharedStore, StorageError};
