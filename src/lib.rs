//! Marvans Ledger - core library for the device-resale client.
//!
//! The app records entries (customer + date + products), each product
//! carrying scanned serial/IMEI codes. This crate owns everything below
//! the UI: the data-shaping pipeline that turns nested order documents
//! into per-view row arrays, the generic search/sort/filter engine, the
//! declarative export field mapper, the remote API client, the offline
//! sync queue, and the session cache. All persistence lives behind the
//! remote REST API; nothing here is authoritative state.
//!
//! Documents travel as `serde_json::Value` end to end. Every field is
//! optional by convention: missing data degrades to empty results, it
//! never panics.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod accessor;
pub mod api;
pub mod compare;
pub mod dates;
pub mod engine;
pub mod export;
pub mod flatten;
pub mod queue;
pub mod search;
pub mod session;

pub use accessor::get_value;
pub use api::ApiClient;
pub use engine::{sort_and_search, FilterDef, FilterKind, SearchConfig};
pub use export::{map_object_keys, values_from_doc, ExportError, FieldSpec};
pub use flatten::{flatten_imei_data, flatten_model_data};
pub use queue::{QueueAction, SyncQueue};
pub use search::{
    process_entries, process_imei_entries, process_model_entries, SortDirection, SortSpec,
};
pub use session::SessionCache;

/// Initialize structured logging for an application embedding this
/// crate. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,marvans_ledger=debug"));

    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
