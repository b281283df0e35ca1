pub mod config;
pub mod entities;
pub mod extract;
pub mod outline;
pub mod reconcile;
pub mod record;
pub mod rename_map;
pub mod sequencer;
pub mod store;
pub mod url_key;
pub mod warn;
