//! Hotsync: Incremental Manifest-Driven Asset Synchronization
//!
//! Keeps a local asset tree in step with a remote manifest tree. A timestamp cache
//! lets an unchanged tree cost one request, and every downloaded file is verified
//! against its SHA-256 before it replaces the local copy.

pub mod cache;
pub mod cli;
pub mod config;
pub mod detect;
pub mod discovery;
pub mod error;
pub mod hash;
pub mod ignore;
pub mod logging;
pub mod remote;
pub mod sync;
pub mod types;
pub mod updater;
