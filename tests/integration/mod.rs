//! Integration tests for hotsync asset synchronization

mod cli_commands;
mod manifest_discovery;
mod test_utils;
