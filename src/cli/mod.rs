//! Command-line interface handlers

pub mod commands;

pub use commands::{
    cmd_build, cmd_derive, cmd_inspect, cmd_keygen, cmd_merkle, cmd_verify, read_block_input,
    BuildArgs, CliResult,
};
