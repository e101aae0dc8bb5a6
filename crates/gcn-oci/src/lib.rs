//! OCI DevOps client for GCN project teardown
//!
//! Implements [`gcn_core::DevOpsClient`] on top of the `oci` command line
//! tool and resolves credentials from the OCI configuration file.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod parse;

pub use auth::{OciAuthResolver, OciAuthentication};
pub use cli::OciCli;
pub use client::OciDevOpsClient;
pub use config::{DEFAULT_PROFILE, OciConfig};
