//! admanager-mcp: MCP server for the Google Ad Manager API
//!
//! This library exposes network, inventory, order, line item, creative and
//! reporting operations of Google Ad Manager as MCP tools over stdio.
//!
//! # Architecture
//!
//! - **Credentials**: a key file override, or the application default chain
//! - **Client**: the REST API when available, the legacy SOAP API otherwise
//! - **Handlers**: one per resource category, each returning a uniform
//!   `{success, action, ...}` envelope
//!
//! # Modules
//!
//! - [`admanager`]: Ad Manager clients and the normalized data model
//! - [`auth`]: Credential resolution and bearer tokens
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types
//! - [`handlers`]: Tool handlers
//! - [`mcp`]: MCP protocol implementation

pub mod admanager;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
