//! # CLI Module
//!
//! Command-line front end of the `oasbind` binary.
//!
//! ## Commands
//!
//! ### `operations`
//!
//! ```bash
//! oasbind operations --spec openapi.yaml
//! ```
//!
//! Lists each operation id with its snake_case fold, method and path.
//!
//! ### `routes`
//!
//! ```bash
//! oasbind routes --spec openapi.yaml
//! ```
//!
//! Lists every route a server would install: one per operation and server
//! base path.
//!
//! ### `call`
//!
//! ```bash
//! oasbind call --spec openapi.yaml --server-url http://localhost:8080 \
//!     get_pet_by_id 42 --query verbose=true --header X-API-Key=secret
//! ```
//!
//! Performs a validated client call over HTTP and prints the status and the
//! payload. `--spec` and `--server-url` may also come from `OASBIND_SPEC` and
//! `OASBIND_SERVER_URL`.

mod commands;

pub use commands::{describe_operations, describe_routes, run, run_cli, Cli, Commands};
