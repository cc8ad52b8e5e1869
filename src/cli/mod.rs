//! # CLI Module
//!
//! Command-line introspection for route manifests, shipped as the `canopy` binary.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List every registered route, sorted by path:
//!
//! ```bash
//! canopy routes --manifest routes.yaml
//! canopy routes --manifest routes.yaml --json
//! ```
//!
//! ### `match`
//!
//! Dispatch a request and print the outcome and extracted parameters. Exits with
//! status 1 unless a route matched:
//!
//! ```bash
//! canopy match GET /api/v1/users/42 --manifest routes.yaml
//! canopy match GET /docs --host docs.example.com --manifest routes.yaml
//! ```
//!
//! ### `url`
//!
//! Build a path from a named route:
//!
//! ```bash
//! canopy url v1.user 42 --manifest routes.yaml
//! ```
//!
//! ### `tree`
//!
//! Dump the radix tree serving a host:
//!
//! ```bash
//! canopy tree --manifest routes.yaml
//! ```
//!
//! `--manifest` can also be supplied through `CANOPY_MANIFEST`.

mod commands;


pub use commands::{run_cli, Cli, Commands, ManifestArg};
