use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::PathBuf;

use crate::manifest::load_router;
use crate::router::{ParamBuf, RouteLookup};

#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(version, about = "Inspect and exercise canopy route manifests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Location of the route manifest
#[derive(Args, Debug, Clone)]
pub struct ManifestArg {
    /// Route manifest (.yaml, .yml, .json or .toml)
    #[arg(short, long, env = "CANOPY_MANIFEST")]
    pub manifest: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every registered route
    Routes {
        #[command(flatten)]
        manifest: ManifestArg,

        /// Print the listing as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dispatch a request and print the outcome
    Match {
        /// HTTP method, e.g. GET
        method: String,

        /// Request path, e.g. /users/42
        path: String,

        /// Request host
        #[arg(long, default_value = "")]
        host: String,

        #[command(flatten)]
        manifest: ManifestArg,
    },
    /// Build a URL from a named route
    Url {
        /// Route name, group-qualified (e.g. `v1.user`)
        name: String,

        /// Positional parameter values
        args: Vec<String>,

        #[command(flatten)]
        manifest: ManifestArg,
    },
    /// Dump the radix tree serving a host
    Tree {
        #[arg(long, default_value = "")]
        host: String,

        #[command(flatten)]
        manifest: ManifestArg,
    },
}

/// Run a parsed command, writing its output to `out`.
///
/// Returns `Ok(false)` when the command ran but did not succeed in the
/// command's own terms (a `match` that found no route).
pub fn run_cli(cli: &Cli, out: &mut impl Write) -> Result<bool> {
    match &cli.command {
        Commands::Routes { manifest, json } => {
            let router = load_router(&manifest.manifest)?;
            if *json {
                let listing = serde_json::to_string_pretty(&router.route_infos())?;
                writeln!(out, "{listing}")?;
            } else {
                write!(out, "{}", router.dump_routes())?;
            }
            Ok(true)
        }
        Commands::Match {
            method,
            path,
            host,
            manifest,
        } => {
            let router = load_router(&manifest.manifest)?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method {method:?}"))?;
            let mut buf = ParamBuf::with_slots(router.max_params_for(host));
            let lookup = router.find(host, &method, path, &mut buf);
            writeln!(out, "status: {}", lookup.outcome())?;
            match lookup {
                RouteLookup::Matched(m) => {
                    writeln!(out, "route: {}", m.route)?;
                    writeln!(out, "handlers: {}", m.handlers().join(", "))?;
                    for (name, value) in m.params.iter() {
                        writeln!(out, "param {name} = {value:?}")?;
                    }
                    Ok(true)
                }
                RouteLookup::MethodNotAllowed { allowed } => {
                    let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                    writeln!(out, "allowed: {}", allowed.join(", "))?;
                    Ok(false)
                }
                RouteLookup::NotFound => Ok(false),
            }
        }
        Commands::Url {
            name,
            args,
            manifest,
        } => {
            let router = load_router(&manifest.manifest)?;
            let Some(route) = router.route_by_name(name) else {
                bail!("no route named {name:?}");
            };
            writeln!(out, "{}", route.url(args))?;
            Ok(true)
        }
        Commands::Tree { host, manifest } => {
            let router = load_router(&manifest.manifest)?;
            let Some(tree) = router.dump_tree(host) else {
                bail!("no routes serve host {host:?}");
            };
            write!(out, "{tree}")?;
            Ok(true)
        }
    }
}
