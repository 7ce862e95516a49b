use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use mrp_copilot::config::OdooConfig;

#[derive(Parser)]
#[command(name = "mrp-copilot")]
#[command(about = "Manufacturing planning copilot for Odoo")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Odoo JSON-RPC endpoint (e.g. https://erp.example.com/jsonrpc)
    #[arg(long, env = "ODOO_URL")]
    pub url: Option<String>,

    /// Database name
    #[arg(long, env = "ODOO_DB")]
    pub db: Option<String>,

    /// Login of the integration user
    #[arg(long, env = "ODOO_USERNAME")]
    pub username: Option<String>,

    /// API key (or password) of the integration user
    #[arg(long, env = "ODOO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "MRP_RPC_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Claude model override
    #[arg(long, env = "MRP_MODEL")]
    pub model: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Connection settings; missing values are left blank for
    /// [`OdooConfig::validate`] to reject.
    pub fn odoo_config(&self) -> OdooConfig {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        OdooConfig::new(
            value(&self.url),
            value(&self.db),
            value(&self.username),
            value(&self.api_key),
        )
        .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Subcommand, PartialEq, Debug, Clone)]
pub enum Command {
    /// Create work centers, products, BOMs and orders from a batch file
    Provision {
        /// Path to the batch JSON document
        batch: PathBuf,
    },
    /// Run a single tool and print its JSON result
    Tool {
        /// Tool name, e.g. list_active_orders
        name: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// List the available tool names
    Tools,
}
