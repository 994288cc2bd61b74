//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "prvotkar.toml")]
    pub output: String,

    /// Include every setting with its default and a comment
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Prvotkar configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set geocoding.user_agent to something that identifies you");
                println!("  2. Optionally export PRVOTKAR_RUIAN_API_KEY for live municipality lists");
                println!("  3. Validate configuration: prvotkar validate-config");
                println!("  4. Run a sync: prvotkar sync");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# Prvotkar Configuration File
# Local replica of SVJ and BD subjects from the ARES registry

[application]
log_level = "info"

[store]
path = "prvotkar.db"

[gazetteer]
# api_key = "${PRVOTKAR_RUIAN_API_KEY}"

[registry]
entity_types = ["svj", "bd"]

[geocoding]
enabled = true
user_agent = "Prvotkar (ops@example.com)"
min_delay_ms = 1100

[logging]
local_enabled = false
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# Prvotkar Configuration File
# Local replica of SVJ and BD subjects from the ARES registry
#
# Values of the form ${VAR} are substituted from the environment.
# Any setting can also be overridden with PRVOTKAR_<SECTION>_<KEY>.

[application]
# trace, debug, info, warn, error
log_level = "info"

[store]
# SQLite file, created on first use
path = "prvotkar.db"

[gazetteer]
# RÚIAN region/municipality service. Without an API key the built-in
# list of large municipalities is used instead.
base_url = "https://ruian.fnx.io/api/v1/ruian/build"
# api_key = "${PRVOTKAR_RUIAN_API_KEY}"
timeout_seconds = 20
# Gap between region requests
region_delay_ms = 300

[gazetteer.retry]
max_attempts = 3
backoff_ms = 3000
rate_limit_backoff_ms = 30000

[registry]
base_url = "https://ares.gov.cz/ekonomicke-subjekty-v-be/rest"
# svj = unit owners' associations, bd = housing cooperatives
entity_types = ["svj", "bd"]
# Largest page the registry serves
page_size = 1000
# Pages fetched per name-prefix partition before giving up on it
max_pages_per_partition = 50
# How many name characters a partition may be refined by (1-3)
max_prefix_depth = 2
page_delay_ms = 200
municipality_delay_ms = 120
timeout_seconds = 30

[registry.retry]
max_attempts = 3
backoff_ms = 5000
rate_limit_backoff_ms = 30000

[geocoding]
enabled = true
base_url = "https://nominatim.openstreetmap.org"
# Required by the Nominatim usage policy
user_agent = "Prvotkar (ops@example.com)"
country_name = "Česká republika"
country_code = "cz"
# At least 1000 (one request per second)
min_delay_ms = 1100
# Results are committed every N subjects
commit_every = 100
timeout_seconds = 10
# retry-failed leaves subjects with this many attempts alone
max_attempts = 3

[logging]
# Rolling JSON log files in addition to the console
local_enabled = false
local_path = "logs"
# daily, hourly, never
local_rotation = "daily"
"#
        .to_string()
    }
}
