use std::net::SocketAddr;
use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;
use climate_dashboard::dashboard::DEFAULT_COLD_THRESHOLD_CELSIUS;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Serialized forecasting model (JSON).
    #[arg(long = "model", env = "MODEL_PATH", default_value = "model.json")]
    pub model_path: PathBuf,

    /// File the fan actuator polls for ON/OFF commands.
    #[arg(long, env = "COMMAND_FILE", default_value = "command.txt")]
    pub command_file: PathBuf,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8501")]
    pub listen: SocketAddr,

    /// Timezone used to display timestamps.
    #[arg(long, env = "TZ", default_value = "Asia/Jakarta")]
    pub timezone: Tz,

    #[arg(long, default_value_t = DEFAULT_COLD_THRESHOLD_CELSIUS)]
    pub cold_threshold: f64,

    /// Skip applying database migrations at startup.
    #[arg(long)]
    pub skip_migrations: bool,
}
