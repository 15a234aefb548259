use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Entity name stamped into linking metadata on every log line. Optional;
    /// the processor itself reads no configuration.
    pub service_name: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Env::raw().only(&["SERVICE_NAME"]))
            .extract()
    }
}
