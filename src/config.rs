use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/notes.db";
}

/// Runtime configuration resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var(env_vars::PORT)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults::PORT);

        let database_url = env::var(env_vars::DATABASE_URL)
            .unwrap_or_else(|_| defaults::DATABASE_URL.to_string());

        Self { port, database_url }
    }
}
