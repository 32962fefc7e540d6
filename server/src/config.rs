pub use satlaunch_shared::config::SessionConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Path the WebSocket endpoint is mounted at
    pub ws_path: String,
    /// Seed for connection id generation
    pub rng_seed: u64,
    /// Capacity of the connection -> session loop command queue
    pub command_buffer: usize,
    pub max_connections: usize,
    pub max_message_bytes: usize,
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9001".to_string(),
            ws_path: "/api/socket".to_string(),
            rng_seed: rand::random(),
            command_buffer: 256,
            max_connections: 500,
            max_message_bytes: 4096,
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, with the bind address taken from the environment if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// `SATLAUNCH_LISTEN_ADDR` wins; otherwise `HOST`/`PORT` are combined.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("SATLAUNCH_LISTEN_ADDR") {
            self.listen_addr = addr;
            return;
        }
        let host = lookup("HOST");
        let port = lookup("PORT");
        if host.is_none() && port.is_none() {
            return;
        }
        let (default_host, default_port) = self
            .listen_addr
            .rsplit_once(':')
            .map(|(h, p)| (h.to_string(), p.to_string()))
            .unwrap_or_else(|| ("0.0.0.0".to_string(), "9001".to_string()));
        self.listen_addr = format!(
            "{}:{}",
            host.unwrap_or(default_host),
            port.unwrap_or(default_port)
        );
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.listen_addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(format!(
                    "listen_addr '{}' must be host:port",
                    self.listen_addr
                ))
            }
        }
        if !self.ws_path.starts_with('/') {
            return Err("ws_path must start with '/'".to_string());
        }
        if self.command_buffer == 0 {
            return Err("command_buffer must be > 0".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        if self.max_message_bytes < 64 {
            return Err("max_message_bytes must be >= 64".to_string());
        }
        self.session.validate()
    }
}
