/// Lowest port the server binary accepts
pub const MIN_PORT: u16 = 1024;

/// Runtime settings of the server library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on, `host:port`
    pub addr: String,
    /// Connections beyond this count are closed right after accept
    pub max_clients: usize,
    /// Longest request line accepted, in bytes
    pub max_line_bytes: usize,
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            max_clients: 64,
            max_line_bytes: 8192,
        }
    }
}
