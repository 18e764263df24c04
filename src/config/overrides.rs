/// Settings passed on the command line, applied on top of tcpopt.toml.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub no_linger: Option<bool>,
    pub nodelay: Option<bool>,
    /// Milliseconds. Turns keep-alive on.
    pub keepalive_idle: Option<u64>,
}
