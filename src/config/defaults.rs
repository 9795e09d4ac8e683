pub fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

pub fn default_timeout_secs() -> u64 {
    30
}

pub fn default_handshake_timeout_ms() -> u64 {
    10_000
}

pub fn default_verbose() -> bool {
    false
}
