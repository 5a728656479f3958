const NODE_ID: &str = "OTESTPOINT_NODE_ID";

const DEFAULT_NODE_ID: &str = "localhost";

pub fn get_default_node_id() -> String {
    DEFAULT_NODE_ID.to_string()
}

pub fn get_node_id() -> String {
    std::env::var(NODE_ID).unwrap_or_else(|_| get_default_node_id())
}

const PROBE_RATE: &str = "OTESTPOINT_PROBE_RATE";

const DEFAULT_PROBE_RATE: u64 = 5;

pub fn get_default_rate() -> u64 {
    DEFAULT_PROBE_RATE
}

pub fn get_rate() -> u64 {
    let rate_from_env = std::env::var(PROBE_RATE);
    rate_from_env.map_or(DEFAULT_PROBE_RATE, |res| {
        res.parse()
            .ok()
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_PROBE_RATE)
    })
}
