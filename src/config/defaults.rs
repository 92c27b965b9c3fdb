pub fn bind() -> String {
    String::from("0.0.0.0:8081")
}

pub fn base_href() -> String {
    String::from("/")
}

pub fn assets_dir() -> String {
    String::from(".")
}

pub fn proxy_timeout_secs() -> u64 {
    30
}

pub fn empty() -> String {
    String::new()
}

pub fn disable() -> bool {
    false
}
