/// How the subscriber is set up, resolved once at startup.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let environment =
            std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string());
        // Structured output is the default everywhere except local shells.
        let json_format = match std::env::var("LOG_FORMAT") {
            Ok(v) => v.eq_ignore_ascii_case("json"),
            Err(_) => environment != "local",
        };

        Self {
            environment,
            json_format,
        }
    }
}
