use crate::core::config::data::Config;
use crate::core::config::defaults::DEFAULT_RETRY_DELAY_MS;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.server {
            Some(server) => println!("  server: {server}"),
            None => println!("  server: (unset, using {})", self.server_or_default()),
        }
        match &self.assistant {
            Some(assistant) => println!("  assistant: {assistant}"),
            None => println!("  assistant: (unset, using {})", self.assistant_or_default()),
        }
        match self.retry_delay_ms {
            Some(ms) => println!("  retry-delay-ms: {ms}"),
            None => println!("  retry-delay-ms: (unset, using {DEFAULT_RETRY_DELAY_MS})"),
        }
        match &self.log_file {
            Some(path) => println!("  log-file: {path}"),
            None => println!("  log-file: (unset)"),
        }
    }
}
