use rand::seq::SliceRandom;
use scout_core::BrowserConfig;

// Common desktop user agents
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Window and identity the browser is launched with
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    /// User agent override, `None` keeps Chromium's own
    pub user_agent: Option<String>,
    /// Window width in pixels
    pub viewport_width: u32,
    /// Window height in pixels
    pub viewport_height: u32,
}

impl LaunchProfile {
    /// Build a launch profile from config, picking a user agent when randomization is on
    pub fn from_config(config: &BrowserConfig) -> Self {
        let user_agent = if config.randomize_user_agent {
            USER_AGENTS
                .choose(&mut rand::thread_rng())
                .map(|ua| (*ua).to_string())
        } else {
            None
        };

        Self {
            user_agent,
            viewport_width: config.window_width,
            viewport_height: config.window_height,
        }
    }
}
