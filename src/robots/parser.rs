//! Robots.txt crawl-delay parser
//!
//! Only the `Crawl-delay` directive is interpreted; allow/disallow rules are
//! deliberately ignored by this crawler.

/// Parsed robots.txt content, queried for crawl delays
#[derive(Debug, Clone)]
pub struct CrawlDirectives {
    content: String,
}

impl CrawlDirectives {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Gets the crawl delay in seconds for the given user agent
    ///
    /// Directives are grouped under the preceding `User-agent` lines;
    /// multiple consecutive `User-agent` lines form one group. A delay
    /// declared for the specific agent wins over the wildcard group's.
    /// Fractional values are accepted.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The user agent string to match against agent groups
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no applicable crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let normalized_agent = user_agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut reading_group_header = false;
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        for line in self.content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A User-agent line after other directives starts a new group
                    if !reading_group_header {
                        group.clear();
                    }
                    group.push(value.to_lowercase());
                    reading_group_header = true;
                }
                "crawl-delay" => {
                    reading_group_header = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|agent| normalized_agent.contains(agent.as_str())) {
                        agent_delay = Some(delay);
                    } else if group.iter().any(|agent| agent == "*") {
                        wildcard_delay = Some(delay);
                    }
                }
                _ => {
                    // Allow, Disallow, Sitemap and friends end the group header
                    reading_group_header = false;
                }
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
