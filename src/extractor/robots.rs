//! robots.txt parsing and path matching.

use regex::Regex;

#[derive(Debug, Clone)]
enum RuleMatcher {
    Prefix,
    Pattern(Regex),
    Unmatchable,
}

/// An `Allow`/`Disallow` path, with `*` and `$` patterns compiled at parse time.
#[derive(Debug, Clone)]
pub struct PathRule {
    pub path: String,
    matcher: RuleMatcher,
}

impl PathRule {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let matcher = if !path.contains('*') && !path.ends_with('$') {
            RuleMatcher::Prefix
        } else {
            match Regex::new(&wildcard_pattern(&path)) {
                Ok(re) => RuleMatcher::Pattern(re),
                Err(e) => {
                    tracing::warn!("[ROBOTS] Ignoring rule {:?}: {}", path, e);
                    RuleMatcher::Unmatchable
                }
            }
        };
        Self { path, matcher }
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            RuleMatcher::Prefix => path.starts_with(&self.path),
            RuleMatcher::Pattern(re) => re.is_match(path),
            RuleMatcher::Unmatchable => false,
        }
    }
}

impl PartialEq for PathRule {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsGroup {
    pub user_agents: Vec<String>,
    pub allow: Vec<PathRule>,
    pub disallow: Vec<PathRule>,
    pub crawl_delay: Option<f64>,
}

impl RobotsGroup {
    fn has_rules(&self) -> bool {
        !self.allow.is_empty() || !self.disallow.is_empty() || self.crawl_delay.is_some()
    }

    fn matches_agent(&self, agent: &str) -> bool {
        self.user_agents
            .iter()
            .any(|ua| ua.eq_ignore_ascii_case(agent))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsTxt {
    pub groups: Vec<RobotsGroup>,
    pub sitemaps: Vec<String>,
    pub issues: Vec<String>,
}

impl RobotsTxt {
    pub fn parse(text: &str) -> Self {
        let mut robots = RobotsTxt::default();
        let mut current: Option<RobotsGroup> = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                robots
                    .issues
                    .push(format!("Line {}: Invalid format, missing colon", line_no));
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().to_string();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group.
                    if current.as_ref().map(|g| g.has_rules()).unwrap_or(false) {
                        robots.groups.extend(current.take());
                    }
                    current
                        .get_or_insert_with(RobotsGroup::default)
                        .user_agents
                        .push(value);
                }
                "allow" | "disallow" | "crawl-delay" => {
                    let Some(group) = current.as_mut() else {
                        robots
                            .issues
                            .push(format!("Line {}: {} before any User-agent", line_no, key));
                        continue;
                    };
                    match key.as_str() {
                        "allow" => group.allow.push(PathRule::new(value)),
                        "disallow" => group.disallow.push(PathRule::new(value)),
                        _ => match value.parse::<f64>() {
                            Ok(delay) => group.crawl_delay = Some(delay),
                            Err(_) => robots
                                .issues
                                .push(format!("Line {}: Invalid crawl-delay value", line_no)),
                        },
                    }
                }
                "sitemap" => robots.sitemaps.push(value),
                _ => {}
            }
        }

        robots.groups.extend(current);
        robots
    }

    /// The group governing `agent`: its own group if named, otherwise `*`.
    pub fn group_for(&self, agent: &str) -> Option<&RobotsGroup> {
        self.groups
            .iter()
            .find(|g| g.matches_agent(agent))
            .or_else(|| self.groups.iter().find(|g| g.matches_agent("*")))
    }

    /// Longest matching rule wins; `Allow` wins ties.
    pub fn is_path_blocked(&self, agent: &str, path: &str) -> bool {
        let Some(group) = self.group_for(agent) else {
            return false;
        };

        let longest = |rules: &[PathRule]| {
            rules
                .iter()
                .filter(|r| !r.path.is_empty() && r.matches(path))
                .map(|r| r.path.len())
                .max()
        };

        match (longest(&group.disallow), longest(&group.allow)) {
            (Some(d), Some(a)) => d > a,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

fn wildcard_pattern(rule: &str) -> String {
    let (body, anchored) = match rule.strip_suffix('$') {
        Some(body) => (body, true),
        None => (rule, false),
    };
    let pattern = body
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{}{}", pattern, if anchored { "$" } else { "" })
}
