//! Startup-built, read-only mapping from path prefix to upstream.

use url::Url;

use crate::config::Config;

/// A single registered route: prefix, upstream base URL, auth requirement.
#[derive(Debug, Clone)]
pub struct Route {
    /// URL path prefix, without a trailing slash (e.g. `/api/tasks`).
    pub prefix: &'static str,
    /// Upstream base URL requests are forwarded to.
    pub upstream: Url,
    /// Whether the authentication gate applies.
    pub requires_auth: bool,
}

/// Ordered mapping from URL path prefix to upstream.
///
/// Built once from configuration, immutable for the process lifetime.
/// Matching is longest-prefix: overlapping prefixes cannot be ambiguous
/// regardless of declaration order.
#[derive(Debug)]
pub struct RouteTable {
    // Sorted by prefix length, longest first.
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build the route table from configuration.
    ///
    /// This is the single declarative source of route definitions.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let entries: [(&'static str, &str, bool); 3] = [
            ("/api/auth", &config.auth_service_url, false),
            ("/api/tasks", &config.task_service_url, true),
            ("/api/billing", &config.billing_service_url, true),
        ];

        let mut routes = Vec::with_capacity(entries.len());
        for (prefix, upstream, requires_auth) in entries {
            let upstream = Url::parse(upstream)
                .map_err(|e| format!("invalid upstream URL for {}: {}", prefix, e))?;
            routes.push(Route {
                prefix,
                upstream,
                requires_auth,
            });
        }

        routes.sort_by_key(|r| std::cmp::Reverse(r.prefix.len()));

        Ok(Self { routes })
    }

    /// Select the longest registered prefix matching the request path.
    ///
    /// Matches are segment-aware: `/api/auth` matches `/api/auth` and
    /// `/api/auth/login` but not `/api/authx`.
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| {
            path == route.prefix
                || (path.len() > route.prefix.len()
                    && path.starts_with(route.prefix)
                    && path.as_bytes()[route.prefix.len()] == b'/')
        })
    }

    /// All registered routes, longest prefix first.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> RouteTable {
        let config = Config {
            port: 3000,
            app_env: "development".to_string(),
            jwt_secret: Some("secret".to_string()),
            auth_service_url: "http://localhost:4000".to_string(),
            task_service_url: "http://localhost:4001".to_string(),
            billing_service_url: "http://localhost:4002".to_string(),
            rate_limit_window_secs: 900,
            rate_limit_max_requests: 100,
            error_log_path: "error.log".to_string(),
            upstream_timeout_ms: 30_000,
            upstream_connect_timeout_ms: 5_000,
            rust_log: "info".to_string(),
        };
        RouteTable::from_config(&config).unwrap()
    }

    #[test]
    fn matches_exact_prefix_and_subpaths() {
        let table = table();

        let route = table.match_path("/api/tasks").unwrap();
        assert_eq!(route.prefix, "/api/tasks");
        assert!(route.requires_auth);

        let route = table.match_path("/api/tasks/42").unwrap();
        assert_eq!(route.prefix, "/api/tasks");

        let route = table.match_path("/api/auth/login").unwrap();
        assert_eq!(route.prefix, "/api/auth");
        assert!(!route.requires_auth);
    }

    #[test]
    fn respects_segment_boundaries() {
        let table = table();
        assert!(table.match_path("/api/authx").is_none());
        assert!(table.match_path("/api/tasksy/1").is_none());
    }

    #[test]
    fn unmatched_paths_return_none() {
        let table = table();
        assert!(table.match_path("/nonexistent").is_none());
        assert!(table.match_path("/").is_none());
        assert!(table.match_path("/api").is_none());
    }

    #[test]
    fn longest_prefix_wins_regardless_of_declaration_order() {
        // Synthesize overlapping prefixes directly.
        let routes = vec![
            Route {
                prefix: "/api",
                upstream: Url::parse("http://localhost:4000").unwrap(),
                requires_auth: false,
            },
            Route {
                prefix: "/api/tasks",
                upstream: Url::parse("http://localhost:4001").unwrap(),
                requires_auth: true,
            },
        ];
        let mut routes = routes;
        routes.sort_by_key(|r| std::cmp::Reverse(r.prefix.len()));
        let table = RouteTable { routes };

        assert_eq!(table.match_path("/api/tasks/1").unwrap().prefix, "/api/tasks");
        assert_eq!(table.match_path("/api/other").unwrap().prefix, "/api");
    }

    #[test]
    fn upstream_urls_are_validated() {
        let mut config = Config {
            port: 3000,
            app_env: "development".to_string(),
            jwt_secret: None,
            auth_service_url: "http://localhost:4000".to_string(),
            task_service_url: "://broken".to_string(),
            billing_service_url: "http://localhost:4002".to_string(),
            rate_limit_window_secs: 900,
            rate_limit_max_requests: 100,
            error_log_path: "error.log".to_string(),
            upstream_timeout_ms: 30_000,
            upstream_connect_timeout_ms: 5_000,
            rust_log: "info".to_string(),
        };
        assert!(RouteTable::from_config(&config).is_err());

        config.task_service_url = "http://localhost:4001".to_string();
        assert!(RouteTable::from_config(&config).is_ok());
    }
}
