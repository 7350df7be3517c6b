//! Prometheus counters exposed at `GET /metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LoginLabels {
    /// `success` or `failure`.
    pub outcome: String,
}

pub struct Metrics {
    registry: Registry,
    http_requests: Family<HttpLabels, Counter>,
    logins: Family<LoginLabels, Counter>,
    posts_created: Counter,
    comments_created: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<HttpLabels, Counter>::default();
        registry.register(
            "board_http_requests",
            "HTTP requests by method and status class",
            http_requests.clone(),
        );
        let logins = Family::<LoginLabels, Counter>::default();
        registry.register("board_logins", "Login attempts by outcome", logins.clone());
        let posts_created = Counter::default();
        registry.register("board_posts_created", "Boards created", posts_created.clone());
        let comments_created = Counter::default();
        registry.register("board_comments_created", "Comments created", comments_created.clone());

        Self { registry, http_requests, logins, posts_created, comments_created }
    }

    /// Counts one response; `status` is collapsed to its class (`2xx`, `4xx`).
    pub fn record_request(&self, method: &str, status: u16) {
        let labels = HttpLabels { method: method.to_owned(), status: format!("{}xx", status / 100) };
        self.http_requests.get_or_create(&labels).inc();
    }

    pub fn record_login(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.logins.get_or_create(&LoginLabels { outcome: outcome.to_owned() }).inc();
    }

    pub fn post_created(&self) {
        self.posts_created.inc();
    }

    pub fn comment_created(&self) {
        self.comments_created.inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_recorded_counters() {
        let metrics = Metrics::new();
        metrics.record_request("GET", 200);
        metrics.record_request("GET", 204);
        metrics.record_login(false);
        metrics.post_created();

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"board_http_requests_total{method="GET",status="2xx"} 2"#));
        assert!(text.contains(r#"board_logins_total{outcome="failure"} 1"#));
        assert!(text.contains("board_posts_created_total 1"));
        assert!(text.contains("board_comments_created_total 0"));
    }
}
