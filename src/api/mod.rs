// Stats API module
// Exposes the request counters as a JSON object

mod response;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use percent_encoding::percent_decode_str;

use crate::error::FileError;
use crate::http;
use crate::stats::StatsRegistry;

pub use response::json_response;

/// Path of the stats endpoint on the file-serving listeners
pub const STATS_PATH: &str = "/stats";

/// Serve a counters snapshot
///
/// `?r=<substring>` keeps only the counters whose name contains it.
pub fn handle_stats(req: &Parts, stats: &StatsRegistry) -> Response<Full<Bytes>> {
    let is_head = match req.method {
        Method::GET => false,
        Method::HEAD => true,
        _ => return http::build_error_response(&FileError::MethodNotAllowed),
    };

    let filter = req.uri.query().and_then(|q| query_param(q, "r"));
    let snapshot = stats.filtered_snapshot(filter.as_deref());
    json_response(StatusCode::OK, &snapshot, is_head)
}

/// First value of `name` in a query string, percent- and `+`-decoded
fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then(|| {
            let value = value.replace('+', " ");
            percent_decode_str(&value).decode_utf8_lossy().into_owned()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;

    fn parts(method: Method, uri: &str) -> Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    async fn json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        use http_body_util::BodyExt;
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("r=fsOK", "r").as_deref(), Some("fsOK"));
        assert_eq!(query_param("x=1&r=Not%20", "r").as_deref(), Some("Not "));
        assert_eq!(query_param("r", "r").as_deref(), Some(""));
        assert_eq!(query_param("rr=1", "r"), None);
    }

    #[tokio::test]
    async fn test_handle_stats_filters() {
        let stats = StatsRegistry::new();
        stats.increment(StatusCode::OK, 42);

        let all = json(handle_stats(&parts(Method::GET, "/stats"), &stats)).await;
        assert_eq!(all.as_object().unwrap().len(), 6);
        assert_eq!(all["fsCalls"], 1);
        assert_eq!(all["fsResponseBodyBytes"], 42);

        let some = json(handle_stats(&parts(Method::GET, "/stats?r=Responses"), &stats)).await;
        let keys: Vec<_> = some.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.iter().all(|k| k.contains("Responses")));
    }

    #[test]
    fn test_handle_stats_methods() {
        let stats = StatsRegistry::new();
        let head = handle_stats(&parts(Method::HEAD, "/stats"), &stats);
        assert_eq!(head.status(), StatusCode::OK);
        let post = handle_stats(&parts(Method::POST, "/stats"), &stats);
        assert_eq!(post.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
