//! Verify query-string assembly against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector lists query pairs in insertion order together with the
//! expected query string and full URL, both as returned by `Request` and as
//! carried by the built `HttpRequest`.

use apireq_core::{HttpMethod, Request};

#[test]
fn query_test_vectors() {
    let raw = include_str!("../../test-vectors/query.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let base_url = case["base_url"].as_str().unwrap();

        let mut req = Request::new(Some(base_url));
        for pair in case["query"].as_array().unwrap() {
            let pair = pair.as_array().unwrap();
            req.add_query(pair[0].as_str().unwrap(), pair[1].as_str().unwrap());
        }

        assert_eq!(
            req.query_string(),
            case["expected_query_string"].as_str().unwrap(),
            "{name}: query string"
        );
        assert!(!req.query_string().ends_with('&'), "{name}: trailing &");
        assert_eq!(req.url(), case["expected_url"].as_str().unwrap(), "{name}: url");

        let built = req.build_request().unwrap();
        assert_eq!(built.method, HttpMethod::Get, "{name}: method");
        assert_eq!(built.url, case["expected_url"].as_str().unwrap(), "{name}: built url");
        assert!(built.body.is_none(), "{name}: body should be None");
    }
}
