//! Query parameter passthrough with an optional deny-list.

use std::collections::HashSet;

use url::Url;

/// Copies inbound query parameters onto the backend URL.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    denied: HashSet<String>,
}

impl QueryFilter {
    /// Names are compared exactly (case-sensitive) after trimming.
    pub fn new<I, S>(denied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denied: denied
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .collect(),
        }
    }

    pub fn is_denied(&self, key: &str) -> bool {
        self.denied.contains(key)
    }

    /// Append every retained pair of the inbound `query` to `target`.
    ///
    /// Pairs are appended, never set: order and repeated keys survive.
    pub fn apply(&self, query: Option<&str>, target: &mut Url) {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return;
        };

        let mut retained = url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| !self.is_denied(key))
            .peekable();
        if retained.peek().is_none() {
            return;
        }

        let mut pairs = target.query_pairs_mut();
        for (key, value) in retained {
            pairs.append_pair(&key, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://assets.s3.us-east-1.amazonaws.com/key").unwrap()
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_drops_denied_keys() {
        let filter = QueryFilter::new(["token"]);
        let mut url = target();
        filter.apply(Some("token=abc&w=100"), &mut url);
        assert_eq!(url.query(), Some("w=100"));
    }

    #[test]
    fn test_no_deny_list_copies_everything() {
        let filter = QueryFilter::default();
        let mut url = target();
        filter.apply(Some("b=2&a=1&b=3"), &mut url);
        assert_eq!(url.query(), Some("b=2&a=1&b=3"));
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let filter = QueryFilter::new(["sig"]);
        let mut url = target();
        filter.apply(Some("x=1&sig=s&y=2&x=3&sig=t&x=1"), &mut url);
        assert_eq!(
            pairs(&url),
            vec![
                ("x".to_string(), "1".to_string()),
                ("y".to_string(), "2".to_string()),
                ("x".to_string(), "3".to_string()),
                ("x".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_match_is_exact_and_case_sensitive() {
        let filter = QueryFilter::new([" Token "]);
        assert!(filter.is_denied("Token"));
        assert!(!filter.is_denied("token"));
        assert!(!filter.is_denied("Tokens"));
    }

    #[test]
    fn test_all_params_removed_leaves_no_query() {
        let filter = QueryFilter::new(["token", "auth"]);
        let mut url = target();
        filter.apply(Some("token=1&auth=2"), &mut url);
        assert_eq!(url.query(), None);
        assert_eq!(url.as_str(), "https://assets.s3.us-east-1.amazonaws.com/key");
    }

    #[test]
    fn test_values_are_decoded_and_reencoded() {
        let filter = QueryFilter::default();
        let mut url = target();
        filter.apply(Some("name=a%20b&empty="), &mut url);
        assert_eq!(
            pairs(&url),
            vec![
                ("name".to_string(), "a b".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_missing_query() {
        let filter = QueryFilter::default();
        let mut url = target();
        filter.apply(None, &mut url);
        filter.apply(Some(""), &mut url);
        assert_eq!(url.query(), None);
    }
}
