//! Domain-name helpers used by host resolution and payload generation.

/// Expand a hostname into every parent-domain suffix it contains, from the
/// two-label root up to the full hostname.
///
/// `"a.b.c.example.com"` becomes `["example.com", "c.example.com",
/// "b.c.example.com", "a.b.c.example.com"]`. Inputs with fewer than two
/// separators (a bare label or `label.tld`) are returned unchanged as a
/// single-entry list; an empty input yields an empty list.
pub fn domain_suffixes(host: &str) -> Vec<String> {
    if host.is_empty() {
        return Vec::new();
    }
    if host.matches('.').count() < 2 {
        return vec![host.to_string()];
    }
    let labels: Vec<&str> = host.split('.').collect();
    let mut suffixes = Vec::with_capacity(labels.len() - 1);
    for i in (0..labels.len() - 1).rev() {
        suffixes.push(labels[i..].join("."));
    }
    suffixes
}

/// Rewrite a request URL so that every occurrence of the matched host domain
/// is replaced with its configured redirect domain. The substitution covers
/// the whole URL, not just the authority part.
pub fn swap_host(url: &str, host_domain: &str, redirect_domain: &str) -> String {
    url.replace(host_domain, redirect_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nothing() {
        assert!(domain_suffixes("").is_empty());
    }

    #[test]
    fn single_label_passes_through() {
        assert_eq!(domain_suffixes("hello"), vec!["hello"]);
    }

    #[test]
    fn two_labels_pass_through() {
        assert_eq!(domain_suffixes("hello.com"), vec!["hello.com"]);
    }

    #[test]
    fn three_labels_expand_from_root() {
        assert_eq!(
            domain_suffixes("world.hello.com"),
            vec!["hello.com", "world.hello.com"]
        );
    }

    #[test]
    fn deep_host_expands_in_order() {
        let suffixes = domain_suffixes("a.b.c.d.e.hello.com");
        assert_eq!(suffixes.len(), 6);
        assert_eq!(suffixes.first().unwrap(), "hello.com");
        assert_eq!(suffixes.last().unwrap(), "a.b.c.d.e.hello.com");
        assert_eq!(
            suffixes,
            vec![
                "hello.com",
                "e.hello.com",
                "d.e.hello.com",
                "c.d.e.hello.com",
                "b.c.d.e.hello.com",
                "a.b.c.d.e.hello.com",
            ]
        );
    }

    #[test]
    fn swap_host_replaces_every_occurrence() {
        let rewritten = swap_host(
            "https://login.lure.io/landing?next=lure.io/home",
            "lure.io",
            "example.com",
        );
        assert_eq!(
            rewritten,
            "https://login.example.com/landing?next=example.com/home"
        );
    }

    #[test]
    fn swap_host_without_match_is_identity() {
        assert_eq!(
            swap_host("https://other.net/x", "lure.io", "example.com"),
            "https://other.net/x"
        );
    }
}
