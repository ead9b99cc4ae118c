use url::Url;

/// Appends `path` to whatever path prefix `base` already carries.
///
/// Query and fragment of `base` are dropped.
pub(crate) fn build_provider_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{path}"));
    url.set_query(None);
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_root_and_prefixed_bases() {
        let root = Url::parse("https://api.openai.com").expect("url");
        assert_eq!(
            build_provider_url(&root, "/v1/chat/completions").as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        let prefixed = Url::parse("https://gateway.local/openai?x=1").expect("url");
        assert_eq!(
            build_provider_url(&prefixed, "/v1/models").as_str(),
            "https://gateway.local/openai/v1/models"
        );
    }
}
