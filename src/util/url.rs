use crate::Error;
use url::Url;

pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw).map_err(|err| Error::InvalidConfig {
        message: "invalid base_url".into(),
        source: Some(Box::new(err)),
    })?;

    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::InvalidConfig {
            message: "base_url must not include query or fragment".into(),
            source: None,
        });
    }

    let path = url.path();
    if path != "/" && !path.ends_with('/') {
        url.set_path(&format!("{path}/"));
    }
    Ok(url)
}

pub(crate) fn endpoint_url<'a, I>(base_url: &Url, segments: I) -> Result<Url, Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| Error::InvalidConfig {
            message: "base_url must be a hierarchical URL".into(),
            source: None,
        })?;
        path.pop_if_empty();
        for seg in segments {
            path.push(seg);
        }
    }
    Ok(url)
}

/// Resolve a caller-supplied job or build URL to its `api/xml` endpoint.
///
/// Hosts hand over either the job page URL or the already-suffixed API URL;
/// both forms resolve to the same endpoint.
pub(crate) fn api_xml_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw).map_err(|err| Error::InvalidConfig {
        message: "invalid job URL".into(),
        source: Some(Box::new(err)),
    })?;
    if url.path().trim_end_matches('/').ends_with("/api/xml") {
        return Ok(url);
    }
    endpoint_url(&url, ["api", "xml"])
}

pub(crate) fn sanitize_url_for_error(url: &Url) -> Url {
    let mut safe = url.clone();
    safe.set_query(None);
    safe.set_fragment(None);
    let _ = safe.set_username("");
    let _ = safe.set_password(None);
    safe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_appends_trailing_slash() {
        let base = normalize_base_url("https://example.com/jenkins").unwrap();
        assert_eq!(base.as_str(), "https://example.com/jenkins/");
    }

    #[test]
    fn normalize_rejects_query() {
        let err = normalize_base_url("https://example.com/?depth=1").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn endpoint_url_encodes_path_segments() {
        let base = normalize_base_url("https://example.com/jenkins").unwrap();
        let url = endpoint_url(&base, ["job", "a b", "api", "xml"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/jenkins/job/a%20b/api/xml"
        );
    }

    #[test]
    fn api_xml_url_appends_suffix_once() {
        let url = api_xml_url("https://builds.apache.org/job/Hadoop-1-win/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://builds.apache.org/job/Hadoop-1-win/api/xml"
        );

        let already = api_xml_url("https://builds.apache.org/job/Hadoop-1-win/api/xml").unwrap();
        assert_eq!(
            already.as_str(),
            "https://builds.apache.org/job/Hadoop-1-win/api/xml"
        );
    }

    #[test]
    fn sanitize_strips_userinfo_and_query() {
        let url = Url::parse("https://user:pw@example.com/job/x/api/xml?tree=jobs#f").unwrap();
        let safe = sanitize_url_for_error(&url);
        assert_eq!(safe.as_str(), "https://example.com/job/x/api/xml");
    }
}
