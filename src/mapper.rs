//! XML document to status-model extraction.
//!
//! Every extractor here is pure: it consumes an already-parsed element tree
//! and either returns a fully populated value or fails with
//! [`Error::Mapping`]. There is no partially-initialized output.

use crate::error::{Error, Result};
use crate::model::{BuildInformation, BuildStatus, JobNames, ProjectStatus};
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use url::Url;
use xmltree::{Element, XMLNode};

/// Name of the build-record container in a build detail document.
const BUILD_RECORD: &str = "freeStyleBuild";

/// Local wall-clock rendering of the Unix epoch.
///
/// The server reports build timestamps as epoch-milliseconds but its own UI
/// renders them in local time with the offset taken at the epoch. Build
/// times are reproduced with the same arithmetic: local epoch plus the raw
/// millisecond offset, applied exactly once.
pub(crate) fn local_epoch() -> NaiveDateTime {
    DateTime::UNIX_EPOCH.with_timezone(&Local).naive_local()
}

fn local_time_from_epoch_ms(ms: i64, url: &Url) -> Result<NaiveDateTime> {
    local_epoch()
        .checked_add_signed(TimeDelta::milliseconds(ms))
        .ok_or_else(|| Error::mapping(url, "timestamp", format!("epoch offset {ms}ms overflows")))
}

/// Closed translation table from the server's ball-color vocabulary.
///
/// An in-progress build keeps its previous color with an `_anime` suffix, so
/// the suffix is stripped before the lookup. Anything outside the table maps
/// to [`BuildStatus::Unknown`] rather than erroring; newer server versions
/// introduce colors this client has never seen.
pub fn status_from_color(color: &str) -> BuildStatus {
    match color.trim().trim_end_matches("_anime") {
        "blue" => BuildStatus::Success,
        "red" | "yellow" => BuildStatus::Failure,
        "aborted" | "disabled" | "grey" | "notbuilt" => BuildStatus::Unknown,
        _ => BuildStatus::Unknown,
    }
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |el| el.name == name)
}

fn child_text(parent: &Element, name: &str) -> Option<String> {
    parent
        .get_child(name)
        .and_then(Element::get_text)
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn required_text(parent: &Element, name: &str, url: &Url) -> Result<String> {
    child_text(parent, name)
        .ok_or_else(|| Error::mapping(url, name, "required element is absent or empty"))
}

fn required_i64(parent: &Element, name: &str, url: &Url) -> Result<i64> {
    let raw = required_text(parent, name, url)?;
    raw.parse::<i64>()
        .map_err(|_| Error::mapping(url, name, format!("`{raw}` is not an integer")))
}

/// Collect every named job from the listing document.
///
/// A `job` entry without a `name` child is skipped with a warning instead of
/// aborting the enumeration; the rest of the listing is still usable. An
/// empty listing is a valid state and yields an empty set.
pub fn job_names(listing: &Element, url: &Url) -> JobNames {
    let mut names = JobNames::new();
    for job in child_elements(listing, "job") {
        match child_text(job, "name") {
            Some(name) => {
                names.insert(name);
            }
            None => {
                tracing::warn!(url = %url, "job entry without a name element, skipping");
            }
        }
    }
    names
}

/// Map a job status document into [`ProjectStatus`].
///
/// Name and web URL are mandatory; timing fields are filled later by the
/// enrichment fetch and stay `None` here.
pub fn project_status(doc: &Element, url: &Url) -> Result<ProjectStatus> {
    let name = child_text(doc, "name")
        .or_else(|| child_text(doc, "displayName"))
        .ok_or_else(|| Error::mapping(url, "name", "required element is absent or empty"))?;
    let web_url = required_text(doc, "url", url)?;
    let last_build_status = child_text(doc, "color")
        .map(|color| status_from_color(&color))
        .unwrap_or(BuildStatus::Unknown);

    Ok(ProjectStatus {
        name,
        web_url,
        last_build_status,
        last_build_label: None,
        last_build_time: None,
    })
}

/// URL of the most recent build, when the status document names one.
pub fn last_build_url(doc: &Element) -> Option<String> {
    child_text(doc.get_child("lastBuild")?, "url")
}

/// Map a build detail document into [`BuildInformation`].
///
/// The six fields are all required; an absent container, absent child, or a
/// numeric field that does not parse fails the whole mapping.
pub fn build_information(doc: &Element, url: &Url) -> Result<BuildInformation> {
    let record = if doc.name == BUILD_RECORD {
        doc
    } else {
        doc.get_child(BUILD_RECORD).ok_or_else(|| {
            Error::mapping(url, BUILD_RECORD, "build record container is absent")
        })?
    };

    let timestamp_ms = required_i64(record, "timestamp", url)?;

    Ok(BuildInformation {
        timestamp: local_time_from_epoch_ms(timestamp_ms, url)?,
        number: required_text(record, "number", url)?,
        duration: required_i64(record, "duration", url)?,
        estimated_duration: required_i64(record, "estimatedDuration", url)?,
        full_display_name: required_text(record, "fullDisplayName", url)?,
        id: required_text(record, "id", url)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).unwrap()
    }

    fn url() -> Url {
        Url::parse("https://ci.example.com/job/demo/api/xml").unwrap()
    }

    const BUILD_DOC: &str = "<freeStyleBuild>\
        <timestamp>1358619163000</timestamp>\
        <number>42</number>\
        <duration>853</duration>\
        <estimatedDuration>-1</estimatedDuration>\
        <fullDisplayName>demo #42</fullDisplayName>\
        <id>2013-01-19_17-32-43</id>\
        </freeStyleBuild>";

    #[test]
    fn color_table_is_closed_over_unknowns() {
        assert_eq!(status_from_color("blue"), BuildStatus::Success);
        assert_eq!(status_from_color("blue_anime"), BuildStatus::Success);
        assert_eq!(status_from_color("red"), BuildStatus::Failure);
        assert_eq!(status_from_color("red_anime"), BuildStatus::Failure);
        assert_eq!(status_from_color("yellow"), BuildStatus::Failure);
        assert_eq!(status_from_color("aborted"), BuildStatus::Unknown);
        assert_eq!(status_from_color("notbuilt"), BuildStatus::Unknown);
        assert_eq!(status_from_color("chartreuse"), BuildStatus::Unknown);
        assert_eq!(status_from_color(""), BuildStatus::Unknown);
    }

    #[test]
    fn epoch_zero_maps_to_local_rendering_of_unix_epoch() {
        let doc = parse(
            "<freeStyleBuild>\
             <timestamp>0</timestamp>\
             <number>1</number>\
             <duration>0</duration>\
             <estimatedDuration>0</estimatedDuration>\
             <fullDisplayName>demo #1</fullDisplayName>\
             <id>1</id>\
             </freeStyleBuild>",
        );
        let info = build_information(&doc, &url()).unwrap();
        assert_eq!(info.timestamp, local_epoch());
    }

    #[test]
    fn timestamp_offset_is_applied_exactly_once() {
        let one_day_ms = 86_400_000;
        let doc = parse(&format!(
            "<freeStyleBuild>\
             <timestamp>{one_day_ms}</timestamp>\
             <number>1</number>\
             <duration>0</duration>\
             <estimatedDuration>0</estimatedDuration>\
             <fullDisplayName>demo #1</fullDisplayName>\
             <id>1</id>\
             </freeStyleBuild>"
        ));
        let info = build_information(&doc, &url()).unwrap();
        assert_eq!(
            info.timestamp - local_epoch(),
            TimeDelta::milliseconds(one_day_ms)
        );
    }

    #[test]
    fn build_information_extracts_all_fields() {
        let doc = parse(BUILD_DOC);
        let info = build_information(&doc, &url()).unwrap();
        assert_eq!(info.number, "42");
        assert_eq!(info.duration, 853);
        assert_eq!(info.estimated_duration, -1);
        assert_eq!(info.full_display_name, "demo #42");
        assert_eq!(info.id, "2013-01-19_17-32-43");
    }

    #[test]
    fn build_information_requires_the_container() {
        let doc = parse("<matrixBuild><timestamp>0</timestamp></matrixBuild>");
        let err = build_information(&doc, &url()).unwrap_err();
        assert!(matches!(err, Error::Mapping { .. }));
    }

    #[test]
    fn build_information_rejects_non_numeric_timestamp() {
        let doc = parse(
            "<freeStyleBuild>\
             <timestamp>yesterday</timestamp>\
             <number>1</number>\
             <duration>0</duration>\
             <estimatedDuration>0</estimatedDuration>\
             <fullDisplayName>demo #1</fullDisplayName>\
             <id>1</id>\
             </freeStyleBuild>",
        );
        let err = build_information(&doc, &url()).unwrap_err();
        assert!(matches!(err, Error::Mapping { element, .. } if &*element == "timestamp"));
    }

    #[test]
    fn build_information_rejects_missing_field() {
        let doc = parse(
            "<freeStyleBuild>\
             <timestamp>0</timestamp>\
             <number>1</number>\
             <duration>0</duration>\
             <estimatedDuration>0</estimatedDuration>\
             <fullDisplayName>demo #1</fullDisplayName>\
             </freeStyleBuild>",
        );
        let err = build_information(&doc, &url()).unwrap_err();
        assert!(matches!(err, Error::Mapping { element, .. } if &*element == "id"));
    }

    #[test]
    fn job_names_deduplicates_and_skips_nameless_entries() {
        let doc = parse(
            "<hudson>\
             <job><name>alpha</name></job>\
             <job><name>beta</name></job>\
             <job><name>alpha</name></job>\
             <job><url>https://ci.example.com/job/nameless/</url></job>\
             </hudson>",
        );
        let names = job_names(&doc, &url());
        assert_eq!(names.len(), 2);
        assert!(names.contains("alpha"));
        assert!(names.contains("beta"));
    }

    #[test]
    fn job_names_of_empty_listing_is_empty() {
        let doc = parse("<hudson></hudson>");
        assert!(job_names(&doc, &url()).is_empty());
    }

    #[test]
    fn project_status_requires_name_and_url() {
        let doc = parse("<freeStyleProject><color>blue</color></freeStyleProject>");
        let err = project_status(&doc, &url()).unwrap_err();
        assert!(matches!(err, Error::Mapping { element, .. } if &*element == "name"));

        let doc = parse("<freeStyleProject><name>demo</name></freeStyleProject>");
        let err = project_status(&doc, &url()).unwrap_err();
        assert!(matches!(err, Error::Mapping { element, .. } if &*element == "url"));
    }

    #[test]
    fn project_status_missing_color_is_unknown() {
        let doc = parse(
            "<freeStyleProject>\
             <name>demo</name>\
             <url>https://ci.example.com/job/demo/</url>\
             </freeStyleProject>",
        );
        let status = project_status(&doc, &url()).unwrap();
        assert_eq!(status.last_build_status, BuildStatus::Unknown);
        assert_eq!(status.last_build_label, None);
        assert_eq!(status.last_build_time, None);
    }

    #[test]
    fn last_build_url_comes_from_the_nested_element() {
        let doc = parse(
            "<freeStyleProject>\
             <name>demo</name>\
             <url>https://ci.example.com/job/demo/</url>\
             <lastBuild>\
             <number>42</number>\
             <url>https://ci.example.com/job/demo/42/</url>\
             </lastBuild>\
             </freeStyleProject>",
        );
        assert_eq!(
            last_build_url(&doc).as_deref(),
            Some("https://ci.example.com/job/demo/42/")
        );
    }
}
