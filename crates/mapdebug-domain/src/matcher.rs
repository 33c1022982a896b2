//! Exact and partial artifact-name matching, with distribution disambiguation.

use crate::issue::{DistMismatchEvidence, MatchFailure, NoUrlMatchEvidence, PartialMatchEvidence};
use crate::model::{Artifact, Distribution, Release};
use crate::store::{ReleaseStore, StoreError};
use mapdebug_types::UnifiedPath;

/// What a frame (or a source map reference) is being matched as.
#[derive(Clone, Copy, Debug)]
pub struct MatchTarget<'a> {
    /// The URL as reported; carried into evidence.
    pub abs_path: &'a str,
    pub unified: &'a UnifiedPath,
    pub filename: Option<&'a str>,
}

/// The event's distribution, resolved against the release once per request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventDistribution {
    /// Name reported by the event.
    pub name: Option<String>,
    /// The release's distribution of that name, if it has one.
    pub resolved: Option<Distribution>,
}

impl EventDistribution {
    /// Look the event's distribution up in the release. No lookup happens without a name.
    pub fn resolve<S>(store: &S, release: &Release, name: Option<&str>) -> Result<Self, StoreError>
    where
        S: ReleaseStore + ?Sized,
    {
        let Some(name) = name else {
            return Ok(Self::default());
        };
        Ok(Self {
            name: Some(name.to_string()),
            resolved: store.distribution(release, Some(name))?,
        })
    }

    /// The reported name without a lookup. Only valid for matches that have no exact-name
    /// candidate to verify.
    pub fn unresolved(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            resolved: None,
        }
    }
}

/// Check that `artifact` was uploaded for the event's distribution.
pub fn verify_distribution(
    dist: &EventDistribution,
    artifact: &Artifact,
    filename: Option<&str>,
) -> Result<(), DistMismatchEvidence> {
    if dist.name.is_none() && artifact.dist_id.is_none() {
        return Ok(());
    }
    let Some(resolved) = &dist.resolved else {
        return Err(DistMismatchEvidence::UnknownEventDist {
            event_dist: dist.name.clone(),
            filename: filename.map(str::to_string),
        });
    };
    if artifact.dist_id != Some(resolved.id) {
        return Err(DistMismatchEvidence::ArtifactDist {
            event_dist: resolved.id,
            artifact_dist: artifact.dist_id,
            filename: filename.map(str::to_string),
        });
    }
    Ok(())
}

/// Select the artifact named exactly like `target`.
///
/// Among several exact matches the first one (in index order) that passes distribution
/// verification wins. `max_names` caps the artifact names carried as evidence.
pub fn find_match<'a>(
    artifacts: &'a [Artifact],
    target: &MatchTarget<'_>,
    dist: &EventDistribution,
    max_names: Option<usize>,
) -> Result<&'a Artifact, MatchFailure> {
    let key = target.unified.as_str();
    let file_name = target.unified.file_name();

    let mut first_rejection = None;
    for artifact in artifacts.iter().filter(|a| a.name == key) {
        match verify_distribution(dist, artifact, target.filename) {
            Ok(()) => return Ok(artifact),
            Err(evidence) => {
                tracing::debug!(name = %artifact.name, dist_id = ?artifact.dist_id, "exact match rejected on distribution");
                first_rejection.get_or_insert(evidence);
            }
        }
    }

    if let Some(evidence) = first_rejection {
        return Err(MatchFailure::DistMismatch(evidence));
    }

    let names = artifact_names(artifacts, max_names);
    let filename = target.filename.map(str::to_string);

    if let Some(partial) = artifacts.iter().find(|a| a.name.ends_with(file_name)) {
        return Err(MatchFailure::PartialMatch(PartialMatchEvidence {
            abs_path: target.abs_path.to_string(),
            url_prefix: url_prefix(target.unified.url_path(), &partial.name),
            partial_match_path: partial.name.clone(),
            filename,
            unified_path: target.unified.clone(),
            artifact_names: names,
        }));
    }

    Err(MatchFailure::NoUrlMatch(NoUrlMatchEvidence {
        abs_path: target.abs_path.to_string(),
        filename,
        unified_path: target.unified.clone(),
        artifact_names: names,
    }))
}

fn artifact_names(artifacts: &[Artifact], max: Option<usize>) -> Vec<String> {
    artifacts
        .iter()
        .take(max.unwrap_or(usize::MAX))
        .map(|a| a.name.clone())
        .collect()
}

/// Suggest the upload prefix that would turn `partial_name` into a match for `url_path`.
///
/// When the URL path occurs inside the name, the suggestion is everything before it.
/// Otherwise it is the `/`-segments found in only one of the two (path-only segments
/// first), joined with `/` and ending with `/`.
pub fn url_prefix(url_path: &str, partial_name: &str) -> String {
    if let Some(pos) = partial_name.find(url_path) {
        return partial_name[..pos].to_string();
    }

    let path_segments = unique_segments(url_path);
    let name_segments = unique_segments(partial_name);

    let mut diff: Vec<&str> = path_segments
        .iter()
        .filter(|s| !name_segments.contains(s))
        .chain(name_segments.iter().filter(|s| !path_segments.contains(s)))
        .copied()
        .collect();
    diff.push("");
    diff.join("/")
}

fn unique_segments(s: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for seg in s.split('/') {
        if !out.contains(&seg) {
            out.push(seg);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{artifact, dist};

    fn target<'a>(abs_path: &'a str, unified: &'a UnifiedPath) -> MatchTarget<'a> {
        MatchTarget {
            abs_path,
            unified,
            filename: Some("bundle.js"),
        }
    }

    fn no_dist() -> EventDistribution {
        EventDistribution::default()
    }

    fn event_dist(name: &str, resolved: Option<Distribution>) -> EventDistribution {
        EventDistribution {
            name: Some(name.to_string()),
            resolved,
        }
    }

    #[test]
    fn exact_match_wins() {
        let key = UnifiedPath::from_url_path("/bundle.js");
        let artifacts = vec![
            artifact("~/static/bundle.js", "a", None),
            artifact("~/bundle.js", "b", None),
        ];
        let hit = find_match(&artifacts, &target("http://cdn/bundle.js", &key), &no_dist(), None)
            .unwrap();
        assert_eq!(hit.file.as_str(), "b");
    }

    #[test]
    fn first_exact_match_in_index_order_wins() {
        let key = UnifiedPath::from_url_path("/bundle.js");
        let artifacts = vec![
            artifact("~/bundle.js", "first", None),
            artifact("~/bundle.js", "second", None),
        ];
        let hit = find_match(&artifacts, &target("http://cdn/bundle.js", &key), &no_dist(), None)
            .unwrap();
        assert_eq!(hit.file.as_str(), "first");
    }

    #[test]
    fn distribution_picks_among_exact_matches() {
        let key = UnifiedPath::from_url_path("/bundle.js");
        let artifacts = vec![
            artifact("~/bundle.js", "ios", Some(11)),
            artifact("~/bundle.js", "android", Some(10)),
        ];
        let dist = event_dist("android", Some(dist(10, "android")));
        let hit = find_match(&artifacts, &target("http://cdn/bundle.js", &key), &dist, None)
            .unwrap();
        assert_eq!(hit.file.as_str(), "android");
    }

    #[test]
    fn event_without_dist_rejects_artifact_with_dist() {
        let key = UnifiedPath::from_url_path("/bundle.js");
        let artifacts = vec![artifact("~/bundle.js", "a", Some(10))];
        let err = find_match(&artifacts, &target("http://cdn/bundle.js", &key), &no_dist(), None)
            .unwrap_err();
        assert_eq!(
            err,
            MatchFailure::DistMismatch(DistMismatchEvidence::UnknownEventDist {
                event_dist: None,
                filename: Some("bundle.js".to_string()),
            })
        );
    }

    #[test]
    fn artifact_from_other_dist_is_rejected() {
        let key = UnifiedPath::from_url_path("/bundle.js");
        let artifacts = vec![artifact("~/bundle.js", "a", Some(11))];
        let dist = event_dist("android", Some(dist(10, "android")));
        let err = find_match(&artifacts, &target("http://cdn/bundle.js", &key), &dist, None)
            .unwrap_err();
        assert_eq!(
            err,
            MatchFailure::DistMismatch(DistMismatchEvidence::ArtifactDist {
                event_dist: 10,
                artifact_dist: Some(11),
                filename: Some("bundle.js".to_string()),
            })
        );
    }

    #[test]
    fn unknown_event_dist_is_rejected() {
        let artifact = artifact("~/bundle.js", "a", None);
        let err = verify_distribution(&event_dist("web", None), &artifact, None).unwrap_err();
        assert_eq!(
            err,
            DistMismatchEvidence::UnknownEventDist {
                event_dist: Some("web".to_string()),
                filename: None,
            }
        );
    }

    #[test]
    fn partial_match_reports_prefix_and_names() {
        let key = UnifiedPath::from_url_path("/bundle.js");
        let artifacts = vec![
            artifact("~/vendor.js", "v", None),
            artifact("~/static/app/bundle.js", "b", None),
        ];
        let err = find_match(&artifacts, &target("http://cdn/bundle.js", &key), &no_dist(), None)
            .unwrap_err();
        let MatchFailure::PartialMatch(ev) = err else {
            panic!("expected partial match, got {err:?}");
        };
        assert_eq!(ev.partial_match_path, "~/static/app/bundle.js");
        assert_eq!(ev.url_prefix, "~/static/app");
        assert_eq!(ev.unified_path.as_str(), "~/bundle.js");
        assert_eq!(ev.artifact_names, ["~/vendor.js", "~/static/app/bundle.js"]);
    }

    #[test]
    fn no_match_lists_capped_names() {
        let key = UnifiedPath::from_url_path("/app.js");
        let artifacts = vec![
            artifact("~/a.css", "a", None),
            artifact("~/b.css", "b", None),
            artifact("~/c.css", "c", None),
        ];
        let err = find_match(&artifacts, &target("http://cdn/app.js", &key), &no_dist(), Some(2))
            .unwrap_err();
        let MatchFailure::NoUrlMatch(ev) = err else {
            panic!("expected no match, got {err:?}");
        };
        assert_eq!(ev.abs_path, "http://cdn/app.js");
        assert_eq!(ev.artifact_names, ["~/a.css", "~/b.css"]);
    }

    #[test]
    fn empty_index_is_no_match() {
        let key = UnifiedPath::from_url_path("/app.js");
        let err = find_match(&[], &target("http://cdn/app.js", &key), &no_dist(), None).unwrap_err();
        assert!(matches!(err, MatchFailure::NoUrlMatch(_)));
    }

    #[test]
    fn url_prefix_substring_case() {
        assert_eq!(url_prefix("/bundle.js", "~/static/app/bundle.js"), "~/static/app");
        assert_eq!(url_prefix("/js/app.js", "~/js/app.js"), "~");
    }

    #[test]
    fn url_prefix_segment_difference_is_ordered() {
        // Path-only segments first, then name-only segments, then a trailing slash.
        assert_eq!(
            url_prefix("/assets/bundle.js", "~/static/bundle.js"),
            "/assets/~/static/"
        );
    }
}
