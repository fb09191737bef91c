//! Pure predicates: which resources are in scope, and which are stale.

use chrono::{DateTime, Utc};

use crate::contract::{BackupObject, Dataset, Resource};
use crate::error::BackupError;

/// Dataset category eligible for backup.
const BACKED_UP_KIND: &str = "public-transit";

/// Resource formats eligible for backup, compared case-insensitively.
const BACKED_UP_FORMATS: [&str; 2] = ["GTFS", "NETEX"];

/// True iff the resource should be considered for backup at all.
///
/// Pure function of (dataset.kind, resource.format): out-of-scope
/// resources cost nothing downstream, not even a bucket lookup.
pub fn in_scope(dataset: &Dataset, resource: &Resource) -> bool {
    if dataset.kind != BACKED_UP_KIND {
        return false;
    }
    match resource.format.as_deref() {
        Some(format) => BACKED_UP_FORMATS
            .iter()
            .any(|backed_up| backed_up.eq_ignore_ascii_case(format)),
        None => false,
    }
}

/// True iff the resource must be backed up again.
///
/// No prior object means stale. Otherwise the newest existing backup is
/// compared against the resource's declared update time; the backup is
/// fresh when it is at least as recent. A missing or unparseable declared
/// time is an input error, surfaced rather than defaulted.
pub fn is_stale(resource: &Resource, existing: &[BackupObject]) -> Result<bool, BackupError> {
    let Some(max_last_modified) = existing.iter().map(|o| o.last_modified).max() else {
        return Ok(true);
    };
    let updated_at = parse_updated_at(resource)?;
    Ok(max_last_modified < updated_at)
}

fn parse_updated_at(resource: &Resource) -> Result<DateTime<Utc>, BackupError> {
    let raw = resource
        .updated_at
        .as_deref()
        .ok_or_else(|| BackupError::MalformedTimestamp {
            resource: resource.title.clone(),
            raw: None,
        })?;
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| BackupError::MalformedTimestamp {
            resource: resource.title.clone(),
            raw: Some(raw.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dataset(kind: &str) -> Dataset {
        Dataset {
            id: "D1".to_string(),
            title: "Test dataset".to_string(),
            kind: kind.to_string(),
            resources: Vec::new(),
        }
    }

    fn resource(format: Option<&str>, updated_at: Option<&str>) -> Resource {
        Resource {
            title: "Lines".to_string(),
            url: "http://x/f.zip".to_string(),
            format: format.map(str::to_string),
            updated_at: updated_at.map(str::to_string),
            valid_from: None,
            valid_until: None,
        }
    }

    fn object(key: &str, year: i32, month: u32, day: u32) -> BackupObject {
        BackupObject {
            key: key.to_string(),
            last_modified: Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap(),
            size: Some(1),
            etag: None,
        }
    }

    #[test]
    fn other_kinds_are_never_in_scope() {
        for kind in ["", "air-quality", "bike-sharing"] {
            let dataset = dataset(kind);
            assert!(!in_scope(&dataset, &resource(Some("GTFS"), None)));
            assert!(!in_scope(&dataset, &resource(Some("NETEX"), None)));
        }
    }

    #[test]
    fn formats_compare_case_insensitively() {
        let dataset = dataset("public-transit");
        assert!(in_scope(&dataset, &resource(Some("GTFS"), None)));
        assert!(in_scope(&dataset, &resource(Some("gtfs"), None)));
        assert!(in_scope(&dataset, &resource(Some("NeTEx"), None)));
        assert!(!in_scope(&dataset, &resource(Some("csv"), None)));
        assert!(!in_scope(&dataset, &resource(None, None)));
    }

    #[test]
    fn no_history_is_always_stale() {
        let resource = resource(Some("GTFS"), None);
        assert!(is_stale(&resource, &[]).unwrap());
    }

    #[test]
    fn fresh_when_backup_is_at_least_as_recent() {
        let resource = resource(Some("GTFS"), Some("2023-01-01T00:00:00Z"));
        let newer = [object("Lines_a", 2023, 6, 1)];
        assert!(!is_stale(&resource, &newer).unwrap());

        let equal = [object("Lines_b", 2023, 1, 1)];
        assert!(!is_stale(&resource, &equal).unwrap());
    }

    #[test]
    fn stale_when_declared_update_is_newer() {
        let resource = resource(Some("GTFS"), Some("2023-06-01T00:00:00Z"));
        let older = [object("Lines_a", 2023, 1, 1)];
        assert!(is_stale(&resource, &older).unwrap());
    }

    #[test]
    fn freshness_survives_newer_backups() {
        // Adding an even newer backup can never flip a fresh resource back
        // to stale.
        let resource = resource(Some("GTFS"), Some("2023-01-01T00:00:00Z"));
        let mut objects = vec![object("Lines_a", 2023, 2, 1)];
        assert!(!is_stale(&resource, &objects).unwrap());

        objects.push(object("Lines_b", 2023, 3, 1));
        assert!(!is_stale(&resource, &objects).unwrap());
    }

    #[test]
    fn missing_update_time_is_an_error_when_history_exists() {
        let resource = resource(Some("GTFS"), None);
        let existing = [object("Lines_a", 2023, 1, 1)];
        let err = is_stale(&resource, &existing).unwrap_err();
        assert!(matches!(
            err,
            BackupError::MalformedTimestamp { raw: None, .. }
        ));
    }

    #[test]
    fn unparseable_update_time_is_an_error() {
        let resource = resource(Some("GTFS"), Some("last tuesday"));
        let existing = [object("Lines_a", 2023, 1, 1)];
        let err = is_stale(&resource, &existing).unwrap_err();
        assert!(matches!(
            err,
            BackupError::MalformedTimestamp { raw: Some(_), .. }
        ));
    }
}
