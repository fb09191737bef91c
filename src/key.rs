//! Object addressing: bucket ids, sanitized titles, ingestion keys.
//!
//! These formats are shared with prior backup history and must stay
//! bit-compatible: buckets are `dataset_{id}`, object keys are
//! `{sanitized_title}_{YYYYMMDDTHHMMSS}`. The sanitized-title component is
//! the logical-resource prefix grouping all historical backups of one
//! resource.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Bucket holding all backups for one dataset. Deterministic, so history
/// accumulates in the same bucket across runs.
pub fn bucket_id(dataset_id: &str) -> String {
    format!("dataset_{dataset_id}")
}

/// Sanitize a resource title into its key prefix: spaces, slashes and
/// quotes become underscores, accented letters fold to their ASCII base,
/// anything else outside ASCII becomes an underscore.
pub fn sanitize_title(title: &str) -> String {
    title.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        ' ' | '/' | '\'' => '_',
        'à' | 'â' | 'ä' => 'a',
        'À' | 'Â' | 'Ä' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'î' | 'ï' => 'i',
        'Î' | 'Ï' => 'I',
        'ô' | 'ö' => 'o',
        'Ô' | 'Ö' => 'O',
        'ù' | 'û' | 'ü' => 'u',
        'Ù' | 'Û' | 'Ü' => 'U',
        c if c.is_ascii() => c,
        _ => '_',
    }
}

/// Full object key for one ingestion of a resource.
pub fn object_key(title: &str, ingested_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        sanitize_title(title),
        ingested_at.format("%Y%m%dT%H%M%S")
    )
}

/// Issues ingestion instants that never repeat within one process.
///
/// Keys carry second resolution, so two ingestions of the same title in
/// the same second would collide; the clock bumps to the next unused
/// second instead.
#[derive(Debug, Default)]
pub struct KeyClock {
    last: AtomicI64,
}

impl KeyClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next ingestion instant: wall-clock now, or one second past the
    /// previously issued instant if now would repeat one.
    pub fn next(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let issued = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, issued, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    return DateTime::from_timestamp(issued, 0)
                        .expect("issued second fits in a timestamp")
                }
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn bucket_id_is_prefixed_dataset_id() {
        assert_eq!(bucket_id("5f9196"), "dataset_5f9196");
    }

    #[test]
    fn sanitize_replaces_separators_and_quotes() {
        assert_eq!(sanitize_title("GTFS du réseau"), "GTFS_du_reseau");
        assert_eq!(sanitize_title("Lignes/été"), "Lignes_ete");
        assert_eq!(sanitize_title("Côte d'Azur"), "Cote_d_Azur");
    }

    #[test]
    fn sanitize_folds_outside_ascii_to_underscore() {
        assert_eq!(sanitize_title("œuvre"), "_uvre");
        assert_eq!(sanitize_title("horaires — v2"), "horaires___v2");
    }

    #[test]
    fn object_key_carries_compact_timestamp() {
        let ingested_at = Utc.with_ymd_and_hms(2023, 1, 1, 12, 30, 5).unwrap();
        assert_eq!(object_key("Lines", ingested_at), "Lines_20230101T123005");
    }

    #[test]
    fn object_key_starts_with_logical_prefix() {
        let ingested_at = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let title = "Réseau de bus / hiver";
        assert!(object_key(title, ingested_at).starts_with(&sanitize_title(title)));
    }

    #[test]
    fn clock_never_repeats_within_a_process() {
        let clock = KeyClock::new();
        let mut keys = HashSet::new();
        for _ in 0..100 {
            assert!(keys.insert(object_key("Lines", clock.next())));
        }
    }
}
