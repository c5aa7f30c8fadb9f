//! Download and archive entry names

use chrono::{DateTime, Utc};
use prelude_common::time;
use std::collections::HashMap;

use super::ExportFormat;

/// Replace every character outside `[A-Za-z0-9]` with `_`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// File name for one exported project
///
/// DAW setup sheets use a `_daw_setup` suffix; every other format uses `_prelude`.
pub fn file_name(project_name: &str, format: ExportFormat) -> String {
    let stem = sanitize_name(project_name);
    match format {
        ExportFormat::Csv | ExportFormat::Text => format!("{}_daw_setup.{}", stem, format.extension()),
        _ => format!("{}_prelude.{}", stem, format.extension()),
    }
}

/// Bulk archive name, dated by the day of `at`
pub fn archive_name(at: DateTime<Utc>) -> String {
    format!("prelude_export_{}.zip", time::iso_date(at))
}

/// Hands out archive entry names, suffixing repeats with `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct EntryNames {
    seen: HashMap<String, usize>,
}

impl EntryNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, name: &str) -> String {
        let count = self.seen.entry(name.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return name.to_string();
        }

        let candidate = match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{}_{}.{}", stem, count, ext),
            None => format!("{}_{}", name, count),
        };

        // A suffixed name can itself collide with a later literal name
        if self.seen.contains_key(&candidate) {
            return self.claim(&candidate);
        }
        self.seen.insert(candidate.clone(), 1);
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_replaces_each_character() {
        assert_eq!(sanitize_name("Live @ Blue Note!"), "Live___Blue_Note_");
        assert_eq!(sanitize_name("Café"), "Caf_");
        assert_eq!(sanitize_name("Album2025"), "Album2025");
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name("My Album", ExportFormat::Pdf), "My_Album_prelude.pdf");
        assert_eq!(file_name("My Album", ExportFormat::Reaper), "My_Album_prelude.rpp");
        assert_eq!(file_name("My Album", ExportFormat::Csv), "My_Album_daw_setup.csv");
        assert_eq!(file_name("My Album", ExportFormat::Text), "My_Album_daw_setup.txt");
    }

    #[test]
    fn test_archive_name_uses_day() {
        let at = Utc.with_ymd_and_hms(2025, 6, 30, 23, 15, 0).unwrap();
        assert_eq!(archive_name(at), "prelude_export_2025-06-30.zip");
    }

    #[test]
    fn test_entry_names_suffix_repeats() {
        let mut names = EntryNames::new();
        assert_eq!(names.claim("A_prelude.pdf"), "A_prelude.pdf");
        assert_eq!(names.claim("A_prelude.pdf"), "A_prelude_2.pdf");
        assert_eq!(names.claim("A_prelude.pdf"), "A_prelude_3.pdf");
        assert_eq!(names.claim("B_prelude.pdf"), "B_prelude.pdf");
    }
}
