use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// The canonical ordered catalog of bookable time slots for a clinic day.
/// Identical for every dentist and every unit; slot labels are opaque
/// tokens everywhere except `slot_bounds`, which derives appointment
/// start/end times from them.
pub const SLOT_LABELS: [&str; 8] = [
    "10:00-11:00",
    "11:00-12:00",
    "12:00-13:00",
    "13:00-14:00",
    "14:00-15:00",
    "15:00-16:00",
    "16:00-17:00",
    "17:00-18:00",
];

pub fn is_catalog_slot(label: &str) -> bool {
    SLOT_LABELS.contains(&label)
}

/// Keeps only catalog slots, deduplicated, in catalog order.
pub fn normalize_slots<S: AsRef<str>>(slots: &[S]) -> Vec<String> {
    SLOT_LABELS
        .iter()
        .filter(|label| slots.iter().any(|s| s.as_ref() == **label))
        .map(|label| (*label).to_string())
        .collect()
}

/// Derive the start/end timestamps of a slot on the given date by splitting
/// the label on "-". Fails on labels not of the form "HH:MM-HH:MM".
pub fn slot_bounds(date: NaiveDate, label: &str) -> Result<(NaiveDateTime, NaiveDateTime), String> {
    let (start_str, end_str) = label
        .split_once('-')
        .ok_or_else(|| format!("malformed slot label: {}", label))?;

    let start = NaiveTime::parse_from_str(start_str, "%H:%M")
        .map_err(|_| format!("malformed slot start time: {}", start_str))?;
    let end = NaiveTime::parse_from_str(end_str, "%H:%M")
        .map_err(|_| format!("malformed slot end time: {}", end_str))?;

    if end <= start {
        return Err(format!("slot end must be after start: {}", label));
    }

    Ok((date.and_time(start), date.and_time(end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_ordered_and_unique() {
        for pair in SLOT_LABELS.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn membership_is_exact_string_match() {
        assert!(is_catalog_slot("13:00-14:00"));
        assert!(!is_catalog_slot("13:00 - 14:00"));
        assert!(!is_catalog_slot("09:00-10:00"));
        assert!(!is_catalog_slot(""));
    }

    #[test]
    fn normalize_dedupes_and_keeps_catalog_order() {
        let input = vec!["17:00-18:00", "10:00-11:00", "17:00-18:00", "bogus"];
        assert_eq!(
            normalize_slots(&input),
            vec!["10:00-11:00".to_string(), "17:00-18:00".to_string()]
        );
    }

    #[test]
    fn slot_bounds_splits_on_separator() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let (start, end) = slot_bounds(date, "13:00-14:00").unwrap();
        assert_eq!(start, date.and_hms_opt(13, 0, 0).unwrap());
        assert_eq!(end, date.and_hms_opt(14, 0, 0).unwrap());
    }

    #[test]
    fn slot_bounds_rejects_malformed_labels() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(slot_bounds(date, "13:00").is_err());
        assert!(slot_bounds(date, "afternoon-ish").is_err());
        assert!(slot_bounds(date, "14:00-13:00").is_err());
    }

    #[test]
    fn every_catalog_slot_has_valid_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for label in SLOT_LABELS {
            assert!(slot_bounds(date, label).is_ok(), "bad catalog slot {}", label);
        }
    }
}
