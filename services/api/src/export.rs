//! CSV rendering of attendance history

use attendance::analytics::HistoryEntry;

const HEADER: [&str; 2] = ["Subject", "Marked At (IST)"];

/// One row per entry, times in the display timezone
pub fn history_csv(entries: &[HistoryEntry]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for entry in entries {
        writer.write_record([entry.subject.as_str(), entry.marked_at_local.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_history_csv() {
        let entries = vec![
            HistoryEntry {
                subject: "dsp".into(),
                marked_at: Utc.with_ymd_and_hms(2026, 3, 2, 4, 2, 0).unwrap(),
                marked_at_local: "2026-03-02 09:32:00".into(),
            },
            HistoryEntry {
                subject: "analog electronics, lab".into(),
                marked_at: Utc.with_ymd_and_hms(2026, 3, 3, 5, 0, 0).unwrap(),
                marked_at_local: "2026-03-03 10:30:00".into(),
            },
        ];

        let csv = history_csv(&entries).unwrap();
        assert_eq!(
            csv,
            "Subject,Marked At (IST)\n\
             dsp,2026-03-02 09:32:00\n\
             \"analog electronics, lab\",2026-03-03 10:30:00\n"
        );
    }
}
