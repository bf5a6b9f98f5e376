use chrono::Timelike;

/// `HH:MM:SS`, zero padded.
pub fn hms<T: Timelike>(t: &T) -> String {
    format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())
}
