use std::collections::BTreeSet;

/// Decodes a catalog weekday code ("MWF", "TTh") into weekday ordinals,
/// Monday = 1. Unknown characters are skipped.
pub fn decode_weekdays(code: &str) -> BTreeSet<u8> {
    let mut days = BTreeSet::new();
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            'M' => {
                days.insert(1);
            }
            'T' if chars.peek() == Some(&'h') => {
                chars.next();
                days.insert(4);
            }
            'T' => {
                days.insert(2);
            }
            'W' => {
                days.insert(3);
            }
            'F' => {
                days.insert(5);
            }
            _ => {}
        }
    }

    days
}

/// Inverse of [`decode_weekdays`], used when persisting meetings.
pub fn encode_weekdays(days: &BTreeSet<u8>) -> String {
    days.iter()
        .filter_map(|day| match day {
            1 => Some("M"),
            2 => Some("T"),
            3 => Some("W"),
            4 => Some("Th"),
            5 => Some("F"),
            _ => None,
        })
        .collect()
}
