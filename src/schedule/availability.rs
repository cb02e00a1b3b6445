use crate::models::Meeting;

/// A section accepts students unless one of its meetings is TBA, cancelled or
/// closed. A section without meetings counts as open.
pub fn is_open(meetings: &[Meeting]) -> bool {
    !meetings
        .iter()
        .any(|m| m.is_tba || m.is_cancelled || m.is_closed)
}
