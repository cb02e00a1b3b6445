use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub is_tba: bool,
    pub is_cancelled: bool,
    pub is_closed: bool,
    /// Set only for one-time meetings.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    /// Weekday ordinals (Monday = 1) for recurring meetings.
    pub weekdays: BTreeSet<u8>,
    pub instructors: Vec<String>,
    pub building: Option<String>,
    pub room: Option<String>,
}

impl Meeting {
    pub fn is_one_time(&self) -> bool {
        self.start_date.is_some()
    }

    pub fn location(&self) -> Location {
        Location {
            building: self.building.clone(),
            room: self.room.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub building: Option<String>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyMeeting {
    pub weekdays: BTreeSet<u8>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneTimeMeeting {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeSchedule {
    pub weekly: Vec<WeeklyMeeting>,
    pub one_time: Vec<OneTimeMeeting>,
}

impl TimeSchedule {
    /// Splits meetings into recurring and one-time entries. Meetings without
    /// both a start and an end time have nothing to place and are skipped.
    pub fn from_meetings(meetings: &[Meeting]) -> Self {
        let mut schedule = TimeSchedule::default();

        for meeting in meetings {
            let (Some(start_time), Some(end_time)) = (meeting.start_time, meeting.end_time) else {
                continue;
            };
            match meeting.start_date {
                Some(date) => schedule.one_time.push(OneTimeMeeting {
                    date,
                    start_time,
                    end_time,
                }),
                None => schedule.weekly.push(WeeklyMeeting {
                    weekdays: meeting.weekdays.clone(),
                    start_time,
                    end_time,
                }),
            }
        }

        schedule
    }
}
