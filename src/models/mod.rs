pub mod course;
pub mod meeting;
pub mod section;

pub use course::{Course, CourseKey, CourseSnapshot};
pub use meeting::{Location, Meeting, OneTimeMeeting, TimeSchedule, WeeklyMeeting};
pub use section::{AssociatedClass, RelatedComponent, Reserve, Section, SectionEntry};
