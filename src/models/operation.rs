//! Names of the data operations exposed to callers.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Features whose page location is found by candidate probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    WeeklySchedule,
    Attendance,
    Fees,
    Library,
    Registration,
    Thesis,
    Internships,
    Petitions,
    Materials,
    Events,
    Transcript,
}

impl Feature {
    pub const ALL: [Feature; 11] = [
        Feature::WeeklySchedule,
        Feature::Attendance,
        Feature::Fees,
        Feature::Library,
        Feature::Registration,
        Feature::Thesis,
        Feature::Internships,
        Feature::Petitions,
        Feature::Materials,
        Feature::Events,
        Feature::Transcript,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::WeeklySchedule => "weekly-schedule",
            Feature::Attendance => "attendance",
            Feature::Fees => "fees",
            Feature::Library => "library",
            Feature::Registration => "registration",
            Feature::Thesis => "thesis",
            Feature::Internships => "internships",
            Feature::Petitions => "petitions",
            Feature::Materials => "materials",
            Feature::Events => "events",
            Feature::Transcript => "transcript",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data operation callable on an authenticated portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Profile,
    /// Student area announcements
    Announcements,
    /// Public home page announcements
    HomeAnnouncements,
    Courses,
    TermCourses,
    Messages,
    OnlineLinks,
    Page,
    Tables(Feature),
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        let op = match normalized.as_str() {
            "profile" | "student-info" => Operation::Profile,
            "announcements" | "student-announcements" => Operation::Announcements,
            "home-announcements" => Operation::HomeAnnouncements,
            "courses" => Operation::Courses,
            "term-courses" => Operation::TermCourses,
            "messages" => Operation::Messages,
            "online-links" | "online-education" => Operation::OnlineLinks,
            "page" | "navigate" => Operation::Page,
            other => Feature::ALL
                .into_iter()
                .find(|f| f.as_str() == other)
                .map(Operation::Tables)
                .ok_or_else(|| AppError::unsupported("operation", s))?,
        };
        Ok(op)
    }
}
