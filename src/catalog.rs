//! # Course Catalog Module
//!
//! Course records as stored in the database, the filters users can browse
//! the catalog by, and the cyclic pager shared by the catalog and the
//! recommendation screens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a filter key does not name any known category
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown catalog key: {0}")]
pub struct UnknownKey(pub String);

/// Field of study a course belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Finance,
    Management,
    Pedagogy,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Finance, Direction::Management, Direction::Pedagogy];

    pub fn as_key(&self) -> &'static str {
        match self {
            Direction::Finance => "finance",
            Direction::Management => "management",
            Direction::Pedagogy => "pedagogy",
        }
    }

    /// Localization key of the human-readable label
    pub fn label_key(&self) -> &'static str {
        match self {
            Direction::Finance => "direction-finance",
            Direction::Management => "direction-management",
            Direction::Pedagogy => "direction-pedagogy",
        }
    }
}

impl FromStr for Direction {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_key() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Position of the learner inside the university
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Teaching staff
    Pps,
    /// Administrative staff
    Aup,
    /// Leadership
    Guide,
    Students,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Pps, Role::Aup, Role::Guide, Role::Students];

    pub fn as_key(&self) -> &'static str {
        match self {
            Role::Pps => "pps",
            Role::Aup => "aup",
            Role::Guide => "guide",
            Role::Students => "students",
        }
    }

    pub fn label_key(&self) -> &'static str {
        match self {
            Role::Pps => "role-pps",
            Role::Aup => "role-aup",
            Role::Guide => "role-guide",
            Role::Students => "role-students",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_key() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Whether a program is open to everyone or limited to a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Open,
    Limited,
}

impl Access {
    pub const ALL: [Access; 2] = [Access::Open, Access::Limited];

    pub fn as_key(&self) -> &'static str {
        match self {
            Access::Open => "open",
            Access::Limited => "limited",
        }
    }

    pub fn label_key(&self) -> &'static str {
        match self {
            Access::Open => "access-open",
            Access::Limited => "access-limited",
        }
    }
}

impl FromStr for Access {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Access::ALL
            .into_iter()
            .find(|a| a.as_key() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Submenu a filter was picked from, used by the "back" button of a course card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMenu {
    Direction,
    Post,
    Availability,
}

/// One way of narrowing the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseFilter {
    Direction(Direction),
    Role(Role),
    Access(Access),
}

impl CourseFilter {
    pub fn as_key(&self) -> &'static str {
        match self {
            CourseFilter::Direction(d) => d.as_key(),
            CourseFilter::Role(r) => r.as_key(),
            CourseFilter::Access(a) => a.as_key(),
        }
    }

    pub fn label_key(&self) -> &'static str {
        match self {
            CourseFilter::Direction(d) => d.label_key(),
            CourseFilter::Role(r) => r.label_key(),
            CourseFilter::Access(a) => a.label_key(),
        }
    }

    pub fn parent_menu(&self) -> FilterMenu {
        match self {
            CourseFilter::Direction(_) => FilterMenu::Direction,
            CourseFilter::Role(_) => FilterMenu::Post,
            CourseFilter::Access(_) => FilterMenu::Availability,
        }
    }
}

impl FromStr for CourseFilter {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(direction) = s.parse() {
            return Ok(CourseFilter::Direction(direction));
        }
        if let Ok(role) = s.parse() {
            return Ok(CourseFilter::Role(role));
        }
        if let Ok(access) = s.parse() {
            return Ok(CourseFilter::Access(access));
        }
        Err(UnknownKey(s.to_string()))
    }
}

impl fmt::Display for CourseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// A course row from the `courses` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub duration_weeks: Option<i32>,
    /// Price in roubles
    pub price: i32,
    pub url: Option<String>,
    pub access: String,
    pub role: String,
    pub direction: String,
}

impl Course {
    pub fn is_open(&self) -> bool {
        self.access == Access::Open.as_key()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction.parse().ok()
    }

    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    /// Localization key of the category shown on the card for `filter`
    pub fn category_key(&self, filter: CourseFilter) -> Option<&'static str> {
        match filter {
            CourseFilter::Direction(_) => self.direction().map(|d| d.label_key()),
            CourseFilter::Role(_) => self.role().map(|r| r.label_key()),
            CourseFilter::Access(_) => Some(if self.is_open() {
                Access::Open.label_key()
            } else {
                Access::Limited.label_key()
            }),
        }
    }
}

/// Where the user currently is in a filtered catalog listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCursor {
    pub filter: CourseFilter,
    pub position: usize,
}

/// Pager direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Prev,
    Next,
}

/// Move `position` one step in a list of `len` items, wrapping at both ends.
///
/// Returns 0 for an empty list.
pub fn cycle(position: usize, step: Step, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let position = position % len;
    match step {
        Step::Next => (position + 1) % len,
        Step::Prev => (position + len - 1) % len,
    }
}

/// Render a price with `,` as the thousands separator
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if price < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
