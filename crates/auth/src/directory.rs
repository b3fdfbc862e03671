//! Organization option sets: teams (and the department each belongs to) and
//! job levels.
//!
//! Injected into the workflow instead of living in globals, so tests can run
//! against fixture tables.

use std::collections::BTreeMap;

use serde::Serialize;

use backoffice_core::{DomainError, DomainResult};

/// A job level that is known to be in the directory's option set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Level(String);

impl Level {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directory {
    /// team -> department
    teams: BTreeMap<String, String>,
    /// Ordered lowest to highest.
    levels: Vec<String>,
}

impl Directory {
    pub fn new<T, D, L>(teams: impl IntoIterator<Item = (T, D)>, levels: impl IntoIterator<Item = L>) -> Self
    where
        T: Into<String>,
        D: Into<String>,
        L: Into<String>,
    {
        Self {
            teams: teams.into_iter().map(|(t, d)| (t.into(), d.into())).collect(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    /// Department a team reports to.
    pub fn department_for(&self, team: &str) -> DomainResult<&str> {
        self.teams
            .get(team.trim())
            .map(String::as_str)
            .ok_or_else(|| DomainError::invalid_option("team", team.trim()))
    }

    /// Resolve a level name against the option set.
    pub fn level(&self, name: &str) -> DomainResult<Level> {
        let name = name.trim();
        self.levels
            .iter()
            .find(|l| l.as_str() == name)
            .map(|l| Level(l.clone()))
            .ok_or_else(|| DomainError::invalid_option("level", name))
    }

    pub fn teams(&self) -> impl Iterator<Item = (&str, &str)> {
        self.teams.iter().map(|(t, d)| (t.as_str(), d.as_str()))
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(
            [
                ("1팀", "영업1본부"),
                ("2팀", "영업1본부"),
                ("3팀", "영업2본부"),
                ("4팀", "영업2본부"),
                ("마케팅팀", "마케팅본부"),
                ("경영지원팀", "경영지원본부"),
            ],
            ["사원", "주임", "대리", "과장", "차장", "부장", "이사"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_resolves_to_department() {
        let dir = Directory::default();
        assert_eq!(dir.department_for("1팀").unwrap(), "영업1본부");
        assert_eq!(dir.department_for(" 3팀 ").unwrap(), "영업2본부");
    }

    #[test]
    fn unknown_options_are_rejected() {
        let dir = Directory::new([("A", "Dept")], ["Junior"]);
        assert_eq!(
            dir.department_for("B").unwrap_err(),
            DomainError::invalid_option("team", "B")
        );
        assert_eq!(dir.level("Senior").unwrap_err().code(), "invalid_option");
        assert_eq!(dir.level("Junior").unwrap().as_str(), "Junior");
    }
}
