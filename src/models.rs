use std::fmt;
use std::str::FromStr;

use anyhow::Error;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WEEKLY_GOAL: i64 = 80;

/// Stored as upper-case text in `users.role`. Not enforced by any route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub avatar: String,
    pub weekly_goal: i64,
    pub role: Role,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub weekly_goal: Option<i64>,
    pub role: Option<String>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            name: user.name.unwrap_or_default(),
            avatar: user.avatar.unwrap_or_default(),
            weekly_goal: user.weekly_goal.unwrap_or(DEFAULT_WEEKLY_GOAL),
            // Rows written by hand may carry roles we don't know about
            role: user
                .role
                .as_deref()
                .and_then(|role| role.parse().ok())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionIssue {
    pub id: i64,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub description: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSessionIssue {
    pub id: Option<i64>,
    #[sqlx(rename = "type")]
    pub issue_type: Option<String>,
    pub description: Option<String>,
}

impl From<DbSessionIssue> for SessionIssue {
    fn from(issue: DbSessionIssue) -> Self {
        Self {
            id: issue.id.unwrap_or_default(),
            issue_type: issue.issue_type.unwrap_or_default(),
            description: issue.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub context: String,
    pub date: String,
    pub score: i64,
    pub issues: Vec<SessionIssue>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSession {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub context: Option<String>,
    pub date: Option<String>,
    pub score: Option<i64>,
}

impl DbSession {
    pub fn with_issues(self, issues: Vec<SessionIssue>) -> Session {
        Session {
            id: self.id.unwrap_or_default(),
            user_id: self.user_id,
            title: self.title.unwrap_or_default(),
            context: self.context.unwrap_or_default(),
            date: self.date.unwrap_or_default(),
            score: self.score.unwrap_or_default(),
            issues,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VocabEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub word: String,
    pub form: String,
    pub meaning: String,
    pub example: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbVocabEntry {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub word: Option<String>,
    pub form: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
}

impl From<DbVocabEntry> for VocabEntry {
    fn from(entry: DbVocabEntry) -> Self {
        Self {
            id: entry.id.unwrap_or_default(),
            user_id: entry.user_id,
            word: entry.word.unwrap_or_default(),
            form: entry.form.unwrap_or_default(),
            meaning: entry.meaning.unwrap_or_default(),
            example: entry.example.unwrap_or_default(),
        }
    }
}

/// Field values for inserting or fully replacing a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub avatar: String,
    pub weekly_goal: i64,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub issue_type: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub title: String,
    pub context: String,
    pub score: i64,
    pub issues: Vec<NewIssue>,
}

#[derive(Debug, Clone)]
pub struct NewVocabEntry {
    pub user_id: i64,
    pub word: String,
    pub form: String,
    pub meaning: String,
    pub example: String,
}
