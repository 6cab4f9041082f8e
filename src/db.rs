use chrono::{DateTime, Local, TimeZone};
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use crate::database::Store;
use crate::error::AppError;
use crate::models::{
    DbSession, DbSessionIssue, DbUser, DbVocabEntry, NewIssue, NewSession, NewUser, NewVocabEntry,
    Session, SessionIssue, User, VocabEntry,
};

/// `OCT 19 // 14:05 PM`: 24-hour clock with the meridiem appended.
pub fn format_session_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%b %d // %H:%M %p").to_string().to_uppercase()
}

#[instrument(skip(conn))]
async fn user_exists(conn: &mut SqliteConnection, user_id: i64) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

async fn require_user(conn: &mut SqliteConnection, user_id: i64) -> Result<(), AppError> {
    if user_exists(conn, user_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            user_id
        )))
    }
}

#[instrument(skip(store))]
pub async fn get_all_users(store: &Store) -> Result<Vec<User>, AppError> {
    info!("Getting all users");
    let mut conn = store.connect().await?;

    let rows = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, avatar, weekly_goal, role FROM users ORDER BY id",
    )
    .fetch_all(&mut conn)
    .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

#[instrument(skip(store, user), fields(name = %user.name, role = %user.role))]
pub async fn create_user(store: &Store, user: &NewUser) -> Result<User, AppError> {
    info!("Creating new user");
    let mut conn = store.connect().await?;

    let res = sqlx::query("INSERT INTO users (name, avatar, weekly_goal, role) VALUES (?, ?, ?, ?)")
        .bind(&user.name)
        .bind(&user.avatar)
        .bind(user.weekly_goal)
        .bind(user.role.as_str())
        .execute(&mut conn)
        .await?;

    Ok(User {
        id: res.last_insert_rowid(),
        name: user.name.clone(),
        avatar: user.avatar.clone(),
        weekly_goal: user.weekly_goal,
        role: user.role,
    })
}

#[instrument(skip(store, user), fields(name = %user.name, role = %user.role))]
pub async fn update_user(store: &Store, id: i64, user: &NewUser) -> Result<User, AppError> {
    info!("Updating user");
    let mut conn = store.connect().await?;

    let res = sqlx::query(
        "UPDATE users SET name = ?, avatar = ?, weekly_goal = ?, role = ? WHERE id = ?",
    )
    .bind(&user.name)
    .bind(&user.avatar)
    .bind(user.weekly_goal)
    .bind(user.role.as_str())
    .bind(id)
    .execute(&mut conn)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        )));
    }

    Ok(User {
        id,
        name: user.name.clone(),
        avatar: user.avatar.clone(),
        weekly_goal: user.weekly_goal,
        role: user.role,
    })
}

/// Removes the user together with their sessions, those sessions' issues
/// and their vocabulary, in one transaction.
#[instrument(skip(store))]
pub async fn delete_user(store: &Store, id: i64) -> Result<(), AppError> {
    info!("Deleting user and owned records");
    let mut conn = store.connect().await?;
    let mut tx = conn.begin().await?;

    sqlx::query(
        "DELETE FROM session_issues WHERE session_id IN (SELECT id FROM sessions WHERE user_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM vocab_bank WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        )));
    }

    tx.commit().await?;
    Ok(())
}

async fn get_session_issues(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Vec<SessionIssue>, AppError> {
    let rows = sqlx::query_as::<_, DbSessionIssue>(
        "SELECT id, type, description FROM session_issues WHERE session_id = ? ORDER BY id",
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(SessionIssue::from).collect())
}

async fn insert_session_issues(
    conn: &mut SqliteConnection,
    session_id: i64,
    issues: &[NewIssue],
) -> Result<Vec<SessionIssue>, AppError> {
    let mut created = Vec::with_capacity(issues.len());

    for issue in issues {
        let res = sqlx::query(
            "INSERT INTO session_issues (session_id, type, description) VALUES (?, ?, ?)",
        )
        .bind(session_id)
        .bind(&issue.issue_type)
        .bind(&issue.description)
        .execute(&mut *conn)
        .await?;

        created.push(SessionIssue {
            id: res.last_insert_rowid(),
            issue_type: issue.issue_type.clone(),
            description: issue.description.clone(),
        });
    }

    Ok(created)
}

/// Newest first, each session carrying its issues in insertion order.
#[instrument(skip(store))]
pub async fn get_sessions(store: &Store, user_id: Option<i64>) -> Result<Vec<Session>, AppError> {
    info!("Getting sessions");
    let mut conn = store.connect().await?;

    let rows = match user_id {
        Some(user_id) => {
            sqlx::query_as::<_, DbSession>(
                "SELECT id, user_id, title, context, date, score FROM sessions
                 WHERE user_id = ?
                 ORDER BY id DESC",
            )
            .bind(user_id)
            .fetch_all(&mut conn)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbSession>(
                "SELECT id, user_id, title, context, date, score FROM sessions ORDER BY id DESC",
            )
            .fetch_all(&mut conn)
            .await?
        }
    };

    let mut sessions = Vec::with_capacity(rows.len());
    for row in rows {
        let issues = get_session_issues(&mut conn, row.id.unwrap_or_default()).await?;
        sessions.push(row.with_issues(issues));
    }

    Ok(sessions)
}

#[instrument(skip(store, session), fields(user_id = session.user_id, issues = session.issues.len()))]
pub async fn create_session(store: &Store, session: &NewSession) -> Result<Session, AppError> {
    create_session_at(store, session, &Local::now()).await
}

/// Creates the session and its issues in one transaction, stamping it with
/// `now`.
#[instrument(skip(store, session, now), fields(user_id = session.user_id))]
pub async fn create_session_at<Tz: TimeZone>(
    store: &Store,
    session: &NewSession,
    now: &DateTime<Tz>,
) -> Result<Session, AppError>
where
    Tz::Offset: std::fmt::Display,
{
    info!("Creating session");
    let date = format_session_date(now);

    let mut conn = store.connect().await?;
    let mut tx = conn.begin().await?;

    require_user(&mut tx, session.user_id).await?;

    let res = sqlx::query(
        "INSERT INTO sessions (user_id, title, context, date, score) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(session.user_id)
    .bind(&session.title)
    .bind(&session.context)
    .bind(&date)
    .bind(session.score)
    .execute(&mut *tx)
    .await?;

    let session_id = res.last_insert_rowid();
    let issues = insert_session_issues(&mut tx, session_id, &session.issues).await?;

    tx.commit().await?;

    Ok(Session {
        id: session_id,
        user_id: Some(session.user_id),
        title: session.title.clone(),
        context: session.context.clone(),
        date,
        score: session.score,
        issues,
    })
}

/// Replaces the score and the full issue list of an existing session.
#[instrument(skip(store, issues), fields(issues = issues.len()))]
pub async fn update_session(
    store: &Store,
    id: i64,
    score: i64,
    issues: &[NewIssue],
) -> Result<Session, AppError> {
    info!("Updating session score and issues");
    let mut conn = store.connect().await?;
    let mut tx = conn.begin().await?;

    let res = sqlx::query("UPDATE sessions SET score = ? WHERE id = ?")
        .bind(score)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound(format!(
            "Session with id {} not found in database",
            id
        )));
    }

    sqlx::query("DELETE FROM session_issues WHERE session_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let issues = insert_session_issues(&mut tx, id, issues).await?;

    let row = sqlx::query_as::<_, DbSession>(
        "SELECT id, user_id, title, context, date, score FROM sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row.with_issues(issues))
}

#[instrument(skip(store))]
pub async fn delete_session(store: &Store, id: i64) -> Result<(), AppError> {
    info!("Deleting session and its issues");
    let mut conn = store.connect().await?;
    let mut tx = conn.begin().await?;

    sqlx::query("DELETE FROM session_issues WHERE session_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let res = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound(format!(
            "Session with id {} not found in database",
            id
        )));
    }

    tx.commit().await?;
    Ok(())
}

/// Case-insensitive substring match on word or meaning. Folding happens in
/// Rust on both sides, since SQLite's `LOWER()` only folds ASCII and would
/// miss capitals like `Á`.
fn matches_search(entry: &VocabEntry, needle: &str) -> bool {
    entry.word.to_lowercase().contains(needle) || entry.meaning.to_lowercase().contains(needle)
}

#[instrument(skip(store))]
pub async fn get_vocab(
    store: &Store,
    user_id: Option<i64>,
    search: Option<&str>,
) -> Result<Vec<VocabEntry>, AppError> {
    info!("Getting vocabulary");
    let mut conn = store.connect().await?;

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT id, user_id, word, form, meaning, example FROM vocab_bank",
    );

    if let Some(user_id) = user_id {
        query.push(" WHERE user_id = ").push_bind(user_id);
    }

    query.push(" ORDER BY id DESC");

    let rows = query
        .build_query_as::<DbVocabEntry>()
        .fetch_all(&mut conn)
        .await?;

    let needle = search.map(str::to_lowercase);

    Ok(rows
        .into_iter()
        .map(VocabEntry::from)
        .filter(|entry| {
            needle
                .as_deref()
                .is_none_or(|needle| matches_search(entry, needle))
        })
        .collect())
}

#[instrument(skip(store, entry), fields(user_id = entry.user_id, word = %entry.word))]
pub async fn create_vocab(store: &Store, entry: &NewVocabEntry) -> Result<VocabEntry, AppError> {
    info!("Creating vocabulary entry");
    let mut conn = store.connect().await?;

    require_user(&mut conn, entry.user_id).await?;

    let res = sqlx::query(
        "INSERT INTO vocab_bank (user_id, word, form, meaning, example) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(entry.user_id)
    .bind(&entry.word)
    .bind(&entry.form)
    .bind(&entry.meaning)
    .bind(&entry.example)
    .execute(&mut conn)
    .await?;

    Ok(VocabEntry {
        id: res.last_insert_rowid(),
        user_id: Some(entry.user_id),
        word: entry.word.clone(),
        form: entry.form.clone(),
        meaning: entry.meaning.clone(),
        example: entry.example.clone(),
    })
}

#[instrument(skip(store))]
pub async fn delete_vocab(store: &Store, id: i64) -> Result<(), AppError> {
    info!("Deleting vocabulary entry");
    let mut conn = store.connect().await?;

    let res = sqlx::query("DELETE FROM vocab_bank WHERE id = ?")
        .bind(id)
        .execute(&mut conn)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Word with id {} not found in database",
            id
        )));
    }

    Ok(())
}
