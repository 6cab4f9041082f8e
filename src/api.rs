use rocket::{Request, State};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use validator::Validate;

use crate::database::Store;
use crate::db::{
    create_session, create_user, create_vocab, delete_session, delete_user, delete_vocab,
    get_all_users, get_sessions, get_vocab, update_session, update_user,
};
use crate::models::{
    DEFAULT_WEEKLY_GOAL, NewIssue, NewSession, NewUser, NewVocabEntry, Role, Session, User,
    VocabEntry,
};
use crate::validation::{AppErrorExt, JsonValidateExt, ValidationResponse};

type ApiResult<T> = Result<T, Custom<Json<ValidationResponse>>>;

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

fn default_weekly_goal() -> i64 {
    DEFAULT_WEEKLY_GOAL
}

#[derive(Deserialize, Validate, Clone)]
pub struct UserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(length(min = 1, message = "Avatar is required"))]
    avatar: String,
    #[serde(default = "default_weekly_goal")]
    #[validate(range(min = 0, message = "Weekly goal cannot be negative"))]
    weekly_goal: i64,
    #[serde(default)]
    role: Role,
}

impl From<UserRequest> for NewUser {
    fn from(request: UserRequest) -> Self {
        Self {
            name: request.name,
            avatar: request.avatar,
            weekly_goal: request.weekly_goal,
            role: request.role,
        }
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct IssueRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Issue type is required"))]
    issue_type: String,
    description: String,
}

impl From<IssueRequest> for NewIssue {
    fn from(request: IssueRequest) -> Self {
        Self {
            issue_type: request.issue_type,
            description: request.description,
        }
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct SessionRequest {
    user_id: i64,
    #[validate(length(min = 1, message = "Title is required"))]
    title: String,
    context: String,
    score: i64,
    #[serde(default)]
    #[validate(nested)]
    issues: Vec<IssueRequest>,
}

impl From<SessionRequest> for NewSession {
    fn from(request: SessionRequest) -> Self {
        Self {
            user_id: request.user_id,
            title: request.title,
            context: request.context,
            score: request.score,
            issues: request.issues.into_iter().map(NewIssue::from).collect(),
        }
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct SessionUpdateRequest {
    score: i64,
    #[serde(default)]
    #[validate(nested)]
    issues: Vec<IssueRequest>,
}

#[derive(Deserialize, Validate, Clone)]
pub struct VocabRequest {
    user_id: i64,
    #[validate(length(min = 1, message = "Word is required"))]
    word: String,
    form: String,
    #[validate(length(min = 1, message = "Meaning is required"))]
    meaning: String,
    example: String,
}

impl From<VocabRequest> for NewVocabEntry {
    fn from(request: VocabRequest) -> Self {
        Self {
            user_id: request.user_id,
            word: request.word,
            form: request.form,
            meaning: request.meaning,
            example: request.example,
        }
    }
}

// Errors raised before a handler runs, e.g. a body that fails to parse,
// still answer with the JSON error body.
#[catch(400)]
pub fn bad_request_api(req: &Request) -> Custom<Json<ValidationResponse>> {
    tracing::warn!(uri = %req.uri(), "Malformed request");
    Custom(
        Status::BadRequest,
        Json(ValidationResponse::with_error("body", "Malformed request body")),
    )
}

#[catch(404)]
pub fn not_found_api(req: &Request) -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::NotFound,
        Json(ValidationResponse::with_error(
            "resource",
            &format!("No route for {}", req.uri()),
        )),
    )
}

#[catch(422)]
pub fn unprocessable_api(req: &Request) -> Custom<Json<ValidationResponse>> {
    tracing::warn!(uri = %req.uri(), "Request body does not match the expected shape");
    Custom(
        Status::UnprocessableEntity,
        Json(ValidationResponse::with_error(
            "body",
            "Request body has missing or invalid fields",
        )),
    )
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

#[get("/users")]
pub async fn api_get_users(db: &State<Store>) -> ApiResult<Json<Vec<User>>> {
    let users = get_all_users(db).await.validate_custom()?;
    Ok(Json(users))
}

#[post("/users", data = "<user>")]
pub async fn api_create_user(
    user: Json<UserRequest>,
    db: &State<Store>,
) -> ApiResult<Custom<Json<User>>> {
    let validated = user.validate_custom()?;

    let created = create_user(db, &NewUser::from(validated))
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(created)))
}

#[put("/users/<id>", data = "<user>")]
pub async fn api_update_user(
    id: i64,
    user: Json<UserRequest>,
    db: &State<Store>,
) -> ApiResult<Json<User>> {
    let validated = user.validate_custom()?;

    let updated = update_user(db, id, &NewUser::from(validated))
        .await
        .validate_custom()?;

    Ok(Json(updated))
}

#[delete("/users/<id>")]
pub async fn api_delete_user(id: i64, db: &State<Store>) -> ApiResult<Json<MessageResponse>> {
    delete_user(db, id).await.validate_custom()?;
    Ok(MessageResponse::new("User deleted"))
}

#[get("/sessions?<user_id>")]
pub async fn api_get_sessions(
    user_id: Option<i64>,
    db: &State<Store>,
) -> ApiResult<Json<Vec<Session>>> {
    let sessions = get_sessions(db, user_id).await.validate_custom()?;
    Ok(Json(sessions))
}

#[post("/sessions", data = "<session>")]
pub async fn api_create_session(
    session: Json<SessionRequest>,
    db: &State<Store>,
) -> ApiResult<Custom<Json<Session>>> {
    let validated = session.validate_custom()?;

    let created = create_session(db, &NewSession::from(validated))
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(created)))
}

#[put("/sessions/<id>", data = "<update>")]
pub async fn api_update_session(
    id: i64,
    update: Json<SessionUpdateRequest>,
    db: &State<Store>,
) -> ApiResult<Json<Session>> {
    let validated = update.validate_custom()?;
    let issues: Vec<NewIssue> = validated.issues.into_iter().map(NewIssue::from).collect();

    let updated = update_session(db, id, validated.score, &issues)
        .await
        .validate_custom()?;

    Ok(Json(updated))
}

#[delete("/sessions/<id>")]
pub async fn api_delete_session(id: i64, db: &State<Store>) -> ApiResult<Json<MessageResponse>> {
    delete_session(db, id).await.validate_custom()?;
    Ok(MessageResponse::new("Session deleted"))
}

#[get("/vocab?<user_id>&<search>")]
pub async fn api_get_vocab(
    user_id: Option<i64>,
    search: Option<String>,
    db: &State<Store>,
) -> ApiResult<Json<Vec<VocabEntry>>> {
    // `?search=` with no value lists everything
    let search = search.as_deref().filter(|s| !s.is_empty());

    let words = get_vocab(db, user_id, search).await.validate_custom()?;
    Ok(Json(words))
}

#[post("/vocab", data = "<entry>")]
pub async fn api_create_vocab(
    entry: Json<VocabRequest>,
    db: &State<Store>,
) -> ApiResult<Custom<Json<VocabEntry>>> {
    let validated = entry.validate_custom()?;

    let created = create_vocab(db, &NewVocabEntry::from(validated))
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(created)))
}

#[delete("/vocab/<id>")]
pub async fn api_delete_vocab(id: i64, db: &State<Store>) -> ApiResult<Json<MessageResponse>> {
    delete_vocab(db, id).await.validate_custom()?;
    Ok(MessageResponse::new("Word deleted"))
}
