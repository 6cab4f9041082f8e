#[cfg(test)]
pub mod test_db {
    use crate::database::{InitReport, Store, initialize_database};
    use crate::db::{create_session, create_user, create_vocab};
    use crate::error::AppError;
    use crate::init_rocket;
    use crate::models::{NewIssue, NewSession, NewUser, NewVocabEntry, Role};
    use rocket::local::asynchronous::Client;
    use std::collections::HashMap;
    use std::sync::Once;
    use tempfile::TempDir;

    static INIT: Once = Once::new();

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        sessions: Vec<TestSession>,
        vocab: Vec<TestVocab>,
    }

    pub struct TestUser {
        pub name: String,
        pub role: Role,
    }

    pub struct TestSession {
        pub owner: String,
        pub title: String,
        pub score: i64,
        pub issues: Vec<(String, String)>,
    }

    pub struct TestVocab {
        pub owner: String,
        pub word: String,
        pub meaning: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user(mut self, name: &str) -> Self {
            self.users.push(TestUser {
                name: name.to_string(),
                role: Role::User,
            });
            self
        }

        pub fn admin(mut self, name: &str) -> Self {
            self.users.push(TestUser {
                name: name.to_string(),
                role: Role::Admin,
            });
            self
        }

        pub fn session(mut self, owner: &str, title: &str, issues: &[(&str, &str)]) -> Self {
            self.sessions.push(TestSession {
                owner: owner.to_string(),
                title: title.to_string(),
                score: 70,
                issues: issues
                    .iter()
                    .map(|(t, d)| (t.to_string(), d.to_string()))
                    .collect(),
            });
            self
        }

        pub fn vocab(mut self, owner: &str, word: &str, meaning: &str) -> Self {
            self.vocab.push(TestVocab {
                owner: owner.to_string(),
                word: word.to_string(),
                meaning: meaning.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            let (store, dir) = empty_store()?;
            let init_report = initialize_database(&store).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let created = create_user(
                    &store,
                    &NewUser {
                        name: user.name.clone(),
                        avatar: format!("https://picsum.photos/seed/{}/100/100", user.name),
                        weekly_goal: 80,
                        role: user.role,
                    },
                )
                .await?;

                user_id_map.insert(user.name.clone(), created.id);
            }

            for session in &self.sessions {
                let user_id = lookup(&user_id_map, &session.owner)?;
                create_session(
                    &store,
                    &NewSession {
                        user_id,
                        title: session.title.clone(),
                        context: format!("Context for {}", session.title),
                        score: session.score,
                        issues: session
                            .issues
                            .iter()
                            .map(|(issue_type, description)| NewIssue {
                                issue_type: issue_type.clone(),
                                description: description.clone(),
                            })
                            .collect(),
                    },
                )
                .await?;
            }

            for entry in &self.vocab {
                let user_id = lookup(&user_id_map, &entry.owner)?;
                create_vocab(
                    &store,
                    &NewVocabEntry {
                        user_id,
                        word: entry.word.clone(),
                        form: "NOUN".to_string(),
                        meaning: entry.meaning.clone(),
                        example: format!("An example using {}.", entry.word),
                    },
                )
                .await?;
            }

            Ok(TestDb {
                store,
                init_report,
                user_id_map,
                _dir: dir,
            })
        }
    }

    fn lookup(user_id_map: &HashMap<String, i64>, name: &str) -> Result<i64, AppError> {
        user_id_map
            .get(name)
            .copied()
            .ok_or_else(|| AppError::Internal(format!("Test user {} was never added", name)))
    }

    /// A store on a fresh file in its own temporary directory. The directory
    /// is removed when the returned `TempDir` is dropped.
    pub fn empty_store() -> Result<(Store, TempDir), AppError> {
        INIT.call_once(|| {
            let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
                .is_test(true)
                .try_init();
        });

        let dir = tempfile::tempdir()
            .map_err(|e| AppError::Internal(format!("Failed to create temp dir: {}", e)))?;
        let url = format!("sqlite://{}", dir.path().join("test.db").display());

        Ok((Store::new(&url)?, dir))
    }

    pub struct TestDb {
        pub store: Store,
        pub init_report: InitReport,
        pub user_id_map: HashMap<String, i64>,
        _dir: TempDir,
    }

    impl TestDb {
        pub fn user_id(&self, name: &str) -> Option<i64> {
            self.user_id_map.get(name).copied()
        }

        pub async fn count(&self, sql: &str) -> i64 {
            let mut conn = self.store.connect().await.expect("Failed to connect");
            sqlx::query_scalar::<_, i64>(sql)
                .fetch_one(&mut conn)
                .await
                .expect("Failed to run count query")
        }

        pub async fn count_for_user(&self, sql: &str, user_id: i64) -> i64 {
            let mut conn = self.store.connect().await.expect("Failed to connect");
            sqlx::query_scalar::<_, i64>(sql)
                .bind(user_id)
                .fetch_one(&mut conn)
                .await
                .expect("Failed to run count query")
        }
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .user("alice")
            .user("bruno")
            .session("alice", "Coffee order", &[("GRAMMAR", "Used ser instead of estar")])
            .session(
                "bruno",
                "Job interview",
                &[
                    ("VOCAB", "Forgot the word for resume"),
                    ("PRONUNCIATION", "Rolled r too weakly"),
                ],
            )
            .vocab("alice", "Madrugada", "The early hours of the morning.")
            .vocab("bruno", "Sobremesa", "Time spent talking after a meal.")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let client = Client::tracked(init_rocket(test_db.store.clone()))
            .await
            .expect("valid rocket instance");

        (client, test_db)
    }
}
