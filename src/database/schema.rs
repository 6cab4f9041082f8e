pub const CURRENT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    avatar TEXT NOT NULL,
    weekly_goal INTEGER DEFAULT 80,
    role TEXT DEFAULT 'USER'
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    title TEXT NOT NULL,
    context TEXT NOT NULL,
    date TEXT NOT NULL,
    score INTEGER NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS session_issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER,
    type TEXT NOT NULL,
    description TEXT NOT NULL,
    FOREIGN KEY (session_id) REFERENCES sessions (id)
);

CREATE TABLE IF NOT EXISTS vocab_bank (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    word TEXT NOT NULL,
    form TEXT NOT NULL,
    meaning TEXT NOT NULL,
    example TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id)
);
"#;

/// A column added after the first release. Older databases get it through
/// `ALTER TABLE ... ADD COLUMN`, so the definition must be nullable or
/// carry a default.
#[derive(Debug, Clone, Copy)]
pub struct AdditiveColumn {
    pub table: &'static str,
    pub column: &'static str,
    pub definition: &'static str,
}

impl AdditiveColumn {
    pub fn alter_sql(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.table, self.column, self.definition
        )
    }
}

pub const ADDITIVE_COLUMNS: &[AdditiveColumn] = &[
    AdditiveColumn {
        table: "users",
        column: "role",
        definition: "TEXT DEFAULT 'USER'",
    },
    AdditiveColumn {
        table: "sessions",
        column: "user_id",
        definition: "INTEGER REFERENCES users(id)",
    },
    AdditiveColumn {
        table: "vocab_bank",
        column: "user_id",
        definition: "INTEGER REFERENCES users(id)",
    },
];

pub struct SeedUser {
    pub name: &'static str,
    pub avatar: &'static str,
    pub weekly_goal: i64,
    pub role: &'static str,
}

pub const SEED_ADMIN: SeedUser = SeedUser {
    name: "ADMIN_01",
    avatar: "https://picsum.photos/seed/admin/100/100",
    weekly_goal: 100,
    role: "ADMIN",
};

pub const SEED_USER: SeedUser = SeedUser {
    name: "USER_01",
    avatar: "https://picsum.photos/seed/cyberpunk/100/100",
    weekly_goal: 82,
    role: "USER",
};

pub struct SeedVocab {
    pub word: &'static str,
    pub form: &'static str,
    pub meaning: &'static str,
    pub example: &'static str,
}

pub const SEED_VOCAB: &[SeedVocab] = &[
    SeedVocab {
        word: "Ephemeral",
        form: "ADJ",
        meaning: "Lasting for a very short time.",
        example: "Fashions are ephemeral, changing with every season.",
    },
    SeedVocab {
        word: "Ubiquitous",
        form: "ADJ",
        meaning: "Present, appearing, or found everywhere.",
        example: "Smartphones have become ubiquitous in daily life.",
    },
];
