// starload-core/src/domain/catalog/table.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::catalog::dialect::Dialect;
use crate::domain::catalog::queries;
use crate::domain::compiler::Quoter;
use crate::domain::error::ConfigurationError;

/// Closed set of tables the pipeline knows how to build.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TableId {
    StagingEvents,
    StagingSongs,
    Songplay,
    UserInfo,
    Song,
    Artist,
    Time,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Staging,
    Fact,
    Dimension,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRole::Staging => write!(f, "staging"),
            TableRole::Fact => write!(f, "fact"),
            TableRole::Dimension => write!(f, "dimension"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub not_null: bool,
}

const fn col(name: &'static str, sql_type: &'static str) -> Column {
    Column {
        name,
        sql_type,
        not_null: false,
    }
}

const fn required(name: &'static str, sql_type: &'static str) -> Column {
    Column {
        name,
        sql_type,
        not_null: true,
    }
}

/// Name, ordered column schema and primary key of one warehouse table.
#[derive(Debug, PartialEq, Eq)]
pub struct TableDescriptor {
    pub id: TableId,
    pub name: &'static str,
    pub role: TableRole,
    pub columns: &'static [Column],
    pub primary_key: &'static [&'static str],
}

static STAGING_EVENTS: TableDescriptor = TableDescriptor {
    id: TableId::StagingEvents,
    name: "staging_events",
    role: TableRole::Staging,
    columns: &[
        col("artist", "varchar(255)"),
        col("auth", "varchar(255)"),
        col("firstname", "varchar(255)"),
        col("gender", "varchar(50)"),
        col("iteminsession", "bigint"),
        col("lastname", "varchar(255)"),
        col("length", "numeric"),
        col("level", "varchar(50)"),
        col("location", "varchar(500)"),
        col("method", "varchar(50)"),
        col("page", "varchar(100)"),
        col("registration", "numeric"),
        col("sessionid", "bigint"),
        col("song", "varchar(255)"),
        col("status", "int"),
        col("ts", "bigint"),
        col("useragent", "varchar(500)"),
        col("userid", "bigint"),
    ],
    primary_key: &[],
};

static STAGING_SONGS: TableDescriptor = TableDescriptor {
    id: TableId::StagingSongs,
    name: "staging_songs",
    role: TableRole::Staging,
    columns: &[
        col("num_songs", "int"),
        col("artist_id", "varchar(255)"),
        col("artist_latitude", "varchar(255)"),
        col("artist_longitude", "varchar(255)"),
        col("artist_location", "varchar(500)"),
        col("artist_name", "varchar(255)"),
        col("song_id", "varchar(255)"),
        col("title", "varchar(255)"),
        col("duration", "float"),
        col("year", "int"),
    ],
    primary_key: &[],
};

static SONGPLAY: TableDescriptor = TableDescriptor {
    id: TableId::Songplay,
    name: "songplay",
    role: TableRole::Fact,
    columns: &[
        required("songplay_id", "varchar(32)"),
        required("start_time", "timestamp"),
        required("userid", "bigint"),
        col("level", "varchar(100)"),
        required("song_id", "varchar(255)"),
        required("artist_id", "varchar(255)"),
        required("sessionid", "bigint"),
        col("location", "varchar(500)"),
        col("useragent", "varchar(500)"),
    ],
    primary_key: &["songplay_id"],
};

static USER_INFO: TableDescriptor = TableDescriptor {
    id: TableId::UserInfo,
    name: "user_info",
    role: TableRole::Dimension,
    columns: &[
        col("userid", "bigint"),
        col("firstname", "varchar(255)"),
        col("lastname", "varchar(255)"),
        col("gender", "varchar(50)"),
        col("level", "varchar(50)"),
    ],
    primary_key: &["userid"],
};

static SONG: TableDescriptor = TableDescriptor {
    id: TableId::Song,
    name: "song",
    role: TableRole::Dimension,
    columns: &[
        col("song_id", "varchar(255)"),
        col("title", "varchar(255)"),
        col("artist_id", "varchar(255)"),
        col("year", "int"),
        col("duration", "float"),
    ],
    primary_key: &["song_id"],
};

static ARTIST: TableDescriptor = TableDescriptor {
    id: TableId::Artist,
    name: "artist",
    role: TableRole::Dimension,
    columns: &[
        col("artist_id", "varchar(255)"),
        col("artist_name", "varchar(255)"),
        col("artist_location", "varchar(500)"),
        col("artist_latitude", "float"),
        col("artist_longitude", "float"),
    ],
    primary_key: &["artist_id"],
};

static TIME: TableDescriptor = TableDescriptor {
    id: TableId::Time,
    name: "time",
    role: TableRole::Dimension,
    columns: &[
        col("start_time", "timestamp"),
        col("hour", "int"),
        col("day", "int"),
        col("week", "int"),
        col("month", "int"),
        col("year", "int"),
        col("weekday", "int"),
    ],
    primary_key: &["start_time"],
};

impl TableId {
    pub const ALL: [TableId; 7] = [
        TableId::StagingEvents,
        TableId::StagingSongs,
        TableId::Songplay,
        TableId::UserInfo,
        TableId::Song,
        TableId::Artist,
        TableId::Time,
    ];

    pub fn descriptor(&self) -> &'static TableDescriptor {
        match self {
            TableId::StagingEvents => &STAGING_EVENTS,
            TableId::StagingSongs => &STAGING_SONGS,
            TableId::Songplay => &SONGPLAY,
            TableId::UserInfo => &USER_INFO,
            TableId::Song => &SONG,
            TableId::Artist => &ARTIST,
            TableId::Time => &TIME,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn role(&self) -> TableRole {
        self.descriptor().role
    }

    /// Parses a configured table name and checks it plays the expected role.
    pub fn resolve(name: &str, role: TableRole) -> Result<TableId, ConfigurationError> {
        let unknown = || ConfigurationError::UnknownTable {
            table: name.to_string(),
            role,
        };
        let id: TableId = name.parse().map_err(|_| unknown())?;
        if id.role() != role {
            return Err(unknown());
        }
        Ok(id)
    }
}

impl FromStr for TableId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TableDescriptor {
    pub fn quoted_name(&self) -> String {
        Quoter::identifier(self.name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// `CREATE TABLE "name" (...)` rendered for the given dialect.
    pub fn create_statement(&self, dialect: Dialect) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut line = format!("    {} {}", c.name, c.sql_type);
                if c.not_null {
                    line.push_str(" NOT NULL");
                }
                line
            })
            .collect();

        if dialect.renders_primary_keys() && !self.primary_key.is_empty() {
            lines.push(format!("    PRIMARY KEY ({})", self.primary_key.join(", ")));
        }

        format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quoted_name(),
            lines.join(",\n")
        )
    }

    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quoted_name())
    }
}

/// Everything a task needs about its target, looked up once at construction.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub descriptor: &'static TableDescriptor,
    pub create_sql: String,
    pub default_insert: Option<&'static str>,
}

impl TableDefinition {
    pub fn lookup(id: TableId, dialect: Dialect) -> Self {
        let descriptor = id.descriptor();
        Self {
            descriptor,
            create_sql: descriptor.create_statement(dialect),
            default_insert: queries::default_insert(id, dialect),
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_tables() -> anyhow::Result<()> {
        assert_eq!(
            TableId::resolve("staging_events", TableRole::Staging)?,
            TableId::StagingEvents
        );
        assert_eq!(TableId::resolve("songplay", TableRole::Fact)?, TableId::Songplay);
        assert_eq!(TableId::resolve("time", TableRole::Dimension)?, TableId::Time);
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_unknown_and_wrong_role() {
        assert!(matches!(
            TableId::resolve("songplays", TableRole::Fact),
            Err(ConfigurationError::UnknownTable { .. })
        ));
        // A dimension is not a valid fact target
        let err = TableId::resolve("user_info", TableRole::Fact);
        assert!(matches!(
            err,
            Err(ConfigurationError::UnknownTable { role: TableRole::Fact, .. })
        ));
    }

    #[test]
    fn test_create_statement_dialects() {
        let redshift = TableId::UserInfo.descriptor().create_statement(Dialect::Redshift);
        assert!(redshift.starts_with("CREATE TABLE \"user_info\" ("));
        assert!(redshift.contains("PRIMARY KEY (userid)"));

        let duck = TableId::UserInfo.descriptor().create_statement(Dialect::DuckDb);
        assert!(!duck.contains("PRIMARY KEY"));
        assert!(duck.contains("userid bigint"));
    }

    #[test]
    fn test_not_null_columns_rendered() {
        let sql = TableId::Songplay.descriptor().create_statement(Dialect::DuckDb);
        assert!(sql.contains("start_time timestamp NOT NULL"));
        assert!(sql.contains("level varchar(100),"));
    }

    #[test]
    fn test_staging_has_no_default_insert() {
        assert!(TableDefinition::lookup(TableId::StagingSongs, Dialect::Redshift)
            .default_insert
            .is_none());
        assert!(TableDefinition::lookup(TableId::Artist, Dialect::DuckDb)
            .default_insert
            .is_some());
    }
}
