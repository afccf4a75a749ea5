// starload-core/src/domain/catalog/queries.rs

// Default SELECTs feeding the fact and dimension tables.
// Column order matches the descriptors in `table.rs`. Events with no
// matching song never reach the fact table (song_id is NOT NULL there).

use crate::domain::catalog::dialect::Dialect;
use crate::domain::catalog::table::TableId;

const SONGPLAY_REDSHIFT: &str = "SELECT
        md5(events.sessionid || events.start_time) songplay_id,
        events.start_time,
        events.userid,
        events.level,
        songs.song_id,
        songs.artist_id,
        events.sessionid,
        events.location,
        events.useragent
    FROM (SELECT TIMESTAMP 'epoch' + ts/1000 * interval '1 second' AS start_time, *
          FROM staging_events
          WHERE page = 'NextSong') events
    LEFT JOIN staging_songs songs
        ON events.song = songs.title
        AND events.artist = songs.artist_name
        AND events.length = songs.duration
    WHERE songs.song_id IS NOT NULL";

const SONGPLAY_DUCKDB: &str = "SELECT
        md5(CAST(events.sessionid AS VARCHAR) || CAST(events.start_time AS VARCHAR)) AS songplay_id,
        events.start_time,
        events.userid,
        events.level,
        songs.song_id,
        songs.artist_id,
        events.sessionid,
        events.location,
        events.useragent
    FROM (SELECT epoch_ms(ts) AS start_time, *
          FROM staging_events
          WHERE page = 'NextSong') events
    LEFT JOIN staging_songs songs
        ON events.song = songs.title
        AND events.artist = songs.artist_name
        AND events.length = songs.duration
    WHERE songs.song_id IS NOT NULL";

const USER_INFO: &str = "SELECT DISTINCT userid, firstname, lastname, gender, level
    FROM staging_events
    WHERE page = 'NextSong'";

const SONG: &str = "SELECT DISTINCT song_id, title, artist_id, year, duration
    FROM staging_songs";

const ARTIST_REDSHIFT: &str = "SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
    FROM staging_songs";

const ARTIST_DUCKDB: &str = "SELECT DISTINCT artist_id, artist_name, artist_location,
        CAST(artist_latitude AS FLOAT), CAST(artist_longitude AS FLOAT)
    FROM staging_songs";

const TIME_REDSHIFT: &str = "SELECT DISTINCT start_time,
        extract(hour from start_time), extract(day from start_time), extract(week from start_time),
        extract(month from start_time), extract(year from start_time), extract(dayofweek from start_time)
    FROM songplay";

const TIME_DUCKDB: &str = "SELECT DISTINCT start_time,
        extract(hour from start_time), extract(day from start_time), extract(week from start_time),
        extract(month from start_time), extract(year from start_time), extract(dow from start_time)
    FROM songplay";

/// Default insert SELECT for a table, or `None` for staging tables
/// (those are filled by a bulk load, not by a query).
pub fn default_insert(table: TableId, dialect: Dialect) -> Option<&'static str> {
    let sql = match (table, dialect) {
        (TableId::StagingEvents | TableId::StagingSongs, _) => return None,
        (TableId::Songplay, Dialect::Redshift) => SONGPLAY_REDSHIFT,
        (TableId::Songplay, Dialect::DuckDb) => SONGPLAY_DUCKDB,
        (TableId::UserInfo, _) => USER_INFO,
        (TableId::Song, _) => SONG,
        (TableId::Artist, Dialect::Redshift) => ARTIST_REDSHIFT,
        (TableId::Artist, Dialect::DuckDb) => ARTIST_DUCKDB,
        (TableId::Time, Dialect::Redshift) => TIME_REDSHIFT,
        (TableId::Time, Dialect::DuckDb) => TIME_DUCKDB,
    };
    Some(sql)
}
