use crate::catalog;
use crate::error::Result;
use crate::models::{FoodCaloriesEntry, FoodInfo, IngredientInfo, IngredientListEntry};
use crate::schema;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initializes the connection pool for the database file, runs migrations and seeds catalogs.
///
/// The pool holds a single connection, so every caller gets exclusive access.
pub fn init_database(db_path: &Path) -> Result<DbPool> {
    log::info!("Database path: {}", db_path.display());

    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path);
    init_pool(manager)
}

/// Same as [`init_database`] but backed by a private in-memory database.
pub fn init_memory_database() -> Result<DbPool> {
    init_pool(SqliteConnectionManager::memory())
}

fn init_pool(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
    {
        let conn = pool.get()?;
        run_migrations(&conn)?;
        catalog::seed_catalogs(&conn)?;
    }
    Ok(pool)
}

/// Applies the schema. Safe to run on every open.
pub fn run_migrations(connection: &Connection) -> Result<()> {
    log::info!("Running database migrations...");

    // Migration 0001: Initial Schema
    connection.execute_batch(schema::MIGRATION_0001)?;

    log::info!("Migrations applied successfully.");
    Ok(())
}

fn row_to_ingredient_info(row: &Row) -> rusqlite::Result<IngredientInfo> {
    Ok(IngredientInfo {
        english_name: row.get("english_name")?,
        korean_name: row.get("korean_name")?,
        shelf_life_days: row.get("shelf_life")?,
    })
}

fn row_to_food_info(row: &Row) -> rusqlite::Result<FoodInfo> {
    Ok(FoodInfo {
        english_name: row.get("english_name")?,
        korean_name: row.get("korean_name")?,
        calories: row.get("calories")?,
    })
}

fn row_to_ingredient_entry(row: &Row) -> rusqlite::Result<IngredientListEntry> {
    Ok(IngredientListEntry {
        id: row.get("id")?,
        english_name: row.get("english_name")?,
        korean_name: row.get("korean_name")?,
        calculated_shelf_life: row.get("calculated_shelf_life")?,
    })
}

fn row_to_food_entry(row: &Row) -> rusqlite::Result<FoodCaloriesEntry> {
    Ok(FoodCaloriesEntry {
        id: row.get("id")?,
        english_name: row.get("english_name")?,
        eaten_date: row.get("eaten_date")?,
        calories: row.get("calories")?,
    })
}

/// Returns `false` when a row with the same english name already exists.
pub fn insert_ingredient_info(conn: &Connection, info: &IngredientInfo) -> Result<bool> {
    let changed = conn.execute(
        "INSERT INTO ingredient_info (english_name, korean_name, shelf_life)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(english_name) DO NOTHING",
        params![info.english_name, info.korean_name, info.shelf_life_days],
    )?;
    Ok(changed > 0)
}

/// Returns `false` when a row with the same english name already exists.
pub fn insert_food_info(conn: &Connection, info: &FoodInfo) -> Result<bool> {
    let changed = conn.execute(
        "INSERT INTO food_info (english_name, korean_name, calories)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(english_name) DO NOTHING",
        params![info.english_name, info.korean_name, info.calories],
    )?;
    Ok(changed > 0)
}

pub fn find_ingredient_info(conn: &Connection, english_name: &str) -> Result<Option<IngredientInfo>> {
    let info = conn
        .query_row(
            "SELECT english_name, korean_name, shelf_life FROM ingredient_info WHERE english_name = ?1",
            params![english_name],
            row_to_ingredient_info,
        )
        .optional()?;
    Ok(info)
}

pub fn find_food_info(conn: &Connection, english_name: &str) -> Result<Option<FoodInfo>> {
    let info = conn
        .query_row(
            "SELECT english_name, korean_name, calories FROM food_info WHERE english_name = ?1",
            params![english_name],
            row_to_food_info,
        )
        .optional()?;
    Ok(info)
}

pub fn list_ingredient_info(conn: &Connection) -> Result<Vec<IngredientInfo>> {
    let mut stmt =
        conn.prepare("SELECT english_name, korean_name, shelf_life FROM ingredient_info ORDER BY id")?;
    let rows = stmt.query_map([], row_to_ingredient_info)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_food_info(conn: &Connection) -> Result<Vec<FoodInfo>> {
    let mut stmt = conn.prepare("SELECT english_name, korean_name, calories FROM food_info ORDER BY id")?;
    let rows = stmt.query_map([], row_to_food_info)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn insert_ingredient_entry(
    conn: &Connection,
    english_name: &str,
    korean_name: &str,
    calculated_shelf_life: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingredient_list (english_name, korean_name, calculated_shelf_life)
         VALUES (?1, ?2, ?3)",
        params![english_name, korean_name, calculated_shelf_life],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_food_entry(conn: &Connection, english_name: &str, eaten_date: &str, calories: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO food_calories (english_name, eaten_date, calories) VALUES (?1, ?2, ?3)",
        params![english_name, eaten_date, calories],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_ingredient_entries(conn: &Connection) -> Result<Vec<IngredientListEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, english_name, korean_name, calculated_shelf_life FROM ingredient_list ORDER BY id",
    )?;
    let rows = stmt.query_map([], row_to_ingredient_entry)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn list_food_entries(conn: &Connection) -> Result<Vec<FoodCaloriesEntry>> {
    let mut stmt =
        conn.prepare("SELECT id, english_name, eaten_date, calories FROM food_calories ORDER BY id")?;
    let rows = stmt.query_map([], row_to_food_entry)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// English names in the inventory, each once, in the order they were first added.
pub fn distinct_ingredient_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT english_name FROM ingredient_list GROUP BY english_name ORDER BY MIN(id)",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Removes every inventory row with this korean name.
pub fn delete_ingredient_entries_named(conn: &Connection, korean_name: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM ingredient_list WHERE korean_name = ?1",
        params![korean_name],
    )?)
}

pub fn delete_ingredient_entry(conn: &Connection, id: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM ingredient_list WHERE id = ?1", params![id])?)
}

/// Removes every log row with this english name.
pub fn delete_food_entries_named(conn: &Connection, english_name: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM food_calories WHERE english_name = ?1",
        params![english_name],
    )?)
}

pub fn delete_food_entry(conn: &Connection, id: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM food_calories WHERE id = ?1", params![id])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn migrations_are_repeatable() {
        let conn = migrated();
        run_migrations(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('ingredient_info', 'ingredient_list', 'food_info', 'food_calories')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn catalog_insert_is_guarded_by_name() {
        let conn = migrated();
        let info = IngredientInfo {
            english_name: "garlic".into(),
            korean_name: "마늘".into(),
            shelf_life_days: 180,
        };
        assert!(insert_ingredient_info(&conn, &info).unwrap());
        assert!(!insert_ingredient_info(&conn, &info).unwrap());
        assert_eq!(list_ingredient_info(&conn).unwrap().len(), 1);
    }

    #[test]
    fn distinct_names_keep_first_seen_order() {
        let conn = migrated();
        insert_ingredient_entry(&conn, "onion", "양파", "a").unwrap();
        insert_ingredient_entry(&conn, "garlic", "마늘", "b").unwrap();
        insert_ingredient_entry(&conn, "onion", "양파", "c").unwrap();
        assert_eq!(
            distinct_ingredient_names(&conn).unwrap(),
            vec!["onion".to_string(), "garlic".to_string()]
        );
    }

    #[test]
    fn food_entries_come_back_in_insertion_order() {
        let conn = migrated();
        insert_food_entry(&conn, "pizza", "2024-01-01 점심", 285).unwrap();
        insert_food_entry(&conn, "sushi", "2024-01-01 저녁", 200).unwrap();
        let names: Vec<String> = list_food_entries(&conn)
            .unwrap()
            .into_iter()
            .map(|e| e.english_name)
            .collect();
        assert_eq!(names, vec!["pizza", "sushi"]);
    }
}
