use crate::db::{self, DbConnection, DbPool};
use crate::error::{Error, Result};
use crate::models::{FoodCaloriesEntry, FoodInfo, IngredientInfo, IngredientListEntry};
use std::path::{Path, PathBuf};

/// Handle to the local database.
///
/// Every operation logs its failure and degrades to an empty result, `None`
/// or `0`; nothing is returned as an error past this type. A store that failed
/// to open stays usable as a value but every call on it is a no-op.
#[derive(Clone)]
pub struct Store {
    pool: Option<DbPool>,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens (creating if needed) the database file, applies the schema and seeds catalogs.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match db::init_database(&path) {
            Ok(pool) => Self {
                pool: Some(pool),
                path: Some(path),
            },
            Err(err) => {
                log::error!("Failed to open database {}: {}", path.display(), err);
                Self {
                    pool: None,
                    path: Some(path),
                }
            }
        }
    }

    pub fn try_open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let pool = db::init_database(&path)?;
        Ok(Self {
            pool: Some(pool),
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            pool: Some(db::init_memory_database()?),
            path: None,
        })
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<T>(&self, op: &str, f: impl FnOnce(&DbConnection) -> Result<T>) -> Option<T> {
        let Some(pool) = self.pool.as_ref() else {
            log::warn!("{op}: store unavailable");
            return None;
        };
        let result = pool.get().map_err(Error::from).and_then(|conn| f(&conn));
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{op} failed: {err}");
                None
            }
        }
    }

    pub fn insert_ingredient_catalog_row(&self, info: &IngredientInfo) -> bool {
        self.with_conn("insert ingredient catalog row", |conn| {
            db::insert_ingredient_info(conn, info)
        })
        .unwrap_or(false)
    }

    pub fn insert_food_catalog_row(&self, info: &FoodInfo) -> bool {
        self.with_conn("insert food catalog row", |conn| db::insert_food_info(conn, info))
            .unwrap_or(false)
    }

    /// Appends an inventory row and returns its id.
    pub fn insert_ingredient_list_entry(
        &self,
        english_name: &str,
        korean_name: &str,
        shelf_life_label: &str,
    ) -> Option<i64> {
        let id = self.with_conn("insert ingredient list entry", |conn| {
            db::insert_ingredient_entry(conn, english_name, korean_name, shelf_life_label)
        })?;
        log::info!("Added ingredient {english_name} ({korean_name}), {shelf_life_label}");
        Some(id)
    }

    /// Appends an eaten-food row and returns its id.
    pub fn insert_food_log_entry(&self, english_name: &str, meal_slot_label: &str, calories: i64) -> Option<i64> {
        let id = self.with_conn("insert food log entry", |conn| {
            db::insert_food_entry(conn, english_name, meal_slot_label, calories)
        })?;
        log::info!("Logged {english_name}, {calories} kcal, {meal_slot_label}");
        Some(id)
    }

    pub fn fetch_ingredient_list_entries(&self) -> Vec<IngredientListEntry> {
        self.with_conn("fetch ingredient list", |conn| db::list_ingredient_entries(conn))
            .unwrap_or_default()
    }

    pub fn fetch_food_log_entries(&self) -> Vec<FoodCaloriesEntry> {
        self.with_conn("fetch food log", |conn| db::list_food_entries(conn))
            .unwrap_or_default()
    }

    pub fn fetch_ingredient_catalog(&self) -> Vec<IngredientInfo> {
        self.with_conn("fetch ingredient catalog", |conn| db::list_ingredient_info(conn))
            .unwrap_or_default()
    }

    pub fn fetch_food_catalog(&self) -> Vec<FoodInfo> {
        self.with_conn("fetch food catalog", |conn| db::list_food_info(conn))
            .unwrap_or_default()
    }

    /// Deletes every inventory row carrying this korean name. Returns the number removed.
    pub fn delete_ingredient_list_entry(&self, korean_name: &str) -> usize {
        self.with_conn("delete ingredient list entry", |conn| {
            db::delete_ingredient_entries_named(conn, korean_name)
        })
        .unwrap_or(0)
    }

    pub fn delete_ingredient_list_entry_by_id(&self, id: i64) -> usize {
        self.with_conn("delete ingredient list entry", |conn| db::delete_ingredient_entry(conn, id))
            .unwrap_or(0)
    }

    /// Deletes every log row carrying this english name. Returns the number removed.
    pub fn delete_food_log_entry(&self, english_name: &str) -> usize {
        self.with_conn("delete food log entry", |conn| {
            db::delete_food_entries_named(conn, english_name)
        })
        .unwrap_or(0)
    }

    pub fn delete_food_log_entry_by_id(&self, id: i64) -> usize {
        self.with_conn("delete food log entry", |conn| db::delete_food_entry(conn, id))
            .unwrap_or(0)
    }

    /// Point lookup in the ingredient catalog: `(korean_name, shelf_life_days)`.
    pub fn lookup_ingredient_catalog(&self, english_name: &str) -> Option<(String, i64)> {
        self.with_conn("lookup ingredient catalog", |conn| {
            db::find_ingredient_info(conn, english_name)
        })
        .flatten()
        .map(|info| (info.korean_name, info.shelf_life_days))
    }

    pub fn lookup_food_catalog(&self, english_name: &str) -> Option<FoodInfo> {
        self.with_conn("lookup food catalog", |conn| db::find_food_info(conn, english_name))
            .flatten()
    }

    pub fn fetch_distinct_ingredient_list_names(&self) -> Vec<String> {
        self.with_conn("fetch ingredient names", |conn| db::distinct_ingredient_names(conn))
            .unwrap_or_default()
    }

    /// Closes this handle and removes the backing file. Clones of this store
    /// keep their connection until dropped.
    pub fn delete_store_file(&mut self) -> bool {
        self.pool = None;
        let Some(path) = self.path.as_ref() else {
            log::warn!("delete store file: in-memory store has no file");
            return false;
        };
        match std::fs::remove_file(path) {
            Ok(()) => {
                log::info!("Deleted database file {}", path.display());
                true
            }
            Err(err) => {
                log::warn!("Failed to delete database file {}: {}", path.display(), err);
                false
            }
        }
    }
}
