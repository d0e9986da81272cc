/// MIGRATION 0001: Initial database schema.
///
/// Every statement is `IF NOT EXISTS`, so the batch is re-run on each open.
pub const MIGRATION_0001: &str = r#"
PRAGMA encoding = "UTF-8";

-- Ingredient catalog: seeded shelf-life data keyed by the classifier label.
CREATE TABLE IF NOT EXISTS ingredient_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    english_name TEXT NOT NULL UNIQUE,
    korean_name TEXT NOT NULL,
    shelf_life INTEGER NOT NULL CHECK (shelf_life >= 0)
);

-- Ingredient list: the user's inventory.
CREATE TABLE IF NOT EXISTS ingredient_list (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    english_name TEXT NOT NULL,
    korean_name TEXT NOT NULL,
    calculated_shelf_life TEXT NOT NULL
);

-- Food catalog: seeded calorie data keyed by the classifier label.
CREATE TABLE IF NOT EXISTS food_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    english_name TEXT NOT NULL UNIQUE,
    korean_name TEXT NOT NULL,
    calories INTEGER NOT NULL CHECK (calories >= 0)
);

-- Food calories: the eaten-food log. eaten_date is "yyyy-MM-dd <meal slot>".
CREATE TABLE IF NOT EXISTS food_calories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    english_name TEXT NOT NULL,
    eaten_date TEXT NOT NULL,
    calories INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ingredient_list_korean_name ON ingredient_list (korean_name);
CREATE INDEX IF NOT EXISTS idx_food_calories_english_name ON food_calories (english_name);
"#;
