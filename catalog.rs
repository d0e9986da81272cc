use crate::db;
use crate::error::Result;
use crate::models::{FoodInfo, IngredientInfo};
use rusqlite::Connection;

/// Built-in ingredient catalog: (english name, korean name, shelf life in days).
pub const DEFAULT_INGREDIENTS: &[(&str, &str, i64)] = &[
    ("apple", "사과", 7),
    ("banana", "바나나", 5),
    ("beetroot", "비트", 14),
    ("bell pepper", "피망", 7),
    ("cabbage", "양배추", 21),
    ("capsicum", "고추", 7),
    ("carrot", "당근", 21),
    ("cauliflower", "콜리플라워", 7),
    ("chilli pepper", "고추", 7),
    ("corn", "옥수수", 5),
    ("cucumber", "오이", 7),
    ("eggplant", "가지", 4),
    ("garlic", "마늘", 180),
    ("ginger", "생강", 30),
    ("grapes", "포도", 7),
    ("jalepeno", "할라페뇨", 7),
    ("kiwi", "키위", 7),
    ("lemon", "레몬", 21),
    ("lettuce", "상추", 7),
    ("mango", "망고", 5),
    ("onion", "양파", 60),
    ("orange", "오렌지", 21),
    ("paprika", "파프리카", 7),
    ("pear", "배", 7),
    ("peas", "완두콩", 5),
    ("pineapple", "파인애플", 5),
    ("pomegranate", "석류", 14),
    ("potato", "감자", 90),
    ("raddish", "무", 14),
    ("soy beans", "콩", 7),
    ("spinach", "시금치", 5),
    ("sweetcorn", "단옥수수", 3),
    ("sweetpotato", "고구마", 30),
    ("tomato", "토마토", 7),
    ("turnip", "순무", 14),
    ("watermelon", "수박", 7),
];

/// Built-in food catalog: (english name, korean name, kcal per serving).
pub const DEFAULT_FOODS: &[(&str, &str, i64)] = &[
    ("Baked Potato", "베이크드 포테이토", 161),
    ("Crispy Chicken", "크리스피 치킨", 246),
    ("Donut", "도넛", 195),
    ("Fries", "감자튀김", 312),
    ("Hot Dog", "핫도그", 151),
    ("Sandwich", "샌드위치", 250),
    ("Taco", "타코", 226),
    ("Taquito", "타키토", 190),
    ("apple_pie", "애플파이", 296),
    ("burger", "버거", 354),
    ("butter_naan", "버터난", 292),
    ("chai", "차", 120),
    ("chapati", "차파티", 120),
    ("cheesecake", "치즈케이크", 257),
    ("chicken_curry", "치킨커리", 243),
    ("chole_bhature", "촐레 바투레", 427),
    ("dal_makhani", "달 마카니", 350),
    ("dhokla", "도클라", 162),
    ("fried_rice", "볶음밥", 250),
    ("ice_cream", "아이스크림", 137),
    ("idli", "이들리", 58),
    ("jalebi", "잘레비", 150),
    ("kaathi_rolls", "커티 롤스", 200),
    ("kadai_paneer", "카다이 파니르", 260),
    ("kulfi", "쿨피", 120),
    ("masala_dosa", "마살라 도사", 168),
    ("momos", "모모", 35),
    ("omelette", "오믈렛", 154),
    ("paani_puri", "파니 푸리", 200),
    ("pakode", "파코데", 170),
    ("pav_bhaji", "파브 바지", 400),
    ("pizza", "피자", 285),
    ("samosa", "사모사", 252),
    ("sushi", "스시", 200),
];

pub fn default_ingredients() -> impl Iterator<Item = IngredientInfo> {
    DEFAULT_INGREDIENTS
        .iter()
        .map(|(english, korean, days)| IngredientInfo {
            english_name: english.to_string(),
            korean_name: korean.to_string(),
            shelf_life_days: *days,
        })
}

pub fn default_foods() -> impl Iterator<Item = FoodInfo> {
    DEFAULT_FOODS.iter().map(|(english, korean, calories)| FoodInfo {
        english_name: english.to_string(),
        korean_name: korean.to_string(),
        calories: *calories,
    })
}

/// Inserts any built-in catalog rows that are missing. Returns how many rows were added.
pub fn seed_catalogs(conn: &Connection) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0usize;
    for info in default_ingredients() {
        if db::insert_ingredient_info(&tx, &info)? {
            inserted += 1;
        }
    }
    for info in default_foods() {
        if db::insert_food_info(&tx, &info)? {
            inserted += 1;
        }
    }
    tx.commit()?;
    if inserted > 0 {
        log::info!("Seeded {inserted} catalog rows");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_keys_are_unique() {
        let ingredients: HashSet<&str> = DEFAULT_INGREDIENTS.iter().map(|r| r.0).collect();
        assert_eq!(ingredients.len(), DEFAULT_INGREDIENTS.len());
        let foods: HashSet<&str> = DEFAULT_FOODS.iter().map(|r| r.0).collect();
        assert_eq!(foods.len(), DEFAULT_FOODS.len());
    }

    #[test]
    fn catalog_values_are_non_negative() {
        assert!(default_ingredients().all(|i| i.shelf_life_days >= 0));
        assert!(default_foods().all(|f| f.calories >= 0));
    }
}
