use crate::classifier::{decode_image, rank, ImageClassifier};
use crate::error::{Error, Result};
use crate::models::{
    CalorieSource, Classification, FoodEstimate, MealSlot, ShelfLifeEstimate, UNKNOWN,
};
use crate::store::Store;
use chrono::{Days, NaiveDate};
use std::sync::Arc;

/// Display format for a resolved expiration date, e.g. `2024년 06월 29일`.
pub const EXPIRY_DISPLAY_FORMAT: &str = "%Y년 %m월 %d일";
/// Format for dates picked by hand and for the food log.
pub const PICKED_DATE_FORMAT: &str = "%Y-%m-%d";
/// Appended to every expiration label stored in the inventory.
pub const EXPIRY_SUFFIX: &str = " 까지";

/// Photo → classifier → catalog → record.
///
/// Holds the classifiers only; the store is passed to each call so the owner
/// decides which handle is current.
#[derive(Clone, Default)]
pub struct Pipeline {
    ingredient_classifier: Option<Arc<dyn ImageClassifier>>,
    food_classifier: Option<Arc<dyn ImageClassifier>>,
}

impl Pipeline {
    pub fn new(
        ingredient_classifier: Option<Arc<dyn ImageClassifier>>,
        food_classifier: Option<Arc<dyn ImageClassifier>>,
    ) -> Self {
        Self {
            ingredient_classifier,
            food_classifier,
        }
    }

    /// Returns the top label for a photographed ingredient.
    pub async fn classify_ingredient(&self, image: Vec<u8>) -> Result<String> {
        let top = classify_top(self.ingredient_classifier.clone(), image).await?;
        log::info!("Predicted ingredient: {} ({:.2})", top.label, top.confidence);
        Ok(top.label)
    }

    /// Looks up the shelf life of `label` and dates it from `as_of`.
    pub fn resolve_shelf_life(&self, store: &Store, label: &str, as_of: NaiveDate) -> ShelfLifeEstimate {
        resolve_shelf_life(store, label, as_of)
    }

    /// Returns the top label for a photographed dish with a calorie figure.
    pub async fn classify_food(&self, store: &Store, image: Vec<u8>) -> Result<FoodEstimate> {
        let top = classify_top(self.food_classifier.clone(), image).await?;
        let estimate = estimate_calories(store, &top);
        log::info!(
            "Predicted food: {} ({} kcal, {:?})",
            estimate.english_name,
            estimate.calories,
            estimate.source
        );
        Ok(estimate)
    }

    /// Saves a classified ingredient. Returns the new row id, or `None` when
    /// the store could not take it.
    pub fn confirm_ingredient(&self, store: &Store, estimate: &ShelfLifeEstimate) -> Result<Option<i64>> {
        if !estimate.is_resolved() {
            log::warn!("Refusing to save unresolved ingredient {}", estimate.english_name);
            return Err(Error::Unconfirmed(
                "ingredient or expiration date is unknown".into(),
            ));
        }
        let label = format!("{}{EXPIRY_SUFFIX}", estimate.expires_on);
        Ok(store.insert_ingredient_list_entry(&estimate.english_name, &estimate.korean_name, &label))
    }

    /// Saves a classified dish under the given day and meal.
    pub fn confirm_food(
        &self,
        store: &Store,
        estimate: &FoodEstimate,
        eaten_on: NaiveDate,
        slot: MealSlot,
    ) -> Result<Option<i64>> {
        if is_sentinel(&estimate.english_name) || estimate.calories < 0 {
            log::warn!("Refusing to save unresolved food {}", estimate.english_name);
            return Err(Error::Unconfirmed("food or calories are unknown".into()));
        }
        Ok(store.insert_food_log_entry(
            &estimate.english_name,
            &eaten_date_label(eaten_on, slot),
            estimate.calories,
        ))
    }

    /// Adds an ingredient typed in by hand with a picked expiration date.
    pub fn add_manual_ingredient(&self, store: &Store, name: &str, expires_on: NaiveDate) -> Result<Option<i64>> {
        let name = required(name, "ingredient name")?;
        let label = format!("{}{EXPIRY_SUFFIX}", expires_on.format(PICKED_DATE_FORMAT));
        Ok(store.insert_ingredient_list_entry(name, name, &label))
    }

    /// Adds an eaten dish typed in by hand.
    pub fn add_manual_food(
        &self,
        store: &Store,
        name: &str,
        calories: i64,
        eaten_on: NaiveDate,
        slot: MealSlot,
    ) -> Result<Option<i64>> {
        let name = required(name, "food name")?;
        if calories < 0 {
            return Err(Error::Validation("calories must not be negative".into()));
        }
        Ok(store.insert_food_log_entry(name, &eaten_date_label(eaten_on, slot), calories))
    }
}

pub fn resolve_shelf_life(store: &Store, label: &str, as_of: NaiveDate) -> ShelfLifeEstimate {
    if is_sentinel(label) {
        return ShelfLifeEstimate::unknown(UNKNOWN);
    }
    let Some((korean_name, days)) = store.lookup_ingredient_catalog(label) else {
        log::info!("No shelf-life data for {label}");
        return ShelfLifeEstimate::unknown(label);
    };
    let expires = u64::try_from(days)
        .ok()
        .and_then(|days| as_of.checked_add_days(Days::new(days)));
    match expires {
        Some(date) => ShelfLifeEstimate {
            english_name: label.to_string(),
            korean_name,
            expires_on: date.format(EXPIRY_DISPLAY_FORMAT).to_string(),
        },
        None => {
            log::warn!("Shelf life of {days} days for {label} is out of range");
            ShelfLifeEstimate::unknown(label)
        }
    }
}

/// `yyyy-MM-dd <meal>` as stored in the food log.
pub fn eaten_date_label(date: NaiveDate, slot: MealSlot) -> String {
    format!("{} {}", date.format(PICKED_DATE_FORMAT), slot.label())
}

fn estimate_calories(store: &Store, top: &Classification) -> FoodEstimate {
    if let Some(info) = store.lookup_food_catalog(&top.label) {
        return FoodEstimate {
            english_name: top.label.clone(),
            korean_name: Some(info.korean_name),
            calories: info.calories,
            source: CalorieSource::Catalog,
        };
    }
    // TODO: replace with a nutrition database lookup for labels missing from the food catalog.
    log::warn!(
        "{} is not in the food catalog; using confidence placeholder for calories",
        top.label
    );
    FoodEstimate {
        english_name: top.label.clone(),
        korean_name: None,
        calories: (top.confidence * 100.0).round() as i64,
        source: CalorieSource::ConfidencePlaceholder,
    }
}

async fn classify_top(classifier: Option<Arc<dyn ImageClassifier>>, image: Vec<u8>) -> Result<Classification> {
    let classifier =
        classifier.ok_or_else(|| Error::Classification("model unavailable".into()))?;
    let results = tokio::task::spawn_blocking(move || {
        let decoded = decode_image(&image)?;
        classifier.classify(&decoded)
    })
    .await
    .map_err(|e| Error::Classification(format!("Task join error: {e}")))??;
    rank(results)
        .into_iter()
        .next()
        .filter(|top| !is_sentinel(&top.label))
        .ok_or_else(|| Error::Classification("no results".into()))
}

fn is_sentinel(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || label == UNKNOWN
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{what} is empty")));
    }
    Ok(value)
}
