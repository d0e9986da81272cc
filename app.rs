use crate::classifier::ImageClassifier;
use crate::config::{AppPaths, ClassifierConfig, Settings};
use crate::error::{Error, Result};
use crate::logging;
use crate::models::{
    FoodCaloriesEntry, FoodEstimate, IngredientListEntry, IngredientPrediction, MealSlot,
    ShelfLifeEstimate,
};
use crate::onnx::OnnxClassifier;
use crate::pipeline::Pipeline;
use crate::recommend::RecommendationClient;
use crate::store::Store;
use chrono::NaiveDate;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Flow controller a UI shell drives: owns the store, the classifiers and the
/// recommendation client, and remembers the last ingredient prediction.
pub struct App {
    store: Store,
    pipeline: Pipeline,
    recommender: Option<RecommendationClient>,
    prediction: Mutex<IngredientPrediction>,
}

impl App {
    pub fn new(store: Store, pipeline: Pipeline, recommender: Option<RecommendationClient>) -> Self {
        Self {
            store,
            pipeline,
            recommender,
            prediction: Mutex::new(IngredientPrediction::default()),
        }
    }

    /// Process start-up: logging, settings, store, models and API client.
    /// Bad settings, missing models or a missing API key only disable the
    /// matching feature.
    pub fn bootstrap(paths: &AppPaths) -> Self {
        logging::init();

        let settings = Settings::load_or_default(&paths.settings_path());
        let store = Store::open(&paths.db_path);
        let pipeline = Pipeline::new(
            load_classifier(paths, &settings.classifier, &settings.classifier.ingredient_model_path),
            load_classifier(paths, &settings.classifier, &settings.classifier.food_model_path),
        );
        let recommender = match RecommendationClient::from_config(&settings.recommendation) {
            Ok(client) => Some(client),
            Err(err) => {
                log::warn!("Recipe recommendations disabled: {err}");
                None
            }
        };
        Self::new(store, pipeline, recommender)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn current_prediction(&self) -> IngredientPrediction {
        self.prediction
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Classifies a photographed ingredient and resolves its expiration date from `today`.
    ///
    /// On failure the previous prediction is kept.
    pub async fn predict_ingredient(&self, image: Vec<u8>, today: NaiveDate) -> Result<IngredientPrediction> {
        let label = match self.pipeline.classify_ingredient(image).await {
            Ok(label) => label,
            Err(err) => {
                log::warn!("Ingredient classification failed: {err}");
                return Err(err);
            }
        };
        let estimate = self.pipeline.resolve_shelf_life(&self.store, &label, today);
        let prediction = IngredientPrediction::from(estimate);
        if let Ok(mut current) = self.prediction.lock() {
            *current = prediction.clone();
        }
        Ok(prediction)
    }

    /// Saves the current prediction to the inventory.
    pub fn confirm_prediction(&self) -> Result<Option<i64>> {
        let prediction = self.current_prediction();
        let estimate = ShelfLifeEstimate {
            english_name: prediction.english_name,
            korean_name: prediction.korean_name,
            expires_on: prediction.expires_on,
        };
        self.pipeline.confirm_ingredient(&self.store, &estimate)
    }

    pub async fn analyze_food(&self, image: Vec<u8>) -> Result<FoodEstimate> {
        self.pipeline.classify_food(&self.store, image).await
    }

    pub fn log_food(&self, estimate: &FoodEstimate, eaten_on: NaiveDate, slot: MealSlot) -> Result<Option<i64>> {
        self.pipeline.confirm_food(&self.store, estimate, eaten_on, slot)
    }

    pub fn add_ingredient(&self, name: &str, expires_on: NaiveDate) -> Result<Option<i64>> {
        self.pipeline.add_manual_ingredient(&self.store, name, expires_on)
    }

    pub fn add_food(&self, name: &str, calories: i64, eaten_on: NaiveDate, slot: MealSlot) -> Result<Option<i64>> {
        self.pipeline
            .add_manual_food(&self.store, name, calories, eaten_on, slot)
    }

    pub fn ingredients(&self) -> Vec<IngredientListEntry> {
        self.store.fetch_ingredient_list_entries()
    }

    pub fn food_log(&self) -> Vec<FoodCaloriesEntry> {
        self.store.fetch_food_log_entries()
    }

    pub fn remove_ingredient(&self, id: i64) -> bool {
        self.store.delete_ingredient_list_entry_by_id(id) > 0
    }

    pub fn remove_food(&self, id: i64) -> bool {
        self.store.delete_food_log_entry_by_id(id) > 0
    }

    /// Asks for recipes that use the ingredients currently in the inventory.
    pub async fn recommend_recipes(&self) -> Result<Vec<String>> {
        let client = self
            .recommender
            .as_ref()
            .ok_or_else(|| Error::Config("recommendation API key is not configured".into()))?;
        let names = self.store.fetch_distinct_ingredient_list_names();
        if names.is_empty() {
            return Err(Error::Validation("ingredient list is empty".into()));
        }
        client.recommend(&names).await
    }

    /// Deletes the database file and starts over with a freshly seeded one.
    ///
    /// If the file cannot be removed the store is left closed and an error is
    /// returned; the old data is never reopened as if it were fresh.
    pub fn reset(&mut self) -> Result<()> {
        let path = self
            .store
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Path("in-memory store has no file to reset".into()))?;
        if !self.store.delete_store_file() && path.exists() {
            return Err(Error::Path(format!(
                "failed to delete database file {}",
                path.display()
            )));
        }
        self.store = Store::try_open(&path)?;
        if let Ok(mut current) = self.prediction.lock() {
            *current = IngredientPrediction::default();
        }
        Ok(())
    }
}

fn load_classifier(paths: &AppPaths, config: &ClassifierConfig, model: &Path) -> Option<Arc<dyn ImageClassifier>> {
    let model_path = paths.resolve_model(model);
    match OnnxClassifier::load(&model_path, config.input_size) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(err) => {
            log::warn!("Classifier {} unavailable: {err}", model_path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN;
    use crate::pipeline::tests::{png_bytes, FixedClassifier};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app_with(results: &[(&str, f32)]) -> App {
        let pipeline = Pipeline::new(
            Some(FixedClassifier::new(results)),
            Some(FixedClassifier::new(&[("sushi", 0.8)])),
        );
        App::new(Store::open_in_memory().unwrap(), pipeline, None)
    }

    #[tokio::test]
    async fn prediction_then_confirmation_adds_entry() {
        let app = app_with(&[("garlic", 0.91), ("onion", 0.05)]);
        let prediction = app.predict_ingredient(png_bytes(), day(2024, 1, 1)).await.unwrap();
        assert_eq!(prediction.korean_name, "마늘");
        assert_eq!(prediction.expires_on, "2024년 06월 29일");
        assert_eq!(app.current_prediction(), prediction);

        let id = app.confirm_prediction().unwrap().unwrap();
        let entries = app.ingredients();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].calculated_shelf_life, "2024년 06월 29일 까지");

        assert!(app.remove_ingredient(id));
        assert!(app.ingredients().is_empty());
    }

    #[tokio::test]
    async fn failed_classification_keeps_state_and_store_untouched() {
        let app = app_with(&[]);
        assert!(app.predict_ingredient(png_bytes(), day(2024, 1, 1)).await.is_err());
        assert_eq!(app.current_prediction(), IngredientPrediction::default());
        assert_eq!(app.current_prediction().english_name, UNKNOWN);
        assert!(matches!(app.confirm_prediction(), Err(Error::Unconfirmed(_))));
        assert!(app.ingredients().is_empty());
    }

    #[tokio::test]
    async fn failed_classification_keeps_previous_prediction() {
        let app = app_with(&[("onion", 0.7)]);
        let first = app.predict_ingredient(png_bytes(), day(2024, 1, 1)).await.unwrap();
        assert!(app
            .predict_ingredient(b"not an image".to_vec(), day(2024, 1, 2))
            .await
            .is_err());
        assert_eq!(app.current_prediction(), first);
        assert!(app.ingredients().is_empty());
    }

    #[tokio::test]
    async fn uncatalogued_ingredient_cannot_be_confirmed() {
        let app = app_with(&[("durian", 0.99)]);
        let prediction = app.predict_ingredient(png_bytes(), day(2024, 1, 1)).await.unwrap();
        assert_eq!(prediction.english_name, "durian");
        assert_eq!(prediction.expires_on, UNKNOWN);
        assert!(app.confirm_prediction().is_err());
        assert!(app.ingredients().is_empty());
    }

    #[tokio::test]
    async fn food_analysis_logs_with_meal_slot() {
        let app = app_with(&[]);
        let estimate = app.analyze_food(png_bytes()).await.unwrap();
        let id = app.log_food(&estimate, day(2024, 3, 5), MealSlot::Breakfast).unwrap().unwrap();
        let log = app.food_log();
        assert_eq!(log[0].english_name, "sushi");
        assert_eq!(log[0].calories, 200);
        assert_eq!(log[0].eaten_date, "2024-03-05 아침");
        assert!(app.remove_food(id));
        assert!(!app.remove_food(id));
    }

    #[tokio::test]
    async fn recommendations_need_a_client() {
        let app = app_with(&[]);
        app.add_ingredient("garlic", day(2024, 1, 1)).unwrap();
        assert!(matches!(app.recommend_recipes().await, Err(Error::Config(_))));
    }

    #[test]
    fn reset_starts_from_a_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_root(dir.path()).unwrap();
        let mut app = App::new(Store::open(&paths.db_path), Pipeline::default(), None);
        app.add_food("bibimbap", 550, day(2024, 1, 1), MealSlot::Dinner).unwrap();
        assert_eq!(app.food_log().len(), 1);

        app.reset().unwrap();
        assert!(app.food_log().is_empty());
        assert!(app.store().lookup_ingredient_catalog("garlic").is_some());
    }

    #[test]
    fn reset_fails_when_file_cannot_be_removed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_root(dir.path()).unwrap();
        let mut app = App::new(Store::open(&paths.db_path), Pipeline::default(), None);
        app.add_food("bibimbap", 550, day(2024, 1, 1), MealSlot::Dinner).unwrap();

        // A directory in place of the database file makes removal fail.
        std::fs::remove_file(&paths.db_path).unwrap();
        std::fs::create_dir(&paths.db_path).unwrap();

        assert!(matches!(app.reset(), Err(Error::Path(_))));
        assert!(paths.db_path.is_dir());
        assert!(!app.store().is_available());
    }

    #[test]
    fn bootstrap_survives_a_broken_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_root(dir.path()).unwrap();
        std::fs::write(paths.settings_path(), r#"{"classifier": {"input_size": "big"}}"#).unwrap();
        let app = App::bootstrap(&paths);
        assert!(app.store().is_available());
        assert!(paths.db_path.exists());
    }

    #[test]
    fn bootstrap_without_models_or_key_still_opens_store() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_root(dir.path()).unwrap();
        std::fs::write(
            paths.settings_path(),
            r#"{"recommendation": {"api_key": "k"}}"#,
        )
        .unwrap();
        let app = App::bootstrap(&paths);
        assert!(app.store().is_available());
        assert!(paths.db_path.exists());
        assert!(app.recommender.is_some());
    }
}
