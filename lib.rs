pub mod app;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod onnx;
pub mod pipeline;
pub mod recommend;
pub mod schema;
pub mod store;

pub use app::App;
pub use classifier::ImageClassifier;
pub use config::{AppPaths, Settings};
pub use error::{Error, Result};
pub use models::{
    CalorieSource, FoodCaloriesEntry, FoodEstimate, FoodInfo, IngredientInfo, IngredientListEntry,
    IngredientPrediction, MealSlot, UNKNOWN,
};
pub use pipeline::Pipeline;
pub use recommend::RecommendationClient;
pub use store::Store;
