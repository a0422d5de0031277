//! Spending anomaly detection
//!
//! Two entry points:
//! - Batch: fit an outlier model on a daily feature table and label the same
//!   table. Scores the rows it was trained on, for retrospective views.
//! - Online: `is_anomalous` judges the day of a single new record against the
//!   trailing 30 days, retraining a fresh model on every call. The candidate's
//!   own day never reaches the training set.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::features::{build_daily_features, DailyFeatureTable, DailyFeatures};
use crate::models::TransactionRecord;
use crate::outlier::{AnomalyLabel, IsolationForest, OutlierConfig, OutlierModel};

/// Anomaly engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Length of the online trailing window in calendar days
    pub window_days: i64,
    /// Parameters for the default isolation forest
    pub outlier: OutlierConfig,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            outlier: OutlierConfig::default(),
        }
    }
}

/// Longest accepted online window (ten years)
pub const MAX_WINDOW_DAYS: i64 = 3650;

impl AnomalyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(Error::Config(format!(
                "window_days must be between 0 and {}, got {}",
                MAX_WINDOW_DAYS, self.window_days
            )));
        }
        self.outlier.validate()
    }
}

/// A daily feature row with its verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledDay {
    pub date: NaiveDate,
    pub features: DailyFeatures,
    pub anomaly: bool,
}

/// Training and evaluation tables for one online check
#[derive(Debug, Clone)]
pub struct OnlineWindow {
    /// Candidate's date
    pub today: NaiveDate,
    /// Window days strictly before `today`
    pub training: DailyFeatureTable,
    /// `today` only, candidate included
    pub evaluation: DailyFeatureTable,
}

/// Builds a fresh, unfitted model for each training run
pub type ModelFactory<M> = Box<dyn Fn(&AnomalyConfig) -> M>;

/// Orchestrates outlier models over daily spending features
pub struct AnomalyEngine<M = IsolationForest> {
    config: AnomalyConfig,
    factory: ModelFactory<M>,
    model: Option<M>,
}

impl AnomalyEngine<IsolationForest> {
    pub fn new() -> Self {
        Self::with_config(AnomalyConfig::default())
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self::with_model_factory(
            config,
            Box::new(|config: &AnomalyConfig| IsolationForest::new(config.outlier.clone())),
        )
    }
}

impl Default for AnomalyEngine<IsolationForest> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: OutlierModel> AnomalyEngine<M> {
    /// Use a custom scoring strategy; `factory` runs once per training
    pub fn with_model_factory(config: AnomalyConfig, factory: ModelFactory<M>) -> Self {
        Self {
            config,
            factory,
            model: None,
        }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// The model from the last `train` call
    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    /// Fit a fresh model on the whole table, replacing any previous one
    pub fn train(&mut self, table: &DailyFeatureTable) -> Result<()> {
        let mut model = (self.factory)(&self.config);
        model.fit(&table.to_matrix())?;
        self.model = Some(model);
        Ok(())
    }

    /// Label every row of `table` with the trained model
    pub fn predict(&self, table: &DailyFeatureTable) -> Result<Vec<LabeledDay>> {
        let model = self.model.as_ref().ok_or(Error::ModelNotTrained)?;
        let labels = score_aligned(model, table)?;

        Ok(table
            .rows()
            .iter()
            .zip(labels)
            .map(|(row, label)| LabeledDay {
                date: row.date,
                features: row.clone(),
                anomaly: label.is_anomalous(),
            })
            .collect())
    }

    /// Train on `table` and label it; an empty table yields no rows
    pub fn detect(&mut self, table: &DailyFeatureTable) -> Result<Vec<LabeledDay>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }
        self.train(table)?;
        self.predict(table)
    }

    /// Dates flagged by the batch operation over `table`
    pub fn anomalous_dates(&mut self, table: &DailyFeatureTable) -> Result<Vec<NaiveDate>> {
        Ok(self
            .detect(table)?
            .into_iter()
            .filter(|day| day.anomaly)
            .map(|day| day.date)
            .collect())
    }

    /// Split history plus candidate into the online training/evaluation tables
    ///
    /// Returns None when history is empty, the candidate has no usable date, or
    /// the window start falls outside the representable calendar.
    pub fn online_window(
        &self,
        candidate: &TransactionRecord,
        history: &[TransactionRecord],
    ) -> Option<OnlineWindow> {
        if history.is_empty() {
            return None;
        }
        let today = candidate.parsed_date()?;
        let cutoff = Duration::try_days(self.config.window_days)
            .and_then(|window| today.checked_sub_signed(window));
        let Some(cutoff) = cutoff else {
            debug!(%today, window_days = self.config.window_days, "Online window start out of range");
            return None;
        };

        let window: Vec<(NaiveDate, &TransactionRecord)> = history
            .iter()
            .chain(std::iter::once(candidate))
            .filter_map(|r| r.parsed_date().map(|d| (d, r)))
            .filter(|(d, _)| *d >= cutoff && *d <= today)
            .collect();

        let training =
            build_daily_features(window.iter().filter(|(d, _)| *d != today).map(|(_, r)| *r));
        let evaluation =
            build_daily_features(window.iter().filter(|(d, _)| *d == today).map(|(_, r)| *r));

        debug!(
            %today,
            window_records = window.len(),
            training_days = training.len(),
            evaluation_days = evaluation.len(),
            "Built online anomaly window"
        );

        Some(OnlineWindow {
            today,
            training,
            evaluation,
        })
    }

    /// Whether the candidate's day looks anomalous against the trailing window
    ///
    /// Cost: fits a brand-new model on up to `window_days` days of history on
    /// every call. Never errors; missing evidence (no history, bad date, empty
    /// training or evaluation day) answers `false`.
    pub fn is_anomalous(&self, candidate: &TransactionRecord, history: &[TransactionRecord]) -> bool {
        let Some(window) = self.online_window(candidate, history) else {
            return false;
        };
        if window.training.is_empty() || window.evaluation.is_empty() {
            return false;
        }

        let mut model = (self.factory)(&self.config);
        if let Err(e) = model.fit(&window.training.to_matrix()) {
            warn!("Online anomaly model failed to fit: {}", e);
            return false;
        }

        match score_aligned(&model, &window.evaluation) {
            Ok(labels) => labels.first().map(AnomalyLabel::is_anomalous).unwrap_or(false),
            Err(e) => {
                warn!("Online anomaly scoring failed: {}", e);
                false
            }
        }
    }
}

/// Score `table` after reindexing it to the model's training columns
fn score_aligned<M: OutlierModel>(model: &M, table: &DailyFeatureTable) -> Result<Vec<AnomalyLabel>> {
    let matrix = table.to_matrix();
    let matrix = match model.columns() {
        Some(columns) => matrix.reindex(columns),
        None => matrix,
    };
    model.score(&matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{category_column, FeatureMatrix, TOTAL_SPENT};
    use crate::models::{Category, TransactionKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Roughly 20/day of food for `days` days ending the day before `today`
    fn stable_history(today: NaiveDate, days: i64) -> Vec<TransactionRecord> {
        (1..=days)
            .map(|i| {
                let amount = 18.0 + ((i * 37) % 40) as f64 * 0.1;
                TransactionRecord::expense(amount, Category::Food, today - Duration::days(i))
            })
            .collect()
    }

    /// Fake model that records what it was fitted on and flags everything
    struct RecordingModel {
        fitted: Rc<RefCell<Vec<FeatureMatrix>>>,
        columns: Option<Vec<String>>,
    }

    impl OutlierModel for RecordingModel {
        fn fit(&mut self, data: &FeatureMatrix) -> Result<()> {
            self.fitted.borrow_mut().push(data.clone());
            self.columns = Some(data.columns().to_vec());
            Ok(())
        }

        fn score(&self, data: &FeatureMatrix) -> Result<Vec<AnomalyLabel>> {
            assert_eq!(Some(data.columns()), self.columns.as_deref());
            Ok(vec![AnomalyLabel::Anomalous; data.len()])
        }

        fn columns(&self) -> Option<&[String]> {
            self.columns.as_deref()
        }
    }

    fn recording_engine() -> (AnomalyEngine<RecordingModel>, Rc<RefCell<Vec<FeatureMatrix>>>) {
        let fitted = Rc::new(RefCell::new(Vec::new()));
        let handle = fitted.clone();
        let engine = AnomalyEngine::with_model_factory(
            AnomalyConfig::default(),
            Box::new(move |_: &AnomalyConfig| RecordingModel {
                fitted: handle.clone(),
                columns: None,
            }),
        );
        (engine, fitted)
    }

    #[test]
    fn test_empty_history_is_not_anomalous() {
        let engine = AnomalyEngine::new();
        let candidate = TransactionRecord::expense(500.0, Category::Food, date(2024, 3, 15));
        assert!(!engine.is_anomalous(&candidate, &[]));
    }

    #[test]
    fn test_unparseable_candidate_date_is_not_anomalous() {
        let engine = AnomalyEngine::new();
        let history = stable_history(date(2024, 3, 15), 40);

        let mut candidate = TransactionRecord::expense(500.0, Category::Food, date(2024, 3, 15));
        candidate.date = Some("15/03/2024".to_string());
        assert!(!engine.is_anomalous(&candidate, &history));

        candidate.date = None;
        assert!(!engine.is_anomalous(&candidate, &history));
    }

    #[test]
    fn test_empty_training_window_is_not_anomalous() {
        let (engine, fitted) = recording_engine();
        let today = date(2024, 3, 15);
        // Only activity is 31+ days old or on the candidate's own day
        let history = vec![
            TransactionRecord::expense(20.0, Category::Food, today - Duration::days(31)),
            TransactionRecord::expense(20.0, Category::Food, today),
        ];
        let candidate = TransactionRecord::expense(500.0, Category::Food, today);

        assert!(!engine.is_anomalous(&candidate, &history));
        assert!(fitted.borrow().is_empty(), "no model should be fitted");
    }

    #[test]
    fn test_income_candidate_has_no_evaluation_day() {
        let (engine, _) = recording_engine();
        let today = date(2024, 3, 15);
        let history = stable_history(today, 10);
        let candidate = TransactionRecord::new(3000.0, "salary", TransactionKind::Income, today);
        assert!(!engine.is_anomalous(&candidate, &history));
    }

    #[test]
    fn test_window_is_inclusive_and_excludes_candidate_day() {
        let engine = AnomalyEngine::new();
        let today = date(2024, 3, 15);
        let mut history = stable_history(today, 40);
        // Extreme spending already recorded on the candidate's day
        history.push(TransactionRecord::expense(9000.0, Category::Shopping, today));
        // Future-dated noise stays out of the window
        history.push(TransactionRecord::expense(50.0, Category::Food, today + Duration::days(1)));
        let candidate = TransactionRecord::expense(25.0, Category::Food, today);

        let window = engine.online_window(&candidate, &history).unwrap();
        assert_eq!(window.today, today);

        let dates = window.training.dates();
        assert_eq!(dates.len(), 30);
        assert_eq!(dates.first(), Some(&(today - Duration::days(30))));
        assert_eq!(dates.last(), Some(&(today - Duration::days(1))));
        assert!(!dates.contains(&today));
        assert!(window
            .training
            .rows()
            .iter()
            .all(|r| r.spent_on(Category::Shopping) == 0.0));

        assert_eq!(window.evaluation.dates(), vec![today]);
        let day = window.evaluation.get(today).unwrap();
        assert_eq!(day.total_spent, 9025.0);
    }

    #[test]
    fn test_model_never_sees_candidate_day() {
        let (engine, fitted) = recording_engine();
        let today = date(2024, 3, 15);
        let mut history = stable_history(today, 40);
        history.push(TransactionRecord::expense(9000.0, Category::Food, today));
        let candidate = TransactionRecord::expense(500.0, Category::Food, today);

        assert!(engine.is_anomalous(&candidate, &history));

        let fitted = fitted.borrow();
        assert_eq!(fitted.len(), 1);
        let total_column = fitted[0].columns().iter().position(|c| c == "total_spent").unwrap();
        assert!(fitted[0].rows().iter().all(|row| row[total_column] < 100.0));
        assert_eq!(fitted[0].len(), 30);
    }

    #[test]
    fn test_spike_day_is_anomalous() {
        let engine = AnomalyEngine::new();
        let today = date(2024, 3, 15);
        let history = stable_history(today, 40);
        let candidate = TransactionRecord::expense(500.0, Category::Food, today);

        assert!(engine.is_anomalous(&candidate, &history));
    }

    #[test]
    fn test_typical_day_is_not_anomalous() {
        let engine = AnomalyEngine::new();
        let today = date(2024, 3, 13);
        let history = stable_history(today, 40);
        let candidate = TransactionRecord::expense(20.0, Category::Food, today);

        assert!(!engine.is_anomalous(&candidate, &history));
    }

    #[test]
    fn test_new_category_on_candidate_day_is_scored() {
        let (engine, fitted) = recording_engine();
        let today = date(2024, 3, 15);
        let history = stable_history(today, 40);
        let candidate = TransactionRecord::expense(15.0, Category::Entertainment, today);

        // Training days only ever spent on food; scoring must still succeed
        let window = engine.online_window(&candidate, &history).unwrap();
        assert!(window
            .training
            .rows()
            .iter()
            .all(|r| r.spent_on(Category::Entertainment) == 0.0));
        assert!(engine.is_anomalous(&candidate, &history));
        assert_eq!(fitted.borrow().len(), 1);
    }

    /// Reports a fitted column set that differs from the table schema
    struct ShiftedColumnsModel {
        columns: Vec<String>,
        scored: Rc<RefCell<Vec<FeatureMatrix>>>,
    }

    impl OutlierModel for ShiftedColumnsModel {
        fn fit(&mut self, _data: &FeatureMatrix) -> Result<()> {
            Ok(())
        }

        fn score(&self, data: &FeatureMatrix) -> Result<Vec<AnomalyLabel>> {
            self.scored.borrow_mut().push(data.clone());
            Ok(vec![AnomalyLabel::Normal; data.len()])
        }

        fn columns(&self) -> Option<&[String]> {
            Some(&self.columns)
        }
    }

    #[test]
    fn test_scoring_reindexes_to_model_columns() {
        let scored = Rc::new(RefCell::new(Vec::new()));
        let handle = scored.clone();
        let model_columns: Vec<String> = vec![
            "spent_gifts".to_string(),
            category_column(Category::Entertainment),
            TOTAL_SPENT.to_string(),
        ];
        let columns = model_columns.clone();
        let engine = AnomalyEngine::with_model_factory(
            AnomalyConfig::default(),
            Box::new(move |_: &AnomalyConfig| ShiftedColumnsModel {
                columns: columns.clone(),
                scored: handle.clone(),
            }),
        );

        let today = date(2024, 3, 15);
        let history = stable_history(today, 10);
        let candidate = TransactionRecord::expense(15.0, Category::Entertainment, today);
        assert!(!engine.is_anomalous(&candidate, &history));

        let scored = scored.borrow();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].columns(), model_columns.as_slice());
        assert_eq!(scored[0].rows(), &[vec![0.0, 15.0, 15.0]]);
    }

    #[test]
    fn test_extreme_candidate_date_is_not_anomalous() {
        let engine = AnomalyEngine::new();
        let history = stable_history(date(2024, 3, 15), 40);

        let mut candidate = TransactionRecord::expense(500.0, Category::Food, date(2024, 3, 15));
        candidate.date = Some(NaiveDate::MIN.format("%Y-%m-%d").to_string());
        assert!(engine.online_window(&candidate, &history).is_none());
        assert!(!engine.is_anomalous(&candidate, &history));
    }

    #[test]
    fn test_window_days_is_bounded() {
        let mut config = AnomalyConfig::default();
        config.window_days = MAX_WINDOW_DAYS;
        assert!(config.validate().is_ok());

        for bad in [-1, MAX_WINDOW_DAYS + 1, 9_223_372_036_854_775] {
            config.window_days = bad;
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_oversized_window_is_not_anomalous() {
        // Constructed directly; config loading would reject this value
        let config = AnomalyConfig {
            window_days: i64::MAX,
            ..AnomalyConfig::default()
        };
        let engine = AnomalyEngine::with_config(config);
        let today = date(2024, 3, 15);
        let history = stable_history(today, 40);
        let candidate = TransactionRecord::expense(500.0, Category::Food, today);

        assert!(!engine.is_anomalous(&candidate, &history));
    }

    #[test]
    fn test_overflowing_history_day_is_left_out() {
        let today = date(2024, 3, 15);
        let mut history = stable_history(today, 20);
        history.push(TransactionRecord::expense(1e308, Category::Food, today - Duration::days(3)));
        history.push(TransactionRecord::expense(1e308, Category::Food, today - Duration::days(3)));
        let candidate = TransactionRecord::expense(500.0, Category::Food, today);

        let (recording, fitted) = recording_engine();
        assert!(recording.is_anomalous(&candidate, &history));
        let fitted = fitted.borrow();
        assert_eq!(fitted[0].len(), 19);
        assert!(fitted[0].rows().iter().flatten().all(|v| v.is_finite()));

        assert!(AnomalyEngine::new().is_anomalous(&candidate, &history));
    }

    #[test]
    fn test_predict_before_train_is_an_error() {
        let engine = AnomalyEngine::new();
        let table = build_daily_features(&stable_history(date(2024, 3, 15), 5));
        assert!(matches!(engine.predict(&table), Err(Error::ModelNotTrained)));
    }

    #[test]
    fn test_batch_labels_every_row_and_flags_spike() {
        let today = date(2024, 3, 15);
        let mut records = stable_history(today, 30);
        records.push(TransactionRecord::expense(480.0, Category::Food, today - Duration::days(10)));
        let table = build_daily_features(&records);

        let mut engine = AnomalyEngine::new();
        engine.train(&table).unwrap();
        let labeled = engine.predict(&table).unwrap();

        assert_eq!(labeled.len(), table.len());
        let spike = labeled
            .iter()
            .find(|d| d.date == today - Duration::days(10))
            .unwrap();
        assert!(spike.anomaly);
        assert!(labeled.iter().filter(|d| d.anomaly).count() <= 2);

        let dates = engine.anomalous_dates(&table).unwrap();
        assert!(dates.contains(&(today - Duration::days(10))));
    }

    #[test]
    fn test_batch_on_empty_table_is_empty() {
        let mut engine = AnomalyEngine::new();
        let table = DailyFeatureTable::default();
        assert!(engine.detect(&table).unwrap().is_empty());
        assert!(engine.anomalous_dates(&table).unwrap().is_empty());
    }
}
