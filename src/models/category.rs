use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Built-in scoring dimensions, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Cliente,
    Prazo,
    #[serde(rename = "Urgência")]
    Urgencia,
    Complexidade,
    Impacto,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Cliente,
        Category::Prazo,
        Category::Urgencia,
        Category::Complexidade,
        Category::Impacto,
    ];

    /// Label-driven categories, looked up as `"<name> / <value>"`.
    pub const LABELED: [Category; 3] = [
        Category::Urgencia,
        Category::Complexidade,
        Category::Impacto,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Cliente => "Cliente",
            Category::Prazo => "Prazo",
            Category::Urgencia => "Urgência",
            Category::Complexidade => "Complexidade",
            Category::Impacto => "Impacto",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn default_weight(&self) -> f64 {
        DEFAULT_CATEGORY_WEIGHTS
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, weight)| *weight)
            .unwrap_or(0.0)
    }
}

/// Fallback weights in percentage points. They are not required to sum to 100.
pub const DEFAULT_CATEGORY_WEIGHTS: [(Category, f64); 5] = [
    (Category::Cliente, 30.0),
    (Category::Prazo, 30.0),
    (Category::Urgencia, 20.0),
    (Category::Complexidade, 15.0),
    (Category::Impacto, 5.0),
];

/// A stored category row. Custom names are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    pub weight: f64,
}

/// Category name -> weight snapshot handed to the score calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights(HashMap<String, f64>);

impl CategoryWeights {
    pub fn insert(&mut self, name: impl Into<String>, weight: f64) {
        self.0.insert(name.into(), weight);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Configured weight, or the category default when absent or unusable.
    pub fn weight_for(&self, category: Category) -> f64 {
        self.get(category.name())
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or_else(|| category.default_weight())
    }
}

/// Everything the calculator reads besides the issue itself.
#[derive(Debug, Clone, Default)]
pub struct ScoringInputs {
    pub client_scores: HashMap<String, f64>,
    pub label_scores: HashMap<String, f64>,
    pub weights: CategoryWeights,
}

/// A client, label or deadline-bucket classification row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub category: String,
    pub key: String,
    pub description: Option<String>,
    pub score: Option<f64>,
}

/// Create/update body for a classification. `score` may arrive as a number
/// or as numeric text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationPayload {
    pub description: Option<String>,
    pub score: Option<serde_json::Value>,
}
