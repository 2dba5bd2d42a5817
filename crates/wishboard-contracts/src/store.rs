use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::wish::{Category, Importance, Wish};

pub const STORE_SCHEMA_VERSION: u64 = 1;
pub const STORE_FILE_NAME: &str = "wishes.json";

/// Fields supplied when creating a wish. The image is resolved before the
/// wish reaches the store, so `image_url` arrives as a separate argument.
#[derive(Debug, Clone, Default)]
pub struct NewWish {
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    pub category: Category,
    pub importance: Option<Importance>,
    pub target_date: Option<String>,
    pub action_plan: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WishPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub category: Option<Category>,
    pub importance: Option<Importance>,
    pub target_date: Option<String>,
    pub action_plan: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardTotals {
    pub total_target: f64,
    pub total_saved: f64,
    pub pct: f64,
}

/// Owns the wish collection and the single serialization point for it.
/// All mutations go through this type; nothing else writes `wishes.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct WishStore {
    pub path: PathBuf,
    pub schema_version: u64,
    pub board_id: String,
    pub created_at: String,
    wishes: IndexMap<String, Wish>,
}

impl WishStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema_version: STORE_SCHEMA_VERSION,
            board_id: Uuid::new_v4().to_string(),
            created_at: now_utc_iso(),
            wishes: IndexMap::new(),
        }
    }

    /// Tolerant load: a missing or corrupt file yields an empty board, and
    /// rows that fail to parse are skipped rather than failing the rest.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self::new(path.clone());
        let payload = read_json(&path).unwrap_or(Value::Object(Map::new()));
        let Some(obj) = payload.as_object() else {
            return store;
        };

        store.schema_version = obj
            .get("schema_version")
            .and_then(Value::as_u64)
            .unwrap_or(store.schema_version);
        store.board_id = obj
            .get("board_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(store.board_id);
        store.created_at = obj
            .get("created_at")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(store.created_at);

        if let Some(rows) = obj.get("wishes").and_then(Value::as_array) {
            for row in rows {
                if let Ok(mut wish) = serde_json::from_value::<Wish>(row.clone()) {
                    wish.saved_amount = clamp_saved(wish.saved_amount, wish.target_amount);
                    store.wishes.insert(wish.id.clone(), wish);
                }
            }
        }
        store
    }

    pub fn save(&self) -> Result<()> {
        let mut payload = Map::new();
        payload.insert(
            "schema_version".to_string(),
            Value::Number(self.schema_version.into()),
        );
        payload.insert("board_id".to_string(), Value::String(self.board_id.clone()));
        payload.insert(
            "created_at".to_string(),
            Value::String(self.created_at.clone()),
        );
        payload.insert(
            "wishes".to_string(),
            Value::Array(
                self.wishes
                    .values()
                    .map(|wish| serde_json::to_value(wish).unwrap_or(Value::Null))
                    .collect(),
            ),
        );
        write_json(&self.path, Value::Object(payload))
    }

    pub fn create(&mut self, params: NewWish, image_url: String) -> Wish {
        let wish = Wish {
            id: Uuid::new_v4().to_string(),
            title: params.title,
            description: params.description,
            target_amount: params.target_amount,
            saved_amount: 0.0,
            image_url,
            category: params.category,
            importance: params.importance,
            created_at: Utc::now().timestamp_millis(),
            is_completed: false,
            target_date: params.target_date,
            action_plan: params.action_plan,
        };
        // Newest first, matching display order.
        self.wishes.shift_insert(0, wish.id.clone(), wish.clone());
        wish
    }

    pub fn update(&mut self, id: &str, patch: WishPatch) -> Option<&Wish> {
        let wish = self.wishes.get_mut(id)?;
        if let Some(title) = patch.title {
            wish.title = title;
        }
        if let Some(description) = patch.description {
            wish.description = description;
        }
        if let Some(target_amount) = patch.target_amount {
            wish.target_amount = target_amount;
        }
        if let Some(category) = patch.category {
            wish.category = category;
        }
        if let Some(importance) = patch.importance {
            wish.importance = Some(importance);
        }
        if let Some(target_date) = patch.target_date {
            wish.target_date = Some(target_date);
        }
        if let Some(action_plan) = patch.action_plan {
            wish.action_plan = Some(action_plan);
        }
        if let Some(image_url) = patch.image_url {
            wish.image_url = image_url;
        }
        wish.saved_amount = clamp_saved(wish.saved_amount, wish.target_amount);
        Some(&*wish)
    }

    pub fn add_savings(&mut self, id: &str, amount: f64) -> Option<&Wish> {
        let wish = self.wishes.get_mut(id)?;
        wish.saved_amount = clamp_saved(wish.saved_amount + amount, wish.target_amount);
        Some(&*wish)
    }

    /// One-way: there is no API that sets `is_completed` back to false.
    pub fn complete(&mut self, id: &str) -> Option<&Wish> {
        let wish = self.wishes.get_mut(id)?;
        wish.is_completed = true;
        Some(&*wish)
    }

    pub fn remove(&mut self, id: &str) -> Option<Wish> {
        self.wishes.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Wish> {
        self.wishes.get(id)
    }

    /// Looks a wish up by full id or unambiguous id prefix.
    pub fn find(&self, needle: &str) -> Result<&Wish> {
        if let Some(wish) = self.wishes.get(needle) {
            return Ok(wish);
        }
        let matches: Vec<&Wish> = self
            .wishes
            .values()
            .filter(|wish| wish.id.starts_with(needle))
            .collect();
        match matches.len() {
            0 => bail!("no wish matches '{needle}'"),
            1 => Ok(matches[0]),
            n => bail!("'{needle}' is ambiguous ({n} wishes match); use a longer prefix"),
        }
    }

    pub fn wishes(&self) -> impl Iterator<Item = &Wish> {
        self.wishes.values()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Wish> {
        self.wishes
            .values()
            .filter(move |wish| wish.category == category)
    }

    pub fn len(&self) -> usize {
        self.wishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wishes.is_empty()
    }

    pub fn totals(&self) -> BoardTotals {
        let total_target: f64 = self.wishes.values().map(|wish| wish.target_amount).sum();
        let total_saved: f64 = self.wishes.values().map(|wish| wish.saved_amount).sum();
        let pct = if total_target > 0.0 {
            (total_saved / total_target * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        BoardTotals {
            total_target,
            total_saved,
            pct,
        }
    }
}

fn clamp_saved(saved: f64, target: f64) -> f64 {
    saved.max(0.0).min(target.max(0.0))
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json(path: &Path, payload: Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&payload)?)?;
    Ok(())
}
