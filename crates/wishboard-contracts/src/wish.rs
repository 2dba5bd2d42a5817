use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A savings goal on the board.
///
/// Invariants, enforced by `WishStore` (the only writer):
/// - `saved_amount` stays within `[0, target_amount]`
/// - `is_completed` only ever transitions false -> true
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_amount: f64,
    #[serde(default)]
    pub saved_amount: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_plan: Option<String>,
}

impl Wish {
    pub fn progress_pct(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.saved_amount / self.target_amount * 100.0).clamp(0.0, 100.0)
    }

    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.saved_amount).max(0.0)
    }

    pub fn is_funded(&self) -> bool {
        self.target_amount > 0.0 && self.saved_amount >= self.target_amount
    }
}

/// Closed category set; serialized under the Spanish display labels the board
/// has always used, parsed from Spanish or English aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Viajes")]
    Travel,
    #[serde(rename = "Vehículos")]
    Vehicles,
    #[serde(rename = "Hogar")]
    Home,
    #[serde(rename = "Tecnología")]
    Gadgets,
    #[serde(rename = "Personal")]
    Personal,
    #[serde(rename = "Otros")]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Travel,
        Category::Vehicles,
        Category::Home,
        Category::Gadgets,
        Category::Personal,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Travel => "Viajes",
            Category::Vehicles => "Vehículos",
            Category::Home => "Hogar",
            Category::Gadgets => "Tecnología",
            Category::Personal => "Personal",
            Category::Other => "Otros",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        let found = match normalized.as_str() {
            "viajes" | "viaje" | "travel" | "trip" => Category::Travel,
            "vehículos" | "vehiculos" | "vehiculo" | "vehicle" | "vehicles" | "auto" => {
                Category::Vehicles
            }
            "hogar" | "casa" | "home" => Category::Home,
            "tecnología" | "tecnologia" | "tech" | "gadgets" => Category::Gadgets,
            "personal" => Category::Personal,
            "otros" | "otro" | "other" => Category::Other,
            _ => {
                return Err(format!(
                    "unknown category '{raw}' (expected one of: viajes, vehiculos, hogar, tecnologia, personal, otros)"
                ))
            }
        };
        Ok(found)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Baja")]
    Low,
}

impl Importance {
    pub fn label(self) -> &'static str {
        match self {
            Importance::High => "Alta",
            Importance::Medium => "Media",
            Importance::Low => "Baja",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Importance {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "alta" | "high" => Ok(Importance::High),
            "media" | "medium" => Ok(Importance::Medium),
            "baja" | "low" => Ok(Importance::Low),
            _ => Err(format!(
                "unknown importance '{raw}' (expected alta, media or baja)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Category, Importance, Wish};

    fn sample() -> Wish {
        Wish {
            id: "w1".to_string(),
            title: "Ferrari rojo".to_string(),
            description: String::new(),
            target_amount: 1000.0,
            saved_amount: 250.0,
            image_url: "https://example.com/car.jpg".to_string(),
            category: Category::Vehicles,
            importance: Some(Importance::High),
            created_at: 1_700_000_000_000,
            is_completed: false,
            target_date: None,
            action_plan: None,
        }
    }

    #[test]
    fn categories_serialize_under_display_labels() -> anyhow::Result<()> {
        let value = serde_json::to_value(sample())?;
        assert_eq!(value["category"], json!("Vehículos"));
        assert_eq!(value["importance"], json!("Alta"));

        let parsed: Wish = serde_json::from_value(value)?;
        assert_eq!(parsed.category, Category::Vehicles);
        assert_eq!(parsed.importance, Some(Importance::High));
        Ok(())
    }

    #[test]
    fn category_parses_spanish_and_english_aliases() {
        assert_eq!("Vehiculos".parse::<Category>(), Ok(Category::Vehicles));
        assert_eq!("travel".parse::<Category>(), Ok(Category::Travel));
        assert_eq!("Tecnología".parse::<Category>(), Ok(Category::Gadgets));
        assert!("luxury".parse::<Category>().is_err());
    }

    #[test]
    fn progress_pct_clamps_and_handles_zero_target() {
        let mut wish = sample();
        assert_eq!(wish.progress_pct(), 25.0);

        wish.saved_amount = 2000.0;
        assert_eq!(wish.progress_pct(), 100.0);

        wish.target_amount = 0.0;
        assert_eq!(wish.progress_pct(), 0.0);
    }

    #[test]
    fn optional_fields_default_when_missing() -> anyhow::Result<()> {
        let parsed: Wish = serde_json::from_value(json!({
            "id": "w2",
            "title": "Depto",
            "target_amount": 90000.0,
            "category": "Hogar",
        }))?;
        assert_eq!(parsed.saved_amount, 0.0);
        assert!(!parsed.is_completed);
        assert!(parsed.importance.is_none());
        assert!(parsed.action_plan.is_none());
        Ok(())
    }
}
