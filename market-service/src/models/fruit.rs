use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Letter quality classification, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    /// Grades that may be stocked and sold.
    pub const MARKETABLE: [Grade; 3] = [Grade::A, Grade::B, Grade::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }

    pub fn is_marketable(&self) -> bool {
        Self::MARKETABLE.contains(self)
    }

    /// Status a freshly graded fruit lands in.
    pub fn status_after_grading(&self) -> FruitStatus {
        match self {
            Grade::A | Grade::B => FruitStatus::Approved,
            Grade::E | Grade::F => FruitStatus::Rejected,
            Grade::C | Grade::D => FruitStatus::Graded,
        }
    }

    /// Score recorded for every attribute when a fruit is entered by hand.
    pub fn manual_entry_score(&self) -> Option<f64> {
        match self {
            Grade::A => Some(90.0),
            Grade::B => Some(80.0),
            Grade::C => Some(70.0),
            _ => None,
        }
    }
}

impl Default for Grade {
    fn default() -> Self {
        Grade::C
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "E" => Ok(Grade::E),
            "F" => Ok(Grade::F),
            other => Err(format!("Invalid grade: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FruitStatus {
    #[default]
    Pending,
    Graded,
    Rejected,
    Approved,
    Available,
}

impl FruitStatus {
    pub const ALL: [FruitStatus; 5] = [
        FruitStatus::Pending,
        FruitStatus::Graded,
        FruitStatus::Rejected,
        FruitStatus::Approved,
        FruitStatus::Available,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FruitStatus::Pending => "pending",
            FruitStatus::Graded => "graded",
            FruitStatus::Rejected => "rejected",
            FruitStatus::Approved => "approved",
            FruitStatus::Available => "available",
        }
    }
}

impl std::fmt::Display for FruitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FruitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(FruitStatus::Pending),
            "graded" => Ok(FruitStatus::Graded),
            "rejected" => Ok(FruitStatus::Rejected),
            "approved" => Ok(FruitStatus::Approved),
            "available" => Ok(FruitStatus::Available),
            other => Err(format!("Invalid fruit status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub total: f64,
    pub color: f64,
    pub texture: f64,
    pub shape: f64,
    pub defect: f64,
}

impl QualityScores {
    pub fn uniform(score: f64) -> Self {
        Self {
            total: score,
            color: score,
            texture: score,
            shape: score,
            defect: score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fruit {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub variety: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub collection_date: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub expiry_date: Option<DateTime<Utc>>,
    pub collector_id: String,
    pub image_url: Option<String>,
    pub grade: Grade,
    pub scores: QualityScores,
    pub status: FruitStatus,
    pub price: f64,
    pub quantity: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Fruit {
    /// A fruit collected and graded by the AI service. Not priced or stocked yet.
    pub fn graded(
        name: String,
        variety: Option<String>,
        collector_id: String,
        image_url: String,
        grade: Grade,
        scores: QualityScores,
    ) -> Self {
        let now = Utc::now();
        let variety = variety
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| name.clone());
        Self {
            id: super::new_record_id(),
            name,
            variety,
            collection_date: now,
            expiry_date: None,
            collector_id,
            image_url: Some(image_url),
            grade,
            scores,
            status: grade.status_after_grading(),
            price: 0.0,
            quantity: 0,
            created_at: now,
        }
    }

    /// A fruit entered by hand, immediately on sale.
    #[allow(clippy::too_many_arguments)]
    pub fn manual(
        name: String,
        collector_id: String,
        image_url: String,
        grade: Grade,
        price: f64,
        quantity: i64,
        expiry_date: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        let score = grade.manual_entry_score().unwrap_or(70.0);
        Self {
            id: super::new_record_id(),
            variety: name.clone(),
            name,
            collection_date: now,
            expiry_date,
            collector_id,
            image_url: Some(image_url),
            grade,
            scores: QualityScores::uniform(score),
            status: FruitStatus::Available,
            price,
            quantity,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < now)
    }

    /// Whether `requested` units can be sold right now.
    pub fn can_supply(&self, requested: i64) -> bool {
        self.status == FruitStatus::Available && self.quantity >= requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn grading_decides_status() {
        assert_eq!(Grade::A.status_after_grading(), FruitStatus::Approved);
        assert_eq!(Grade::B.status_after_grading(), FruitStatus::Approved);
        assert_eq!(Grade::C.status_after_grading(), FruitStatus::Graded);
        assert_eq!(Grade::D.status_after_grading(), FruitStatus::Graded);
        assert_eq!(Grade::E.status_after_grading(), FruitStatus::Rejected);
        assert_eq!(Grade::F.status_after_grading(), FruitStatus::Rejected);
    }

    #[test]
    fn grades_order_best_first() {
        let mut grades = vec![Grade::C, Grade::A, Grade::F, Grade::B];
        grades.sort();
        assert_eq!(grades, vec![Grade::A, Grade::B, Grade::C, Grade::F]);
    }

    #[test]
    fn graded_fruit_falls_back_to_name_for_variety() {
        let fruit = Fruit::graded(
            "Mango".to_string(),
            Some("  ".to_string()),
            "collector-1".to_string(),
            "/uploads/1.png".to_string(),
            Grade::E,
            QualityScores::uniform(40.0),
        );
        assert_eq!(fruit.variety, "Mango");
        assert_eq!(fruit.status, FruitStatus::Rejected);
        assert_eq!(fruit.quantity, 0);
        assert!(fruit.expiry_date.is_none());
    }

    #[test]
    fn manual_fruit_is_available_with_grade_scores() {
        let fruit = Fruit::manual(
            "Papaya".to_string(),
            "collector-2".to_string(),
            "/uploads/2.jpg".to_string(),
            Grade::B,
            120.0,
            30,
            None,
        );
        assert_eq!(fruit.status, FruitStatus::Available);
        assert_eq!(fruit.scores, QualityScores::uniform(80.0));
        assert_eq!(fruit.variety, "Papaya");
        assert!(fruit.can_supply(30));
        assert!(!fruit.can_supply(31));
    }

    #[test]
    fn expiry_is_checked_against_a_given_instant() {
        let now = Utc::now();
        let mut fruit = Fruit::manual(
            "Banana".to_string(),
            "c".to_string(),
            "/uploads/b.png".to_string(),
            Grade::A,
            10.0,
            1,
            Some(now - Duration::days(1)),
        );
        assert!(fruit.is_expired_at(now));
        fruit.expiry_date = None;
        assert!(!fruit.is_expired_at(now));
    }

    #[test]
    fn grade_and_status_parse_leniently() {
        assert_eq!(" b ".parse::<Grade>(), Ok(Grade::B));
        assert!("G".parse::<Grade>().is_err());
        assert_eq!("Available".parse::<FruitStatus>(), Ok(FruitStatus::Available));
        assert!("sold".parse::<FruitStatus>().is_err());
    }
}
