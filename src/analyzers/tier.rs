use serde::Serialize;

/// Score band used to colour the exported report.
///
/// | Range             | Tier         |
/// |-------------------|--------------|
/// | > 4               | Excellent    |
/// | > 3 and <= 4      | Good         |
/// | > 2.5 and <= 3    | Satisfactory |
/// | <= 2.5            | Poor         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Excellent,
    Good,
    Satisfactory,
    Poor,
}

impl ScoreTier {
    pub const ALL: [ScoreTier; 4] = [
        ScoreTier::Excellent,
        ScoreTier::Good,
        ScoreTier::Satisfactory,
        ScoreTier::Poor,
    ];

    pub fn from_score(score: f64) -> Self {
        match score {
            s if s > 4.0 => ScoreTier::Excellent,
            s if s > 3.0 => ScoreTier::Good,
            s if s > 2.5 => ScoreTier::Satisfactory,
            _ => ScoreTier::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "отлично",
            ScoreTier::Good => "хорошо",
            ScoreTier::Satisfactory => "удовлетворительно",
            ScoreTier::Poor => "неудовлетворительно",
        }
    }

    /// Cell fill colour, `#RRGGBB`.
    pub fn fill_color(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "#63BE7B",
            ScoreTier::Good => "#C6EFCE",
            ScoreTier::Satisfactory => "#FFEB9C",
            ScoreTier::Poor => "#FFC7CE",
        }
    }
}
