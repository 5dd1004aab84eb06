//! Enumerated questionnaire answers.
//!
//! Every enum carries its storage code (the value persisted and accepted in
//! JSON input) and an explicit display label. Labels are never derived from
//! variant names.

use serde::{Deserialize, Serialize};

/// Common behaviour of a questionnaire choice.
pub trait Choice: Copy + Sized + 'static {
    /// Every variant, in storage-code order.
    const ALL: &'static [Self];

    /// Storage / wire code.
    fn code(self) -> &'static str;

    /// Human-readable label.
    fn label(self) -> &'static str;

    /// Parse a storage code (surrounding whitespace ignored).
    fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// `(code, label)` pairs for rendering a choice list.
    fn table() -> Vec<(&'static str, &'static str)> {
        Self::ALL.iter().map(|c| (c.code(), c.label())).collect()
    }
}

/// Yes/no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    #[serde(rename = "y")]
    Yes,
    #[serde(rename = "n")]
    No,
}

impl Answer {
    #[must_use]
    pub fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl Choice for Answer {
    const ALL: &'static [Self] = &[Self::Yes, Self::No];

    fn code(self) -> &'static str {
        match self {
            Self::Yes => "y",
            Self::No => "n",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

/// Race and ethnicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ethnicity {
    #[serde(rename = "1")]
    White,
    #[serde(rename = "2")]
    AfricanAmerican,
    #[serde(rename = "3")]
    Other,
}

impl Choice for Ethnicity {
    const ALL: &'static [Self] = &[Self::White, Self::AfricanAmerican, Self::Other];

    fn code(self) -> &'static str {
        match self {
            Self::White => "1",
            Self::AfricanAmerican => "2",
            Self::Other => "3",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::AfricanAmerican => "African American",
            Self::Other => "Other race or ethnicity",
        }
    }
}

/// Daily alcohol amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlcoholAmount {
    #[serde(rename = "1")]
    OneDrink,
    #[serde(rename = "2")]
    TwoOrMore,
}

impl Choice for AlcoholAmount {
    const ALL: &'static [Self] = &[Self::OneDrink, Self::TwoOrMore];

    fn code(self) -> &'static str {
        match self {
            Self::OneDrink => "1",
            Self::TwoOrMore => "2",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::OneDrink => "1 drink",
            Self::TwoOrMore => "2 or more drinks",
        }
    }
}

/// Post-menopausal hormone therapy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HormoneTherapyType {
    /// Estrogen + progesterone
    #[serde(rename = "1")]
    Combined,
    /// Estrogen replacement therapy
    #[serde(rename = "2")]
    EstrogenOnly,
}

impl Choice for HormoneTherapyType {
    const ALL: &'static [Self] = &[Self::Combined, Self::EstrogenOnly];

    fn code(self) -> &'static str {
        match self {
            Self::Combined => "1",
            Self::EstrogenOnly => "2",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Combined => "Combined HT (Estrogen + Progesterone)",
            Self::EstrogenOnly => "ERT (Estrogen Replacement Therapy)",
        }
    }
}

/// Finding mentioned in a breast biopsy report.
///
/// Discriminants equal the storage codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BiopsyReport {
    #[serde(rename = "1")]
    Fibrosis = 1,
    #[serde(rename = "2")]
    SimpleCysts = 2,
    #[serde(rename = "3")]
    MildHyperplasia = 3,
    #[serde(rename = "4")]
    Adenosis = 4,
    #[serde(rename = "5")]
    PhyllodesTumor = 5,
    #[serde(rename = "6")]
    SinglePapilloma = 6,
    #[serde(rename = "7")]
    FatNecrosis = 7,
    #[serde(rename = "8")]
    DuctEctasia = 8,
    #[serde(rename = "9")]
    PeriductalFibrosis = 9,
    #[serde(rename = "10")]
    SquamousApocrineMetaplasia = 10,
    #[serde(rename = "11")]
    EpithelialCalcifications = 11,
    #[serde(rename = "12")]
    Lipoma = 12,
    #[serde(rename = "13")]
    Hamartoma = 13,
    #[serde(rename = "14")]
    Hemangioma = 14,
    #[serde(rename = "15")]
    Neurofibroma = 15,
    #[serde(rename = "16")]
    Adenomyoepithelioma = 16,
    #[serde(rename = "17")]
    Mastitis = 17,
    #[serde(rename = "18")]
    UsualDuctalHyperplasia = 18,
    #[serde(rename = "19")]
    Fibroadenoma = 19,
    #[serde(rename = "20")]
    SclerosingAdenosis = 20,
    #[serde(rename = "21")]
    Papillomatosis = 21,
    #[serde(rename = "22")]
    RadialScar = 22,
    #[serde(rename = "23")]
    AtypicalDuctalHyperplasia = 23,
    #[serde(rename = "24")]
    AtypicalLobularHyperplasia = 24,
    #[serde(rename = "25")]
    LobularCarcinomaInSitu = 25,
}

const BIOPSY_CODES: [&str; 25] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "23", "24", "25",
];

const BIOPSY_LABELS: [&str; 25] = [
    "Fibrosis",
    "Simple cysts (fibrocystic changes)",
    "Mild hyperplasia",
    "Adenosis",
    "Phyllodes tumor",
    "A single papilloma",
    "Fat necrosis",
    "Duct ectasia",
    "Periductal fibrosis",
    "Squamous and apocrine metaplasia",
    "Epithelial-related calcifications",
    "Lipoma",
    "Hamartoma",
    "Hemangioma",
    "Neurofibroma",
    "Adenomyoepithelioma",
    "Mastitis (infection of the breast)",
    "Usual ductal hyperplasia (without atypia)",
    "Fibroadenoma",
    "Sclerosing adenosis",
    "Several papillomas (papillomatosis)",
    "Radial scar",
    "Atypical ductal hyperplasia (ADH)",
    "Atypical lobular hyperplasia (ALH)",
    "Lobular carcinoma in situ (LCIS)",
];

impl BiopsyReport {
    /// Atypical hyperplasia (ductal or lobular) or LCIS.
    #[must_use]
    pub fn is_atypical(self) -> bool {
        matches!(
            self,
            Self::AtypicalDuctalHyperplasia
                | Self::AtypicalLobularHyperplasia
                | Self::LobularCarcinomaInSitu
        )
    }

    /// Sclerosing adenosis, papillomatosis or radial scar.
    #[must_use]
    pub fn is_proliferative_without_atypia(self) -> bool {
        matches!(
            self,
            Self::SclerosingAdenosis | Self::Papillomatosis | Self::RadialScar
        )
    }

    fn index(self) -> usize {
        self as usize - 1
    }
}

impl Choice for BiopsyReport {
    const ALL: &'static [Self] = &[
        Self::Fibrosis,
        Self::SimpleCysts,
        Self::MildHyperplasia,
        Self::Adenosis,
        Self::PhyllodesTumor,
        Self::SinglePapilloma,
        Self::FatNecrosis,
        Self::DuctEctasia,
        Self::PeriductalFibrosis,
        Self::SquamousApocrineMetaplasia,
        Self::EpithelialCalcifications,
        Self::Lipoma,
        Self::Hamartoma,
        Self::Hemangioma,
        Self::Neurofibroma,
        Self::Adenomyoepithelioma,
        Self::Mastitis,
        Self::UsualDuctalHyperplasia,
        Self::Fibroadenoma,
        Self::SclerosingAdenosis,
        Self::Papillomatosis,
        Self::RadialScar,
        Self::AtypicalDuctalHyperplasia,
        Self::AtypicalLobularHyperplasia,
        Self::LobularCarcinomaInSitu,
    ];

    fn code(self) -> &'static str {
        BIOPSY_CODES[self.index()]
    }

    fn label(self) -> &'static str {
        BIOPSY_LABELS[self.index()]
    }
}

/// Dominant pattern in the daily diet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diet {
    #[serde(rename = "1")]
    HighFat,
    #[serde(rename = "2")]
    FruitVegetableDairy,
    #[serde(rename = "3")]
    LowRedMeat,
    #[serde(rename = "4")]
    HighSoy,
    #[serde(rename = "5")]
    NoneOfTheAbove,
}

impl Choice for Diet {
    const ALL: &'static [Self] = &[
        Self::HighFat,
        Self::FruitVegetableDairy,
        Self::LowRedMeat,
        Self::HighSoy,
        Self::NoneOfTheAbove,
    ];

    fn code(self) -> &'static str {
        match self {
            Self::HighFat => "1",
            Self::FruitVegetableDairy => "2",
            Self::LowRedMeat => "3",
            Self::HighSoy => "4",
            Self::NoneOfTheAbove => "5",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::HighFat => "High fat diets",
            Self::FruitVegetableDairy => {
                "High in fruits and vegetables and calcium-rich dairy diets"
            }
            Self::LowRedMeat => "Low in red and processed meats",
            Self::HighSoy => "Diets high in soy products",
            Self::NoneOfTheAbove => "None of mentioned above",
        }
    }
}

/// BMI band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    #[serde(rename = "Underweight")]
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    #[serde(rename = "Overweight")]
    Overweight,
    #[serde(rename = "Obese")]
    Obese,
}

impl BmiCategory {
    /// Band for a BMI value.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::NormalWeight
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::NormalWeight => "Normal weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_category_serializes_as_label() {
        for category in [
            BmiCategory::Underweight,
            BmiCategory::NormalWeight,
            BmiCategory::Overweight,
            BmiCategory::Obese,
        ] {
            let json = serde_json::to_string(&category).expect("Should serialize");
            assert_eq!(json, format!("\"{}\"", category.label()));
        }
        assert_eq!(
            serde_json::from_str::<BmiCategory>("\"Normal weight\"").expect("Should parse"),
            BmiCategory::NormalWeight
        );
    }

    #[test]
    fn test_codes_roundtrip_through_from_code() {
        for report in BiopsyReport::ALL {
            assert_eq!(BiopsyReport::from_code(report.code()), Some(*report));
        }
        assert_eq!(Diet::from_code(" 1 "), Some(Diet::HighFat));
        assert_eq!(Answer::from_code("maybe"), None);
    }

    #[test]
    fn test_biopsy_table_matches_discriminants() {
        assert_eq!(BiopsyReport::ALL.len(), 25);
        assert_eq!(BiopsyReport::LobularCarcinomaInSitu.code(), "25");
        assert_eq!(BiopsyReport::RadialScar.label(), "Radial scar");
        assert_eq!(BiopsyReport::Fibrosis.label(), "Fibrosis");
    }

    #[test]
    fn test_biopsy_groups() {
        let atypical: Vec<_> = BiopsyReport::ALL
            .iter()
            .filter(|r| r.is_atypical())
            .map(|r| r.code())
            .collect();
        assert_eq!(atypical, vec!["23", "24", "25"]);

        let proliferative: Vec<_> = BiopsyReport::ALL
            .iter()
            .filter(|r| r.is_proliferative_without_atypia())
            .map(|r| r.code())
            .collect();
        assert_eq!(proliferative, vec!["20", "21", "22"]);
    }

    #[test]
    fn test_serde_uses_storage_codes() {
        let json = serde_json::to_string(&BiopsyReport::AtypicalDuctalHyperplasia)
            .expect("Should serialize");
        assert_eq!(json, "\"23\"");

        let answer: Answer = serde_json::from_str("\"y\"").expect("Should parse");
        assert!(answer.is_yes());
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::NormalWeight);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }
}
