// Rule-based classification of measure descriptions.
//
// All text schemes run through one evaluator over an ordered rule table: the
// first rule with any needle contained in the lower-cased description claims
// the record. Table order is the tie-break policy and is part of the
// taxonomy; more specific rules must sit earlier. The financial scheme is the
// odd one out and classifies on the payback period instead of the text.
use crate::types::{ClassifiedMeasure, MeasureRecord};
use once_cell::sync::Lazy;

/// Fallback category for text schemes when no rule matches.
pub const FALLBACK_CATEGORY: &str = "Other";
/// Fallback category of the coded scheme.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Sentinel base code of the coded scheme's fallback; the sequencer never
/// numbers it.
pub const UNCATEGORIZED_CODE: &str = "X";

/// One ordered matching rule.
struct MatchRule {
    category: &'static str,
    base_code: Option<&'static str>,
    needles: Vec<String>,
}

impl MatchRule {
    /// An exact-phrase entry carrying a base code.
    fn phrase(phrase: &str, category: &'static str, base_code: &'static str) -> Self {
        MatchRule {
            category,
            base_code: Some(base_code),
            needles: vec![phrase.to_lowercase()],
        }
    }

    /// A keyword-set entry: any keyword hit claims the record.
    fn keywords(category: &'static str, keywords: &[&str]) -> Self {
        MatchRule {
            category,
            base_code: None,
            needles: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

fn first_match<'a>(rules: &'a [MatchRule], description: &str) -> Option<&'a MatchRule> {
    let haystack = description.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.needles.iter().any(|needle| haystack.contains(needle.as_str())))
}

// The measure-type table, shared by the plain and the coded scheme. Thermal
// entries carry the A group, energy management B, lighting C; the ordinal is
// the entry's position within its group.
static MEASURE_RULES: Lazy<Vec<MatchRule>> = Lazy::new(|| {
    vec![
        MatchRule::phrase("Regulación de la temperatura de consigna", "Control térmico", "A.1"),
        MatchRule::phrase("Sustitución de equipos de climatización", "Control térmico", "A.2"),
        MatchRule::phrase("Instalación de cortina de aire", "Control térmico", "A.3"),
        MatchRule::phrase("Instalación de temporizador digital", "Control térmico", "A.4"),
        MatchRule::phrase("Aislamiento de tuberías", "Control térmico", "A.5"),
        MatchRule::phrase("Recuperadores de calor", "Control térmico", "A.6"),
        MatchRule::phrase("Optimización de la potencia contratada", "Gestión energética", "B.1"),
        MatchRule::phrase("Implementación de un sistema de gestión", "Gestión energética", "B.2"),
        MatchRule::phrase("Compensación del consumo de energía reactiva", "Gestión energética", "B.3"),
        MatchRule::phrase("Reducción del consumo remanente", "Gestión energética", "B.4"),
        MatchRule::phrase("Buenas prácticas", "Gestión energética", "B.5"),
        MatchRule::phrase("Batería de condensadores", "Gestión energética", "B.6"),
        MatchRule::phrase("Instalación solar fotovoltaica", "Gestión energética", "B.7"),
        MatchRule::phrase("Sustitución de luminarias a LED", "Iluminación eficiente", "C.1"),
        MatchRule::phrase("Instalación de regletas programables", "Iluminación eficiente", "C.2"),
        MatchRule::phrase("Mejora en el control", "Iluminación eficiente", "C.3"),
    ]
});

// Installation keywords take priority over retrofit keywords, retrofit over
// behavioral; "instalación solar fotovoltaica" is an installation, not an
// upgrade.
static INTERVENTION_RULES: Lazy<Vec<MatchRule>> = Lazy::new(|| {
    vec![
        MatchRule::keywords(
            "New System Installation",
            &["instalación", "batería", "recuperadores", "solar"],
        ),
        MatchRule::keywords(
            "Equipment Retrofit & Upgrade",
            &["sustitución", "cambio", "mejora", "aislamiento"],
        ),
        MatchRule::keywords(
            "Operational & Behavioral",
            &["prácticas", "regulación", "optimización", "reducción"],
        ),
    ]
});

static FUNCTION_RULES: Lazy<Vec<MatchRule>> = Lazy::new(|| {
    vec![
        MatchRule::keywords(
            "Building Envelope & HVAC",
            &["hvac", "climatización", "temperatura", "ventilación", "aislamiento", "cortina", "calor"],
        ),
        MatchRule::keywords(
            "Lighting & Electrical",
            &["led", "iluminación", "luminarias", "eléctrico", "potencia", "reactiva", "condensadores", "regletas"],
        ),
        MatchRule::keywords(
            "Energy Management & Strategy",
            &["gestión", "fotovoltaica", "solar", "prácticas", "remanente"],
        ),
    ]
});

// Renewable before thermal before electrical: a solar measure is renewable
// even when it also touches the electrical installation.
static ENERGY_RULES: Lazy<Vec<MatchRule>> = Lazy::new(|| {
    vec![
        MatchRule::keywords("Renovable", &["solar", "fotovoltaica"]),
        MatchRule::keywords(
            "Térmica",
            &["climatización", "temperatura", "calor", "tuberías", "cortina"],
        ),
        MatchRule::keywords(
            "Eléctrica",
            &["led", "luminarias", "iluminación", "potencia", "reactiva", "condensadores", "regletas", "eléctrico"],
        ),
    ]
});

/// Payback ranges, applied in order; the first matching range wins.
fn payback_category(payback_years: f64) -> &'static str {
    if payback_years <= 0.0 {
        "No Cost / Immediate"
    } else if payback_years < 2.0 {
        "Quick Wins (< 2 years)"
    } else if payback_years <= 5.0 {
        "Standard Projects (2-5 years)"
    } else {
        "Strategic Investments (> 5 years)"
    }
}

/// The selectable classification taxonomies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    MeasureType,
    MeasureCode,
    Intervention,
    Financial,
    BusinessFunction,
    EnergyType,
}

/// Category (and, under the coded scheme, base code) assigned to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: &'static str,
    pub base_code: Option<&'static str>,
}

impl Scheme {
    /// Every scheme, in menu order.
    pub const ALL: [Scheme; 6] = [
        Scheme::MeasureType,
        Scheme::MeasureCode,
        Scheme::Intervention,
        Scheme::Financial,
        Scheme::BusinessFunction,
        Scheme::EnergyType,
    ];

    /// Operator-facing label, as shown in menus and chart titles.
    pub fn label(&self) -> &'static str {
        match self {
            Scheme::MeasureType => "Tipo de Medida",
            Scheme::MeasureCode => "Código de Medida",
            Scheme::Intervention => "Tipo de Intervención",
            Scheme::Financial => "Impacto Financiero",
            Scheme::BusinessFunction => "Función de Negocio",
            Scheme::EnergyType => "Tipo de Energía",
        }
    }

    /// Look a scheme up by its label or identifier; unknown names fall back
    /// to the default scheme rather than failing.
    pub fn from_name(name: &str) -> Scheme {
        match name.trim() {
            "Tipo de Medida" | "measure_type" => Scheme::MeasureType,
            "Código de Medida" | "measure_code" => Scheme::MeasureCode,
            "Tipo de Intervención" | "intervention" => Scheme::Intervention,
            "Impacto Financiero" | "financial" => Scheme::Financial,
            "Función de Negocio" | "business_function" => Scheme::BusinessFunction,
            "Tipo de Energía" | "energy_type" => Scheme::EnergyType,
            _ => Scheme::MeasureType,
        }
    }

    /// Classify one record. Pure: reads the record and the scheme's table,
    /// mutates nothing, and always yields a category.
    pub fn classify(&self, record: &MeasureRecord) -> Classification {
        match self {
            Scheme::MeasureType => match first_match(&MEASURE_RULES, &record.measure) {
                Some(rule) => Classification {
                    category: rule.category,
                    base_code: None,
                },
                None => Classification {
                    category: FALLBACK_CATEGORY,
                    base_code: None,
                },
            },
            Scheme::MeasureCode => match first_match(&MEASURE_RULES, &record.measure) {
                Some(rule) => Classification {
                    category: rule.category,
                    base_code: rule.base_code,
                },
                None => Classification {
                    category: UNCATEGORIZED,
                    base_code: Some(UNCATEGORIZED_CODE),
                },
            },
            Scheme::Intervention => keyword_classification(&INTERVENTION_RULES, record),
            Scheme::BusinessFunction => keyword_classification(&FUNCTION_RULES, record),
            Scheme::EnergyType => keyword_classification(&ENERGY_RULES, record),
            Scheme::Financial => Classification {
                category: payback_category(record.payback_years),
                base_code: None,
            },
        }
    }
}

fn keyword_classification(rules: &[MatchRule], record: &MeasureRecord) -> Classification {
    match first_match(rules, &record.measure) {
        Some(rule) => Classification {
            category: rule.category,
            base_code: None,
        },
        None => Classification {
            category: FALLBACK_CATEGORY,
            base_code: None,
        },
    }
}

/// Classify every record in one pass, wrapping each with its category.
pub fn classify_all(records: &[MeasureRecord], scheme: Scheme) -> Vec<ClassifiedMeasure> {
    records
        .iter()
        .map(|record| {
            let c = scheme.classify(record);
            ClassifiedMeasure {
                record: record.clone(),
                category: c.category,
                base_code: c.base_code,
            }
        })
        .collect()
}
