//! Health alerts derived from stored readings.
//!
//! The catalog is a fixed, ordered list of independent threshold rules. A
//! record can trigger any number of them; evaluation order is catalog order.
//! All comparisons are strict.

use crate::record::TemperatureRecord;
use serde::Serialize;

/// One health warning a reading can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HealthAlert {
    Hypothermia,
    ColdAirRespiratory,
    Frostbite,
    HeartAttack,
    HeatExhaustion,
    Dehydration,
    HeatStroke,
    SkinDamage,
    Allergy,
    DryAir,
    MoldAndDustMites,
    RespiratoryConditions,
    HeatIllnessAndAsthma,
    LowPressure,
    HighPressure,
}

/// Message text for alerts.
pub trait AlertMessages: Send + Sync {
    fn message(&self, alert: HealthAlert) -> &str;
}

/// Built-in English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl AlertMessages for EnglishMessages {
    fn message(&self, alert: HealthAlert) -> &str {
        match alert {
            HealthAlert::Hypothermia => "hypothermia risk",
            HealthAlert::ColdAirRespiratory => "respiratory irritation from cold air",
            HealthAlert::Frostbite => "frostbite risk",
            HealthAlert::HeartAttack => "elevated heart-attack risk",
            HealthAlert::HeatExhaustion => "heat exhaustion risk",
            HealthAlert::Dehydration => "dehydration risk",
            HealthAlert::HeatStroke => "heat stroke risk",
            HealthAlert::SkinDamage => "sunburn/skin risk",
            HealthAlert::Allergy => "elevated pollen/allergy risk",
            HealthAlert::DryAir => "dry air may cause respiratory irritation",
            HealthAlert::MoldAndDustMites => "mold/dust-mite growth risk",
            HealthAlert::RespiratoryConditions => "respiratory conditions may worsen",
            HealthAlert::HeatIllnessAndAsthma => "heat-illness and allergy/asthma risk",
            HealthAlert::LowPressure => "migraine/joint-pain/altitude-sickness risk",
            HealthAlert::HighPressure => "headache/sinus/circulatory risk",
        }
    }
}

/// A threshold predicate and the alert it raises.
#[derive(Clone, Copy)]
pub struct AlertRule {
    pub predicate: fn(&TemperatureRecord) -> bool,
    pub alert: HealthAlert,
}

impl std::fmt::Debug for AlertRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertRule").field("alert", &self.alert).finish()
    }
}

const fn rule(predicate: fn(&TemperatureRecord) -> bool, alert: HealthAlert) -> AlertRule {
    AlertRule { predicate, alert }
}

fn below_10c(r: &TemperatureRecord) -> bool {
    r.temperature_c < 10.0
}
fn below_0c(r: &TemperatureRecord) -> bool {
    r.temperature_c < 0.0
}
fn above_27c(r: &TemperatureRecord) -> bool {
    r.temperature_c > 27.0
}
fn above_40c(r: &TemperatureRecord) -> bool {
    r.temperature_c > 40.0
}
fn above_21c(r: &TemperatureRecord) -> bool {
    r.temperature_c > 21.0
}
fn above_15c(r: &TemperatureRecord) -> bool {
    r.temperature_c > 15.0
}
fn humidity_below_30(r: &TemperatureRecord) -> bool {
    r.humidity_pct < 30
}
fn humidity_above_50(r: &TemperatureRecord) -> bool {
    r.humidity_pct > 50
}
fn humidity_above_60(r: &TemperatureRecord) -> bool {
    r.humidity_pct > 60
}
fn humidity_above_70(r: &TemperatureRecord) -> bool {
    r.humidity_pct > 70
}
fn pressure_below_980(r: &TemperatureRecord) -> bool {
    r.pressure_hpa < 980
}
fn pressure_above_1050(r: &TemperatureRecord) -> bool {
    r.pressure_hpa > 1050
}

/// The fixed rule catalog, in evaluation order.
pub const CATALOG: &[AlertRule] = &[
    rule(below_10c, HealthAlert::Hypothermia),
    rule(below_10c, HealthAlert::ColdAirRespiratory),
    rule(below_0c, HealthAlert::Frostbite),
    rule(below_0c, HealthAlert::HeartAttack),
    rule(above_27c, HealthAlert::HeatExhaustion),
    rule(above_27c, HealthAlert::Dehydration),
    rule(above_40c, HealthAlert::HeatStroke),
    rule(above_21c, HealthAlert::SkinDamage),
    rule(above_15c, HealthAlert::Allergy),
    rule(humidity_below_30, HealthAlert::DryAir),
    rule(humidity_above_50, HealthAlert::MoldAndDustMites),
    rule(humidity_above_60, HealthAlert::RespiratoryConditions),
    rule(humidity_above_70, HealthAlert::HeatIllnessAndAsthma),
    rule(pressure_below_980, HealthAlert::LowPressure),
    rule(pressure_above_1050, HealthAlert::HighPressure),
];

/// Evaluates the catalog against records.
pub struct AlertRuleEngine {
    rules: &'static [AlertRule],
    messages: Box<dyn AlertMessages>,
}

impl Default for AlertRuleEngine {
    fn default() -> Self {
        Self::new(EnglishMessages)
    }
}

impl AlertRuleEngine {
    pub fn new(messages: impl AlertMessages + 'static) -> Self {
        Self {
            rules: CATALOG,
            messages: Box::new(messages),
        }
    }

    /// Alerts triggered by `record`, in catalog order.
    pub fn evaluate(&self, record: &TemperatureRecord) -> Vec<HealthAlert> {
        self.rules
            .iter()
            .filter(|rule| (rule.predicate)(record))
            .map(|rule| rule.alert)
            .collect()
    }

    /// Message text for every triggered alert, in catalog order.
    pub fn messages(&self, record: &TemperatureRecord) -> Vec<String> {
        self.evaluate(record)
            .into_iter()
            .map(|alert| self.messages.message(alert).to_string())
            .collect()
    }
}

impl std::fmt::Debug for AlertRuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertRuleEngine")
            .field("rules", &self.rules.len())
            .finish()
    }
}
