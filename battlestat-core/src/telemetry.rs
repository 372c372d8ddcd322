//! Account telemetry consumed by the estimator.
//!
//! [`TelemetrySnapshot`] is the flat, read-only record the engine works
//! from. [`ProfilePayload`] mirrors the nested profile / personal-stats
//! document delivered by the telemetry collaborator and converts into a
//! snapshot. Every field defaults when absent: a missing counter means "no
//! activity of that kind", never an error.
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::numbers::{finite_or_zero, round_f64_to_u64};

/// Consumable substances whose use implies spent energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substance {
    Ecstasy,
    Vicodin,
    Ketamine,
    Lsd,
    Opium,
    Pcp,
    Shrooms,
    Speed,
    Cannabis,
    Xanax,
}

impl Substance {
    pub const ALL: [Self; 10] = [
        Self::Ecstasy,
        Self::Vicodin,
        Self::Ketamine,
        Self::Lsd,
        Self::Opium,
        Self::Pcp,
        Self::Shrooms,
        Self::Speed,
        Self::Cannabis,
        Self::Xanax,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Ecstasy => "ecstasy",
            Self::Vicodin => "vicodin",
            Self::Ketamine => "ketamine",
            Self::Lsd => "lsd",
            Self::Opium => "opium",
            Self::Pcp => "pcp",
            Self::Shrooms => "shrooms",
            Self::Speed => "speed",
            Self::Cannabis => "cannabis",
            Self::Xanax => "xanax",
        }
    }
}

/// Immutable account telemetry at one observation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TelemetrySnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub level: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub rank: String,
    /// Observation instant, unix seconds.
    #[serde(deserialize_with = "lenient_i64")]
    pub captured_at: i64,
    #[serde(deserialize_with = "lenient_u32")]
    pub age_days: u32,
    /// Unix seconds of the last observed action; absent means "active now".
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_action: Option<i64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub donator_days: u64,
    /// Cumulative time online, seconds.
    #[serde(deserialize_with = "lenient_u64")]
    pub activity_time: u64,
    /// Cumulative time travelling, seconds.
    #[serde(deserialize_with = "lenient_u64")]
    pub travel_time: u64,
    #[serde(deserialize_with = "lenient_substances")]
    pub substances: BTreeMap<Substance, u64>,
    /// Criminal record counters keyed by category name.
    #[serde(deserialize_with = "lenient_counters")]
    pub crimes: BTreeMap<String, u64>,
    /// Record uses the newer crime categories (vandalism, cybercrime, ...).
    #[serde(deserialize_with = "null_as_default")]
    pub alternate_crimes: bool,
    #[serde(deserialize_with = "lenient_u64")]
    pub energy_refills: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub energy_drinks: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub boosters: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub stat_enhancers: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub attacks_won: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub attacks_lost: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub attacks_stalemate: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub revives: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub dump_finds: u64,
    #[serde(deserialize_with = "lenient_f64")]
    pub networth: f64,
}

impl TelemetrySnapshot {
    /// Set the observation instant, keeping every other field.
    #[must_use]
    pub fn with_captured_at(mut self, captured_at: i64) -> Self {
        self.captured_at = captured_at;
        self
    }

    #[must_use]
    pub fn substance(&self, substance: Substance) -> u64 {
        self.substances.get(&substance).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn crime(&self, category: &str) -> u64 {
        self.crimes.get(category).copied().unwrap_or(0)
    }

    /// Sum of every criminal record counter.
    #[must_use]
    pub fn total_crimes(&self) -> u64 {
        self.crimes
            .values()
            .fold(0_u64, |acc, count| acc.saturating_add(*count))
    }

    /// Attacks finished in any outcome.
    #[must_use]
    pub fn attacks(&self) -> u64 {
        self.attacks_won
            .saturating_add(self.attacks_lost)
            .saturating_add(self.attacks_stalemate)
    }

    /// Seconds since the last action, never negative.
    #[must_use]
    pub fn seconds_offline(&self) -> i64 {
        self.last_action
            .map_or(0, |last| self.captured_at.saturating_sub(last).max(0))
    }
}

/// Nested profile and personal-stats document as fetched upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfilePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile: ProfileSection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personalstats: PersonalStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub level: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub age: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rank: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_action: Option<LastAction>,
    #[serde(default, deserialize_with = "lenient_networth")]
    pub networth: Option<Networth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LastAction {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

/// Net worth arrives either as a bare number or as `{ "total": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Networth {
    Breakdown {
        #[serde(default, deserialize_with = "lenient_f64")]
        total: f64,
    },
    Plain(f64),
}

impl Networth {
    #[must_use]
    pub const fn total(&self) -> f64 {
        match self {
            Self::Breakdown { total } | Self::Plain(total) => *total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PersonalStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub other: OtherStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub travel: TravelStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drugs: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub criminalrecord: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: ItemStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attacking: AttackingStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hospital: HospitalStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OtherStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub donator_days: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activity: ActivityStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refills: RefillStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RefillStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub energy: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TravelStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub time_spent: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub used: ItemsUsed,
    #[serde(default, deserialize_with = "null_as_default")]
    pub found: ItemsFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemsUsed {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub energy_drinks: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub boosters: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub stat_enhancers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemsFound {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub dump: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AttackingStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attacks: AttackOutcomes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AttackOutcomes {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub won: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub lost: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub stalemate: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HospitalStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviving: RevivingStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RevivingStats {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub revives: u64,
}

/// Category whose presence marks the newer crime taxonomy.
const ALTERNATE_TAXONOMY_MARKER: &str = "vandalism";

/// Read a counter leniently: non-numeric and negative entries count as zero.
fn counter(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(round_f64_to_u64))
        .unwrap_or(0)
}

fn counters(raw: &BTreeMap<String, Value>) -> BTreeMap<String, u64> {
    raw.iter()
        .filter(|(_, value)| value.is_number())
        .map(|(key, value)| (key.clone(), counter(value)))
        .collect()
}

fn substance_counts(counts: &BTreeMap<String, u64>) -> BTreeMap<Substance, u64> {
    Substance::ALL
        .iter()
        .filter_map(|substance| {
            counts
                .get(substance.key())
                .map(|count| (*substance, *count))
        })
        .collect()
}

fn amount(value: &Value) -> f64 {
    value.as_f64().map_or(0.0, finite_or_zero)
}

fn timestamp(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|seconds| seconds.is_finite())
            .and_then(|seconds| num_traits::cast::cast::<f64, i64>(seconds.trunc()))
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_counters<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, u64>, D::Error> {
    let raw: BTreeMap<String, Value> = null_as_default(deserializer)?;
    Ok(counters(&raw))
}

fn lenient_substances<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<Substance, u64>, D::Error> {
    Ok(substance_counts(&lenient_counters(deserializer)?))
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(counter(&Value::deserialize(deserializer)?))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let count = counter(&Value::deserialize(deserializer)?);
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(timestamp(&Value::deserialize(deserializer)?).unwrap_or(0))
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(timestamp(&Value::deserialize(deserializer)?))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(amount(&Value::deserialize(deserializer)?))
}

fn lenient_networth<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Networth>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(fields) => Some(Networth::Breakdown {
            total: fields.get("total").map_or(0.0, amount),
        }),
        value @ Value::Number(_) => Some(Networth::Plain(amount(&value))),
        _ => None,
    })
}

impl ProfilePayload {
    /// Load a payload from JSON, accepting either the wrapped document or a bare profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is syntactically invalid or a section is
    /// not an object. Null or non-numeric counters read as zero.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("profile").is_some() || value.get("personalstats").is_some() {
            serde_json::from_value(value)
        } else {
            Ok(Self {
                profile: serde_json::from_value(value)?,
                personalstats: PersonalStats::default(),
            })
        }
    }

    /// Flatten into a snapshot observed at `captured_at`.
    #[must_use]
    pub fn into_snapshot(self, captured_at: i64) -> TelemetrySnapshot {
        let stats = self.personalstats;
        let substances = substance_counts(&counters(&stats.drugs));
        let crimes = counters(&stats.criminalrecord);
        let alternate_crimes = crimes
            .get(ALTERNATE_TAXONOMY_MARKER)
            .is_some_and(|count| *count > 0);

        TelemetrySnapshot {
            name: self.profile.name,
            level: self.profile.level,
            rank: self.profile.rank,
            captured_at,
            age_days: self.profile.age,
            last_action: self.profile.last_action.and_then(|last| last.timestamp),
            donator_days: stats.other.donator_days,
            activity_time: stats.other.activity.time,
            travel_time: stats.travel.time_spent,
            substances,
            crimes,
            alternate_crimes,
            energy_refills: stats.other.refills.energy,
            energy_drinks: stats.items.used.energy_drinks,
            boosters: stats.items.used.boosters,
            stat_enhancers: stats.items.used.stat_enhancers,
            attacks_won: stats.attacking.attacks.won,
            attacks_lost: stats.attacking.attacks.lost,
            attacks_stalemate: stats.attacking.attacks.stalemate,
            revives: stats.hospital.reviving.revives,
            dump_finds: stats.items.found.dump,
            networth: self
                .profile
                .networth
                .as_ref()
                .map_or(0.0, Networth::total),
        }
    }
}
