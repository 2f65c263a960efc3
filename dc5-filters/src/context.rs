use std::collections::{BTreeMap, BTreeSet};

use dc5_core::digits::{self, MIRROR, VTRAC};
use dc5_core::models::{Combo, Draw, DrawError};

use crate::value::Value;

/// Vocabulaire fixe des faits visibles par les prédicats.
///
/// Les faits communs viennent en premier, puis les faits propres au
/// candidat ; l'ordre sert d'index de stockage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fact {
    SeedDigits,
    SeedValue,
    SeedSum,
    SeedSumCat,
    SeedParity,
    SeedCounts,
    SeedVtracs,
    SeedStructure,
    PrevSeedDigits,
    PrevPrevSeedDigits,
    PrevPrevPrevSeedDigits,
    PrevSeedSum,
    PrevPrevSeedSum,
    PrevPrevPrevSeedSum,
    NewSeedDigits,
    PrevPattern,
    HotDigits,
    ColdDigits,
    DueDigits,
    CommonToBoth,
    Last2,
    Mirror,
    Vtrac,
    Nan,

    ComboDigits,
    ComboSum,
    ComboSumCat,
    ComboParity,
    ComboVtracs,
    ComboStructure,
    ComboCounts,
    ComboSeedCommon,
}

pub const COMMON_FACTS: [Fact; 24] = [
    Fact::SeedDigits,
    Fact::SeedValue,
    Fact::SeedSum,
    Fact::SeedSumCat,
    Fact::SeedParity,
    Fact::SeedCounts,
    Fact::SeedVtracs,
    Fact::SeedStructure,
    Fact::PrevSeedDigits,
    Fact::PrevPrevSeedDigits,
    Fact::PrevPrevPrevSeedDigits,
    Fact::PrevSeedSum,
    Fact::PrevPrevSeedSum,
    Fact::PrevPrevPrevSeedSum,
    Fact::NewSeedDigits,
    Fact::PrevPattern,
    Fact::HotDigits,
    Fact::ColdDigits,
    Fact::DueDigits,
    Fact::CommonToBoth,
    Fact::Last2,
    Fact::Mirror,
    Fact::Vtrac,
    Fact::Nan,
];

pub const CANDIDATE_FACTS: [Fact; 8] = [
    Fact::ComboDigits,
    Fact::ComboSum,
    Fact::ComboSumCat,
    Fact::ComboParity,
    Fact::ComboVtracs,
    Fact::ComboStructure,
    Fact::ComboCounts,
    Fact::ComboSeedCommon,
];

impl Fact {
    pub fn name(&self) -> &'static str {
        match self {
            Fact::SeedDigits => "seed_digits",
            Fact::SeedValue => "seed_value",
            Fact::SeedSum => "seed_sum",
            Fact::SeedSumCat => "seed_sum_cat",
            Fact::SeedParity => "seed_parity",
            Fact::SeedCounts => "seed_counts",
            Fact::SeedVtracs => "seed_vtracs",
            Fact::SeedStructure => "seed_structure",
            Fact::PrevSeedDigits => "prev_seed_digits",
            Fact::PrevPrevSeedDigits => "prev_prev_seed_digits",
            Fact::PrevPrevPrevSeedDigits => "prev_prev_prev_seed_digits",
            Fact::PrevSeedSum => "prev_seed_sum",
            Fact::PrevPrevSeedSum => "prev_prev_seed_sum",
            Fact::PrevPrevPrevSeedSum => "prev_prev_prev_seed_sum",
            Fact::NewSeedDigits => "new_seed_digits",
            Fact::PrevPattern => "prev_pattern",
            Fact::HotDigits => "hot_digits",
            Fact::ColdDigits => "cold_digits",
            Fact::DueDigits => "due_digits",
            Fact::CommonToBoth => "common_to_both",
            Fact::Last2 => "last2",
            Fact::Mirror => "mirror",
            Fact::Vtrac => "vtrac",
            Fact::Nan => "nan",
            Fact::ComboDigits => "combo_digits",
            Fact::ComboSum => "combo_sum",
            Fact::ComboSumCat => "combo_sum_cat",
            Fact::ComboParity => "combo_parity",
            Fact::ComboVtracs => "combo_vtracs",
            Fact::ComboStructure => "combo_structure",
            Fact::ComboCounts => "combo_counts",
            Fact::ComboSeedCommon => "combo_seed_common",
        }
    }

    /// Anciens noms encore présents dans les catalogues existants.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Fact::SeedSumCat => &["prev_sum_cat"],
            Fact::SeedStructure => &["winner_structure"],
            Fact::PrevSeedDigits => &["seed_digits_1"],
            Fact::PrevPrevSeedDigits => &["seed_digits_2", "prev_prev_draw_digits"],
            Fact::PrevPrevPrevSeedDigits => &["seed_digits_3"],
            Fact::Mirror => &["MIRROR"],
            Fact::Vtrac => &["V_TRAC_GROUPS"],
            _ => &[],
        }
    }

    pub fn lookup(name: &str) -> Option<Fact> {
        COMMON_FACTS
            .iter()
            .chain(CANDIDATE_FACTS.iter())
            .find(|f| f.name() == name || f.aliases().contains(&name))
            .copied()
    }

    pub fn is_candidate(&self) -> bool {
        (*self as usize) >= COMMON_FACTS.len()
    }

    fn slot(&self) -> usize {
        let index = *self as usize;
        if self.is_candidate() {
            index - COMMON_FACTS.len()
        } else {
            index
        }
    }
}

fn counter_of(digits: &[u8]) -> Value {
    let mut counts: BTreeMap<Value, i64> = BTreeMap::new();
    for &d in digits {
        *counts.entry(Value::Int(d as i64)).or_insert(0) += 1;
    }
    Value::Counter(counts)
}

fn digit_table(table: &[u8; 10]) -> Value {
    Value::Dict(
        table
            .iter()
            .enumerate()
            .map(|(d, &v)| (Value::Int(d as i64), Value::Int(v as i64)))
            .collect(),
    )
}

fn check_digit_list(digits: &[u8]) -> Result<(), DrawError> {
    if let Some(&d) = digits.iter().find(|&&d| d > 9) {
        return Err(DrawError::InvalidDigitList {
            text: format!("{digits:?}"),
            reason: format!("{d} n'est pas un chiffre 0-9"),
        });
    }
    Ok(())
}

/// Faits partagés par tous les candidats d'une même requête, calculés une
/// seule fois. Chaque candidat l'emprunte et n'y ajoute que ses faits.
#[derive(Debug, Clone)]
pub struct CommonContext {
    values: Vec<Value>,
    seed: Draw,
    seed_set: BTreeSet<u8>,
}

/// `history[0]` est le seed, `history[1..]` les tirages plus anciens.
/// `due` remplace le calcul par défaut des chiffres dus quand il est fourni.
pub fn build_common_context(
    history: &[Draw],
    hot: &[u8],
    cold: &[u8],
    due: Option<&[u8]>,
) -> Result<CommonContext, DrawError> {
    let seed = *history.first().ok_or(DrawError::EmptyHistory)?;
    check_digit_list(hot)?;
    check_digit_list(cold)?;
    if let Some(due) = due {
        check_digit_list(due)?;
    }

    let seed_set = seed.digit_set();
    let prev = history.get(1);
    let prev_set: BTreeSet<u8> = prev.map(|d| d.digit_set()).unwrap_or_default();

    let older_digits = |back: usize| -> Value {
        history
            .get(back)
            .map(|d| Value::digits(d.digits()))
            .unwrap_or(Value::List(Vec::new()))
    };
    let older_sum = |back: usize| -> Value {
        history
            .get(back)
            .map(|d| Value::Int(d.sum() as i64))
            .unwrap_or(Value::None)
    };

    let (common_to_both, last2) = match prev {
        Some(_) => (
            Value::digit_set(seed_set.intersection(&prev_set)),
            Value::digit_set(seed_set.union(&prev_set)),
        ),
        None => (Value::Set(BTreeSet::new()), Value::Set(BTreeSet::new())),
    };

    let due_digits: Vec<u8> = match due {
        Some(due) => due.to_vec(),
        None => (0..10u8)
            .filter(|d| !seed_set.contains(d) && !prev_set.contains(d))
            .collect(),
    };

    let mut pattern = Vec::new();
    for draw in history.iter().take(3).rev() {
        pattern.push(Value::str(draw.sum_category().label()));
        pattern.push(Value::str(draw.parity().label()));
    }

    let mut values = vec![Value::None; COMMON_FACTS.len()];
    let mut set = |fact: Fact, value: Value| values[fact.slot()] = value;

    set(Fact::SeedDigits, Value::digits(seed.digits()));
    set(Fact::SeedValue, Value::Int(seed.value() as i64));
    set(Fact::SeedSum, Value::Int(seed.sum() as i64));
    set(Fact::SeedSumCat, Value::str(seed.sum_category().label()));
    set(Fact::SeedParity, Value::str(seed.parity().label()));
    set(Fact::SeedCounts, counter_of(seed.digits()));
    set(Fact::SeedVtracs, Value::digit_set(&seed.vtracs()));
    set(Fact::SeedStructure, Value::str(seed.structure().label()));
    set(Fact::PrevSeedDigits, older_digits(1));
    set(Fact::PrevPrevSeedDigits, older_digits(2));
    set(Fact::PrevPrevPrevSeedDigits, older_digits(3));
    set(Fact::PrevSeedSum, older_sum(1));
    set(Fact::PrevPrevSeedSum, older_sum(2));
    set(Fact::PrevPrevPrevSeedSum, older_sum(3));
    set(Fact::NewSeedDigits, Value::digit_set(seed_set.difference(&prev_set)));
    set(Fact::PrevPattern, Value::Tuple(pattern));
    set(Fact::HotDigits, Value::digits(hot));
    set(Fact::ColdDigits, Value::digits(cold));
    set(Fact::DueDigits, Value::digits(&due_digits));
    set(Fact::CommonToBoth, common_to_both);
    set(Fact::Last2, last2);
    set(Fact::Mirror, digit_table(&MIRROR));
    set(Fact::Vtrac, digit_table(&VTRAC));
    set(Fact::Nan, Value::Float(f64::NAN));

    Ok(CommonContext {
        values,
        seed,
        seed_set,
    })
}

impl CommonContext {
    pub fn seed(&self) -> &Draw {
        &self.seed
    }

    /// Valeur d'un fait commun ; `None` pour un fait de candidat.
    pub fn get(&self, fact: Fact) -> Option<&Value> {
        if fact.is_candidate() {
            None
        } else {
            self.values.get(fact.slot())
        }
    }

    pub fn facts(&self) -> impl Iterator<Item = (Fact, &Value)> {
        COMMON_FACTS.iter().copied().zip(self.values.iter())
    }
}

/// Contexte complet d'un candidat : emprunte le contexte commun.
#[derive(Debug, Clone)]
pub struct Context<'c> {
    common: &'c CommonContext,
    combo: Combo,
    values: Vec<Value>,
}

pub fn extend_for_candidate<'c>(common: &'c CommonContext, combo: &Combo) -> Context<'c> {
    let combo_digits = combo.digits();
    let shared: BTreeSet<u8> = combo_digits
        .iter()
        .copied()
        .filter(|d| common.seed_set.contains(d))
        .collect();

    let mut values = vec![Value::None; CANDIDATE_FACTS.len()];
    let mut set = |fact: Fact, value: Value| values[fact.slot()] = value;

    set(Fact::ComboDigits, Value::digits(combo_digits));
    set(Fact::ComboSum, Value::Int(combo.sum() as i64));
    set(Fact::ComboSumCat, Value::str(combo.sum_category().label()));
    set(Fact::ComboParity, Value::str(combo.parity().label()));
    set(Fact::ComboVtracs, Value::digit_set(&combo.vtracs()));
    set(Fact::ComboStructure, Value::str(digits::structure_of(combo_digits).label()));
    set(Fact::ComboCounts, counter_of(combo_digits));
    set(Fact::ComboSeedCommon, Value::digit_set(&shared));

    Context {
        common,
        combo: *combo,
        values,
    }
}

impl<'c> Context<'c> {
    pub fn combo(&self) -> &Combo {
        &self.combo
    }

    pub fn get(&self, fact: Fact) -> &Value {
        if fact.is_candidate() {
            &self.values[fact.slot()]
        } else {
            &self.common.values[fact.slot()]
        }
    }

    pub fn facts(&self) -> impl Iterator<Item = (Fact, &Value)> {
        self.common
            .facts()
            .chain(CANDIDATE_FACTS.iter().copied().zip(self.values.iter()))
    }
}
