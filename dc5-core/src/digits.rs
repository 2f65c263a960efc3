use std::collections::BTreeSet;

/// Table miroir : chaque chiffre est associé à (d + 5) mod 10.
pub const MIRROR: [u8; 10] = [5, 6, 7, 8, 9, 0, 1, 2, 3, 4];

/// Groupes V-Trac : {0,5}→1, {1,6}→2, {2,7}→3, {3,8}→4, {4,9}→5.
pub const VTRAC: [u8; 10] = [1, 2, 3, 4, 5, 1, 2, 3, 4, 5];

pub fn mirror(d: u8) -> u8 {
    MIRROR[(d % 10) as usize]
}

pub fn vtrac_group(d: u8) -> u8 {
    VTRAC[(d % 10) as usize]
}

pub fn vtrac_set(digits: &[u8]) -> BTreeSet<u8> {
    digits.iter().map(|&d| vtrac_group(d)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SumCategory {
    VeryLow,
    Low,
    Mid,
    High,
}

/// Bornes inclusives des catégories de somme. Les sommes au-delà de 45
/// (impossibles sur 5 chiffres) restent dans la dernière catégorie.
pub const SUM_CATEGORY_BOUNDS: [(u32, u32, SumCategory); 4] = [
    (0, 14, SumCategory::VeryLow),
    (15, 20, SumCategory::Low),
    (21, 26, SumCategory::Mid),
    (27, 45, SumCategory::High),
];

impl SumCategory {
    pub fn label(&self) -> &'static str {
        match self {
            SumCategory::VeryLow => "Very Low",
            SumCategory::Low => "Low",
            SumCategory::Mid => "Mid",
            SumCategory::High => "High",
        }
    }
}

impl std::fmt::Display for SumCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn sum_category(total: u32) -> SumCategory {
    SUM_CATEGORY_BOUNDS
        .iter()
        .find(|(lo, hi, _)| total >= *lo && total <= *hi)
        .map(|(_, _, cat)| *cat)
        .unwrap_or(SumCategory::High)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn label(&self) -> &'static str {
        match self {
            Parity::Even => "Even",
            Parity::Odd => "Odd",
        }
    }
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn parity(total: u32) -> Parity {
    if total % 2 == 0 {
        Parity::Even
    } else {
        Parity::Odd
    }
}

/// Forme structurelle d'un multiensemble de 5 chiffres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Structure {
    Single,
    Double,
    DoubleDouble,
    Triple,
    TripleDouble,
    Quad,
    Quint,
}

impl Structure {
    pub fn label(&self) -> &'static str {
        match self {
            Structure::Single => "SINGLE",
            Structure::Double => "DOUBLE",
            Structure::DoubleDouble => "DOUBLE-DOUBLE",
            Structure::Triple => "TRIPLE",
            Structure::TripleDouble => "TRIPLE-DOUBLE",
            Structure::Quad => "QUAD",
            Structure::Quint => "QUINT",
        }
    }
}

impl std::fmt::Display for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Nombre d'occurrences de chaque chiffre 0-9.
pub fn digit_counts(digits: &[u8]) -> [u8; 10] {
    let mut counts = [0u8; 10];
    for &d in digits {
        counts[(d % 10) as usize] += 1;
    }
    counts
}

pub fn structure_of(digits: &[u8; 5]) -> Structure {
    let mut counts: Vec<u8> = digit_counts(digits).into_iter().filter(|&c| c > 0).collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let first = counts.first().copied().unwrap_or(0);
    let second = counts.get(1).copied().unwrap_or(0);
    match (first, second) {
        (5, _) => Structure::Quint,
        (4, _) => Structure::Quad,
        (3, 2) => Structure::TripleDouble,
        (3, _) => Structure::Triple,
        (2, 2) => Structure::DoubleDouble,
        (2, _) => Structure::Double,
        _ => Structure::Single,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_involution() {
        for d in 0..10u8 {
            assert_eq!(mirror(mirror(d)), d);
            assert_eq!(mirror(d), (d + 5) % 10);
        }
    }

    #[test]
    fn test_vtrac_partition() {
        let mut groups: std::collections::BTreeMap<u8, Vec<u8>> = std::collections::BTreeMap::new();
        for d in 0..10u8 {
            groups.entry(vtrac_group(d)).or_default().push(d);
        }
        assert_eq!(groups.len(), 5);
        assert!(groups.values().all(|members| members.len() == 2));
        assert_eq!(groups[&1], vec![0, 5]);
        assert_eq!(groups[&5], vec![4, 9]);
    }

    #[test]
    fn test_vtrac_same_group_as_mirror() {
        for d in 0..10u8 {
            assert_eq!(vtrac_group(d), vtrac_group(mirror(d)));
        }
    }

    #[test]
    fn test_sum_category_boundaries() {
        assert_eq!(sum_category(0), SumCategory::VeryLow);
        assert_eq!(sum_category(14), SumCategory::VeryLow);
        assert_eq!(sum_category(15), SumCategory::Low);
        assert_eq!(sum_category(20), SumCategory::Low);
        assert_eq!(sum_category(21), SumCategory::Mid);
        assert_eq!(sum_category(26), SumCategory::Mid);
        assert_eq!(sum_category(27), SumCategory::High);
        assert_eq!(sum_category(45), SumCategory::High);
        assert_eq!(sum_category(99), SumCategory::High);
    }

    #[test]
    fn test_sum_category_bounds_contiguous() {
        assert_eq!(SUM_CATEGORY_BOUNDS[0].0, 0);
        assert_eq!(SUM_CATEGORY_BOUNDS[SUM_CATEGORY_BOUNDS.len() - 1].1, 45);
        for pair in SUM_CATEGORY_BOUNDS.windows(2) {
            assert_eq!(pair[0].1 + 1, pair[1].0);
        }
    }

    #[test]
    fn test_parity() {
        assert_eq!(parity(10), Parity::Even);
        assert_eq!(parity(15), Parity::Odd);
        assert_eq!(parity(0).to_string(), "Even");
    }

    #[test]
    fn test_structure_of_all_shapes() {
        assert_eq!(structure_of(&[0, 1, 2, 3, 4]), Structure::Single);
        assert_eq!(structure_of(&[0, 0, 2, 3, 4]), Structure::Double);
        assert_eq!(structure_of(&[0, 0, 2, 2, 4]), Structure::DoubleDouble);
        assert_eq!(structure_of(&[7, 7, 7, 3, 4]), Structure::Triple);
        assert_eq!(structure_of(&[1, 1, 2, 2, 2]), Structure::TripleDouble);
        assert_eq!(structure_of(&[8, 8, 8, 8, 1]), Structure::Quad);
        assert_eq!(structure_of(&[5, 5, 5, 5, 5]), Structure::Quint);
    }

    #[test]
    fn test_structure_labels() {
        assert_eq!(structure_of(&[1, 1, 2, 2, 2]).to_string(), "TRIPLE-DOUBLE");
        assert_eq!(Structure::DoubleDouble.label(), "DOUBLE-DOUBLE");
    }

    #[test]
    fn test_digit_counts() {
        let counts = digit_counts(&[1, 1, 3, 2, 3]);
        assert_eq!(counts[1], 2);
        assert_eq!(counts[2], 1);
        assert_eq!(counts[3], 2);
        assert_eq!(counts.iter().map(|&c| c as u32).sum::<u32>(), 5);
    }
}
