use dc5_core::models::Draw;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitStats {
    pub digit: u8,
    pub frequency: u32,
    /// Nombre de tirages depuis la dernière apparition (0 = tirage le plus
    /// récent) ; vaut le nombre de tirages si le chiffre n'est jamais sorti.
    pub gap: u32,
}

/// Fréquence et retard de chaque chiffre, tirages du plus récent au plus
/// ancien.
pub fn compute_stats(draws: &[Draw]) -> Vec<DigitStats> {
    (0..10u8)
        .map(|digit| {
            let frequency = draws
                .iter()
                .map(|d| d.digits().iter().filter(|&&x| x == digit).count() as u32)
                .sum();
            let gap = draws
                .iter()
                .position(|d| d.digits().contains(&digit))
                .unwrap_or(draws.len()) as u32;
            DigitStats {
                digit,
                frequency,
                gap,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotCold {
    pub hot: Vec<u8>,
    pub cold: Vec<u8>,
    pub due: Vec<u8>,
}

/// Chiffres chauds (fréquence au moins égale à la 3e plus haute), froids
/// (au plus la 3e plus basse) et dus (absents des deux derniers tirages).
/// Seuls les chiffres sortis au moins une fois sont classés chauds ou froids.
pub fn hot_cold(draws: &[Draw]) -> HotCold {
    let stats: Vec<DigitStats> = compute_stats(draws)
        .into_iter()
        .filter(|s| s.frequency > 0)
        .collect();
    if stats.is_empty() {
        return HotCold::default();
    }
    let rank = 2.min(stats.len() - 1);

    let mut counts: Vec<u32> = stats.iter().map(|s| s.frequency).collect();
    counts.sort_unstable();
    let cold_cutoff = counts[rank];
    counts.reverse();
    let hot_cutoff = counts[rank];

    let hot = stats
        .iter()
        .filter(|s| s.frequency >= hot_cutoff)
        .map(|s| s.digit)
        .collect();
    let cold = stats
        .iter()
        .filter(|s| s.frequency <= cold_cutoff)
        .map(|s| s.digit)
        .collect();
    let recent = &draws[..draws.len().min(2)];
    let due = (0..10u8)
        .filter(|d| !recent.iter().any(|draw| draw.digits().contains(d)))
        .collect();

    HotCold { hot, cold, due }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws(texts: &[&str]) -> Vec<Draw> {
        texts.iter().map(|t| Draw::parse(t).unwrap()).collect()
    }

    #[test]
    fn test_compute_stats() {
        let stats = compute_stats(&draws(&["11323", "45638"]));
        assert_eq!(stats[1].frequency, 2);
        assert_eq!(stats[1].gap, 0);
        assert_eq!(stats[3].frequency, 3);
        assert_eq!(stats[4].gap, 1);
        assert_eq!(stats[0].frequency, 0);
        assert_eq!(stats[0].gap, 2);
    }

    #[test]
    fn test_hot_cold_due() {
        let history = draws(&["11323", "45638", "90876", "11111"]);
        let result = hot_cold(&history);
        // 1 : 7, 3 : 3, 6 et 8 : 2
        assert_eq!(result.hot, vec![1, 3, 6, 8]);
        // 2, 4, 5, 7, 9 et 0 sortent une fois
        assert_eq!(result.cold, vec![0, 2, 4, 5, 7, 9]);
        assert_eq!(result.due, vec![0, 7, 9]);
    }

    #[test]
    fn test_cold_ignores_absent_digits() {
        let result = hot_cold(&draws(&["12345"]));
        assert_eq!(result.cold, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.hot, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.due, vec![0, 6, 7, 8, 9]);
    }

    #[test]
    fn test_hot_cold_with_few_distinct_digits() {
        // 1 : 6, 2 : 4 ; moins de trois chiffres distincts
        let result = hot_cold(&draws(&["11122", "11122"]));
        assert_eq!(result.hot, vec![1, 2]);
        assert_eq!(result.cold, vec![1, 2]);

        // 7 : 5, 1 : 3, 2 : 1, 3 : 1
        let result = hot_cold(&draws(&["11123", "77777"]));
        assert_eq!(result.hot, vec![1, 2, 3, 7]);
        assert_eq!(result.cold, vec![1, 2, 3]);
        assert!(!result.cold.contains(&0));
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(hot_cold(&[]), HotCold::default());
    }
}
